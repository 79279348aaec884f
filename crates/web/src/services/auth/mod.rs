//! Authentication service.
//!
//! A typed facade over the backend's `/auth/*` endpoints. Credentials are
//! checked, hashed and stored by the backend; this side only forwards them
//! and decodes the answers. Registration forms are validated locally first
//! (see [`validate_registration`]) so obviously bad input never leaves the
//! browser session.

mod error;
mod types;

pub use error::ValidationError;
pub use types::{
    AuthResponse, Credentials, PasswordResetConfirm, PasswordResetRequest, RegisterData,
    TokenStatus,
};

use portal_core::{Email, SessionUser};
use tracing::instrument;

use crate::api::{ApiClient, ApiError, required};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Authentication service.
///
/// Token-bearing calls (`logout`, `verify`, `refresh`, `me`) use whatever
/// token the wrapped client was scoped to with [`ApiClient::with_token`].
pub struct AuthService<'a> {
    client: &'a ApiClient,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    // =========================================================================
    // Session lifecycle
    // =========================================================================

    /// Exchange email and password for a token.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` (typically 401) for rejected credentials.
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ApiError> {
        const ENDPOINT: &str = "/auth/login";
        required(self.client.post(ENDPOINT, credentials).await?, ENDPOINT)
    }

    /// Create an account and log it in.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` if the backend refuses the registration.
    #[instrument(skip(self, data), fields(email = %data.email))]
    pub async fn register(&self, data: &RegisterData) -> Result<AuthResponse, ApiError> {
        const ENDPOINT: &str = "/auth/register";
        required(self.client.post(ENDPOINT, data).await?, ENDPOINT)
    }

    /// Invalidate the current token on the backend.
    ///
    /// # Errors
    ///
    /// Returns the backend error.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), ApiError> {
        let _: Option<serde_json::Value> = self.client.post_empty("/auth/logout").await?;
        Ok(())
    }

    /// Ask the backend whether the current token is still valid.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Status` (typically 401) for rejected tokens.
    #[instrument(skip(self))]
    pub async fn verify(&self) -> Result<TokenStatus, ApiError> {
        const ENDPOINT: &str = "/auth/verify";
        required(self.client.get(ENDPOINT).await?, ENDPOINT)
    }

    /// Trade the current token for a fresh one.
    ///
    /// # Errors
    ///
    /// Returns the backend error.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<AuthResponse, ApiError> {
        const ENDPOINT: &str = "/auth/refresh";
        required(self.client.post_empty(ENDPOINT).await?, ENDPOINT)
    }

    /// The user the current token belongs to.
    ///
    /// # Errors
    ///
    /// Returns the backend error.
    #[instrument(skip(self))]
    pub async fn me(&self) -> Result<SessionUser, ApiError> {
        const ENDPOINT: &str = "/auth/me";
        required(self.client.get(ENDPOINT).await?, ENDPOINT)
    }

    // =========================================================================
    // Password reset
    // =========================================================================

    /// Start a password reset for `email`.
    ///
    /// # Errors
    ///
    /// Returns the backend error.
    #[instrument(skip(self))]
    pub async fn request_password_reset(&self, email: &str) -> Result<(), ApiError> {
        let body = PasswordResetRequest {
            email: email.to_string(),
        };
        let _: Option<serde_json::Value> = self.client.post("/auth/password-reset", &body).await?;
        Ok(())
    }

    /// Complete a password reset with the emailed token.
    ///
    /// # Errors
    ///
    /// Returns the backend error.
    #[instrument(skip_all)]
    pub async fn confirm_password_reset(&self, token: &str, password: &str) -> Result<(), ApiError> {
        let body = PasswordResetConfirm {
            token: token.to_string(),
            password: password.to_string(),
        };
        let _: Option<serde_json::Value> = self
            .client
            .post("/auth/password-reset/confirm", &body)
            .await?;
        Ok(())
    }
}

// =============================================================================
// Form validation
// =============================================================================

/// Check a registration form before submitting it.
///
/// Checks run in order: every field present, email well-formed, password
/// and confirmation equal, password long enough.
///
/// # Errors
///
/// Returns the first failing check.
pub fn validate_registration(
    name: &str,
    email: &str,
    password: &str,
    confirm_password: &str,
) -> Result<(), ValidationError> {
    if [name, email, password, confirm_password]
        .iter()
        .any(|field| field.trim().is_empty())
    {
        return Err(ValidationError::FieldsRequired);
    }
    Email::parse(email).map_err(|_| ValidationError::InvalidEmail)?;
    if password != confirm_password {
        return Err(ValidationError::PasswordMismatch);
    }
    validate_password(password)
}

/// Check password strength.
///
/// # Errors
///
/// Returns `ValidationError::PasswordTooShort` below [`MIN_PASSWORD_LENGTH`]
/// characters.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooShort {
            min: MIN_PASSWORD_LENGTH,
        });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use portal_core::RecordId;
    use secrecy::SecretString;
    use serde_json::json;
    use url::Url;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::config::PortalConfig;

    async fn setup() -> (MockServer, ApiClient) {
        let server = MockServer::start().await;
        let url = Url::parse(&format!("{}/api/", server.uri())).unwrap();
        let client = ApiClient::new(&PortalConfig::for_backend(url)).unwrap();
        (server, client)
    }

    fn user_json() -> serde_json::Value {
        json!({ "id": 1, "name": "Ada", "email": "ada@example.com", "role": "admin" })
    }

    #[test]
    fn test_validate_registration_mismatch() {
        let err = validate_registration("Ada", "ada@example.com", "abcd1234", "abcd9999");
        assert_eq!(err, Err(ValidationError::PasswordMismatch));
        assert_eq!(
            ValidationError::PasswordMismatch.message_key(),
            "register.passwordMismatch"
        );
    }

    #[test]
    fn test_validate_registration_order() {
        assert_eq!(
            validate_registration("", "bad", "x", "y"),
            Err(ValidationError::FieldsRequired)
        );
        assert_eq!(
            validate_registration("Ada", "not-an-email", "x", "y"),
            Err(ValidationError::InvalidEmail)
        );
        assert_eq!(
            validate_registration("Ada", "ada@example.com", "short", "short"),
            Err(ValidationError::PasswordTooShort { min: 8 })
        );
        assert!(validate_registration("Ada", "ada@example.com", "abcd1234", "abcd1234").is_ok());
    }

    #[test]
    fn test_password_length_counts_characters() {
        assert!(validate_password("密码密码密码密码").is_ok());
        assert!(validate_password("密码密码").is_err());
    }

    #[tokio::test]
    async fn test_login_forwards_credentials() {
        let (server, client) = setup().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .and(body_json(json!({ "email": "ada@example.com", "password": "secret123" })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "token": "tok", "user": user_json() })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let response = AuthService::new(&client)
            .login(&Credentials {
                email: "ada@example.com".to_string(),
                password: "secret123".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(response.token, "tok");
        assert_eq!(response.user.id, RecordId::Number(1));
    }

    #[tokio::test]
    async fn test_verify_uses_scoped_token() {
        let (server, client) = setup().await;
        Mock::given(method("GET"))
            .and(path("/api/auth/verify"))
            .and(header("authorization", "Bearer stored"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "valid": true, "user": user_json() })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let scoped = client.with_token(&SecretString::from("stored"));
        let status = AuthService::new(&scoped).verify().await.unwrap();
        assert!(status.valid);
        assert_eq!(status.into_user().unwrap().name, "Ada");
    }

    #[test]
    fn test_invalid_token_status_has_no_user() {
        let status = TokenStatus {
            valid: false,
            user: Some(serde_json::from_value(user_json()).unwrap()),
        };
        assert!(status.into_user().is_none());
    }

    #[tokio::test]
    async fn test_logout_accepts_no_content() {
        let (server, client) = setup().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/logout"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        AuthService::new(&client).logout().await.unwrap();
    }

    #[tokio::test]
    async fn test_me_with_empty_body_is_an_error() {
        let (server, client) = setup().await;
        Mock::given(method("GET"))
            .and(path("/api/auth/me"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let err = AuthService::new(&client).me().await.unwrap_err();
        assert!(matches!(err, ApiError::EmptyBody(_)));
    }

    #[tokio::test]
    async fn test_password_reset_endpoints() {
        let (server, client) = setup().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/password-reset"))
            .and(body_json(json!({ "email": "ada@example.com" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "sent": true })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/auth/password-reset/confirm"))
            .and(body_json(json!({ "token": "r1", "password": "newpass123" })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let auth = AuthService::new(&client);
        auth.request_password_reset("ada@example.com").await.unwrap();
        auth.confirm_password_reset("r1", "newpass123").await.unwrap();
    }
}
