//! Authentication extractors.
//!
//! The route guard has already run by the time these extract, so on
//! protected paths a verified [`SessionUser`] may sit in the request
//! extensions. Elsewhere the user shown in the layout comes from the
//! tower-sessions cache, and only while the auth cookie is still present.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, StatusCode, header::SET_COOKIE, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use portal_core::SessionUser;
use secrecy::SecretString;
use tower_sessions::Session;

use crate::error::json_error;
use crate::middleware::guard::LOGIN_PATH;
use crate::models::session_keys;
use crate::session::cookie::{AUTH_COOKIE_NAME, bearer_token, clear_auth_cookie, read_cookie};

/// Error returned when authentication is required but missing.
pub enum AuthRejection {
    /// Redirect to the login page (for HTML requests), clearing a stale
    /// auth cookie on the way.
    RedirectToLogin,
    /// `401 {"error":"Unauthorized"}` (for API requests).
    Unauthorized,
}

impl AuthRejection {
    fn for_path(path: &str) -> Self {
        if path.starts_with("/api/") {
            Self::Unauthorized
        } else {
            Self::RedirectToLogin
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => {
                let mut headers = HeaderMap::new();
                headers.insert(SET_COOKIE, clear_auth_cookie(false));
                (headers, Redirect::to(LOGIN_PATH)).into_response()
            }
            Self::Unauthorized => json_error(StatusCode::UNAUTHORIZED, "Unauthorized"),
        }
    }
}

/// Extractor for the caller's backend token (auth cookie, or bearer header
/// for non-browser clients).
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(State(state): State<AppState>, AuthToken(token): AuthToken) {
///     let api = state.api().with_token(&token);
/// }
/// ```
pub struct AuthToken(pub SecretString);

impl<S> FromRequestParts<S> for AuthToken
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        token_from_headers(&parts.headers)
            .map(|token| Self(SecretString::from(token)))
            .ok_or_else(|| AuthRejection::for_path(parts.uri.path()))
    }
}

/// Like [`AuthToken`], but never rejects.
pub struct OptionalToken(pub Option<SecretString>);

impl<S> FromRequestParts<S> for OptionalToken
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(token_from_headers(&parts.headers).map(SecretString::from)))
    }
}

fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    read_cookie(headers, AUTH_COOKIE_NAME).or_else(|| bearer_token(headers))
}

/// Extractor that requires a verified user.
///
/// Pages get a redirect to `/login`, API paths a 401.
pub struct CurrentUser(pub SessionUser);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        lookup_user(parts)
            .await
            .map(Self)
            .ok_or_else(|| AuthRejection::for_path(parts.uri.path()))
    }
}

/// Extractor that optionally gets the current user.
pub struct OptionalUser(pub Option<SessionUser>);

impl<S> FromRequestParts<S> for OptionalUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(lookup_user(parts).await))
    }
}

async fn lookup_user(parts: &Parts) -> Option<SessionUser> {
    if let Some(user) = parts.extensions.get::<SessionUser>() {
        return Some(user.clone());
    }
    read_cookie(&parts.headers, AUTH_COOKIE_NAME)?;
    let session = parts.extensions.get::<Session>()?;
    session
        .get::<SessionUser>(session_keys::CURRENT_USER)
        .await
        .ok()
        .flatten()
}

/// Cache the logged-in user in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &SessionUser,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Remove the cached user from the session (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<SessionUser>(session_keys::CURRENT_USER)
        .await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use axum::{Router, body::Body, extract::Request, http::header, routing::get};
    use portal_core::RecordId;
    use secrecy::ExposeSecret;
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route(
                "/api/token",
                get(|AuthToken(token): AuthToken| async move {
                    token.expose_secret().to_string()
                }),
            )
            .route(
                "/dashboard",
                get(|CurrentUser(user): CurrentUser| async move { user.name }),
            )
            .route(
                "/about",
                get(|OptionalUser(user): OptionalUser| async move {
                    user.map_or_else(|| "guest".to_string(), |u| u.name)
                }),
            )
    }

    async fn text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_token_from_cookie_or_bearer() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/api/token")
                    .header(header::COOKIE, "auth_token=from-cookie")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(text(response).await, "from-cookie");

        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/api/token")
                    .header(header::AUTHORIZATION, "Bearer from-header")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(text(response).await, "from-header");
    }

    #[tokio::test]
    async fn test_missing_token_on_api_is_401() {
        let response = app()
            .oneshot(Request::builder().uri("/api/token").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_current_user_from_guard_extension() {
        let mut request = Request::builder().uri("/dashboard").body(Body::empty()).unwrap();
        request.extensions_mut().insert(SessionUser {
            id: RecordId::from(1),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            role: "admin".to_string(),
        });

        let response = app().oneshot(request).await.unwrap();
        assert_eq!(text(response).await, "Ada");
    }

    #[tokio::test]
    async fn test_missing_user_redirects_and_clears_cookie() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/dashboard")
                    .header(header::COOKIE, "auth_token=stale")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response.status().is_redirection());
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/login");
        assert!(
            response
                .headers()
                .get(header::SET_COOKIE)
                .unwrap()
                .to_str()
                .unwrap()
                .contains("Max-Age=0")
        );
    }

    #[tokio::test]
    async fn test_optional_user_without_session_is_guest() {
        let response = app()
            .oneshot(Request::builder().uri("/about").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(text(response).await, "guest");
    }
}
