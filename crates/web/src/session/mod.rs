//! Authentication session lifecycle.
//!
//! A [`SessionManager`] holds the current user and token for one visitor and
//! drives them through `Uninitialized → Authenticated | Anonymous`. The user
//! and token are always set and cleared together. The token is persisted
//! through a [`TokenStore`], which on the web side is the `auth_token`
//! cookie.
//!
//! # Example
//!
//! ```rust,ignore
//! let store = CookieTokenStore::from_headers(&headers);
//! let session = SessionManager::new(api.clone(), store, translator);
//!
//! if session.login(&email, &password).await {
//!     let set_cookie = session.store().set_cookie_header(secure);
//!     // redirect with the Set-Cookie header
//! } else {
//!     let message = session.error(); // localized
//! }
//! ```

pub mod cookie;
pub mod store;

pub use store::{CookieTokenStore, MemoryTokenStore, TokenChange, TokenStore};

use std::sync::{Mutex, MutexGuard, PoisonError};

use portal_core::SessionUser;
use secrecy::SecretString;
use tracing::{debug, info, instrument, warn};

use crate::api::ApiClient;
use crate::i18n::Translator;
use crate::services::auth::{AuthResponse, AuthService, Credentials, RegisterData};

/// Message key shown when login fails.
pub const LOGIN_FAILED_KEY: &str = "login.error.invalidCredentials";

/// Message key shown when registration fails.
pub const REGISTER_FAILED_KEY: &str = "login.error.serverError";

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// `init` has not completed yet.
    Uninitialized,
    /// A verified user and token are held.
    Authenticated,
    /// No user; any persisted token has been cleared.
    Anonymous,
}

/// The user and token of an authenticated session.
#[derive(Debug, Clone)]
pub struct ActiveSession {
    pub user: SessionUser,
    pub token: SecretString,
}

#[derive(Debug)]
struct Inner {
    state: SessionState,
    session: Option<ActiveSession>,
    error: Option<String>,
    in_flight: usize,
}

/// Session state for one visitor.
///
/// Explicitly constructed and passed to whoever needs it. Internal state is
/// behind a mutex that is never held across an await, so concurrent calls
/// interleave at backend round-trips; the last response to arrive wins.
pub struct SessionManager<S> {
    api: ApiClient,
    store: S,
    translator: Translator,
    inner: Mutex<Inner>,
}

impl<S: TokenStore> SessionManager<S> {
    /// Create an uninitialized session.
    ///
    /// `api` should be unscoped; the manager attaches tokens itself.
    pub fn new(api: ApiClient, store: S, translator: Translator) -> Self {
        Self {
            api,
            store,
            translator,
            inner: Mutex::new(Inner {
                state: SessionState::Uninitialized,
                session: None,
                error: None,
                in_flight: 0,
            }),
        }
    }

    /// Restore the session from the persisted token.
    ///
    /// A token the backend does not confirm (invalid, unreachable, no user)
    /// is cleared and the session becomes anonymous. Failures are logged,
    /// never returned.
    #[instrument(skip(self))]
    pub async fn init(&self) {
        let Some(token) = self.store.get() else {
            self.finish(|inner| {
                inner.state = SessionState::Anonymous;
                inner.session = None;
            });
            return;
        };

        self.begin();
        let scoped = self.api.with_token(&token);
        let verified = match AuthService::new(&scoped).verify().await {
            Ok(status) => status.into_user(),
            Err(e) => {
                warn!(error = %e, "Token verification failed");
                None
            }
        };

        match verified {
            Some(user) => {
                debug!(user_id = %user.id, "Session restored");
                self.finish(|inner| {
                    inner.state = SessionState::Authenticated;
                    inner.session = Some(ActiveSession { user, token });
                });
            }
            None => {
                self.store.clear();
                self.finish(|inner| {
                    inner.state = SessionState::Anonymous;
                    inner.session = None;
                });
            }
        }
    }

    /// Log in with email and password.
    ///
    /// Returns `true` on success. On failure the session is anonymous and
    /// [`SessionManager::error`] holds a localized message.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> bool {
        let credentials = Credentials {
            email: email.to_string(),
            password: password.to_string(),
        };

        self.begin();
        let result = AuthService::new(&self.api).login(&credentials).await;
        match result {
            Ok(response) => {
                info!(user_id = %response.user.id, "Login succeeded");
                self.establish(response);
                true
            }
            Err(e) => {
                warn!(error = %e, "Login failed");
                self.fail(LOGIN_FAILED_KEY);
                false
            }
        }
    }

    /// Register a new account and log it in.
    ///
    /// Returns `true` on success; see [`SessionManager::login`].
    #[instrument(skip(self, password))]
    pub async fn register(&self, name: &str, email: &str, password: &str) -> bool {
        let data = RegisterData {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role: None,
        };

        self.begin();
        let result = AuthService::new(&self.api).register(&data).await;
        match result {
            Ok(response) => {
                info!(user_id = %response.user.id, "Registration succeeded");
                self.establish(response);
                true
            }
            Err(e) => {
                warn!(error = %e, "Registration failed");
                self.fail(REGISTER_FAILED_KEY);
                false
            }
        }
    }

    /// End the session.
    ///
    /// The backend is told to drop the token, but whatever it answers the
    /// persisted token and in-memory session are cleared.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        let token = self
            .lock()
            .session
            .as_ref()
            .map(|s| s.token.clone())
            .or_else(|| self.store.get());

        if let Some(token) = token {
            self.begin();
            let scoped = self.api.with_token(&token);
            if let Err(e) = AuthService::new(&scoped).logout().await {
                warn!(error = %e, "Backend logout failed");
            }
            self.store.clear();
            self.finish(|inner| {
                inner.state = SessionState::Anonymous;
                inner.session = None;
            });
        } else {
            self.store.clear();
            let mut inner = self.lock();
            inner.state = SessionState::Anonymous;
            inner.session = None;
        }
    }

    /// Forget the last error message.
    pub fn clear_error(&self) {
        self.lock().error = None;
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.lock().state
    }

    /// The logged-in user, if any.
    #[must_use]
    pub fn user(&self) -> Option<SessionUser> {
        self.lock().session.as_ref().map(|s| s.user.clone())
    }

    /// The session token, if authenticated.
    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        self.lock().session.as_ref().map(|s| s.token.clone())
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.lock().state == SessionState::Authenticated
    }

    /// Whether a backend call is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.lock().in_flight > 0
    }

    /// Localized message of the last failed login or registration.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    /// An API client scoped to the session token, if authenticated.
    #[must_use]
    pub fn api(&self) -> Option<ApiClient> {
        self.token().map(|token| self.api.with_token(&token))
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    // =========================================================================
    // State transitions
    // =========================================================================

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self) {
        self.lock().in_flight += 1;
    }

    fn finish(&self, update: impl FnOnce(&mut Inner)) {
        let mut inner = self.lock();
        inner.in_flight = inner.in_flight.saturating_sub(1);
        update(&mut inner);
    }

    fn establish(&self, response: AuthResponse) {
        let token = SecretString::from(response.token);
        self.store.set(&token);
        self.finish(|inner| {
            inner.state = SessionState::Authenticated;
            inner.session = Some(ActiveSession {
                user: response.user,
                token,
            });
            inner.error = None;
        });
    }

    fn fail(&self, key: &str) {
        let message = self.translator.get(key).to_string();
        self.finish(|inner| {
            if inner.session.is_none() {
                inner.state = SessionState::Anonymous;
            }
            inner.error = Some(message);
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use portal_core::{Locale, RecordId};
    use secrecy::ExposeSecret;
    use serde_json::json;
    use url::Url;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::config::PortalConfig;

    async fn setup() -> (MockServer, ApiClient) {
        let server = MockServer::start().await;
        let url = Url::parse(&format!("{}/api/", server.uri())).unwrap();
        let client = ApiClient::new(&PortalConfig::for_backend(url)).unwrap();
        (server, client)
    }

    fn english() -> Translator {
        Translator::new(Locale::EnUs, Locale::ZhCn)
    }

    fn auth_body(token: &str) -> serde_json::Value {
        json!({
            "token": token,
            "user": { "id": 7, "name": "Ada", "email": "ada@example.com", "role": "admin" }
        })
    }

    #[tokio::test]
    async fn test_login_success_persists_token() {
        let (server, api) = setup().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(auth_body("tok-1")))
            .mount(&server)
            .await;

        let session = SessionManager::new(api, MemoryTokenStore::new(), english());
        assert_eq!(session.state(), SessionState::Uninitialized);

        assert!(session.login("ada@example.com", "secret123").await);
        assert_eq!(session.state(), SessionState::Authenticated);
        assert_eq!(session.user().unwrap().id, RecordId::Number(7));
        assert_eq!(session.store().get().unwrap().expose_secret(), "tok-1");
        assert!(session.error().is_none());
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn test_login_failure_sets_localized_error() {
        let (server, api) = setup().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "bad" })))
            .mount(&server)
            .await;

        let session = SessionManager::new(api, MemoryTokenStore::new(), english());
        assert!(!session.login("ada@example.com", "wrong").await);
        assert_eq!(session.state(), SessionState::Anonymous);
        assert!(session.user().is_none());
        assert!(session.token().is_none());
        assert_eq!(session.error().as_deref(), Some("Invalid email or password"));

        session.clear_error();
        assert!(session.error().is_none());
    }

    #[tokio::test]
    async fn test_register_failure_uses_server_error_message() {
        let (server, api) = setup().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/register"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let session = SessionManager::new(api, MemoryTokenStore::new(), english());
        assert!(!session.register("Ada", "ada@example.com", "secret123").await);
        assert_eq!(
            session.error().as_deref(),
            Some("Server error, please try again later")
        );
    }

    #[tokio::test]
    async fn test_init_restores_valid_token() {
        let (server, api) = setup().await;
        Mock::given(method("GET"))
            .and(path("/api/auth/verify"))
            .and(header("authorization", "Bearer stored"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "valid": true,
                "user": { "id": 7, "name": "Ada", "email": "ada@example.com", "role": "admin" }
            })))
            .mount(&server)
            .await;

        let session = SessionManager::new(api, MemoryTokenStore::with_token("stored"), english());
        session.init().await;
        assert_eq!(session.state(), SessionState::Authenticated);
        assert_eq!(session.token().unwrap().expose_secret(), "stored");
    }

    #[tokio::test]
    async fn test_init_clears_stale_token() {
        let (server, api) = setup().await;
        Mock::given(method("GET"))
            .and(path("/api/auth/verify"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let session = SessionManager::new(api, MemoryTokenStore::with_token("stale"), english());
        session.init().await;
        assert_eq!(session.state(), SessionState::Anonymous);
        assert!(session.store().get().is_none());
        assert!(session.error().is_none());
    }

    #[tokio::test]
    async fn test_init_without_token_is_anonymous() {
        let (_server, api) = setup().await;
        let session = SessionManager::new(api, MemoryTokenStore::new(), english());
        session.init().await;
        assert_eq!(session.state(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn test_logout_clears_even_when_backend_fails() {
        let (server, api) = setup().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(auth_body("tok-1")))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/auth/logout"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let session = SessionManager::new(api, MemoryTokenStore::new(), english());
        assert!(session.login("ada@example.com", "secret123").await);

        session.logout().await;
        assert_eq!(session.state(), SessionState::Anonymous);
        assert!(session.user().is_none());
        assert!(session.store().get().is_none());
    }

    #[tokio::test]
    async fn test_logout_uses_stored_token_before_init() {
        let (server, api) = setup().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/logout"))
            .and(header("authorization", "Bearer cookie-token"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let session =
            SessionManager::new(api, MemoryTokenStore::with_token("cookie-token"), english());
        session.logout().await;
        assert_eq!(session.state(), SessionState::Anonymous);
        assert!(session.into_store().get().is_none());
    }

    #[tokio::test]
    async fn test_scoped_api_only_when_authenticated() {
        let (server, api) = setup().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(auth_body("tok-9")))
            .mount(&server)
            .await;

        let session = SessionManager::new(api, MemoryTokenStore::new(), english());
        assert!(session.api().is_none());
        session.login("ada@example.com", "secret123").await;
        assert!(session.api().unwrap().has_token());
    }
}
