//! Where the session token is persisted between requests.

use std::sync::{Mutex, PoisonError};

use axum::http::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};

use super::cookie::{AUTH_COOKIE_NAME, auth_cookie, clear_auth_cookie, read_cookie};

/// Persistence for the session token.
///
/// Implementations are synchronous; the session manager calls them outside
/// any await point.
pub trait TokenStore: Send + Sync {
    /// The persisted token, if any.
    fn get(&self) -> Option<SecretString>;

    /// Persist `token`, replacing any previous one.
    fn set(&self, token: &SecretString);

    /// Forget the persisted token.
    fn clear(&self);
}

/// In-process token store.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<SecretString>>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `token`.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(SecretString::from(token.into()))),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self) -> Option<SecretString> {
        self.token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set(&self, token: &SecretString) {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.clone());
    }

    fn clear(&self) {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// A pending change to the browser's auth cookie.
#[derive(Debug, Clone)]
pub enum TokenChange {
    Set(SecretString),
    Cleared,
}

/// Token store backed by the `auth_token` cookie of one request.
///
/// Reads come from the inbound `Cookie` header; writes are recorded and
/// turned into a `Set-Cookie` header by [`CookieTokenStore::set_cookie_header`]
/// once the handler builds its response.
#[derive(Debug, Default)]
pub struct CookieTokenStore {
    initial: Option<SecretString>,
    change: Mutex<Option<TokenChange>>,
}

impl CookieTokenStore {
    /// A store seeded from the request's `auth_token` cookie.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            initial: read_cookie(headers, AUTH_COOKIE_NAME).map(SecretString::from),
            change: Mutex::new(None),
        }
    }

    /// The recorded change, if any.
    #[must_use]
    pub fn change(&self) -> Option<TokenChange> {
        self.change
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// `Set-Cookie` value reflecting the recorded change, if any.
    ///
    /// A token that cannot be placed in a header is dropped and the cookie
    /// cleared instead.
    #[must_use]
    pub fn set_cookie_header(&self, secure: bool) -> Option<HeaderValue> {
        match self.change()? {
            TokenChange::Set(token) => Some(
                auth_cookie(token.expose_secret(), secure).unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "Backend token is not a valid cookie value");
                    clear_auth_cookie(secure)
                }),
            ),
            TokenChange::Cleared => Some(clear_auth_cookie(secure)),
        }
    }
}

impl TokenStore for CookieTokenStore {
    fn get(&self) -> Option<SecretString> {
        match self.change() {
            Some(TokenChange::Set(token)) => Some(token),
            Some(TokenChange::Cleared) => None,
            None => self.initial.clone(),
        }
    }

    fn set(&self, token: &SecretString) {
        *self.change.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(TokenChange::Set(token.clone()));
    }

    fn clear(&self) {
        *self.change.lock().unwrap_or_else(PoisonError::into_inner) = Some(TokenChange::Cleared);
    }
}
