//! Application state shared across handlers.

use std::sync::Arc;

use moka::future::Cache;
use portal_core::{Locale, SessionUser};

use crate::api::{ApiClient, ApiError};
use crate::config::PortalConfig;
use crate::i18n::Translator;

/// Upper bound on cached token verifications.
const VERIFY_CACHE_CAPACITY: u64 = 10_000;

/// Cached outcome of verifying a token: the user, or `None` if rejected.
pub type VerifyCache = Cache<String, Option<SessionUser>>;

/// Application state shared across all handlers.
///
/// Cheap to clone via `Arc`. Holds the unscoped backend client; handlers
/// scope it to the caller's token with [`ApiClient::with_token`].
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: PortalConfig,
    api: ApiClient,
    verify_cache: VerifyCache,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend HTTP client cannot be built.
    pub fn new(config: PortalConfig) -> Result<Self, ApiError> {
        let api = ApiClient::new(&config)?;
        let verify_cache = Cache::builder()
            .max_capacity(VERIFY_CACHE_CAPACITY)
            .time_to_live(config.verify_cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                api,
                verify_cache,
            }),
        })
    }

    /// Get a reference to the portal configuration.
    #[must_use]
    pub fn config(&self) -> &PortalConfig {
        &self.inner.config
    }

    /// Get a reference to the unscoped backend client.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// Token verifications shared by the route guard.
    #[must_use]
    pub fn verify_cache(&self) -> &VerifyCache {
        &self.inner.verify_cache
    }

    /// A translator for `locale`, falling back to the configured default.
    #[must_use]
    pub fn translator(&self, locale: Locale) -> Translator {
        Translator::new(locale, self.inner.config.default_locale)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.inner.config.secure_cookies()
    }
}
