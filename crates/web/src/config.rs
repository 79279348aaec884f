//! Portal configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `PORTAL_API_URL` - Base URL of the backend API (e.g. `http://localhost:3001/api`)
//!
//! ## Optional
//! - `PORTAL_HOST` - Bind address (default: 127.0.0.1)
//! - `PORTAL_PORT` - Listen port (default: 3000)
//! - `PORTAL_BASE_URL` - Public URL of the front end (default: <http://localhost:3000>)
//! - `PORTAL_DEFAULT_LOCALE` - Fallback UI locale (default: zh-CN)
//! - `PORTAL_VERIFY_CACHE_SECONDS` - How long token verifications are cached (default: 30)
//! - `PORTAL_HTTP_TIMEOUT_SECONDS` - Backend request timeout (default: 10)
//! - `PORTAL_STATIC_DIR` - Directory served under `/static` (default: crates/web/static)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use portal_core::Locale;
use thiserror::Error;
use url::Url;

const DEFAULT_STATIC_DIR: &str = "crates/web/static";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Portal application configuration.
///
/// Implements `Debug` manually to redact the Sentry DSN.
#[derive(Clone)]
pub struct PortalConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the front end
    pub base_url: String,
    /// Backend API base URL; endpoints are appended to its path
    pub api_url: Url,
    /// Locale used when neither cookie nor `Accept-Language` matches
    pub default_locale: Locale,
    /// TTL for cached token verifications in the route guard
    pub verify_cache_ttl: Duration,
    /// Timeout for each backend request
    pub http_timeout: Duration,
    /// Stylesheets and other assets served under `/static`
    pub static_dir: PathBuf,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. "production")
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

impl std::fmt::Debug for PortalConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortalConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("base_url", &self.base_url)
            .field("api_url", &self.api_url.as_str())
            .field("default_locale", &self.default_locale)
            .field("verify_cache_ttl", &self.verify_cache_ttl)
            .field("http_timeout", &self.http_timeout)
            .field("static_dir", &self.static_dir)
            .field("sentry_dsn", &self.sentry_dsn.as_ref().map(|_| "[REDACTED]"))
            .field("sentry_environment", &self.sentry_environment)
            .finish_non_exhaustive()
    }
}

impl PortalConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env_or_default("PORTAL_HOST", "127.0.0.1")?;
        let port = parse_env_or_default("PORTAL_PORT", "3000")?;
        let base_url = get_env_or_default("PORTAL_BASE_URL", "http://localhost:3000");
        let api_url = parse_api_url(&get_required_env("PORTAL_API_URL")?)?;

        let locale_tag = get_env_or_default("PORTAL_DEFAULT_LOCALE", Locale::default().tag());
        let default_locale = Locale::from_tag(&locale_tag).ok_or_else(|| {
            ConfigError::InvalidEnvVar(
                "PORTAL_DEFAULT_LOCALE".to_string(),
                format!("unsupported locale '{locale_tag}'"),
            )
        })?;

        let verify_cache_ttl =
            Duration::from_secs(parse_env_or_default("PORTAL_VERIFY_CACHE_SECONDS", "30")?);
        let http_timeout =
            Duration::from_secs(parse_env_or_default("PORTAL_HTTP_TIMEOUT_SECONDS", "10")?);

        Ok(Self {
            host,
            port,
            base_url,
            api_url,
            default_locale,
            verify_cache_ttl,
            http_timeout,
            static_dir: PathBuf::from(get_env_or_default("PORTAL_STATIC_DIR", DEFAULT_STATIC_DIR)),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env_or_default("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env_or_default("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Configuration pointing at a given backend, with defaults for the rest.
    ///
    /// Used by tests and by embedders that build config programmatically.
    /// The URL path gets a trailing slash so endpoints join beneath it.
    #[must_use]
    pub fn for_backend(api_url: Url) -> Self {
        let api_url = with_trailing_slash(api_url);
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            api_url,
            default_locale: Locale::default(),
            verify_cache_ttl: Duration::from_secs(30),
            http_timeout: Duration::from_secs(10),
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable (or its default) into `T`.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse the backend URL, normalizing it to end with `/` so endpoint paths
/// join onto it instead of replacing its last segment.
fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |msg: String| ConfigError::InvalidEnvVar("PORTAL_API_URL".to_string(), msg);

    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    Ok(with_trailing_slash(url))
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_api_url_appends_trailing_slash() {
        let url = parse_api_url("http://localhost:3001/api").unwrap();
        assert_eq!(url.as_str(), "http://localhost:3001/api/");
        assert_eq!(url.join("auth/login").unwrap().path(), "/api/auth/login");
    }

    #[test]
    fn test_parse_api_url_keeps_existing_slash() {
        let url = parse_api_url("https://backend.example.com/").unwrap();
        assert_eq!(url.as_str(), "https://backend.example.com/");
    }

    #[test]
    fn test_parse_api_url_rejects_other_schemes() {
        let err = parse_api_url("ftp://example.com/api").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
        assert!(parse_api_url("not a url").is_err());
    }

    #[test]
    fn test_for_backend_appends_trailing_slash() {
        let config = PortalConfig::for_backend(Url::parse("http://backend.test/api").unwrap());
        assert_eq!(config.api_url.as_str(), "http://backend.test/api/");

        let client = crate::api::ApiClient::new(&config).unwrap();
        let url = client.endpoint_url("/users").unwrap();
        assert_eq!(url.as_str(), "http://backend.test/api/users");
    }

    #[test]
    fn test_socket_addr() {
        let mut config = PortalConfig::for_backend(Url::parse("http://localhost:3001/").unwrap());
        config.port = 8080;

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 8080);
    }

    #[test]
    fn test_secure_cookies_follow_base_url_scheme() {
        let mut config = PortalConfig::for_backend(Url::parse("http://localhost:3001/").unwrap());
        assert!(!config.secure_cookies());
        config.base_url = "https://portal.example.com".to_string();
        assert!(config.secure_cookies());
    }

    #[test]
    fn test_debug_redacts_sentry_dsn() {
        let mut config = PortalConfig::for_backend(Url::parse("http://localhost:3001/").unwrap());
        config.sentry_dsn = Some("https://key@sentry.example.com/1".to_string());

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("localhost:3001"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("key@sentry"));
    }
}
