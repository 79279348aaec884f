//! Browser cookies: the auth token and the UI preferences.

use axum::http::header::{AUTHORIZATION, COOKIE, InvalidHeaderValue};
use axum::http::{HeaderMap, HeaderValue};
use tower_sessions::cookie::time::Duration;
use tower_sessions::cookie::{Cookie, SameSite};

/// Name of the cookie carrying the backend token.
pub const AUTH_COOKIE_NAME: &str = "auth_token";

/// Name of the locale preference cookie.
pub const LOCALE_COOKIE_NAME: &str = "locale";

/// Name of the theme preference cookie.
pub const THEME_COOKIE_NAME: &str = "theme";

/// Auth cookie lifetime (7 days).
pub const AUTH_COOKIE_MAX_AGE_DAYS: i64 = 7;

/// Preference cookie lifetime (1 year).
pub const PREFERENCE_COOKIE_MAX_AGE_DAYS: i64 = 365;

/// `Set-Cookie` value storing `token` in the auth cookie.
///
/// # Errors
///
/// Returns an error if the token contains bytes not allowed in a header.
pub fn auth_cookie(token: &str, secure: bool) -> Result<HeaderValue, InvalidHeaderValue> {
    let cookie = Cookie::build((AUTH_COOKIE_NAME, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .max_age(Duration::days(AUTH_COOKIE_MAX_AGE_DAYS))
        .build();
    HeaderValue::from_str(&cookie.to_string())
}

/// `Set-Cookie` value deleting the auth cookie.
#[must_use]
pub fn clear_auth_cookie(secure: bool) -> HeaderValue {
    let cookie = Cookie::build((AUTH_COOKIE_NAME, ""))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .max_age(Duration::ZERO)
        .build();
    // Name and empty value are plain ASCII.
    HeaderValue::from_str(&cookie.to_string())
        .unwrap_or_else(|_| HeaderValue::from_static("auth_token=; Path=/; Max-Age=0"))
}

/// `Set-Cookie` value for a UI preference (`locale`, `theme`).
///
/// Preferences are readable by page scripts and sent on top-level
/// navigations.
///
/// # Errors
///
/// Returns an error if `value` contains bytes not allowed in a header.
pub fn preference_cookie(
    name: &'static str,
    value: &str,
    secure: bool,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let cookie = Cookie::build((name, value))
        .path("/")
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(Duration::days(PREFERENCE_COOKIE_MAX_AGE_DAYS))
        .build();
    HeaderValue::from_str(&cookie.to_string())
}

/// Value of the first cookie named `name` across all `Cookie` headers.
///
/// Empty values count as absent.
#[must_use]
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value().trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Token from an `Authorization: Bearer` header.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?
        .trim();
    (!token.is_empty()).then(|| token.to_string())
}
