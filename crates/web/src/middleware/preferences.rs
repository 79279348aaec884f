//! Per-request UI preferences: locale and theme.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::ACCEPT_LANGUAGE, request::Parts},
};
use portal_core::{ColorScheme, Locale, Theme};

use crate::i18n::Translator;
use crate::middleware::security_headers::COLOR_SCHEME_HINT;
use crate::session::cookie::{LOCALE_COOKIE_NAME, THEME_COOKIE_NAME, read_cookie};
use crate::state::AppState;

/// The visitor's locale and theme, resolved from cookies and headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preferences {
    pub locale: Locale,
    pub theme: Theme,
    /// From the `Sec-CH-Prefers-Color-Scheme` client hint, when sent.
    pub prefers_dark: Option<bool>,
    fallback: Locale,
}

impl Preferences {
    /// Resolve preferences from request headers.
    ///
    /// Locale order: `locale` cookie, then `Accept-Language`, then
    /// `default_locale`. Each source is negotiated by exact tag first and
    /// base language second.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap, default_locale: Locale) -> Self {
        let locale = read_cookie(headers, LOCALE_COOKIE_NAME)
            .and_then(|tag| Locale::negotiate(&tag))
            .or_else(|| {
                headers
                    .get(ACCEPT_LANGUAGE)
                    .and_then(|v| v.to_str().ok())
                    .and_then(Locale::from_accept_language)
            })
            .unwrap_or(default_locale);

        let theme = read_cookie(headers, THEME_COOKIE_NAME)
            .map(|value| Theme::parse_or_default(&value))
            .unwrap_or_default();

        let prefers_dark = headers
            .get(COLOR_SCHEME_HINT)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| match v.trim().trim_matches('"') {
                "dark" => Some(true),
                "light" => Some(false),
                _ => None,
            });

        Self {
            locale,
            theme,
            prefers_dark,
            fallback: default_locale,
        }
    }

    /// A translator for the resolved locale.
    #[must_use]
    pub const fn translator(&self) -> Translator {
        Translator::new(self.locale, self.fallback)
    }

    /// The concrete color scheme to render.
    #[must_use]
    pub const fn color_scheme(&self) -> ColorScheme {
        self.theme.resolve(self.prefers_dark)
    }
}

impl FromRequestParts<AppState> for Preferences {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers, state.config().default_locale))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use axum::http::{HeaderValue, header::COOKIE};

    #[test]
    fn test_defaults_without_headers() {
        let prefs = Preferences::from_headers(&HeaderMap::new(), Locale::ZhCn);
        assert_eq!(prefs.locale, Locale::ZhCn);
        assert_eq!(prefs.theme, Theme::System);
        assert_eq!(prefs.color_scheme(), ColorScheme::Light);
    }

    #[test]
    fn test_cookie_beats_accept_language() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("locale=en-US; theme=dark"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("zh-CN"));

        let prefs = Preferences::from_headers(&headers, Locale::ZhCn);
        assert_eq!(prefs.locale, Locale::EnUs);
        assert_eq!(prefs.color_scheme(), ColorScheme::Dark);
    }

    #[test]
    fn test_accept_language_base_match() {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-GB,en;q=0.9"));

        let prefs = Preferences::from_headers(&headers, Locale::ZhCn);
        assert_eq!(prefs.locale, Locale::EnUs);
        assert_eq!(prefs.translator().get("nav.home"), "Home");
    }

    #[test]
    fn test_unsupported_cookie_falls_through() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("locale=fr-FR; theme=sepia"));

        let prefs = Preferences::from_headers(&headers, Locale::EnUs);
        assert_eq!(prefs.locale, Locale::EnUs);
        assert_eq!(prefs.theme, Theme::System);
    }

    #[test]
    fn test_system_theme_follows_client_hint() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=system"));
        headers.insert(COLOR_SCHEME_HINT, HeaderValue::from_static("\"dark\""));

        let prefs = Preferences::from_headers(&headers, Locale::ZhCn);
        assert_eq!(prefs.prefers_dark, Some(true));
        assert_eq!(prefs.color_scheme(), ColorScheme::Dark);
    }
}
