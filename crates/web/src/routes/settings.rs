//! Settings route handlers: language and theme.
//!
//! Both preferences live in long-lived cookies, so they work the same for
//! anonymous visitors and signed-in users.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{InvalidHeaderValue, SET_COOKIE},
    },
    response::{IntoResponse, Redirect, Response},
};
use portal_core::{Locale, Theme};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::filters;
use crate::middleware::{OptionalUser, Preferences};
use crate::routes::auth::is_local_path;
use crate::session::cookie::{LOCALE_COOKIE_NAME, THEME_COOKIE_NAME, preference_cookie};
use crate::state::AppState;
use crate::views::Layout;

const SETTINGS_PATH: &str = "/settings";

/// Settings page template.
#[derive(Template, WebTemplate)]
#[template(path = "settings.html")]
pub struct SettingsTemplate {
    pub layout: Layout,
}

/// Theme form data.
#[derive(Debug, Deserialize)]
pub struct ThemeForm {
    pub theme: String,
    /// Page to return to; defaults to `/settings`.
    #[serde(default)]
    pub back: Option<String>,
}

/// Locale form data.
#[derive(Debug, Deserialize)]
pub struct LocaleForm {
    pub locale: String,
    /// Page to return to; defaults to `/settings`.
    #[serde(default)]
    pub back: Option<String>,
}

/// Display the settings page.
#[instrument(skip_all)]
pub async fn show(prefs: Preferences, OptionalUser(user): OptionalUser) -> SettingsTemplate {
    SettingsTemplate {
        layout: Layout::new(&prefs, user.as_ref(), SETTINGS_PATH),
    }
}

/// Store the theme choice. Unknown values are stored as `system`.
#[instrument(skip_all, fields(theme = %form.theme))]
pub async fn set_theme(
    State(state): State<AppState>,
    Form(form): Form<ThemeForm>,
) -> Response {
    let theme = Theme::parse_or_default(&form.theme);
    debug!(theme = theme.as_str(), "Theme changed");
    with_cookie(
        preference_cookie(THEME_COOKIE_NAME, theme.as_str(), state.secure_cookies()),
        form.back.as_deref(),
    )
}

/// Store the language choice. Unsupported locales are rejected.
#[instrument(skip_all, fields(locale = %form.locale))]
pub async fn set_locale(
    State(state): State<AppState>,
    Form(form): Form<LocaleForm>,
) -> Response {
    let Some(locale) = Locale::negotiate(&form.locale) else {
        return (StatusCode::BAD_REQUEST, "Unsupported locale").into_response();
    };
    debug!(locale = locale.tag(), "Locale changed");
    with_cookie(
        preference_cookie(LOCALE_COOKIE_NAME, locale.tag(), state.secure_cookies()),
        form.back.as_deref(),
    )
}

/// Redirect to `back` (or `/settings`), setting `cookie` when it could be
/// built.
fn with_cookie(cookie: Result<HeaderValue, InvalidHeaderValue>, back: Option<&str>) -> Response {
    let mut headers = HeaderMap::new();
    match cookie {
        Ok(value) => {
            headers.insert(SET_COOKIE, value);
        }
        Err(e) => tracing::warn!(error = %e, "Preference cookie rejected"),
    }
    let target = back
        .filter(|path| is_local_path(path))
        .unwrap_or(SETTINGS_PATH);
    (headers, Redirect::to(target)).into_response()
}
