//! Authentication route handlers.
//!
//! Login, registration and logout pages. Each request builds its own
//! [`SessionManager`] over a [`CookieTokenStore`], so the token the backend
//! hands out ends up in the `auth_token` cookie and nowhere else.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Redirect, Response},
};
use secrecy::ExposeSecret;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{Result, clear_sentry_user};
use crate::filters;
use crate::middleware::guard::forget_token;
use crate::middleware::{OptionalUser, Preferences, clear_current_user, set_current_user};
use crate::services::auth::validate_registration;
use crate::session::cookie::clear_auth_cookie;
use crate::session::{CookieTokenStore, SessionManager, TokenStore};
use crate::state::AppState;
use crate::views::Layout;

/// Where a successful login lands without a `next` parameter.
pub const DEFAULT_AFTER_LOGIN: &str = "/dashboard";

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

/// Registration form data.
#[derive(Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
}

/// `?next=/path` on the login page.
#[derive(Debug, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub layout: Layout,
    /// Localized error, empty when none.
    pub error: String,
    pub email: String,
    pub next: String,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub layout: Layout,
    /// Localized error, empty when none.
    pub error: String,
    pub name: String,
    pub email: String,
}

/// Whether `path` stays on this site: rooted, and not `//host` or a
/// backslash variant browsers treat the same way.
#[must_use]
pub fn is_local_path(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//") && !path.contains('\\')
}

/// A local path to continue to after login, else [`DEFAULT_AFTER_LOGIN`].
#[must_use]
pub fn safe_redirect_target(next: Option<&str>) -> &str {
    next.filter(|path| is_local_path(path))
        .unwrap_or(DEFAULT_AFTER_LOGIN)
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
#[instrument(skip_all)]
pub async fn login_page(
    prefs: Preferences,
    OptionalUser(user): OptionalUser,
    Query(query): Query<NextQuery>,
) -> Response {
    if user.is_some() {
        return Redirect::to(safe_redirect_target(query.next.as_deref())).into_response();
    }

    LoginTemplate {
        layout: Layout::new(&prefs, None, "/login"),
        error: String::new(),
        email: String::new(),
        next: query.next.unwrap_or_default(),
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    prefs: Preferences,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let manager = SessionManager::new(
        state.api().anonymous(),
        CookieTokenStore::from_headers(&headers),
        prefs.translator(),
    );

    if manager.login(&form.email, &form.password).await {
        let target = safe_redirect_target(form.next.as_deref());
        return sign_in(&state, &session, &manager, target).await;
    }

    let page = LoginTemplate {
        layout: Layout::new(&prefs, None, "/login"),
        error: manager.error().unwrap_or_default(),
        email: form.email,
        next: form.next.unwrap_or_default(),
    };
    Ok((StatusCode::UNAUTHORIZED, page).into_response())
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
#[instrument(skip_all)]
pub async fn register_page(prefs: Preferences) -> RegisterTemplate {
    RegisterTemplate {
        layout: Layout::new(&prefs, None, "/register"),
        error: String::new(),
        name: String::new(),
        email: String::new(),
    }
}

/// Handle registration form submission.
///
/// The form is checked locally first; nothing reaches the backend unless
/// every check passes.
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    prefs: Preferences,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    let translator = prefs.translator();
    let rerender = |status: StatusCode, error: String| {
        let page = RegisterTemplate {
            layout: Layout::new(&prefs, None, "/register"),
            error,
            name: form.name.clone(),
            email: form.email.clone(),
        };
        (status, page).into_response()
    };

    if let Err(e) = validate_registration(
        &form.name,
        &form.email,
        &form.password,
        &form.confirm_password,
    ) {
        tracing::debug!(error = %e, "Registration form rejected");
        return Ok(rerender(
            StatusCode::BAD_REQUEST,
            translator.get(e.message_key()).to_string(),
        ));
    }

    let manager = SessionManager::new(
        state.api().anonymous(),
        CookieTokenStore::from_headers(&headers),
        translator,
    );

    if manager
        .register(form.name.trim(), form.email.trim(), &form.password)
        .await
    {
        return sign_in(&state, &session, &manager, DEFAULT_AFTER_LOGIN).await;
    }

    Ok(rerender(
        StatusCode::BAD_REQUEST,
        manager.error().unwrap_or_default(),
    ))
}

// =============================================================================
// Logout
// =============================================================================

/// Handle logout.
///
/// Always ends with the auth cookie cleared and a redirect to `/login`,
/// whatever the backend says.
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    prefs: Preferences,
    session: Session,
    headers: HeaderMap,
) -> Result<Response> {
    let store = CookieTokenStore::from_headers(&headers);
    let token = store.get();

    let manager = SessionManager::new(state.api().anonymous(), store, prefs.translator());
    manager.logout().await;

    clear_current_user(&session).await?;
    clear_sentry_user();
    if let Some(token) = token {
        forget_token(&state, token.expose_secret()).await;
    }

    let secure = state.secure_cookies();
    let cookie = manager
        .store()
        .set_cookie_header(secure)
        .unwrap_or_else(|| clear_auth_cookie(secure));

    let mut response_headers = HeaderMap::new();
    response_headers.insert(SET_COOKIE, cookie);
    Ok((response_headers, Redirect::to("/login")).into_response())
}

/// Finish a successful login or registration: cache the user in the
/// session, rotate the session id and set the auth cookie.
async fn sign_in(
    state: &AppState,
    session: &Session,
    manager: &SessionManager<CookieTokenStore>,
    target: &str,
) -> Result<Response> {
    if let Some(user) = manager.user() {
        session.cycle_id().await?;
        set_current_user(session, &user).await?;
        tracing::info!(user_id = %user.id, "Signed in");
    }

    let mut headers = HeaderMap::new();
    if let Some(cookie) = manager.store().set_cookie_header(state.secure_cookies()) {
        headers.insert(SET_COOKIE, cookie);
    }
    Ok((headers, Redirect::to(target)).into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_redirect_target() {
        assert_eq!(safe_redirect_target(None), "/dashboard");
        assert_eq!(safe_redirect_target(Some("/dashboard/users?page=2")), "/dashboard/users?page=2");
        assert_eq!(safe_redirect_target(Some("//evil.example")), "/dashboard");
        assert_eq!(safe_redirect_target(Some("https://evil.example")), "/dashboard");
        assert_eq!(safe_redirect_target(Some("/\\evil.example")), "/dashboard");
        assert_eq!(safe_redirect_target(Some("")), "/dashboard");
    }
}
