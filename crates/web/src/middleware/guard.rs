//! Route guard for protected pages and API paths.
//!
//! # Rules
//!
//! - Public API paths (`/api/auth/login`, `/api/auth/register`) always pass
//! - Protected paths (`/dashboard`, `/api/users`, `/api/documents`,
//!   `/api/analytics`) need a non-empty `auth_token` cookie; without one,
//!   `/api/` paths answer `401 {"error":"Unauthorized"}` and pages redirect
//!   to `/login`
//! - With a cookie the request passes; the token is verified against the
//!   backend (briefly cached) and, when valid, the user is attached as the
//!   `x-user-id` header and a [`SessionUser`] request extension
//! - A client-supplied `x-user-id` header is always removed
//!
//! Token expiry and signatures are the backend's business: an unverifiable
//! token still passes, just without identity.

use axum::{
    extract::{Request, State},
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use portal_core::SessionUser;
use tracing::{debug, warn};

use crate::error::{json_error, set_sentry_user};
use crate::services::auth::AuthService;
use crate::session::cookie::{AUTH_COOKIE_NAME, read_cookie};
use crate::state::AppState;

/// Header carrying the verified user ID to downstream handlers.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Paths that need a session.
pub const PROTECTED_PREFIXES: &[&str] =
    &["/dashboard", "/api/users", "/api/documents", "/api/analytics"];

/// API paths open to anonymous callers, checked before the protected list.
pub const PUBLIC_API_PREFIXES: &[&str] = &["/api/auth/login", "/api/auth/register"];

/// Where unauthenticated page requests are sent.
pub const LOGIN_PATH: &str = "/login";

/// How the guard treats a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Explicitly public API route.
    Public,
    /// Requires the auth cookie.
    Protected,
    /// Not covered by the guard.
    Open,
}

/// Classify a request path.
#[must_use]
pub fn classify(path: &str) -> RouteClass {
    if PUBLIC_API_PREFIXES.iter().any(|p| path.starts_with(p)) {
        RouteClass::Public
    } else if PROTECTED_PREFIXES.iter().any(|p| path.starts_with(p)) {
        RouteClass::Protected
    } else {
        RouteClass::Open
    }
}

/// The unauthenticated response for `path`.
#[must_use]
pub fn unauthorized_response(path: &str) -> Response {
    if path.starts_with("/api/") {
        json_error(StatusCode::UNAUTHORIZED, "Unauthorized")
    } else {
        Redirect::to(LOGIN_PATH).into_response()
    }
}

/// Guard middleware; install with `axum::middleware::from_fn_with_state`.
pub async fn route_guard(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    request.headers_mut().remove(USER_ID_HEADER);

    let path = request.uri().path().to_owned();
    if classify(&path) != RouteClass::Protected {
        return next.run(request).await;
    }

    let Some(token) = read_cookie(request.headers(), AUTH_COOKIE_NAME) else {
        debug!(path = %path, "Rejecting request without auth cookie");
        return unauthorized_response(&path);
    };

    if let Some(user) = resolve_user(&state, &token).await {
        set_sentry_user(&user.id, Some(&user.email));
        if let Ok(value) = HeaderValue::from_str(&user.id.to_string()) {
            request.headers_mut().insert(USER_ID_HEADER, value);
        }
        request.extensions_mut().insert(user);
    }

    next.run(request).await
}

/// Look up the user a token belongs to, via the verify cache.
///
/// Backend rejections are cached as `None`; transport and decode failures
/// are not cached so the next request retries.
pub async fn resolve_user(state: &AppState, token: &str) -> Option<SessionUser> {
    let cache = state.verify_cache();
    if let Some(cached) = cache.get(token).await {
        return cached;
    }

    let scoped = state.api().with_token(&token.to_owned().into());
    match AuthService::new(&scoped).verify().await {
        Ok(status) => {
            let user = status.into_user();
            cache.insert(token.to_owned(), user.clone()).await;
            user
        }
        Err(e) if e.status().is_some_and(|s| s.is_client_error()) => {
            debug!(status = ?e.status(), "Backend rejected token");
            cache.insert(token.to_owned(), None).await;
            None
        }
        Err(e) => {
            warn!(error = %e, "Token verification unavailable");
            None
        }
    }
}

/// Drop a token's cached verification (after logout).
pub async fn forget_token(state: &AppState, token: &str) {
    state.verify_cache().invalidate(token).await;
}
