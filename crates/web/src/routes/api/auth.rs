//! `/api/auth/*` routes.
//!
//! Login, registration and refresh forward the caller's JSON to the backend
//! and, on success, move the returned token into the `auth_token` cookie.
//! The JSON answer still carries the token for non-browser callers.

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use portal_core::SessionUser;
use secrecy::ExposeSecret;
use serde_json::Value;
use tower_sessions::Session;
use tracing::{error, instrument, warn};

use super::{ProxyError, relay};
use crate::api::{ApiError, required};
use crate::error::clear_sentry_user;
use crate::middleware::guard::forget_token;
use crate::middleware::{AuthToken, OptionalToken, clear_current_user, set_current_user};
use crate::services::auth::AuthService;
use crate::session::cookie::{auth_cookie, clear_auth_cookie};
use crate::state::AppState;

const LOGIN_FAILED: &str = "Login failed";
const REGISTRATION_FAILED: &str = "Registration failed";
const REQUEST_FAILED: &str = "Request failed";

/// Log in.
///
/// POST /api/auth/login
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<Value>,
) -> Response {
    let result = state.api().anonymous().post("/auth/login", &body).await;
    establish(&state, &session, result, "/auth/login", LOGIN_FAILED).await
}

/// Register and log in.
///
/// POST /api/auth/register
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(body): Json<Value>,
) -> Response {
    let result = state.api().anonymous().post("/auth/register", &body).await;
    establish(&state, &session, result, "/auth/register", REGISTRATION_FAILED).await
}

/// Exchange the current token for a fresh one.
///
/// POST /api/auth/refresh
#[instrument(skip_all)]
pub async fn refresh(
    State(state): State<AppState>,
    session: Session,
    AuthToken(token): AuthToken,
) -> Response {
    let result = state
        .api()
        .with_token(&token)
        .post_empty("/auth/refresh")
        .await;
    let response = establish(&state, &session, result, "/auth/refresh", REQUEST_FAILED).await;
    if response.status().is_success() {
        forget_token(&state, token.expose_secret()).await;
    }
    response
}

/// Log out. Always answers `204` with the auth cookie cleared.
///
/// POST /api/auth/logout
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    session: Session,
    OptionalToken(token): OptionalToken,
) -> Response {
    if let Some(token) = token {
        let scoped = state.api().with_token(&token);
        if let Err(e) = AuthService::new(&scoped).logout().await {
            warn!(error = %e, "Backend logout failed");
        }
        forget_token(&state, token.expose_secret()).await;
    }
    if let Err(e) = clear_current_user(&session).await {
        warn!(error = %e, "Failed to clear session user");
    }
    clear_sentry_user();

    (
        StatusCode::NO_CONTENT,
        [(SET_COOKIE, clear_auth_cookie(state.secure_cookies()))],
    )
        .into_response()
}

/// The current user as the backend sees it.
///
/// GET /api/auth/me
#[instrument(skip_all)]
pub async fn me(State(state): State<AppState>, AuthToken(token): AuthToken) -> Response {
    match state
        .api()
        .with_token(&token)
        .get::<Value>("/auth/me")
        .await
    {
        Ok(body) => relay(StatusCode::OK, body),
        Err(e) => failure(&e, REQUEST_FAILED),
    }
}

/// Ask for a password reset mail.
///
/// POST /api/auth/password-reset
#[instrument(skip_all)]
pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Response {
    forward_anonymous(&state, "/auth/password-reset", &body).await
}

/// Set a new password with a reset token.
///
/// POST /api/auth/password-reset/confirm
#[instrument(skip_all)]
pub async fn confirm_password_reset(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Response {
    forward_anonymous(&state, "/auth/password-reset/confirm", &body).await
}

async fn forward_anonymous(state: &AppState, endpoint: &str, body: &Value) -> Response {
    match state.api().anonymous().post::<Value, _>(endpoint, body).await {
        Ok(Some(body)) => relay(StatusCode::OK, Some(body)),
        Ok(None) => relay(StatusCode::NO_CONTENT, None),
        Err(e) => failure(&e, REQUEST_FAILED),
    }
}

/// Turn a backend auth answer into our response: the backend JSON plus the
/// auth cookie on success, `{"error"}` otherwise.
async fn establish(
    state: &AppState,
    session: &Session,
    result: Result<Option<Value>, ApiError>,
    endpoint: &str,
    fallback: &str,
) -> Response {
    let data = match result.and_then(|body| required(body, endpoint)) {
        Ok(data) => data,
        Err(e) => return failure(&e, fallback),
    };

    let mut response = Json(&data).into_response();

    match data.get("token").and_then(Value::as_str) {
        Some(token) => match auth_cookie(token, state.secure_cookies()) {
            Ok(cookie) => {
                response.headers_mut().insert(SET_COOKIE, cookie);
            }
            Err(e) => warn!(error = %e, "Backend token is not a valid cookie value"),
        },
        None => warn!(endpoint, "Backend answered without a token"),
    }

    if let Some(user) = data
        .get("user")
        .and_then(|u| serde_json::from_value::<SessionUser>(u.clone()).ok())
    {
        let cached = async {
            session.cycle_id().await?;
            set_current_user(session, &user).await
        };
        if let Err(e) = cached.await {
            warn!(error = %e, "Failed to cache session user");
        }
    }

    response
}

/// Error answer for a failed backend call.
///
/// A backend status is passed through with its `message` (or `error`)
/// text, else `fallback`. Anything without a status is our problem.
fn failure(err: &ApiError, fallback: &str) -> Response {
    match err.status() {
        Some(status) => ProxyError::new(status, err.message().unwrap_or(fallback)).into_response(),
        None => {
            error!(error = %err, "Auth request failed");
            ProxyError::internal("Internal server error").into_response()
        }
    }
}
