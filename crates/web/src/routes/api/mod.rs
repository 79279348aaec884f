//! JSON routes forwarding to the backend API.
//!
//! Bodies travel as raw JSON so fields the portal does not model still
//! reach the caller. Failures answer `{"error": "..."}` the way the guard
//! does.

pub mod analytics;
pub mod auth;
pub mod proxy;
pub mod resources;

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{any, get, post},
};
use serde_json::Value;

use crate::error::json_error;
use crate::state::AppState;

/// Error response for proxy endpoints.
#[derive(Debug)]
pub struct ProxyError {
    status: StatusCode,
    message: String,
}

impl ProxyError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// `500` with `message`.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        json_error(self.status, self.message)
    }
}

/// A backend answer relayed as-is: `status` with the JSON body, or just the
/// status when there was no body.
pub fn relay(status: StatusCode, body: Option<Value>) -> Response {
    match body {
        Some(body) => (status, Json(body)).into_response(),
        None => status.into_response(),
    }
}

/// Create the `/api/auth` routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .route("/logout", post(auth::logout))
        .route("/refresh", post(auth::refresh))
        .route("/me", get(auth::me))
        .route("/password-reset", post(auth::request_password_reset))
        .route("/password-reset/confirm", post(auth::confirm_password_reset))
}

/// Create the `/api/analytics` routes router.
pub fn analytics_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(analytics::dashboard))
        .route("/user-activity", get(analytics::user_activity))
}

/// Create all `/api` routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .route(
            "/users",
            get(resources::list_users).post(resources::create_user),
        )
        .route(
            "/users/{id}",
            get(resources::get_user)
                .put(resources::update_user)
                .delete(resources::delete_user),
        )
        .route(
            "/documents",
            get(resources::list_documents).post(resources::create_document),
        )
        .route(
            "/documents/{id}",
            get(resources::get_document)
                .put(resources::update_document)
                .delete(resources::delete_document),
        )
        .nest("/analytics", analytics_routes())
        .route("/proxy/{*path}", any(proxy::forward))
}
