//! `/api/analytics/*` routes.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::Value;
use tracing::{error, instrument};

use super::{ProxyError, relay};
use crate::middleware::AuthToken;
use crate::state::AppState;

/// GET /api/analytics/dashboard
#[instrument(skip_all)]
pub async fn dashboard(State(state): State<AppState>, AuthToken(token): AuthToken) -> Response {
    let api = state.api().with_token(&token);
    match api.get::<Value>("/analytics/dashboard").await {
        Ok(body) => relay(StatusCode::OK, body),
        Err(e) => {
            error!(error = %e, "Failed to fetch dashboard analytics");
            ProxyError::internal("Failed to fetch analytics from backend service").into_response()
        }
    }
}

/// GET /api/analytics/user-activity
#[instrument(skip_all)]
pub async fn user_activity(
    State(state): State<AppState>,
    AuthToken(token): AuthToken,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    let api = state.api().with_token(&token);
    match api
        .get_with_query::<Value, _>("/analytics/user-activity", &params)
        .await
    {
        Ok(body) => relay(StatusCode::OK, body),
        Err(e) => {
            error!(error = %e, "Failed to fetch user activity");
            ProxyError::internal("Failed to fetch user activity from backend service")
                .into_response()
        }
    }
}
