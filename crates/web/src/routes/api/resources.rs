//! `/api/users*` and `/api/documents*` routes.
//!
//! Each call is forwarded with the caller's token and query string. A
//! backend 404 becomes `404 {"error": "User not found"}` (or "Document");
//! every other failure is reported as a `500` naming the operation.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use portal_core::RecordId;
use secrecy::SecretString;
use serde_json::Value;
use tracing::{error, instrument};

use super::{ProxyError, relay};
use crate::api::{ApiClient, ApiError, item_endpoint};
use crate::middleware::AuthToken;
use crate::state::AppState;

/// A backend collection exposed under `/api`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resource {
    /// Backend collection endpoint.
    pub endpoint: &'static str,
    pub singular: &'static str,
    pub plural: &'static str,
    pub not_found: &'static str,
}

pub const USERS: Resource = Resource {
    endpoint: "/users",
    singular: "user",
    plural: "users",
    not_found: "User not found",
};

pub const DOCUMENTS: Resource = Resource {
    endpoint: "/documents",
    singular: "document",
    plural: "documents",
    not_found: "Document not found",
};

/// What a forwarded call was doing, for its error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Create,
    Get,
    Update,
    Delete,
}

impl Resource {
    /// The `500` message for a failed `op`.
    #[must_use]
    pub fn failure_message(&self, op: Operation) -> String {
        match op {
            Operation::List => format!("Failed to fetch {} from backend service", self.plural),
            Operation::Create => format!("Failed to create {} in backend service", self.singular),
            Operation::Get => format!("Failed to fetch {} from backend service", self.singular),
            Operation::Update => format!("Failed to update {} in backend service", self.singular),
            Operation::Delete => format!("Failed to delete {} in backend service", self.singular),
        }
    }

    /// Endpoint of one record.
    ///
    /// # Errors
    ///
    /// Answers `400 Invalid id` where [`item_endpoint`] refuses the id.
    pub fn item_endpoint(&self, id: &str) -> Result<String, ProxyError> {
        item_endpoint(self.endpoint, &RecordId::Text(id.to_owned()))
            .map_err(|_| ProxyError::new(StatusCode::BAD_REQUEST, "Invalid id"))
    }

    fn error(&self, op: Operation, err: &ApiError) -> ProxyError {
        if err.is_not_found() && op != Operation::List && op != Operation::Create {
            return ProxyError::new(StatusCode::NOT_FOUND, self.not_found);
        }
        error!(error = %err, resource = self.plural, operation = ?op, "Backend call failed");
        ProxyError::internal(self.failure_message(op))
    }
}

fn client(state: &AppState, token: &SecretString) -> ApiClient {
    state.api().with_token(token)
}

async fn list(
    state: &AppState,
    token: &SecretString,
    resource: Resource,
    params: &[(String, String)],
) -> Response {
    match client(state, token)
        .get_with_query::<Value, _>(resource.endpoint, params)
        .await
    {
        Ok(body) => relay(StatusCode::OK, body),
        Err(e) => resource.error(Operation::List, &e).into_response(),
    }
}

async fn create(
    state: &AppState,
    token: &SecretString,
    resource: Resource,
    body: &Value,
) -> Response {
    match client(state, token)
        .post::<Value, _>(resource.endpoint, body)
        .await
    {
        Ok(body) => relay(StatusCode::CREATED, body),
        Err(e) => resource.error(Operation::Create, &e).into_response(),
    }
}

async fn fetch(state: &AppState, token: &SecretString, resource: Resource, id: &str) -> Response {
    let endpoint = match resource.item_endpoint(id) {
        Ok(endpoint) => endpoint,
        Err(e) => return e.into_response(),
    };
    match client(state, token).get::<Value>(&endpoint).await {
        Ok(body) => relay(StatusCode::OK, body),
        Err(e) => resource.error(Operation::Get, &e).into_response(),
    }
}

async fn update(
    state: &AppState,
    token: &SecretString,
    resource: Resource,
    id: &str,
    body: &Value,
) -> Response {
    let endpoint = match resource.item_endpoint(id) {
        Ok(endpoint) => endpoint,
        Err(e) => return e.into_response(),
    };
    match client(state, token).put::<Value, _>(&endpoint, body).await {
        Ok(body) => relay(StatusCode::OK, body),
        Err(e) => resource.error(Operation::Update, &e).into_response(),
    }
}

async fn remove(state: &AppState, token: &SecretString, resource: Resource, id: &str) -> Response {
    let endpoint = match resource.item_endpoint(id) {
        Ok(endpoint) => endpoint,
        Err(e) => return e.into_response(),
    };
    match client(state, token).delete::<Value>(&endpoint).await {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => resource.error(Operation::Delete, &e).into_response(),
    }
}

// =============================================================================
// Users
// =============================================================================

/// GET /api/users
#[instrument(skip_all)]
pub async fn list_users(
    State(state): State<AppState>,
    AuthToken(token): AuthToken,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    list(&state, &token, USERS, &params).await
}

/// POST /api/users
#[instrument(skip_all)]
pub async fn create_user(
    State(state): State<AppState>,
    AuthToken(token): AuthToken,
    Json(body): Json<Value>,
) -> Response {
    create(&state, &token, USERS, &body).await
}

/// GET /api/users/{id}
#[instrument(skip_all, fields(id = %id))]
pub async fn get_user(
    State(state): State<AppState>,
    AuthToken(token): AuthToken,
    Path(id): Path<String>,
) -> Response {
    fetch(&state, &token, USERS, &id).await
}

/// PUT /api/users/{id}
#[instrument(skip_all, fields(id = %id))]
pub async fn update_user(
    State(state): State<AppState>,
    AuthToken(token): AuthToken,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    update(&state, &token, USERS, &id, &body).await
}

/// DELETE /api/users/{id}
#[instrument(skip_all, fields(id = %id))]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthToken(token): AuthToken,
    Path(id): Path<String>,
) -> Response {
    remove(&state, &token, USERS, &id).await
}

// =============================================================================
// Documents
// =============================================================================

/// GET /api/documents
#[instrument(skip_all)]
pub async fn list_documents(
    State(state): State<AppState>,
    AuthToken(token): AuthToken,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    list(&state, &token, DOCUMENTS, &params).await
}

/// POST /api/documents
#[instrument(skip_all)]
pub async fn create_document(
    State(state): State<AppState>,
    AuthToken(token): AuthToken,
    Json(body): Json<Value>,
) -> Response {
    create(&state, &token, DOCUMENTS, &body).await
}

/// GET /api/documents/{id}
#[instrument(skip_all, fields(id = %id))]
pub async fn get_document(
    State(state): State<AppState>,
    AuthToken(token): AuthToken,
    Path(id): Path<String>,
) -> Response {
    fetch(&state, &token, DOCUMENTS, &id).await
}

/// PUT /api/documents/{id}
#[instrument(skip_all, fields(id = %id))]
pub async fn update_document(
    State(state): State<AppState>,
    AuthToken(token): AuthToken,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    update(&state, &token, DOCUMENTS, &id, &body).await
}

/// DELETE /api/documents/{id}
#[instrument(skip_all, fields(id = %id))]
pub async fn delete_document(
    State(state): State<AppState>,
    AuthToken(token): AuthToken,
    Path(id): Path<String>,
) -> Response {
    remove(&state, &token, DOCUMENTS, &id).await
}
