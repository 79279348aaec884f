//! Analytics payloads from the `/analytics` endpoints.

use serde::{Deserialize, Serialize};

use super::id::RecordId;

/// A single user action recorded by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: RecordId,
    pub user_id: RecordId,
    pub action: String,
    pub target: String,
    /// Backend-formatted timestamp, shown as-is.
    pub timestamp: String,
}

/// Dashboard overview numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub user_count: u64,
    pub document_count: u64,
    pub active_users: u64,
    #[serde(default)]
    pub recent_activities: Vec<Activity>,
}
