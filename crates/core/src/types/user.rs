//! User types as returned by the backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::RecordId;

/// The identity held for the duration of a login.
///
/// This is the `user` object of the backend's auth responses. The front end
/// only keeps it for display and for stamping proxied requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: RecordId,
    pub name: String,
    pub email: String,
    pub role: String,
}

impl SessionUser {
    /// Returns true if the user carries the `admin` role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role.eq_ignore_ascii_case("admin")
    }
}

/// A user record from the `/users` endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub id: RecordId,
    pub name: String,
    pub email: String,
    pub role: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub last_login: Option<DateTime<Utc>>,
}

/// Fields accepted by user create and update calls.
///
/// Every field is optional so the same type serves partial updates; unset
/// fields are left out of the JSON body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}
