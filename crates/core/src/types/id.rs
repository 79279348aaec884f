//! Backend record identifiers.
//!
//! The backend hands out either numeric or string IDs depending on the
//! resource, so [`RecordId`] accepts both JSON forms and writes back whatever
//! it was given.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a backend record (user, document, activity).
///
/// Serializes untagged: `42` and `"usr_42"` both round-trip unchanged.
/// [`Display`](fmt::Display) renders the bare value so the ID can be placed
/// directly into a URL path segment.
///
/// # Example
///
/// ```rust
/// use portal_core::RecordId;
///
/// let numeric: RecordId = serde_json::from_str("7").unwrap();
/// let text: RecordId = serde_json::from_str("\"doc-7\"").unwrap();
///
/// assert_eq!(numeric.to_string(), "7");
/// assert_eq!(text.to_string(), "doc-7");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    /// Numeric identifier.
    Number(i64),
    /// Opaque string identifier.
    Text(String),
}

impl RecordId {
    /// Returns the numeric value, if this is a numeric ID.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        Self::Number(id)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        id.parse::<i64>()
            .map_or_else(|_| Self::Text(id.to_owned()), Self::Number)
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        id.parse::<i64>().map_or(Self::Text(id), Self::Number)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_number_and_text() {
        let n: RecordId = serde_json::from_str("42").unwrap();
        assert_eq!(n, RecordId::Number(42));

        let s: RecordId = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(s, RecordId::Text("abc".to_string()));
    }

    #[test]
    fn test_serialize_keeps_original_form() {
        assert_eq!(serde_json::to_string(&RecordId::Number(5)).unwrap(), "5");
        assert_eq!(
            serde_json::to_string(&RecordId::Text("u-5".to_string())).unwrap(),
            "\"u-5\""
        );
    }

    #[test]
    fn test_from_path_segment() {
        assert_eq!(RecordId::from("17"), RecordId::Number(17));
        assert_eq!(
            RecordId::from("a1b2"),
            RecordId::Text("a1b2".to_string())
        );
    }

    #[test]
    fn test_as_i64() {
        assert_eq!(RecordId::Number(3).as_i64(), Some(3));
        assert_eq!(RecordId::Text("x".to_string()).as_i64(), None);
    }
}
