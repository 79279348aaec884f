//! Document types from the `/documents` endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::RecordId;

/// A document record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: RecordId,
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author_id: RecordId,
}

impl Document {
    /// Returns at most `max_chars` characters of the content, for list views.
    #[must_use]
    pub fn excerpt(&self, max_chars: usize) -> &str {
        match self.content.char_indices().nth(max_chars) {
            Some((idx, _)) => self.content.get(..idx).unwrap_or(&self.content),
            None => &self.content,
        }
    }
}

/// Fields accepted by document create and update calls.
///
/// The backend assigns `id`, `createdAt` and `updatedAt`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentInput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_id: Option<RecordId>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn document(content: &str) -> Document {
        serde_json::from_value(serde_json::json!({
            "id": 1,
            "title": "Notes",
            "content": content,
            "createdAt": "2025-01-01T00:00:00Z",
            "updatedAt": "2025-01-02T00:00:00Z",
            "authorId": "u-9"
        }))
        .unwrap()
    }

    #[test]
    fn test_document_from_backend_json() {
        let doc = document("hello");
        assert_eq!(doc.author_id, RecordId::Text("u-9".to_string()));
        assert!(doc.updated_at > doc.created_at);
    }

    #[test]
    fn test_excerpt_respects_char_boundaries() {
        let doc = document("你好世界");
        assert_eq!(doc.excerpt(2), "你好");
        assert_eq!(doc.excerpt(10), "你好世界");
    }

    #[test]
    fn test_document_input_uses_camel_case() {
        let input = DocumentInput {
            title: Some("T".to_string()),
            content: None,
            author_id: Some(RecordId::Number(3)),
        };
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json, serde_json::json!({ "title": "T", "authorId": 3 }));
    }
}
