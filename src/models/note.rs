use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::timestamp_format;

/// A note owned by exactly one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub note_id: String,
    /// Id of the owning user; set at creation, never changed afterwards
    #[serde(rename = "userId")]
    pub owner_id: String,
    pub title: String,
    pub content: String,
    #[serde(with = "timestamp_format")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp_format")]
    pub updated_at: DateTime<Utc>,
}

/// Client-supplied note fields for create and update.
///
/// `owner_id` is accepted only so it can be overridden (create) or checked
/// (update); it never decides who owns a note.
#[derive(Debug, Default, Deserialize)]
pub struct NoteDraft {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, rename = "userId", alias = "ownerId")]
    pub owner_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_reads_client_owner_field() {
        let draft: NoteDraft =
            serde_json::from_str(r#"{"title":"t","content":"c","userId":"someone-else"}"#).unwrap();
        assert_eq!(draft.owner_id.as_deref(), Some("someone-else"));
    }

    #[test]
    fn test_draft_fields_are_optional() {
        let draft: NoteDraft = serde_json::from_str("{}").unwrap();
        assert!(draft.title.is_none());
        assert!(draft.content.is_none());
        assert!(draft.owner_id.is_none());
    }

    #[test]
    fn test_note_wire_shape() {
        let at = crate::models::now();
        let note = Note {
            note_id: "n-1".to_string(),
            owner_id: "u-1".to_string(),
            title: "title".to_string(),
            content: "content".to_string(),
            created_at: at,
            updated_at: at,
        };

        let json = serde_json::to_value(&note).unwrap();
        assert_eq!(json["noteId"], "n-1");
        assert_eq!(json["userId"], "u-1");
        assert_eq!(json["createdAt"], json["updatedAt"]);
    }
}
