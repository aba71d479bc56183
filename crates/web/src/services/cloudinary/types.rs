//! Cloudinary Admin API response types.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// `GET /folders/{path}` response.
#[derive(Debug, Deserialize)]
pub struct FolderListResponse {
    #[serde(default)]
    pub folders: Vec<FolderEntry>,
    pub next_cursor: Option<String>,
}

/// One subfolder.
#[derive(Debug, Deserialize)]
pub struct FolderEntry {
    pub name: String,
    pub path: String,
}

/// `POST /resources/search` response.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub resources: Vec<SearchResource>,
}

/// One search hit.
#[derive(Debug, Deserialize)]
pub struct SearchResource {
    pub created_at: DateTime<Utc>,
}

/// `DELETE /resources/image/upload` response.
///
/// `deleted` maps each public id to `"deleted"` or `"not_found"`. `partial`
/// is set when a prefix delete stopped before removing everything.
#[derive(Debug, Deserialize)]
pub struct DeleteResourcesResponse {
    #[serde(default)]
    pub deleted: HashMap<String, String>,
    #[serde(default)]
    pub partial: bool,
}

/// Error envelope returned with non-2xx statuses.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorMessage,
}

#[derive(Debug, Deserialize)]
pub struct ErrorMessage {
    pub message: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_folder_list() {
        let json = r#"{
            "folders": [
                {"name": "oak-bench", "path": "projects/oak-bench", "external_id": "c8d"},
                {"name": "walnut-table", "path": "projects/walnut-table", "external_id": "a1f"}
            ],
            "next_cursor": null,
            "total_count": 2
        }"#;
        let parsed: FolderListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.folders.len(), 2);
        assert_eq!(parsed.folders[1].path, "projects/walnut-table");
        assert!(parsed.next_cursor.is_none());
    }

    #[test]
    fn test_parse_search() {
        let json = r#"{
            "total_count": 12,
            "resources": [
                {"public_id": "projects/oak-bench/IMG_0001", "created_at": "2025-03-14T09:26:53Z", "bytes": 1024}
            ]
        }"#;
        let parsed: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.resources.len(), 1);
        assert_eq!(parsed.resources[0].created_at.to_rfc3339(), "2025-03-14T09:26:53+00:00");
    }

    #[test]
    fn test_parse_delete_response() {
        let json = r#"{"deleted": {"hero/banner": "not_found"}, "deleted_counts": {}, "partial": false}"#;
        let parsed: DeleteResourcesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.deleted["hero/banner"], "not_found");
        assert!(!parsed.partial);
    }

    #[test]
    fn test_parse_error() {
        let json = r#"{"error": {"message": "Can't find folder with path projects"}}"#;
        let parsed: ErrorResponse = serde_json::from_str(json).unwrap();
        assert!(parsed.error.message.starts_with("Can't find folder"));
    }
}
