//! HTTP API message definitions for Direxplorer.
//!
//! This module defines the JSON bodies exchanged between the daemon and its
//! clients. Field names match what the browser client reads (`items`,
//! `count`, `home`, `error`, ...), so renames here are wire-breaking.

use serde::{Deserialize, Serialize};

/// Base scope every API route is mounted under.
pub const API_SCOPE: &str = "/FileSystem/api";

// ============================================================================
// Listing Messages
// ============================================================================

/// Kind of a listed filesystem entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemType {
    /// Regular file (or anything that is not a directory).
    File,
    /// Directory.
    Folder,
}

impl ItemType {
    /// Returns the wire name of this type.
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::File => "File",
            ItemType::Folder => "Folder",
        }
    }
}

/// A single listing record for a file or folder under the home directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryItem {
    /// Base name of the entry.
    pub name: String,
    /// Path relative to the home directory. Clients hand this back verbatim
    /// to browse, download, upload and delete calls.
    pub path: String,
    /// Entry type.
    #[serde(rename = "type")]
    pub item_type: ItemType,
    /// Size in bytes as a decimal string ("0" for folders).
    pub size: String,
}

impl DirectoryItem {
    /// Create a folder item.
    pub fn folder(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            item_type: ItemType::Folder,
            size: "0".to_string(),
        }
    }

    /// Create a file item with its exact byte length.
    pub fn file(name: impl Into<String>, path: impl Into<String>, len: u64) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            item_type: ItemType::File,
            size: len.to_string(),
        }
    }

    /// Whether this item is a folder.
    pub fn is_folder(&self) -> bool {
        self.item_type == ItemType::Folder
    }
}

/// Response body for a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowseResponse {
    pub items: Vec<DirectoryItem>,
    pub count: usize,
}

impl BrowseResponse {
    pub fn new(items: Vec<DirectoryItem>) -> Self {
        let count = items.len();
        Self { items, count }
    }
}

/// Response body for a search, echoing the query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub items: Vec<DirectoryItem>,
    pub count: usize,
    pub query: String,
}

impl SearchResponse {
    pub fn new(items: Vec<DirectoryItem>, query: impl Into<String>) -> Self {
        let count = items.len();
        Self {
            items,
            count,
            query: query.into(),
        }
    }
}

// ============================================================================
// Home Directory Messages
// ============================================================================

/// Response body for the current home directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomeResponse {
    pub home: String,
}

/// Response body after the home directory was replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomeUpdated {
    pub message: String,
    pub path: String,
}

impl HomeUpdated {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            message: text::HOME_UPDATED.to_string(),
            path: path.into(),
        }
    }
}

// ============================================================================
// Generic Messages
// ============================================================================

/// Plain success body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Failure body. The text is always one of the fixed strings in [`text`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Liveness probe body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// Fixed human-readable texts returned to clients.
pub mod text {
    pub const BROWSE_UNAVAILABLE: &str = "Unable to browse at this time.";
    pub const SEARCH_QUERY_REQUIRED: &str = "Search query required.";
    pub const SEARCH_NO_RESULTS: &str = "No results found.";
    pub const SEARCH_UNAVAILABLE: &str = "Unable to search at this time.";
    pub const HOME_UPDATED: &str = "Home directory updated.";
    pub const HOME_INVALID: &str = "Invalid path.";
    pub const DOWNLOAD_PATH_REQUIRED: &str = "Path is required.";
    pub const DOWNLOAD_NOT_FOUND: &str = "File not found.";
    pub const DOWNLOAD_UNAVAILABLE: &str = "Unable to download file.";
    pub const UPLOAD_OK: &str = "File uploaded successfully.";
    pub const UPLOAD_FAILED: &str = "File failed to upload.";
    pub const FOLDER_CREATED: &str = "Folder created successfully.";
    pub const FOLDER_CREATE_FAILED: &str = "Unable to create folder.";
    pub const FILE_DELETED: &str = "File deleted successfully.";
    pub const FILE_DELETE_FAILED: &str = "Unable to delete file.";
    pub const FOLDER_DELETED: &str = "Folder deleted successfully.";
    pub const FOLDER_DELETE_FAILED: &str = "Unable to delete folder.";
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_item_type_wire_names() {
        assert_eq!(serde_json::to_value(ItemType::File).unwrap(), json!("File"));
        assert_eq!(
            serde_json::to_value(ItemType::Folder).unwrap(),
            json!("Folder")
        );
        assert_eq!(ItemType::Folder.as_str(), "Folder");
    }

    #[test]
    fn test_directory_item_uses_type_key() {
        let item = DirectoryItem::file("b.txt", "a/b.txt", 10);
        let value = serde_json::to_value(&item).unwrap();

        assert_eq!(
            value,
            json!({ "name": "b.txt", "path": "a/b.txt", "type": "File", "size": "10" })
        );
    }

    #[test]
    fn test_folder_size_is_zero() {
        let item = DirectoryItem::folder("docs", "docs");
        assert_eq!(item.size, "0");
        assert!(item.is_folder());
    }

    #[test]
    fn test_directory_item_parses_client_payload() {
        let raw = r#"{"name":"x","path":"x","type":"Folder","size":"0"}"#;
        let item: DirectoryItem = serde_json::from_str(raw).unwrap();
        assert_eq!(item, DirectoryItem::folder("x", "x"));
    }

    #[test]
    fn test_browse_response_counts_items() {
        let response = BrowseResponse::new(vec![
            DirectoryItem::folder("a", "a"),
            DirectoryItem::file("b", "b", 3),
        ]);
        assert_eq!(response.count, 2);
    }

    #[test]
    fn test_search_response_echoes_query() {
        let response = SearchResponse::new(vec![], "report");
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value, json!({ "items": [], "count": 0, "query": "report" }));
    }

    #[test]
    fn test_home_updated_message() {
        let body = HomeUpdated::new("/srv/share");
        assert_eq!(body.message, text::HOME_UPDATED);
        assert_eq!(body.path, "/srv/share");
    }

    #[test]
    fn test_error_response_shape() {
        let value = serde_json::to_value(ErrorResponse::new(text::HOME_INVALID)).unwrap();
        assert_eq!(value, json!({ "error": "Invalid path." }));
    }
}
