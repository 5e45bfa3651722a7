use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a folder in the tree store.
pub type FolderId = i64;

/// Identifier of a bookmark in the tree store.
pub type BookmarkId = i64;

/// Reserved id of the root folder.
pub const ROOT_FOLDER_ID: FolderId = 0;

/// Reserved id of the archive folder.
pub const ARCHIVE_FOLDER_ID: FolderId = -1;

pub const ROOT_FOLDER_NAME: &str = "All Bookmarks";
pub const ARCHIVE_FOLDER_NAME: &str = "Archive";

/// A saved bookmark, owned by exactly one folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkItem {
    pub id: BookmarkId,
    pub title: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub add_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived_from_path: Option<String>,
    pub parent_folder_id: FolderId,
}

impl BookmarkItem {
    pub fn is_archived(&self) -> bool {
        self.parent_folder_id == ARCHIVE_FOLDER_ID
    }
}

/// A folder node. Children are referenced by id; the nodes themselves live in
/// the store's indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderItem {
    pub id: FolderId,
    pub name: String,
    pub parent_folder_id: Option<FolderId>,
    pub folders: Vec<FolderId>,
    pub bookmarks: Vec<BookmarkId>,
}

impl FolderItem {
    pub fn new(id: FolderId, name: &str, parent_folder_id: Option<FolderId>) -> Self {
        Self {
            id,
            name: name.to_string(),
            parent_folder_id,
            folders: Vec::new(),
            bookmarks: Vec::new(),
        }
    }

    /// Root and archive can never be renamed, moved or deleted.
    pub fn is_reserved(&self) -> bool {
        self.id == ROOT_FOLDER_ID || self.id == ARCHIVE_FOLDER_ID
    }
}

/// A bookmark as extracted from an imported Netscape bookmark file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBookmark {
    pub title: String,
    pub url: String,
    pub add_date: Option<String>,
    pub folder_path_segments: Vec<String>,
}

impl RawBookmark {
    /// The `/`-joined folder path.
    pub fn folder_path(&self) -> String {
        self.folder_path_segments.join("/")
    }
}

/// Flat bookmark record consumed by the exporter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBookmark {
    pub id: BookmarkId,
    pub title: String,
    pub url: String,
    pub add_date: Option<String>,
    pub folder_path: String,
}

/// Recursive content counts for a folder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderSummary {
    pub folder_count: usize,
    pub bookmark_count: usize,
}
