use serde::{Deserialize, Serialize};

use super::bookmark::FolderId;

/// Whether a column item is a folder or a bookmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Folder,
    Bookmark,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Folder => "folder",
            ItemKind::Bookmark => "bookmark",
        }
    }
}

/// Selection key: a `(kind, id)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemKey {
    pub kind: ItemKind,
    pub id: i64,
}

impl ItemKey {
    pub fn folder(id: FolderId) -> Self {
        Self { kind: ItemKind::Folder, id }
    }

    pub fn bookmark(id: i64) -> Self {
        Self { kind: ItemKind::Bookmark, id }
    }
}

/// The logical selected entry, used for breadcrumbs and the rename field.
pub type SelectedEntry = ItemKey;

/// Range-selection anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionAnchor {
    pub column_index: usize,
    pub item_index: usize,
}

/// Which top-level view is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RootTab {
    #[default]
    All,
    Archive,
}

impl RootTab {
    pub fn as_str(&self) -> &'static str {
        match self {
            RootTab::All => "all",
            RootTab::Archive => "archive",
        }
    }
}

/// Modifier keys held during a click.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClickModifiers {
    pub shift: bool,
    /// Ctrl on Linux/Windows, Cmd on macOS.
    pub multi: bool,
}

/// One visible entry of a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinderColumnItem {
    pub kind: ItemKind,
    pub id: i64,
    pub name: String,
    pub subtitle: String,
    pub parent_folder_id: FolderId,
}

impl FinderColumnItem {
    pub fn key(&self) -> ItemKey {
        ItemKey { kind: self.kind, id: self.id }
    }
}

/// One folder's worth of visible items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinderColumn {
    pub id: FolderId,
    pub title: String,
    pub items: Vec<FinderColumnItem>,
}
