//! Monotonic identifier source for folders and bookmarks.

use serde::{Deserialize, Serialize};

use crate::types::bookmark::{BookmarkId, FolderId};

/// Issues folder and bookmark ids. Counters only ever increase; the reserved
/// root (0) and archive (-1) ids are never handed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdAllocator {
    next_folder_id: FolderId,
    next_bookmark_id: BookmarkId,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self {
            next_folder_id: 1,
            next_bookmark_id: 1,
        }
    }

    pub fn allocate_folder(&mut self) -> FolderId {
        let id = self.next_folder_id;
        self.next_folder_id += 1;
        id
    }

    pub fn allocate_bookmark(&mut self) -> BookmarkId {
        let id = self.next_bookmark_id;
        self.next_bookmark_id += 1;
        id
    }

    pub fn next_folder_id(&self) -> FolderId {
        self.next_folder_id
    }

    pub fn next_bookmark_id(&self) -> BookmarkId {
        self.next_bookmark_id
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
