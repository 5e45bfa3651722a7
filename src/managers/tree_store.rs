//! Bookmark Tree Store.
//!
//! Implements `TreeStoreTrait`, the canonical folder/bookmark tree. Nodes live
//! in two id-keyed maps and reference each other by id, so a snapshot is a
//! plain clone of the maps plus the id counters.
//!
//! Every mutation either fully applies or leaves the tree untouched, and bumps
//! the tree version that column caches key on.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::services::id_allocator::IdAllocator;
use crate::services::search::{bookmark_matches_query, compare_bookmarks, compare_text, fuzzy_match};
use crate::services::url_tools::normalize_url;
use crate::types::bookmark::{
    BookmarkId, BookmarkItem, ExportBookmark, FolderId, FolderItem, FolderSummary, RawBookmark,
    ARCHIVE_FOLDER_ID, ARCHIVE_FOLDER_NAME, ROOT_FOLDER_ID, ROOT_FOLDER_NAME,
};
use crate::types::errors::TreeError;
use crate::types::settings::SortField;

/// Structural mutations of the bookmark tree.
pub trait TreeStoreTrait {
    fn ensure_folder_path(&mut self, segments: &[String], parent_id: FolderId) -> Result<FolderId, TreeError>;
    fn create_bookmark(&mut self, folder_id: FolderId, title: &str, url: &str, add_date: Option<&str>) -> Result<BookmarkId, TreeError>;
    fn move_bookmark_to_folder(&mut self, bookmark_id: BookmarkId, target_folder_id: FolderId) -> bool;
    fn move_bookmarks_to_folder(&mut self, bookmark_ids: &[BookmarkId], target_folder_id: FolderId) -> usize;
    fn move_folder_to_folder(&mut self, folder_id: FolderId, target_folder_id: FolderId) -> Result<bool, TreeError>;
    fn move_folders_to_folder(&mut self, folder_ids: &[FolderId], target_folder_id: FolderId) -> FolderMoveReport;
    fn archive_bookmark(&mut self, bookmark_id: BookmarkId) -> bool;
    fn archive_bookmarks_in_subtree(&mut self, folder_id: FolderId) -> usize;
    fn remove_bookmark(&mut self, bookmark_id: BookmarkId) -> bool;
    fn remove_folder(&mut self, folder_id: FolderId) -> bool;
    fn rename_folder(&mut self, folder_id: FolderId, name: &str) -> Result<bool, TreeError>;
}

/// Result of a batch folder move. Rejected folders do not roll back the
/// folders moved before them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderMoveReport {
    pub moved: Vec<FolderId>,
    pub rejected: Vec<(FolderId, TreeError)>,
}

/// Deep copy of the tree and its id counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeSnapshot {
    pub folders: HashMap<FolderId, FolderItem>,
    pub bookmarks: HashMap<BookmarkId, BookmarkItem>,
    pub ids: IdAllocator,
}

/// Arena-backed bookmark tree with the reserved root and archive folders.
#[derive(Debug, Clone)]
pub struct TreeStore {
    folders: HashMap<FolderId, FolderItem>,
    bookmarks: HashMap<BookmarkId, BookmarkItem>,
    ids: IdAllocator,
    version: u64,
}

impl TreeStore {
    pub fn new() -> Self {
        let mut store = Self {
            folders: HashMap::new(),
            bookmarks: HashMap::new(),
            ids: IdAllocator::new(),
            version: 0,
        };
        store.install_reserved_folders();
        store
    }

    fn install_reserved_folders(&mut self) {
        self.folders.insert(
            ROOT_FOLDER_ID,
            FolderItem::new(ROOT_FOLDER_ID, ROOT_FOLDER_NAME, None),
        );
        self.folders.insert(
            ARCHIVE_FOLDER_ID,
            FolderItem::new(ARCHIVE_FOLDER_ID, ARCHIVE_FOLDER_NAME, None),
        );
    }

    /// Drops every folder and bookmark except the reserved folders. Id
    /// counters keep counting so ids stay unique for the whole session.
    pub fn reset(&mut self) {
        self.folders.clear();
        self.bookmarks.clear();
        self.install_reserved_folders();
        self.bump_version();
    }

    /// Rebuilds the tree from parsed import records, creating folders on
    /// demand. Returns the number of bookmarks created.
    pub fn rebuild_from_raw(&mut self, raw: &[RawBookmark]) -> usize {
        self.reset();
        let mut created = 0;
        for record in raw {
            let created_bookmark = self
                .ensure_folder_path(&record.folder_path_segments, ROOT_FOLDER_ID)
                .and_then(|folder_id| {
                    self.create_bookmark(folder_id, &record.title, &record.url, record.add_date.as_deref())
                });
            if created_bookmark.is_ok() {
                created += 1;
            }
        }
        info!(count = created, folders = self.folders.len() - 2, "rebuilt bookmark tree");
        created
    }

    // ─── Lookups ───

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Marks the tree as changed so cached projections are recomputed.
    pub fn bump_version(&mut self) {
        self.version += 1;
    }

    pub fn ids(&self) -> IdAllocator {
        self.ids
    }

    pub fn folder(&self, folder_id: FolderId) -> Option<&FolderItem> {
        self.folders.get(&folder_id)
    }

    pub fn bookmark(&self, bookmark_id: BookmarkId) -> Option<&BookmarkItem> {
        self.bookmarks.get(&bookmark_id)
    }

    pub fn has_folder(&self, folder_id: FolderId) -> bool {
        self.folders.contains_key(&folder_id)
    }

    pub fn has_bookmark(&self, bookmark_id: BookmarkId) -> bool {
        self.bookmarks.contains_key(&bookmark_id)
    }

    /// Number of folders, reserved folders included.
    pub fn folder_count(&self) -> usize {
        self.folders.len()
    }

    /// Number of bookmarks, archived ones included.
    pub fn bookmark_count(&self) -> usize {
        self.bookmarks.len()
    }

    /// Number of bookmarks outside the archive.
    pub fn active_bookmark_count(&self) -> usize {
        self.bookmarks.values().filter(|b| !b.is_archived()).count()
    }

    pub fn bookmarks(&self) -> impl Iterator<Item = &BookmarkItem> {
        self.bookmarks.values()
    }

    /// Bookmarks of a folder in stored order.
    pub fn folder_bookmarks(&self, folder_id: FolderId) -> Vec<&BookmarkItem> {
        self.folders
            .get(&folder_id)
            .map(|folder| folder.bookmarks.iter().filter_map(|id| self.bookmarks.get(id)).collect())
            .unwrap_or_default()
    }

    /// Child folders ordered case-insensitively by name.
    pub fn sorted_child_folders(&self, folder_id: FolderId) -> Vec<&FolderItem> {
        let mut children: Vec<&FolderItem> = self
            .folders
            .get(&folder_id)
            .map(|folder| folder.folders.iter().filter_map(|id| self.folders.get(id)).collect())
            .unwrap_or_default();
        children.sort_by(|a, b| compare_text(&a.name, &b.name));
        children
    }

    /// Ids from the top-level folder (root or archive) down to `folder_id`.
    /// Unknown ids resolve to the root.
    pub fn folder_path_ids(&self, folder_id: FolderId) -> Vec<FolderId> {
        let mut path = Vec::new();
        let mut current = self.folders.get(&folder_id);
        while let Some(folder) = current {
            if path.len() > self.folders.len() {
                break;
            }
            path.push(folder.id);
            current = folder.parent_folder_id.and_then(|id| self.folders.get(&id));
        }
        if path.is_empty() {
            return vec![ROOT_FOLDER_ID];
        }
        path.reverse();
        path
    }

    /// `/`-joined folder names below root/archive, e.g. `"Work/Reading"`.
    pub fn folder_path_for(&self, folder_id: FolderId) -> String {
        self.folder_path_ids(folder_id)
            .into_iter()
            .filter(|id| *id != ROOT_FOLDER_ID && *id != ARCHIVE_FOLDER_ID)
            .filter_map(|id| self.folders.get(&id).map(|f| f.name.as_str()))
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Whether `candidate` is `ancestor` or lies below it.
    pub fn is_folder_descendant(&self, ancestor: FolderId, candidate: FolderId) -> bool {
        let mut current = self.folders.get(&candidate);
        let mut steps = 0;
        while let Some(folder) = current {
            if folder.id == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.folders.len() {
                return false;
            }
            current = folder.parent_folder_id.and_then(|id| self.folders.get(&id));
        }
        false
    }

    /// Drops ids whose ancestor is also in the set, and repeated ids.
    pub fn prune_nested_folder_ids(&self, folder_ids: &[FolderId]) -> Vec<FolderId> {
        let mut seen = HashSet::new();
        folder_ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .filter(|id| {
                !folder_ids
                    .iter()
                    .any(|other| other != id && self.is_folder_descendant(*other, *id))
            })
            .collect()
    }

    /// Whether the bookmark sits anywhere below one of the folders.
    pub fn is_bookmark_inside_any(&self, bookmark_id: BookmarkId, folder_ids: &[FolderId]) -> bool {
        let Some(bookmark) = self.bookmarks.get(&bookmark_id) else {
            return false;
        };
        folder_ids
            .iter()
            .any(|id| self.is_folder_descendant(*id, bookmark.parent_folder_id))
    }

    // ─── Summaries and search ───

    /// Recursive folder and bookmark counts below `folder_id`.
    pub fn folder_summary(&self, folder_id: FolderId) -> FolderSummary {
        let Some(folder) = self.folders.get(&folder_id) else {
            return FolderSummary::default();
        };
        let mut summary = FolderSummary {
            folder_count: 0,
            bookmark_count: folder.bookmarks.len(),
        };
        for child in &folder.folders {
            let child_summary = self.folder_summary(*child);
            summary.folder_count += 1 + child_summary.folder_count;
            summary.bookmark_count += child_summary.bookmark_count;
        }
        summary
    }

    /// Direct bookmark count label, e.g. `"1 bookmark"` or `"3 bookmarks"`.
    pub fn direct_summary(&self, folder_id: FolderId) -> String {
        let count = self.folders.get(&folder_id).map(|f| f.bookmarks.len()).unwrap_or(0);
        format!("{} bookmark{}", count, if count == 1 { "" } else { "s" })
    }

    /// A folder matches when its name, one of its bookmarks or one of its
    /// descendant folders matches.
    pub fn folder_matches_query(&self, folder_id: FolderId, query: &str) -> bool {
        let query = query.trim();
        if query.is_empty() {
            return true;
        }
        let Some(folder) = self.folders.get(&folder_id) else {
            return false;
        };
        if fuzzy_match(query, &folder.name) {
            return true;
        }
        if folder
            .bookmarks
            .iter()
            .filter_map(|id| self.bookmarks.get(id))
            .any(|b| bookmark_matches_query(b, query))
        {
            return true;
        }
        folder.folders.iter().any(|child| self.folder_matches_query(*child, query))
    }

    // ─── Export views ───

    /// Every bookmark outside the archive with its folder path, depth first,
    /// a folder's own bookmarks before its subfolders.
    pub fn flatten_bookmarks(&self) -> Vec<ExportBookmark> {
        let mut items = Vec::new();
        self.flatten_into(ROOT_FOLDER_ID, "", &mut items);
        items
    }

    fn flatten_into(&self, folder_id: FolderId, path: &str, items: &mut Vec<ExportBookmark>) {
        let Some(folder) = self.folders.get(&folder_id) else {
            return;
        };
        items.extend(
            folder
                .bookmarks
                .iter()
                .filter_map(|id| self.bookmarks.get(id))
                .map(|b| ExportBookmark {
                    id: b.id,
                    title: b.title.clone(),
                    url: b.url.clone(),
                    add_date: b.add_date.clone(),
                    folder_path: path.to_string(),
                }),
        );
        for child_id in &folder.folders {
            let Some(child) = self.folders.get(child_id) else {
                continue;
            };
            let next = if path.is_empty() {
                child.name.clone()
            } else {
                format!("{}/{}", path, child.name)
            };
            self.flatten_into(*child_id, &next, items);
        }
    }

    // ─── Ordering ───

    /// Sorts the stored bookmark order of every folder outside the archive.
    pub fn sort_all_bookmarks(&mut self, field: SortField) {
        let bookmarks = &self.bookmarks;
        for folder in self.folders.values_mut() {
            if folder.id == ARCHIVE_FOLDER_ID {
                continue;
            }
            folder.bookmarks.sort_by(|a, b| match (bookmarks.get(a), bookmarks.get(b)) {
                (Some(a), Some(b)) => compare_bookmarks(a, b, field),
                _ => Ordering::Equal,
            });
        }
        self.bump_version();
    }

    // ─── Extra mutations ───

    /// Splits a `/`-joined path and ensures it below `parent_id`.
    pub fn ensure_folder_path_str(&mut self, path: &str, parent_id: FolderId) -> Result<FolderId, TreeError> {
        let segments: Vec<String> = path.split('/').map(str::to_string).collect();
        self.ensure_folder_path(&segments, parent_id)
    }

    /// Changes a bookmark's title and url. The url gets an `https://` scheme
    /// when it has none.
    pub fn update_bookmark(&mut self, bookmark_id: BookmarkId, title: &str, url: &str) -> Result<bool, TreeError> {
        let title = title.trim();
        let url = url.trim();
        if title.is_empty() {
            return Err(TreeError::Validation("Bookmark title cannot be empty.".to_string()));
        }
        if url.is_empty() {
            return Err(TreeError::Validation("Enter a valid URL.".to_string()));
        }
        let Some(bookmark) = self.bookmarks.get_mut(&bookmark_id) else {
            return Ok(false);
        };
        bookmark.title = title.to_string();
        bookmark.url = normalize_url(url);
        self.bump_version();
        Ok(true)
    }

    /// Hard-deletes every archived bookmark and returns their ids.
    pub fn clear_archive(&mut self) -> Vec<BookmarkId> {
        let removed = self
            .folders
            .get_mut(&ARCHIVE_FOLDER_ID)
            .map(|archive| std::mem::take(&mut archive.bookmarks))
            .unwrap_or_default();
        for id in &removed {
            self.bookmarks.remove(id);
        }
        self.bump_version();
        info!(count = removed.len(), "cleared archive");
        removed
    }

    /// Next free `Folder N` name among the children of `parent_id`.
    pub fn next_auto_folder_name(&self, parent_id: FolderId) -> String {
        let children = self.sorted_child_folders(parent_id);
        let existing: HashSet<String> = children.iter().map(|f| f.name.to_lowercase()).collect();
        let max_ordinal = children
            .iter()
            .filter_map(|f| auto_folder_ordinal(&f.name))
            .max()
            .unwrap_or(0);

        let mut ordinal = max_ordinal.saturating_add(1).max(1);
        let mut candidate = format!("Folder {}", ordinal);
        while existing.contains(&candidate.to_lowercase()) {
            ordinal += 1;
            candidate = format!("Folder {}", ordinal);
        }
        candidate
    }

    /// Creates an auto-named sibling folder of `target_bookmark_id` and moves
    /// the target plus the dragged bookmarks into it.
    ///
    /// Returns the new folder id and the number of bookmarks it holds.
    pub fn create_folder_from_bookmarks(
        &mut self,
        target_bookmark_id: BookmarkId,
        dragged: &[BookmarkId],
    ) -> Result<(FolderId, usize), TreeError> {
        let parent_id = self
            .bookmarks
            .get(&target_bookmark_id)
            .map(|b| b.parent_folder_id)
            .ok_or(TreeError::BookmarkNotFound(target_bookmark_id))?;
        if !self.folders.contains_key(&parent_id) {
            return Err(TreeError::FolderNotFound(parent_id));
        }
        if parent_id == ARCHIVE_FOLDER_ID {
            return Err(TreeError::ArchiveTarget);
        }

        let target_was_dragged = dragged.contains(&target_bookmark_id);
        let mut seen = HashSet::new();
        let members: Vec<BookmarkId> = dragged
            .iter()
            .copied()
            .chain(std::iter::once(target_bookmark_id))
            .filter(|id| seen.insert(*id))
            .filter(|id| *id != target_bookmark_id || !target_was_dragged)
            .filter(|id| self.bookmarks.contains_key(id))
            .collect();
        if members.len() < 2 {
            return Err(TreeError::Validation(
                "Drop on a different bookmark to create a folder.".to_string(),
            ));
        }

        let name = self.next_auto_folder_name(parent_id);
        let folder_id = self.ids.allocate_folder();
        self.folders.insert(folder_id, FolderItem::new(folder_id, &name, Some(parent_id)));
        if let Some(parent) = self.folders.get_mut(&parent_id) {
            parent.folders.push(folder_id);
        }
        let moved = self.move_bookmarks_to_folder(&members, folder_id);
        self.bump_version();
        debug!(folder_id, name = %name, moved, "created folder from bookmark drop");
        Ok((folder_id, members.len()))
    }

    // ─── Drop validation ───

    /// Bookmarks can be dropped on any existing folder they are not already in.
    pub fn can_drop_bookmarks_on_folder(&self, bookmark_ids: &[BookmarkId], target_folder_id: FolderId) -> bool {
        if bookmark_ids.is_empty() || !self.folders.contains_key(&target_folder_id) {
            return false;
        }
        bookmark_ids.iter().all(|id| {
            self.bookmarks
                .get(id)
                .map(|b| b.parent_folder_id != target_folder_id)
                .unwrap_or(false)
        })
    }

    /// Folders can be dropped on a folder outside their own subtree that is
    /// not their current parent and not the archive.
    pub fn can_drop_folders_on_folder(&self, folder_ids: &[FolderId], target_folder_id: FolderId) -> bool {
        if folder_ids.is_empty()
            || target_folder_id == ARCHIVE_FOLDER_ID
            || !self.folders.contains_key(&target_folder_id)
        {
            return false;
        }
        folder_ids.iter().all(|id| match self.folders.get(id) {
            Some(folder) => {
                !folder.is_reserved()
                    && folder.id != target_folder_id
                    && !self.is_folder_descendant(folder.id, target_folder_id)
                    && folder.parent_folder_id != Some(target_folder_id)
            }
            None => false,
        })
    }

    /// Bookmarks can be combined with another active bookmark that is not
    /// part of the drag.
    pub fn can_drop_on_bookmark(&self, bookmark_ids: &[BookmarkId], target_bookmark_id: BookmarkId) -> bool {
        if bookmark_ids.is_empty() || bookmark_ids.contains(&target_bookmark_id) {
            return false;
        }
        match self.bookmarks.get(&target_bookmark_id) {
            Some(target) if !target.is_archived() => {}
            _ => return false,
        }
        bookmark_ids.iter().all(|id| {
            self.bookmarks
                .get(id)
                .map(|b| !b.is_archived())
                .unwrap_or(false)
        })
    }

    // ─── Snapshots ───

    pub fn snapshot(&self) -> TreeSnapshot {
        TreeSnapshot {
            folders: self.folders.clone(),
            bookmarks: self.bookmarks.clone(),
            ids: self.ids,
        }
    }

    /// Replaces the whole tree with a snapshot. A snapshot that fails the
    /// structural checks is rejected and the tree is left as it was.
    pub fn restore(&mut self, snapshot: TreeSnapshot) -> Result<(), TreeError> {
        let candidate = TreeStore {
            folders: snapshot.folders,
            bookmarks: snapshot.bookmarks,
            ids: snapshot.ids,
            version: self.version + 1,
        };
        candidate.check_invariants()?;
        *self = candidate;
        debug!(version = self.version, "restored tree snapshot");
        Ok(())
    }

    /// Verifies parent/child consistency, reachability and id bounds.
    pub fn check_invariants(&self) -> Result<(), TreeError> {
        for (reserved, name) in [(ROOT_FOLDER_ID, ROOT_FOLDER_NAME), (ARCHIVE_FOLDER_ID, ARCHIVE_FOLDER_NAME)] {
            match self.folders.get(&reserved) {
                Some(folder) if folder.parent_folder_id.is_none() => {}
                _ => return Err(TreeError::Corrupted(format!("missing reserved folder {}", name))),
            }
        }
        if self.folders.get(&ARCHIVE_FOLDER_ID).map(|a| !a.folders.is_empty()).unwrap_or(false) {
            return Err(TreeError::Corrupted("archive holds subfolders".to_string()));
        }

        let mut listed_folders = 0;
        let mut listed_bookmarks = 0;
        for folder in self.folders.values() {
            for child_id in &folder.folders {
                listed_folders += 1;
                match self.folders.get(child_id) {
                    Some(child) if child.parent_folder_id == Some(folder.id) => {}
                    _ => {
                        return Err(TreeError::Corrupted(format!(
                            "folder {} lists foreign child folder {}",
                            folder.id, child_id
                        )))
                    }
                }
            }
            for bookmark_id in &folder.bookmarks {
                listed_bookmarks += 1;
                match self.bookmarks.get(bookmark_id) {
                    Some(b) if b.parent_folder_id == folder.id => {}
                    _ => {
                        return Err(TreeError::Corrupted(format!(
                            "folder {} lists foreign bookmark {}",
                            folder.id, bookmark_id
                        )))
                    }
                }
            }
            if !folder.is_reserved() {
                if folder.id <= 0 || folder.id >= self.ids.next_folder_id() {
                    return Err(TreeError::Corrupted(format!("folder id {} out of range", folder.id)));
                }
                if self.folder_path_ids(folder.id).first() != Some(&ROOT_FOLDER_ID) {
                    return Err(TreeError::Corrupted(format!("folder {} is unreachable", folder.id)));
                }
            }
        }
        if listed_folders != self.folders.len() - 2 || listed_bookmarks != self.bookmarks.len() {
            return Err(TreeError::Corrupted("ownership lists disagree with indices".to_string()));
        }
        if let Some(b) = self
            .bookmarks
            .values()
            .find(|b| b.id <= 0 || b.id >= self.ids.next_bookmark_id())
        {
            return Err(TreeError::Corrupted(format!("bookmark id {} out of range", b.id)));
        }
        Ok(())
    }

    fn detach_bookmark(&mut self, bookmark_id: BookmarkId, folder_id: FolderId) {
        if let Some(folder) = self.folders.get_mut(&folder_id) {
            folder.bookmarks.retain(|id| *id != bookmark_id);
        }
    }
}

impl Default for TreeStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Ordinal of an auto-generated `Folder N` name.
fn auto_folder_ordinal(name: &str) -> Option<u64> {
    let rest = name.strip_prefix("Folder")?;
    let digits = rest.trim_start();
    if digits.len() == rest.len() || digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

impl TreeStoreTrait for TreeStore {
    /// Walks `segments` below `parent_id`, reusing exact name matches and
    /// creating the rest. Blank segments are skipped; an unknown parent falls
    /// back to the root.
    fn ensure_folder_path(&mut self, segments: &[String], parent_id: FolderId) -> Result<FolderId, TreeError> {
        let parent_id = if self.folders.contains_key(&parent_id) {
            parent_id
        } else {
            ROOT_FOLDER_ID
        };
        if parent_id == ARCHIVE_FOLDER_ID {
            return Err(TreeError::ArchiveTarget);
        }

        let mut current = parent_id;
        let mut created = 0;
        for segment in segments.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
            let existing = self.folders.get(&current).and_then(|folder| {
                folder.folders.iter().copied().find(|child| {
                    self.folders
                        .get(child)
                        .map(|c| c.name == segment)
                        .unwrap_or(false)
                })
            });
            current = match existing {
                Some(id) => id,
                None => {
                    let id = self.ids.allocate_folder();
                    self.folders.insert(id, FolderItem::new(id, segment, Some(current)));
                    if let Some(parent) = self.folders.get_mut(&current) {
                        parent.folders.push(id);
                    }
                    created += 1;
                    id
                }
            };
        }
        if created > 0 {
            self.bump_version();
            debug!(parent_id, created, "created folders");
        }
        Ok(current)
    }

    /// Appends a bookmark to a folder. The url is stored as given.
    fn create_bookmark(&mut self, folder_id: FolderId, title: &str, url: &str, add_date: Option<&str>) -> Result<BookmarkId, TreeError> {
        if folder_id == ARCHIVE_FOLDER_ID {
            return Err(TreeError::ArchiveTarget);
        }
        let Some(folder) = self.folders.get_mut(&folder_id) else {
            return Err(TreeError::FolderNotFound(folder_id));
        };
        let id = self.ids.allocate_bookmark();
        folder.bookmarks.push(id);
        self.bookmarks.insert(
            id,
            BookmarkItem {
                id,
                title: title.to_string(),
                url: url.to_string(),
                add_date: add_date.filter(|d| !d.is_empty()).map(str::to_string),
                archived_at: None,
                archived_from_path: None,
                parent_folder_id: folder_id,
            },
        );
        self.bump_version();
        Ok(id)
    }

    /// Relocates one bookmark. Moving into the archive archives it; moving
    /// anywhere else clears archive metadata.
    fn move_bookmark_to_folder(&mut self, bookmark_id: BookmarkId, target_folder_id: FolderId) -> bool {
        let Some(source) = self.bookmarks.get(&bookmark_id).map(|b| b.parent_folder_id) else {
            return false;
        };
        if source == target_folder_id || !self.folders.contains_key(&target_folder_id) {
            return false;
        }
        if target_folder_id == ARCHIVE_FOLDER_ID {
            return self.archive_bookmark(bookmark_id);
        }

        self.detach_bookmark(bookmark_id, source);
        if let Some(target) = self.folders.get_mut(&target_folder_id) {
            target.bookmarks.push(bookmark_id);
        }
        if let Some(bookmark) = self.bookmarks.get_mut(&bookmark_id) {
            bookmark.parent_folder_id = target_folder_id;
            bookmark.archived_at = None;
            bookmark.archived_from_path = None;
        }
        self.bump_version();
        true
    }

    fn move_bookmarks_to_folder(&mut self, bookmark_ids: &[BookmarkId], target_folder_id: FolderId) -> usize {
        bookmark_ids
            .iter()
            .filter(|id| self.move_bookmark_to_folder(**id, target_folder_id))
            .count()
    }

    /// Reparents one folder. Root and archive never move, nothing moves into
    /// the archive, and a folder cannot land inside its own subtree.
    fn move_folder_to_folder(&mut self, folder_id: FolderId, target_folder_id: FolderId) -> Result<bool, TreeError> {
        if folder_id == ROOT_FOLDER_ID || folder_id == ARCHIVE_FOLDER_ID {
            return Err(TreeError::ProtectedFolder(folder_id));
        }
        let Some(parent) = self.folders.get(&folder_id).map(|f| f.parent_folder_id) else {
            return Ok(false);
        };
        if !self.folders.contains_key(&target_folder_id) {
            return Ok(false);
        }
        if target_folder_id == ARCHIVE_FOLDER_ID {
            return Err(TreeError::ArchiveTarget);
        }
        if self.is_folder_descendant(folder_id, target_folder_id) {
            return Err(TreeError::Cycle {
                folder_id,
                target_folder_id,
            });
        }
        if parent == Some(target_folder_id) {
            return Ok(false);
        }

        if let Some(old_parent) = parent {
            if let Some(old_parent) = self.folders.get_mut(&old_parent) {
                old_parent.folders.retain(|id| *id != folder_id);
            }
        }
        if let Some(target) = self.folders.get_mut(&target_folder_id) {
            target.folders.push(folder_id);
        }
        if let Some(folder) = self.folders.get_mut(&folder_id) {
            folder.parent_folder_id = Some(target_folder_id);
        }
        self.bump_version();
        Ok(true)
    }

    /// Moves the top-level folders of the set. Each folder is checked on its
    /// own; a rejected folder does not undo earlier moves.
    fn move_folders_to_folder(&mut self, folder_ids: &[FolderId], target_folder_id: FolderId) -> FolderMoveReport {
        let mut report = FolderMoveReport::default();
        for folder_id in self.prune_nested_folder_ids(folder_ids) {
            match self.move_folder_to_folder(folder_id, target_folder_id) {
                Ok(true) => report.moved.push(folder_id),
                Ok(false) => {}
                Err(e) => report.rejected.push((folder_id, e)),
            }
        }
        report
    }

    /// Moves a bookmark into the archive and records where it came from.
    fn archive_bookmark(&mut self, bookmark_id: BookmarkId) -> bool {
        let Some(source) = self.bookmarks.get(&bookmark_id).map(|b| b.parent_folder_id) else {
            return false;
        };
        if source == ARCHIVE_FOLDER_ID || !self.folders.contains_key(&source) {
            return false;
        }

        let source_path = self.folder_path_for(source);
        self.detach_bookmark(bookmark_id, source);
        if let Some(archive) = self.folders.get_mut(&ARCHIVE_FOLDER_ID) {
            archive.bookmarks.push(bookmark_id);
        }
        if let Some(bookmark) = self.bookmarks.get_mut(&bookmark_id) {
            bookmark.parent_folder_id = ARCHIVE_FOLDER_ID;
            bookmark.archived_at = Some(Utc::now());
            bookmark.archived_from_path = Some(source_path.clone());
        }
        self.bump_version();
        debug!(bookmark_id, source_path = %source_path, "archived bookmark");
        true
    }

    fn archive_bookmarks_in_subtree(&mut self, folder_id: FolderId) -> usize {
        let Some(folder) = self.folders.get(&folder_id) else {
            return 0;
        };
        let bookmark_ids = folder.bookmarks.clone();
        let child_ids = folder.folders.clone();

        let mut archived = bookmark_ids
            .into_iter()
            .filter(|id| self.archive_bookmark(*id))
            .count();
        for child in child_ids {
            archived += self.archive_bookmarks_in_subtree(child);
        }
        archived
    }

    fn remove_bookmark(&mut self, bookmark_id: BookmarkId) -> bool {
        let Some(bookmark) = self.bookmarks.remove(&bookmark_id) else {
            return false;
        };
        self.detach_bookmark(bookmark_id, bookmark.parent_folder_id);
        self.bump_version();
        true
    }

    /// Hard-deletes a folder with its whole subtree.
    fn remove_folder(&mut self, folder_id: FolderId) -> bool {
        if folder_id == ROOT_FOLDER_ID || folder_id == ARCHIVE_FOLDER_ID {
            return false;
        }
        let Some(parent) = self.folders.get(&folder_id).map(|f| f.parent_folder_id) else {
            return false;
        };

        let mut pending = vec![folder_id];
        while let Some(id) = pending.pop() {
            if let Some(folder) = self.folders.remove(&id) {
                for bookmark_id in &folder.bookmarks {
                    self.bookmarks.remove(bookmark_id);
                }
                pending.extend(folder.folders);
            }
        }
        if let Some(parent_id) = parent {
            if let Some(parent) = self.folders.get_mut(&parent_id) {
                parent.folders.retain(|id| *id != folder_id);
            }
        }
        self.bump_version();
        true
    }

    fn rename_folder(&mut self, folder_id: FolderId, name: &str) -> Result<bool, TreeError> {
        if folder_id == ROOT_FOLDER_ID || folder_id == ARCHIVE_FOLDER_ID {
            return Err(TreeError::ProtectedFolder(folder_id));
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(TreeError::Validation("Folder name cannot be empty.".to_string()));
        }
        let Some(folder) = self.folders.get_mut(&folder_id) else {
            return Ok(false);
        };
        folder.name = name.to_string();
        self.bump_version();
        Ok(true)
    }
}
