//! Selection Controller.
//!
//! Implements `SelectionControllerTrait`: the multi-column navigation state
//! (path of open folders, active column, root tab) and the selection set with
//! its range anchor. Column contents are derived from the live tree and
//! memoized on the tree version plus every view input that shapes them.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::managers::tree_store::TreeStore;
use crate::services::search::{bookmark_matches_query, compare_bookmarks};
use crate::services::url_tools::format_url_for_display;
use crate::types::bookmark::{BookmarkId, FolderId, FolderItem, ARCHIVE_FOLDER_ID, ROOT_FOLDER_ID};
use crate::types::selection::{
    ClickModifiers, FinderColumn, FinderColumnItem, ItemKey, ItemKind, RootTab, SelectedEntry,
    SelectionAnchor,
};
use crate::types::settings::{FolderDisplayMode, SortField};

/// Gesture-level selection transitions.
pub trait SelectionControllerTrait {
    fn select_folder(&mut self, tree: &TreeStore, folder_id: FolderId) -> bool;
    fn select_bookmark(&mut self, tree: &TreeStore, bookmark_id: BookmarkId) -> bool;
    fn click(&mut self, tree: &TreeStore, column_index: usize, item: ItemKey, modifiers: ClickModifiers);
    fn move_selection_vertical(&mut self, tree: &TreeStore, delta: isize, extend_range: bool);
    fn navigate_into_selected_folder(&mut self, tree: &TreeStore) -> bool;
    fn navigate_up_from_selected_folder(&mut self, tree: &TreeStore) -> bool;
    fn select_all_in_active_column(&mut self, tree: &TreeStore);
    fn switch_root_tab(&mut self, tab: RootTab) -> bool;
    fn reconcile_after_mutation(&mut self, tree: &TreeStore);
}

/// Cursor state captured by undo snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionState {
    pub selected_folder_id: FolderId,
    pub selected_entry: Option<SelectedEntry>,
    pub column_path_folder_ids: Vec<FolderId>,
    pub active_column_id: FolderId,
    pub active_root_tab: RootTab,
    pub selected_item_keys: BTreeSet<ItemKey>,
    pub selection_anchor: Option<SelectionAnchor>,
    pub rename_folder_name: String,
    pub search_query: String,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self {
            selected_folder_id: ROOT_FOLDER_ID,
            selected_entry: Some(ItemKey::folder(ROOT_FOLDER_ID)),
            column_path_folder_ids: vec![ROOT_FOLDER_ID],
            active_column_id: ROOT_FOLDER_ID,
            active_root_tab: RootTab::All,
            selected_item_keys: BTreeSet::new(),
            selection_anchor: None,
            rename_folder_name: String::new(),
            search_query: String::new(),
        }
    }
}

/// Everything the column projection depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ColumnsCacheKey {
    tree_version: u64,
    tab: RootTab,
    query: String,
    sort_field: SortField,
    display_mode: FolderDisplayMode,
    auto_sort: bool,
    path: Vec<FolderId>,
}

/// Where keyboard navigation currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Location {
    column_index: usize,
    item_index: usize,
}

pub struct SelectionController {
    state: SelectionState,
    sort_field: SortField,
    display_mode: FolderDisplayMode,
    auto_sort: bool,
    cache: Option<(ColumnsCacheKey, Arc<Vec<FinderColumn>>)>,
}

impl SelectionController {
    pub fn new() -> Self {
        Self {
            state: SelectionState::default(),
            sort_field: SortField::Title,
            display_mode: FolderDisplayMode::Top,
            auto_sort: true,
            cache: None,
        }
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    /// Replaces the cursor state wholesale, as undo does.
    pub fn restore_state(&mut self, state: SelectionState) {
        self.state = state;
        self.invalidate_columns();
    }

    /// Back to the root of the "all" tab with nothing selected.
    pub fn reset(&mut self) {
        self.state = SelectionState::default();
        self.invalidate_columns();
    }

    pub fn sort_field(&self) -> SortField {
        self.sort_field
    }

    pub fn set_sort_field(&mut self, field: SortField) {
        self.sort_field = field;
    }

    pub fn display_mode(&self) -> FolderDisplayMode {
        self.display_mode
    }

    pub fn set_display_mode(&mut self, mode: FolderDisplayMode) {
        self.display_mode = mode;
    }

    /// With auto-sort off, columns keep the stored bookmark order.
    pub fn set_auto_sort(&mut self, enabled: bool) {
        self.auto_sort = enabled;
    }

    pub fn search_query(&self) -> &str {
        &self.state.search_query
    }

    pub fn set_search_query(&mut self, query: &str) {
        self.state.search_query = query.to_string();
    }

    pub fn set_rename_folder_name(&mut self, name: &str) {
        self.state.rename_folder_name = name.to_string();
    }

    pub fn clear_selection(&mut self) {
        self.state.selected_item_keys.clear();
        self.state.selection_anchor = None;
    }

    /// Selects exactly the given keys, without an anchor.
    pub fn set_selected_keys(&mut self, keys: impl IntoIterator<Item = ItemKey>) {
        self.state.selected_item_keys = keys.into_iter().collect();
        self.state.selection_anchor = None;
    }

    pub fn set_selected_entry(&mut self, entry: Option<SelectedEntry>) {
        self.state.selected_entry = entry;
    }

    pub fn is_key_selected(&self, key: ItemKey) -> bool {
        self.state.selected_item_keys.contains(&key)
    }

    /// Selected bookmarks that still exist.
    pub fn selected_bookmark_ids(&self, tree: &TreeStore) -> Vec<BookmarkId> {
        self.state
            .selected_item_keys
            .iter()
            .filter(|key| key.kind == ItemKind::Bookmark && tree.has_bookmark(key.id))
            .map(|key| key.id)
            .collect()
    }

    /// Selected folders that still exist, root excluded.
    pub fn selected_folder_ids(&self, tree: &TreeStore) -> Vec<FolderId> {
        self.state
            .selected_item_keys
            .iter()
            .filter(|key| key.kind == ItemKind::Folder && key.id != ROOT_FOLDER_ID && tree.has_folder(key.id))
            .map(|key| key.id)
            .collect()
    }

    /// An item is highlighted when it is in the selection set, is the open
    /// folder of the next column, or is the selected bookmark.
    pub fn is_item_selected(&self, column_index: usize, item: ItemKey) -> bool {
        if self.state.selected_item_keys.contains(&item) {
            return true;
        }
        let Some(entry) = self.state.selected_entry else {
            return false;
        };
        match item.kind {
            ItemKind::Folder => self.state.column_path_folder_ids.get(column_index + 1) == Some(&item.id),
            ItemKind::Bookmark => entry == item,
        }
    }

    /// Folders from the top-level folder down to the selected one.
    pub fn breadcrumbs<'a>(&self, tree: &'a TreeStore) -> Vec<&'a FolderItem> {
        if self.state.active_root_tab == RootTab::Archive {
            return tree.folder(ARCHIVE_FOLDER_ID).into_iter().collect();
        }
        let selected = if tree.has_folder(self.state.selected_folder_id) {
            self.state.selected_folder_id
        } else {
            ROOT_FOLDER_ID
        };
        tree.folder_path_ids(selected)
            .into_iter()
            .filter_map(|id| tree.folder(id))
            .collect()
    }

    pub fn set_active_column(&mut self, tree: &TreeStore, column_id: FolderId) {
        if tree.has_folder(column_id) {
            self.state.active_column_id = column_id;
        }
    }

    /// Recomputes the column path from the selected folder, for when that
    /// folder was moved.
    pub fn rebuild_column_path(&mut self, tree: &TreeStore) {
        if tree.has_folder(self.state.selected_folder_id) {
            self.state.column_path_folder_ids = tree.folder_path_ids(self.state.selected_folder_id);
        }
    }

    pub fn invalidate_columns(&mut self) {
        self.cache = None;
    }

    /// Visible columns, recomputed only when the tree or a view input changed.
    pub fn columns(&mut self, tree: &TreeStore) -> Arc<Vec<FinderColumn>> {
        let key = ColumnsCacheKey {
            tree_version: tree.version(),
            tab: self.state.active_root_tab,
            query: self.state.search_query.clone(),
            sort_field: self.sort_field,
            display_mode: self.display_mode,
            auto_sort: self.auto_sort,
            path: self.state.column_path_folder_ids.clone(),
        };
        if let Some((cached_key, columns)) = &self.cache {
            if *cached_key == key {
                return Arc::clone(columns);
            }
        }

        let columns = Arc::new(self.compute_columns(tree));
        trace!(count = columns.len(), version = key.tree_version, "recomputed columns");
        self.cache = Some((key, Arc::clone(&columns)));
        columns
    }

    fn compute_columns(&self, tree: &TreeStore) -> Vec<FinderColumn> {
        let query = self.state.search_query.as_str();
        if self.state.active_root_tab == RootTab::Archive {
            return tree
                .folder(ARCHIVE_FOLDER_ID)
                .map(|archive| FinderColumn {
                    id: archive.id,
                    title: archive.name.clone(),
                    items: self.bookmark_items(tree, archive.id, query),
                })
                .into_iter()
                .collect();
        }

        self.state
            .column_path_folder_ids
            .iter()
            .filter_map(|id| tree.folder(*id))
            .map(|folder| {
                let folder_items: Vec<FinderColumnItem> = tree
                    .sorted_child_folders(folder.id)
                    .into_iter()
                    .filter(|child| tree.folder_matches_query(child.id, query))
                    .map(|child| FinderColumnItem {
                        kind: ItemKind::Folder,
                        id: child.id,
                        name: child.name.clone(),
                        subtitle: tree.direct_summary(child.id),
                        parent_folder_id: folder.id,
                    })
                    .collect();
                let bookmark_items = self.bookmark_items(tree, folder.id, query);
                let items = match self.display_mode {
                    FolderDisplayMode::Top => folder_items.into_iter().chain(bookmark_items).collect(),
                    FolderDisplayMode::Bottom => bookmark_items.into_iter().chain(folder_items).collect(),
                };
                FinderColumn {
                    id: folder.id,
                    title: folder.name.clone(),
                    items,
                }
            })
            .collect()
    }

    fn bookmark_items(&self, tree: &TreeStore, folder_id: FolderId, query: &str) -> Vec<FinderColumnItem> {
        let mut bookmarks: Vec<_> = tree
            .folder_bookmarks(folder_id)
            .into_iter()
            .filter(|b| bookmark_matches_query(b, query))
            .collect();
        if self.auto_sort {
            bookmarks.sort_by(|a, b| compare_bookmarks(a, b, self.sort_field));
        }
        bookmarks
            .into_iter()
            .map(|b| FinderColumnItem {
                kind: ItemKind::Bookmark,
                id: b.id,
                name: b.title.clone(),
                subtitle: format_url_for_display(&b.url),
                parent_folder_id: folder_id,
            })
            .collect()
    }

    fn item_index(columns: &[FinderColumn], column_index: usize, item: ItemKey) -> Option<usize> {
        columns
            .get(column_index)?
            .items
            .iter()
            .position(|entry| entry.key() == item)
    }

    fn select_single_item(&mut self, tree: &TreeStore, column_index: usize, item: ItemKey, item_index: Option<usize>) {
        self.state.selected_item_keys.clear();
        self.state.selected_item_keys.insert(item);
        if let Some(item_index) = item_index {
            self.state.selection_anchor = Some(SelectionAnchor {
                column_index,
                item_index,
            });
        }
        match item.kind {
            ItemKind::Folder => {
                self.select_folder(tree, item.id);
            }
            ItemKind::Bookmark => {
                self.state.column_path_folder_ids.truncate(column_index + 1);
                self.select_bookmark(tree, item.id);
            }
        }
    }

    fn toggle_selection(&mut self, item: ItemKey) {
        if !self.state.selected_item_keys.remove(&item) {
            self.state.selected_item_keys.insert(item);
        }
    }

    /// Selects the contiguous run between the anchor and `item_index`. An
    /// anchor in another column is replaced by the clicked item.
    fn select_range(&mut self, tree: &TreeStore, column_index: usize, item_index: usize) {
        let columns = self.columns(tree);
        let Some(column) = columns.get(column_index) else {
            return;
        };

        match self.state.selection_anchor {
            Some(anchor) if anchor.column_index == column_index => {
                let start = anchor.item_index.min(item_index);
                let end = anchor.item_index.max(item_index);
                self.state.selected_item_keys = column
                    .items
                    .iter()
                    .skip(start)
                    .take(end - start + 1)
                    .map(FinderColumnItem::key)
                    .collect();
            }
            _ => {
                self.state.selected_item_keys.clear();
                if let Some(item) = column.items.get(item_index) {
                    self.state.selected_item_keys.insert(item.key());
                }
                self.state.selection_anchor = Some(SelectionAnchor {
                    column_index,
                    item_index,
                });
            }
        }
    }

    /// Anchor first, then the selected entry, then the first item of the
    /// active column.
    fn keyboard_location(&self, columns: &[FinderColumn]) -> Option<Location> {
        if columns.is_empty() {
            return None;
        }

        if let Some(anchor) = self.state.selection_anchor {
            let exists = columns
                .get(anchor.column_index)
                .map(|c| anchor.item_index < c.items.len())
                .unwrap_or(false);
            if exists {
                return Some(Location {
                    column_index: anchor.column_index,
                    item_index: anchor.item_index,
                });
            }
        }

        if let Some(entry) = self.state.selected_entry {
            for (column_index, column) in columns.iter().enumerate() {
                if let Some(item_index) = column.items.iter().position(|item| item.key() == entry) {
                    return Some(Location {
                        column_index,
                        item_index,
                    });
                }
            }
        }

        let column_index = columns
            .iter()
            .position(|c| c.id == self.state.active_column_id)
            .unwrap_or(columns.len() - 1);
        if columns[column_index].items.is_empty() {
            return None;
        }
        Some(Location {
            column_index,
            item_index: 0,
        })
    }

    fn rename_name_for(tree: &TreeStore, folder_id: FolderId) -> String {
        tree.folder(folder_id)
            .filter(|folder| !folder.is_reserved())
            .map(|folder| folder.name.clone())
            .unwrap_or_default()
    }
}

impl Default for SelectionController {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionControllerTrait for SelectionController {
    /// Opens a folder: the column path becomes its ancestor chain. The
    /// archive switches to the archive tab.
    fn select_folder(&mut self, tree: &TreeStore, folder_id: FolderId) -> bool {
        if !tree.has_folder(folder_id) {
            return false;
        }
        self.state.selected_folder_id = folder_id;
        self.state.active_column_id = folder_id;
        self.state.selected_entry = Some(ItemKey::folder(folder_id));
        if folder_id == ARCHIVE_FOLDER_ID {
            self.state.active_root_tab = RootTab::Archive;
            self.state.column_path_folder_ids = vec![ARCHIVE_FOLDER_ID];
            self.state.rename_folder_name.clear();
        } else {
            self.state.active_root_tab = RootTab::All;
            self.state.column_path_folder_ids = tree.folder_path_ids(folder_id);
            self.state.rename_folder_name = Self::rename_name_for(tree, folder_id);
        }
        true
    }

    fn select_bookmark(&mut self, tree: &TreeStore, bookmark_id: BookmarkId) -> bool {
        let Some(bookmark) = tree.bookmark(bookmark_id) else {
            return false;
        };
        self.state.selected_entry = Some(ItemKey::bookmark(bookmark_id));
        self.state.selected_folder_id = bookmark.parent_folder_id;
        if bookmark.is_archived() {
            self.state.active_root_tab = RootTab::Archive;
            self.state.column_path_folder_ids = vec![ARCHIVE_FOLDER_ID];
            self.state.active_column_id = ARCHIVE_FOLDER_ID;
        } else {
            self.state.active_root_tab = RootTab::All;
            self.state.column_path_folder_ids = tree.folder_path_ids(bookmark.parent_folder_id);
        }
        true
    }

    /// Plain click selects one item, shift extends from the anchor, and
    /// ctrl/cmd toggles.
    fn click(&mut self, tree: &TreeStore, column_index: usize, item: ItemKey, modifiers: ClickModifiers) {
        let columns = self.columns(tree);
        if let Some(column) = columns.get(column_index) {
            self.state.active_column_id = column.id;
        }
        let item_index = Self::item_index(&columns, column_index, item);

        if modifiers.shift {
            if let Some(item_index) = item_index {
                self.select_range(tree, column_index, item_index);
                return;
            }
        }

        if modifiers.multi {
            self.toggle_selection(item);
            if let Some(item_index) = item_index {
                self.state.selection_anchor = Some(SelectionAnchor {
                    column_index,
                    item_index,
                });
            }
            return;
        }

        self.select_single_item(tree, column_index, item, item_index);
    }

    fn move_selection_vertical(&mut self, tree: &TreeStore, delta: isize, extend_range: bool) {
        let columns = self.columns(tree);
        let Some(current) = self.keyboard_location(&columns) else {
            return;
        };
        let column = &columns[current.column_index];
        let last = column.items.len().saturating_sub(1) as isize;
        let next = (current.item_index as isize + delta).clamp(0, last) as usize;
        if next == current.item_index {
            return;
        }

        self.state.active_column_id = column.id;
        if extend_range {
            if self.state.selection_anchor.is_none() {
                self.state.selection_anchor = Some(SelectionAnchor {
                    column_index: current.column_index,
                    item_index: current.item_index,
                });
            }
            self.select_range(tree, current.column_index, next);
            return;
        }

        if let Some(item) = column.items.get(next) {
            self.select_single_item(tree, current.column_index, item.key(), Some(next));
        }
    }

    fn navigate_into_selected_folder(&mut self, tree: &TreeStore) -> bool {
        let columns = self.columns(tree);
        let Some(current) = self.keyboard_location(&columns) else {
            return false;
        };
        let item = columns[current.column_index].items[current.item_index].key();
        if item.kind != ItemKind::Folder {
            return false;
        }
        self.select_folder(tree, item.id)
    }

    fn navigate_up_from_selected_folder(&mut self, tree: &TreeStore) -> bool {
        let Some(entry) = self.state.selected_entry.filter(|e| e.kind == ItemKind::Folder) else {
            return false;
        };
        let Some(parent_id) = tree.folder(entry.id).and_then(|f| f.parent_folder_id) else {
            return false;
        };
        self.select_folder(tree, parent_id)
    }

    fn select_all_in_active_column(&mut self, tree: &TreeStore) {
        let columns = self.columns(tree);
        let Some(column_index) = columns
            .iter()
            .position(|c| c.id == self.state.active_column_id)
            .or_else(|| columns.len().checked_sub(1))
        else {
            return;
        };
        let column = &columns[column_index];
        self.state.active_column_id = column.id;
        self.state.selected_item_keys = column.items.iter().map(FinderColumnItem::key).collect();
        if !column.items.is_empty() {
            self.state.selection_anchor = Some(SelectionAnchor {
                column_index,
                item_index: 0,
            });
        }
    }

    /// Returns `false` when the tab was already active.
    fn switch_root_tab(&mut self, tab: RootTab) -> bool {
        if self.state.active_root_tab == tab {
            return false;
        }
        let top = match tab {
            RootTab::All => ROOT_FOLDER_ID,
            RootTab::Archive => ARCHIVE_FOLDER_ID,
        };
        self.state.active_root_tab = tab;
        self.state.selected_folder_id = top;
        self.state.active_column_id = top;
        self.state.column_path_folder_ids = vec![top];
        self.state.selected_entry = Some(ItemKey::folder(top));
        self.state.rename_folder_name.clear();
        true
    }

    /// Drops vanished folders from the column path and repoints the selected
    /// folder and active column when they no longer exist.
    fn reconcile_after_mutation(&mut self, tree: &TreeStore) {
        let tab_root = match self.state.active_root_tab {
            RootTab::All => ROOT_FOLDER_ID,
            RootTab::Archive => ARCHIVE_FOLDER_ID,
        };
        let kept: Vec<FolderId> = self
            .state
            .column_path_folder_ids
            .iter()
            .copied()
            .filter(|id| tree.has_folder(*id))
            .enumerate()
            .filter(|(index, id)| *index > 0 || *id == tab_root)
            .map(|(_, id)| id)
            .collect();
        self.state.column_path_folder_ids = if kept.first() == Some(&tab_root) {
            kept
        } else {
            vec![tab_root]
        };

        let fallback = self
            .state
            .column_path_folder_ids
            .last()
            .copied()
            .unwrap_or(tab_root);
        if !tree.has_folder(self.state.selected_folder_id) {
            self.state.selected_folder_id = fallback;
        }
        if !tree.has_folder(self.state.active_column_id) {
            self.state.active_column_id = fallback;
        }
        self.state.rename_folder_name = Self::rename_name_for(tree, self.state.selected_folder_id);
        self.state
            .selected_item_keys
            .retain(|key| match key.kind {
                ItemKind::Folder => tree.has_folder(key.id),
                ItemKind::Bookmark => tree.has_bookmark(key.id),
            });
        if let Some(entry) = self.state.selected_entry {
            let exists = match entry.kind {
                ItemKind::Folder => tree.has_folder(entry.id),
                ItemKind::Bookmark => tree.has_bookmark(entry.id),
            };
            if !exists {
                self.state.selected_entry = Some(ItemKey::folder(self.state.selected_folder_id));
            }
        }
    }
}
