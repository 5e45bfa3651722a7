//! App Core for Bookmark Cowboy.
//!
//! Composes the tree store, selection controller, undo stack, duplicate
//! policy and preview tracker, under already-normalized settings. Every mutating user action
//! runs as one transaction: a snapshot is taken first, the action either
//! succeeds and the snapshot becomes an undo step, or fails and the snapshot
//! is put back. Outcomes are queued as [`Notice`]s for the presentation layer.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::managers::selection_manager::{SelectionController, SelectionControllerTrait, SelectionState};
use crate::managers::tree_store::{TreeSnapshot, TreeStore, TreeStoreTrait};
use crate::managers::undo_manager::{UndoStack, UndoStackTrait};
use crate::services::duplicate_policy::{DuplicateOutcome, DuplicatePolicyEngine, DuplicatePolicyTrait};
use crate::services::netscape_exporter::build_bookmarks_html;
use crate::services::netscape_parser::parse_bookmarks;
use crate::services::preview::PreviewTracker;
use crate::services::settings_engine::{apply_settings_patch, normalize_settings};
use crate::services::shortcuts::{resolve_shortcut, KeyChord};
use crate::services::url_tools::{domain_from_url, is_likely_url, normalize_url};
use crate::types::bookmark::{BookmarkId, FolderId, FolderItem, ARCHIVE_FOLDER_ID, ROOT_FOLDER_ID};
use crate::types::errors::{ActionError, CodecError, PreviewError, SettingsError};
use crate::types::preview::{PreviewPayload, PreviewState};
use crate::types::selection::{ClickModifiers, FinderColumn, ItemKey, ItemKind, RootTab};
use crate::types::settings::{AppSettings, FolderDisplayMode, ShortcutAction, SortField};

/// Text the user has typed but not yet submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingInput {
    pub add_input: String,
    pub inline_add_folder_id: Option<FolderId>,
    pub create_folder_path: String,
}

/// The undo unit: tree, cursor and pending input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSnapshot {
    pub tree: TreeSnapshot,
    pub selection: SelectionState,
    pub input: PendingInput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A status line for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

/// Items picked up by a drag gesture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragPayload {
    Bookmarks(Vec<BookmarkId>),
    Folders(Vec<FolderId>),
}

/// What a key press did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Ignored,
    Handled,
    /// The presentation layer should open the UI for this action.
    Requested(ShortcutAction),
}

/// A preview fetch the presentation layer should start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewRequest {
    pub token: u64,
    pub url: String,
}

/// Central application struct holding all managers and services.
pub struct BookmarkApp {
    pub tree: TreeStore,
    pub selection: SelectionController,
    settings: AppSettings,
    undo: UndoStack<AppSnapshot>,
    dedupe: DuplicatePolicyEngine,
    preview: PreviewTracker,
    pending_preview: Option<PreviewRequest>,
    input: PendingInput,
    dragging: Option<DragPayload>,
    notices: Vec<Notice>,
}

impl BookmarkApp {
    /// Creates an empty app. `settings` are taken as given; hosts read them
    /// through [`crate::services::settings_engine`] first.
    pub fn new(settings: AppSettings) -> Self {
        let mut app = Self {
            tree: TreeStore::new(),
            selection: SelectionController::new(),
            settings,
            undo: UndoStack::new(),
            dedupe: DuplicatePolicyEngine::new(),
            preview: PreviewTracker::new(),
            pending_preview: None,
            input: PendingInput::default(),
            dragging: None,
            notices: Vec::new(),
        };
        app.apply_view_settings();
        app
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    // ─── Notices ───

    /// Takes every queued notice, oldest first.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn notify(&mut self, level: NoticeLevel, text: &str) {
        self.notices.push(Notice {
            level,
            text: text.to_string(),
        });
    }

    fn report(&mut self, result: Result<String, ActionError>) -> Result<String, ActionError> {
        match &result {
            Ok(message) => self.notify(NoticeLevel::Success, message),
            Err(e) => self.notify(NoticeLevel::Error, &e.to_string()),
        }
        result
    }

    // ─── Snapshots and undo ───

    pub fn snapshot(&self) -> AppSnapshot {
        AppSnapshot {
            tree: self.tree.snapshot(),
            selection: self.selection.state().clone(),
            input: self.input.clone(),
        }
    }

    fn apply_snapshot(&mut self, snapshot: AppSnapshot) -> Result<(), ActionError> {
        self.tree.restore(snapshot.tree)?;
        self.selection.restore_state(snapshot.selection);
        self.input = snapshot.input;
        Ok(())
    }

    /// Runs `op` as one undoable step. On failure the tree and cursor are
    /// put back exactly as they were and nothing is recorded.
    fn transact<T>(
        &mut self,
        label: &str,
        op: impl FnOnce(&mut Self) -> Result<T, ActionError>,
    ) -> Result<T, ActionError> {
        let before = self.snapshot();
        match op(self) {
            Ok(value) => {
                self.undo.record(label, before);
                Ok(value)
            }
            Err(e) => {
                if let Err(restore_error) = self.apply_snapshot(before) {
                    warn!(error = %restore_error, label, "failed to roll back action");
                }
                Err(e)
            }
        }
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    /// Restores the state captured before the most recent action.
    pub fn undo(&mut self) -> Result<String, ActionError> {
        let result = self.undo_last();
        self.report(result)
    }

    fn undo_last(&mut self) -> Result<String, ActionError> {
        let entry = self.undo.pop()?;
        self.apply_snapshot(entry.snapshot)?;
        self.clear_preview();
        info!(label = %entry.label, "undid action");
        Ok(format!("Undid: {}.", entry.label))
    }

    // ─── Post-mutation policy ───

    fn sort_if_enabled(&mut self) {
        if self.settings().auto_sort_enabled {
            self.tree.sort_all_bookmarks(self.selection.sort_field());
        }
    }

    fn enforce_duplicates(&mut self) {
        let auto_delete = self.settings().duplicate_auto_delete_enabled;
        let outcome = self.dedupe.enforce(&mut self.tree, auto_delete);
        if let Some(message) = outcome.message() {
            let level = match outcome {
                DuplicateOutcome::Detected(_) => NoticeLevel::Error,
                _ => NoticeLevel::Success,
            };
            self.notify(level, &message);
        }
    }

    fn apply_view_settings(&mut self) {
        let settings = self.settings().clone();
        self.selection.set_sort_field(settings.default_sort_field);
        self.selection.set_display_mode(settings.default_folder_display_mode);
        self.selection.set_auto_sort(settings.auto_sort_enabled);
    }

    // ─── Import / export ───

    /// Replaces the whole tree with the bookmarks of a Netscape bookmark file.
    pub fn import_html(&mut self, html: &str) -> Result<String, ActionError> {
        let result = self.transact("Import bookmarks", |app| {
            let parsed = parse_bookmarks(html);
            app.tree.rebuild_from_raw(&parsed);
            app.selection.reset();
            app.input = PendingInput::default();
            app.clear_preview();
            app.sort_if_enabled();
            app.enforce_duplicates();
            info!(count = parsed.len(), "imported bookmarks");
            Ok(format!("Imported {} bookmarks.", parsed.len()))
        });
        self.report(result)
    }

    pub fn import_file(&mut self, path: &Path) -> Result<String, ActionError> {
        match fs::read_to_string(path) {
            Ok(html) => self.import_html(&html),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read bookmark file");
                let result = Err(CodecError::IoError(format!("Unable to read selected file: {}", e)).into());
                self.report(result)
            }
        }
    }

    /// Canonical bookmark file of every active bookmark. Clears the archive
    /// afterwards when the setting asks for it.
    pub fn export_html(&mut self) -> Result<String, ActionError> {
        let (html, count) = self.render_export()?;
        self.finish_export(count);
        Ok(html)
    }

    /// Writes the export to `path`. The archive is only cleared once the
    /// file has been written.
    pub fn export_file(&mut self, path: &Path) -> Result<usize, ActionError> {
        let (html, count) = self.render_export()?;
        if let Err(e) = fs::write(path, &html) {
            warn!(path = %path.display(), error = %e, "failed to write bookmark file");
            let result = Err(CodecError::IoError(format!("Unable to write {}: {}", path.display(), e)).into());
            return self.report(result).map(|_| 0);
        }
        self.finish_export(count);
        Ok(count)
    }

    fn render_export(&mut self) -> Result<(String, usize), ActionError> {
        let bookmarks = self.tree.flatten_bookmarks();
        if bookmarks.is_empty() {
            let result = Err(CodecError::Empty.into());
            return self.report(result).map(|_| (String::new(), 0));
        }
        Ok((build_bookmarks_html(&bookmarks), bookmarks.len()))
    }

    fn finish_export(&mut self, count: usize) {
        if self.settings.clear_archive_after_export {
            let cleared = self.transact("Clear archive after export", |app| {
                app.tree.clear_archive();
                app.selection.reconcile_after_mutation(&app.tree);
                Ok(())
            });
            if let Err(e) = cleared {
                warn!(error = %e, "failed to clear archive after export");
            }
        }
        info!(count, "exported bookmarks");
        self.notify(NoticeLevel::Success, &format!("Exported {} bookmarks.", count));
    }

    // ─── Adding ───

    pub fn start_inline_add(&mut self, folder_id: FolderId) {
        if self.tree.has_folder(folder_id) {
            self.input.inline_add_folder_id = Some(folder_id);
            self.input.add_input.clear();
        }
    }

    pub fn cancel_inline_add(&mut self) {
        self.input.inline_add_folder_id = None;
        self.input.add_input.clear();
    }

    pub fn set_add_input(&mut self, value: &str) {
        self.input.add_input = value.to_string();
    }

    pub fn set_create_folder_path(&mut self, value: &str) {
        self.input.create_folder_path = value.to_string();
    }

    pub fn pending_input(&self) -> &PendingInput {
        &self.input
    }

    /// Submits the inline add field into its folder, or the active column.
    pub fn submit_inline_add(&mut self) -> Result<String, ActionError> {
        let folder_id = self
            .input
            .inline_add_folder_id
            .unwrap_or(self.selection.state().active_column_id);
        let raw = self.input.add_input.clone();
        let result = self.add_item(Some(folder_id), &raw);
        if result.is_ok() {
            self.input.add_input.clear();
            self.input.inline_add_folder_id = Some(folder_id);
        }
        result
    }

    /// Adds a URL, a `folder/path/url` or a folder path below `folder_id`
    /// (the active column when `None`).
    pub fn add_item(&mut self, folder_id: Option<FolderId>, raw: &str) -> Result<String, ActionError> {
        let folder_id = folder_id.unwrap_or(self.selection.state().active_column_id);
        let raw = raw.trim();
        let result = if !self.tree.has_folder(folder_id) {
            Err(ActionError::Validation("Select a valid folder first.".to_string()))
        } else if raw.is_empty() {
            Err(ActionError::Validation("Enter a URL or folder path.".to_string()))
        } else {
            self.transact("Add item", |app| {
                let added = app.add_item_from_raw(raw, folder_id)?;
                app.sort_if_enabled();
                app.enforce_duplicates();
                Ok(match added {
                    Some(title) => format!("Added bookmark {}.", title),
                    None => "Folder created.".to_string(),
                })
            })
        };
        self.report(result)
    }

    /// Returns the bookmark title when a bookmark was created, `None` when
    /// only folders were.
    fn add_item_from_raw(&mut self, raw: &str, folder_id: FolderId) -> Result<Option<String>, ActionError> {
        if is_likely_url(raw) {
            return self.add_url(raw, folder_id).map(Some);
        }

        let parts: Vec<String> = raw
            .split('/')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect();
        let Some((last, folders)) = parts.split_last() else {
            return Err(ActionError::Validation("Enter a URL or folder path.".to_string()));
        };
        if is_likely_url(last) {
            let target = self.tree.ensure_folder_path(folders, folder_id)?;
            return self.add_url(last, target).map(Some);
        }
        self.tree.ensure_folder_path(&parts, folder_id)?;
        Ok(None)
    }

    fn add_url(&mut self, raw: &str, folder_id: FolderId) -> Result<String, ActionError> {
        let url = normalize_url(raw);
        let domain = domain_from_url(&url);
        let title = if domain.is_empty() { url.clone() } else { domain };
        self.tree.create_bookmark(folder_id, &title, &url, None)?;
        Ok(title)
    }

    /// Adds one bookmark per URL line to the active column's folder.
    pub fn bulk_add(&mut self, text: &str) -> Result<String, ActionError> {
        let folder_id = self.selection.state().active_column_id;
        let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
        let result = if !self.tree.has_folder(folder_id) {
            Err(ActionError::Validation("Select a valid folder first.".to_string()))
        } else if lines.is_empty() {
            Err(ActionError::Validation("Paste one URL per line.".to_string()))
        } else {
            self.transact("Bulk add", |app| {
                let mut added = 0;
                let mut skipped = 0;
                for line in &lines {
                    if !is_likely_url(line) || app.add_url(line, folder_id).is_err() {
                        skipped += 1;
                        continue;
                    }
                    added += 1;
                }
                if added == 0 {
                    return Err(ActionError::Validation("No valid URLs were added.".to_string()));
                }
                app.sort_if_enabled();
                app.enforce_duplicates();
                Ok((added, skipped))
            })
            .map(|(added, skipped)| {
                if skipped > 0 {
                    self.notify(
                        NoticeLevel::Error,
                        &format!("Skipped {} invalid URL line(s).", skipped),
                    );
                }
                format!("Bulk add complete: {} bookmarks.", added)
            })
        };
        self.report(result)
    }

    /// Creates a folder path: from the root when it contains `/`, otherwise
    /// below the selected folder.
    pub fn create_folder(&mut self, path: &str) -> Result<String, ActionError> {
        let value = path.trim().to_string();
        let result = if value.is_empty() {
            Err(ActionError::Validation("Enter a folder path.".to_string()))
        } else {
            self.transact("Create folder", |app| {
                let parent = if value.contains('/') {
                    ROOT_FOLDER_ID
                } else {
                    app.selected_folder_id()
                };
                app.tree.ensure_folder_path_str(&value, parent)?;
                app.input.create_folder_path.clear();
                Ok("Folder created.".to_string())
            })
        };
        self.report(result)
    }

    /// Submits the pending create-folder field.
    pub fn submit_create_folder(&mut self) -> Result<String, ActionError> {
        let path = self.input.create_folder_path.clone();
        self.create_folder(&path)
    }

    // ─── Editing ───

    /// Renames the selected folder.
    pub fn rename_selected_folder(&mut self, name: &str) -> Result<String, ActionError> {
        self.selection.set_rename_folder_name(name);
        let entry = self.selection.state().selected_entry;
        let next = name.trim().to_string();
        let result = match entry {
            Some(entry) if entry.kind == ItemKind::Folder => {
                let renamable = self
                    .tree
                    .folder(entry.id)
                    .map(|folder| !folder.is_reserved())
                    .unwrap_or(false);
                if !renamable {
                    Err(ActionError::Validation("Root folder cannot be renamed.".to_string()))
                } else if next.is_empty() {
                    Err(ActionError::Validation("Folder name cannot be empty.".to_string()))
                } else {
                    self.transact("Rename folder", |app| {
                        app.tree.rename_folder(entry.id, &next)?;
                        app.selection.set_rename_folder_name(&next);
                        Ok("Folder renamed.".to_string())
                    })
                }
            }
            _ => Err(ActionError::Validation("Select a folder to rename.".to_string())),
        };
        self.report(result)
    }

    /// Changes a bookmark's title and url.
    pub fn edit_bookmark(&mut self, bookmark_id: BookmarkId, title: &str, url: &str) -> Result<String, ActionError> {
        let result = if title.trim().is_empty() {
            Err(ActionError::Validation("Bookmark title cannot be empty.".to_string()))
        } else if url.trim().is_empty() || !is_likely_url(url.trim()) {
            Err(ActionError::Validation("Enter a valid URL.".to_string()))
        } else if !self.tree.has_bookmark(bookmark_id) {
            Err(ActionError::Validation("Bookmark not found.".to_string()))
        } else {
            self.transact("Edit bookmark", |app| {
                app.tree.update_bookmark(bookmark_id, title, url)?;
                app.sort_if_enabled();
                app.enforce_duplicates();
                Ok("Bookmark updated.".to_string())
            })
        };
        self.report(result)
    }

    // ─── Moving ───

    /// Picks up `item`, or the whole selection when `item` is part of it.
    /// Root and archive cannot be dragged.
    pub fn start_drag(&mut self, item: ItemKey) -> Option<DragPayload> {
        let payload = match item.kind {
            ItemKind::Bookmark => {
                if !self.tree.has_bookmark(item.id) {
                    return None;
                }
                let selected = self.selection.selected_bookmark_ids(&self.tree);
                let ids = if selected.contains(&item.id) { selected } else { vec![item.id] };
                self.selection.set_selected_keys(ids.iter().map(|id| ItemKey::bookmark(*id)));
                DragPayload::Bookmarks(ids)
            }
            ItemKind::Folder => {
                if item.id == ROOT_FOLDER_ID || item.id == ARCHIVE_FOLDER_ID || !self.tree.has_folder(item.id) {
                    return None;
                }
                let selected = self.selection.selected_folder_ids(&self.tree);
                let ids = if selected.contains(&item.id) {
                    self.tree.prune_nested_folder_ids(&selected)
                } else {
                    vec![item.id]
                };
                self.selection.set_selected_keys(ids.iter().map(|id| ItemKey::folder(*id)));
                DragPayload::Folders(ids)
            }
        };
        self.dragging = Some(payload.clone());
        Some(payload)
    }

    pub fn cancel_drag(&mut self) {
        self.dragging = None;
    }

    pub fn can_drop_on_folder(&self, folder_id: FolderId) -> bool {
        match &self.dragging {
            Some(DragPayload::Bookmarks(ids)) => self.tree.can_drop_bookmarks_on_folder(ids, folder_id),
            Some(DragPayload::Folders(ids)) => self.tree.can_drop_folders_on_folder(ids, folder_id),
            None => false,
        }
    }

    pub fn can_drop_on_bookmark(&self, bookmark_id: BookmarkId) -> bool {
        match &self.dragging {
            Some(DragPayload::Bookmarks(ids)) => self.tree.can_drop_on_bookmark(ids, bookmark_id),
            _ => false,
        }
    }

    /// Drops the dragged items into a folder.
    pub fn drop_on_folder(&mut self, folder_id: FolderId) -> Result<String, ActionError> {
        if !self.can_drop_on_folder(folder_id) {
            self.dragging = None;
            return self.report(Err(ActionError::Validation("Invalid drop target.".to_string())));
        }
        match self.dragging.take() {
            Some(DragPayload::Bookmarks(ids)) => self.move_bookmarks(&ids, folder_id),
            Some(DragPayload::Folders(ids)) => self.move_folders(&ids, folder_id),
            None => self.report(Err(ActionError::Validation("Invalid drop target.".to_string()))),
        }
    }

    /// Drops the dragged bookmarks onto another bookmark, grouping them all
    /// into a new sibling folder.
    pub fn drop_on_bookmark(&mut self, bookmark_id: BookmarkId) -> Result<String, ActionError> {
        if !self.can_drop_on_bookmark(bookmark_id) {
            self.dragging = None;
            return self.report(Err(ActionError::Validation("Invalid drop target.".to_string())));
        }
        let dragged = match self.dragging.take() {
            Some(DragPayload::Bookmarks(ids)) => ids,
            _ => Vec::new(),
        };
        self.create_folder_from_bookmarks(bookmark_id, &dragged)
    }

    pub fn create_folder_from_bookmarks(
        &mut self,
        target_bookmark_id: BookmarkId,
        dragged: &[BookmarkId],
    ) -> Result<String, ActionError> {
        let distinct = dragged
            .iter()
            .filter(|id| **id != target_bookmark_id)
            .count();
        let label = if distinct == 1 {
            "Create folder from 2 bookmarks"
        } else {
            "Create folder from bookmarks"
        };
        let result = self.transact(label, |app| {
            let (folder_id, count) = app.tree.create_folder_from_bookmarks(target_bookmark_id, dragged)?;
            app.enforce_duplicates();
            app.selection.select_folder(&app.tree, folder_id);
            app.selection.set_selected_keys([ItemKey::folder(folder_id)]);
            let name = app.tree.folder(folder_id).map(|f| f.name.clone()).unwrap_or_default();
            Ok(format!("Created {} with {} bookmarks.", name, count))
        });
        self.clear_preview();
        self.report(result)
    }

    pub fn move_bookmarks(&mut self, bookmark_ids: &[BookmarkId], folder_id: FolderId) -> Result<String, ActionError> {
        let label = if bookmark_ids.len() == 1 { "Move bookmark" } else { "Move bookmarks" };
        let result = self.transact(label, |app| {
            let name = app
                .tree
                .folder(folder_id)
                .map(|f| f.name.clone())
                .ok_or(ActionError::Validation("Invalid drop target.".to_string()))?;
            app.tree.move_bookmarks_to_folder(bookmark_ids, folder_id);
            app.sort_if_enabled();
            app.enforce_duplicates();
            app.selection.reconcile_after_mutation(&app.tree);
            Ok(if bookmark_ids.len() == 1 {
                format!("Moved bookmark to {}.", name)
            } else {
                format!("Moved {} bookmarks to {}.", bookmark_ids.len(), name)
            })
        });
        self.report(result)
    }

    /// Moves folders; nested ids are pruned first. A folder rejected by a
    /// structural check does not undo the folders moved before it.
    pub fn move_folders(&mut self, folder_ids: &[FolderId], folder_id: FolderId) -> Result<String, ActionError> {
        let label = if folder_ids.len() == 1 { "Move folder" } else { "Move folders" };
        let result = self.transact(label, |app| {
            let name = app
                .tree
                .folder(folder_id)
                .map(|f| f.name.clone())
                .ok_or(ActionError::Validation("Invalid drop target.".to_string()))?;
            let top_level = app.tree.prune_nested_folder_ids(folder_ids);
            let report = app.tree.move_folders_to_folder(&top_level, folder_id);
            if report.moved.is_empty() {
                if let Some((_, e)) = report.rejected.into_iter().next() {
                    return Err(e.into());
                }
            } else if let Some((_, e)) = report.rejected.first() {
                let text = e.to_string();
                app.notify(NoticeLevel::Error, &text);
            }
            app.selection.rebuild_column_path(&app.tree);
            app.enforce_duplicates();
            Ok(if top_level.len() == 1 {
                format!("Moved folder to {}.", name)
            } else {
                format!("Moved {} folders to {}.", top_level.len(), name)
            })
        });
        self.report(result)
    }

    // ─── Deleting ───

    /// Deletes the multi-selection, or the selected entry when nothing is
    /// multi-selected. Active bookmarks go to the archive; archived ones are
    /// deleted for good. Folders archive their bookmarks and are removed.
    pub fn delete_selected(&mut self) -> Result<String, ActionError> {
        let candidate_folders: Vec<FolderId> = self
            .selection
            .selected_folder_ids(&self.tree)
            .into_iter()
            .filter(|id| *id != ARCHIVE_FOLDER_ID)
            .collect();
        let folders = self.tree.prune_nested_folder_ids(&candidate_folders);
        let bookmarks: Vec<BookmarkId> = self
            .selection
            .selected_bookmark_ids(&self.tree)
            .into_iter()
            .filter(|id| !self.tree.is_bookmark_inside_any(*id, &folders))
            .collect();

        if folders.is_empty() && bookmarks.is_empty() {
            let Some(entry) = self.selection.state().selected_entry else {
                return self.report(Err(ActionError::Validation(
                    "Select a bookmark or folder to delete.".to_string(),
                )));
            };
            return self.delete_item(entry);
        }

        let result = self.transact("Delete selected", |app| {
            let mut archived = 0;
            let mut deleted_bookmarks = 0;
            let mut deleted_folders = 0;
            for id in &bookmarks {
                let Some(bookmark) = app.tree.bookmark(*id) else {
                    continue;
                };
                if bookmark.is_archived() {
                    if app.tree.remove_bookmark(*id) {
                        deleted_bookmarks += 1;
                    }
                } else if app.tree.archive_bookmark(*id) {
                    archived += 1;
                }
            }
            for id in &folders {
                if app.tree.has_folder(*id) {
                    archived += app.tree.archive_bookmarks_in_subtree(*id);
                    app.tree.remove_folder(*id);
                    deleted_folders += 1;
                }
            }

            app.selection.clear_selection();
            app.selection.reconcile_after_mutation(&app.tree);
            let selected_folder = app.selection.state().selected_folder_id;
            app.selection.set_selected_entry(Some(ItemKey::folder(selected_folder)));
            info!(archived, deleted_bookmarks, deleted_folders, "deleted selection");

            Ok(if archived + deleted_bookmarks + deleted_folders > 0 {
                format!(
                    "Archived {} bookmarks, deleted {} folders and {} archived bookmarks.",
                    archived, deleted_folders, deleted_bookmarks
                )
            } else {
                "Nothing selected to delete.".to_string()
            })
        });
        self.clear_preview();
        self.report(result)
    }

    /// Deletes a single bookmark or folder.
    pub fn delete_item(&mut self, item: ItemKey) -> Result<String, ActionError> {
        let result = match item.kind {
            ItemKind::Bookmark => self.transact("Delete bookmark", |app| {
                let archived = app
                    .tree
                    .bookmark(item.id)
                    .map(|b| b.is_archived())
                    .ok_or(ActionError::Validation("Select a bookmark or folder to delete.".to_string()))?;
                let message = if archived {
                    app.tree.remove_bookmark(item.id);
                    "Bookmark permanently deleted."
                } else {
                    app.tree.archive_bookmark(item.id);
                    "Bookmark moved to archive."
                };
                app.selection.reconcile_after_mutation(&app.tree);
                if app.selection.state().selected_entry == Some(item) {
                    app.selection.set_selected_entry(None);
                }
                Ok(message.to_string())
            }),
            ItemKind::Folder if item.id == ROOT_FOLDER_ID || item.id == ARCHIVE_FOLDER_ID => {
                Err(ActionError::Validation("Root folder cannot be deleted.".to_string()))
            }
            ItemKind::Folder => self.transact("Delete folder", |app| {
                if !app.tree.has_folder(item.id) {
                    return Err(ActionError::Validation("Select a bookmark or folder to delete.".to_string()));
                }
                let archived = app.tree.archive_bookmarks_in_subtree(item.id);
                app.tree.remove_folder(item.id);
                app.selection.reconcile_after_mutation(&app.tree);
                let selected_folder = app.selection.state().selected_folder_id;
                app.selection.set_selected_entry(Some(ItemKey::folder(selected_folder)));
                Ok(format!("Folder deleted. Archived {} bookmarks.", archived))
            }),
        };
        self.clear_preview();
        self.report(result)
    }

    // ─── View settings ───

    pub fn set_sort_field(&mut self, field: SortField) -> String {
        self.selection.set_sort_field(field);
        self.tree.sort_all_bookmarks(field);
        let message = format!("Sorted bookmarks by {}.", field.as_str());
        self.notify(NoticeLevel::Success, &message);
        message
    }

    pub fn set_folder_display_mode(&mut self, mode: FolderDisplayMode) -> String {
        self.selection.set_display_mode(mode);
        let message = match mode {
            FolderDisplayMode::Top => "Folders are now shown on top.",
            FolderDisplayMode::Bottom => "Folders are now shown on bottom.",
        };
        self.notify(NoticeLevel::Success, message);
        message.to_string()
    }

    /// Merges a partial settings blob into the current settings and applies
    /// the result.
    pub fn update_settings(&mut self, patch: &serde_json::Value) -> Result<(), ActionError> {
        let next = apply_settings_patch(&self.settings, patch);
        self.after_settings_change(next)
    }

    /// Replaces all settings and applies them.
    pub fn replace_settings(&mut self, settings: AppSettings) -> Result<(), ActionError> {
        let next = normalize_settings(settings);
        self.after_settings_change(next)
    }

    fn after_settings_change(&mut self, next: Result<AppSettings, SettingsError>) -> Result<(), ActionError> {
        let settings = match next {
            Ok(settings) => settings,
            Err(e) => {
                let err = ActionError::Settings(e.to_string());
                self.notify(NoticeLevel::Error, &err.to_string());
                return Err(err);
            }
        };
        self.settings = settings;
        self.apply_view_settings();
        self.sort_if_enabled();
        self.enforce_duplicates();
        Ok(())
    }

    // ─── Navigation ───

    fn selected_folder_id(&self) -> FolderId {
        let id = self.selection.state().selected_folder_id;
        if self.tree.has_folder(id) {
            id
        } else {
            ROOT_FOLDER_ID
        }
    }

    pub fn columns(&mut self) -> Arc<Vec<FinderColumn>> {
        self.selection.columns(&self.tree)
    }

    pub fn breadcrumbs(&self) -> Vec<&FolderItem> {
        self.selection.breadcrumbs(&self.tree)
    }

    pub fn is_item_selected(&self, column_index: usize, item: ItemKey) -> bool {
        self.selection.is_item_selected(column_index, item)
    }

    pub fn set_search_query(&mut self, query: &str) {
        self.selection.set_search_query(query);
    }

    pub fn select_folder(&mut self, folder_id: FolderId) -> bool {
        let selected = self.selection.select_folder(&self.tree, folder_id);
        self.sync_preview();
        selected
    }

    pub fn select_bookmark(&mut self, bookmark_id: BookmarkId) -> bool {
        let selected = self.selection.select_bookmark(&self.tree, bookmark_id);
        self.sync_preview();
        selected
    }

    pub fn switch_root_tab(&mut self, tab: RootTab) -> bool {
        let switched = self.selection.switch_root_tab(tab);
        self.sync_preview();
        switched
    }

    pub fn click(&mut self, column_index: usize, item: ItemKey, modifiers: ClickModifiers) {
        self.selection.click(&self.tree, column_index, item, modifiers);
        self.sync_preview();
    }

    pub fn set_active_column(&mut self, column_id: FolderId) {
        self.selection.set_active_column(&self.tree, column_id);
    }

    pub fn select_all_in_active_column(&mut self) {
        self.selection.select_all_in_active_column(&self.tree);
    }

    /// Handles a key press from the column view.
    pub fn handle_key(&mut self, chord: &KeyChord) -> KeyOutcome {
        let key = chord.key.to_lowercase();
        if chord.ctrl || chord.cmd {
            match key.as_str() {
                "a" => {
                    self.select_all_in_active_column();
                    return KeyOutcome::Handled;
                }
                "z" => {
                    // The outcome is reported through the notice queue.
                    let _ = self.undo();
                    return KeyOutcome::Handled;
                }
                "f" => return KeyOutcome::Requested(ShortcutAction::Search),
                _ => {}
            }
        }

        match key.as_str() {
            "arrowdown" | "arrowup" => {
                let delta = if key == "arrowdown" { 1 } else { -1 };
                self.selection.move_selection_vertical(&self.tree, delta, chord.shift);
                self.sync_preview();
                return KeyOutcome::Handled;
            }
            "arrowright" => {
                if self.selection.navigate_into_selected_folder(&self.tree) {
                    self.sync_preview();
                    return KeyOutcome::Handled;
                }
                return KeyOutcome::Ignored;
            }
            "arrowleft" => {
                if self.selection.navigate_up_from_selected_folder(&self.tree) {
                    self.sync_preview();
                    return KeyOutcome::Handled;
                }
                return KeyOutcome::Ignored;
            }
            _ => {}
        }

        match resolve_shortcut(&self.settings().shortcuts, chord) {
            Some(ShortcutAction::Delete) => {
                let _ = self.delete_selected();
                KeyOutcome::Handled
            }
            Some(action) => KeyOutcome::Requested(action),
            None => KeyOutcome::Ignored,
        }
    }

    // ─── Preview ───

    pub fn preview_state(&self) -> &PreviewState {
        self.preview.state()
    }

    /// The fetch started by the latest bookmark selection, if not yet taken.
    pub fn take_preview_request(&mut self) -> Option<PreviewRequest> {
        self.pending_preview.take()
    }

    pub fn complete_preview(&mut self, token: u64, result: Result<PreviewPayload, PreviewError>) -> bool {
        self.preview.complete(token, result)
    }

    pub fn on_preview_image_loaded(&mut self) {
        self.preview.on_image_loaded();
    }

    pub fn on_preview_image_error(&mut self) {
        self.preview.on_image_error();
    }

    fn clear_preview(&mut self) {
        self.preview.clear();
        self.pending_preview = None;
    }

    /// Starts a preview when a different bookmark became the selected entry,
    /// and clears it when the entry is no longer a bookmark.
    fn sync_preview(&mut self) {
        let url = match self.selection.state().selected_entry {
            Some(entry) if entry.kind == ItemKind::Bookmark => self.tree.bookmark(entry.id).map(|b| b.url.clone()),
            _ => None,
        };
        match url {
            Some(url) if url == self.preview.state().url => {}
            Some(url) => {
                let token = self.preview.begin(&url);
                self.pending_preview = Some(PreviewRequest { token, url });
            }
            None => {
                if !self.preview.state().url.is_empty() {
                    self.clear_preview();
                }
            }
        }
    }
}
