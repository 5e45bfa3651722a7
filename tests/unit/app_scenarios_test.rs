//! End-to-end scenarios through `BookmarkApp`: import, selection, editing,
//! deletion, undo, duplicate policy and export.

use serde_json::json;
use tempfile::TempDir;

use bookmark_cowboy::app::{BookmarkApp, DragPayload, KeyOutcome, NoticeLevel};
use bookmark_cowboy::managers::undo_manager::UNDO_LIMIT;
use bookmark_cowboy::services::settings_engine::settings_from_str;
use bookmark_cowboy::services::shortcuts::KeyChord;
use bookmark_cowboy::types::bookmark::{ARCHIVE_FOLDER_ID, ROOT_FOLDER_ID};
use bookmark_cowboy::types::errors::{ActionError, CodecError, PreviewError};
use bookmark_cowboy::types::preview::PreviewPayload;
use bookmark_cowboy::types::selection::{ClickModifiers, ItemKey, ItemKind};
use bookmark_cowboy::types::settings::{AppSettings, ShortcutAction};

const NESTED: &str = r#"<!DOCTYPE NETSCAPE-Bookmark-file-1>
<DL><p>
  <DT><H3>Folder A</H3>
  <DL><p>
    <DT><H3>Folder B</H3>
    <DL><p>
      <DT><A HREF="https://example.com" ADD_DATE="1700000000">X</A>
    </DL><p>
  </DL><p>
</DL><p>"#;

const FLAT: &str = r#"<DL><p>
<DT><A HREF="https://a.com">a</A>
<DT><A HREF="https://b.com">b</A>
<DT><A HREF="https://c.com">c</A>
</DL>"#;

/// Fresh app with default settings and a scratch directory for exports.
fn setup() -> (BookmarkApp, TempDir) {
    let tmp = TempDir::new().expect("Failed to create temp dir");
    (BookmarkApp::new(AppSettings::default()), tmp)
}

fn texts(app: &mut BookmarkApp) -> Vec<String> {
    app.drain_notices().into_iter().map(|n| n.text).collect()
}

fn root_titles(app: &BookmarkApp) -> Vec<String> {
    app.tree
        .folder_bookmarks(ROOT_FOLDER_ID)
        .into_iter()
        .map(|b| b.title.clone())
        .collect()
}

// ─── Import and export ───

#[test]
fn test_import_nested_folders_and_export_path() {
    let (mut app, _tmp) = setup();
    let message = app.import_html(NESTED).unwrap();
    assert_eq!(message, "Imported 1 bookmarks.");

    let flat = app.tree.flatten_bookmarks();
    assert_eq!(flat.len(), 1);
    assert_eq!(flat[0].folder_path, "Folder A/Folder B");
    assert_eq!(flat[0].add_date.as_deref(), Some("1700000000"));

    let x = flat[0].id;
    assert!(app.select_bookmark(x));
    let columns = app.columns();
    let titles: Vec<&str> = columns.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(titles, vec!["All Bookmarks", "Folder A", "Folder B"]);
    assert_eq!(columns[2].items.len(), 1);
    assert_eq!(columns[2].items[0].kind, ItemKind::Bookmark);
    assert_eq!(columns[2].items[0].id, x);
    assert_eq!(columns[2].items[0].name, "X");

    let html = app.export_html().unwrap();
    assert!(html.contains("<DT><H3>Folder A</H3>"));
    assert!(html.contains("<DT><A HREF=\"https://example.com\" ADD_DATE=\"1700000000\">X</A>"));
}

#[test]
fn test_import_can_be_undone() {
    let (mut app, _tmp) = setup();
    app.import_html(FLAT).unwrap();
    app.import_html(NESTED).unwrap();
    assert_eq!(app.tree.active_bookmark_count(), 1);

    assert_eq!(app.undo().unwrap(), "Undid: Import bookmarks.");
    assert_eq!(root_titles(&app), vec!["a", "b", "c"]);
}

#[test]
fn test_export_without_bookmarks_fails() {
    let (mut app, _tmp) = setup();
    let err = app.export_html().unwrap_err();
    assert!(matches!(err, ActionError::Codec(CodecError::Empty)));
    let notices = app.drain_notices();
    assert_eq!(notices.last().map(|n| n.level), Some(NoticeLevel::Error));
}

#[test]
fn test_export_clears_archive_and_leaves_it_out() {
    let (mut app, _tmp) = setup();
    app.import_html(FLAT).unwrap();
    let a = app.tree.folder_bookmarks(ROOT_FOLDER_ID)[0].id;
    app.delete_item(ItemKey::bookmark(a)).unwrap();

    let html = app.export_html().unwrap();
    assert!(!html.contains("https://a.com"));
    assert!(!app.tree.has_bookmark(a));
    assert!(texts(&mut app).contains(&"Exported 2 bookmarks.".to_string()));
}

#[test]
fn test_export_keeps_archive_when_setting_off() {
    let (mut app, _tmp) = setup();
    app.update_settings(&json!({"clearArchiveAfterExport": false})).unwrap();
    app.import_html(FLAT).unwrap();
    let a = app.tree.folder_bookmarks(ROOT_FOLDER_ID)[0].id;
    app.delete_item(ItemKey::bookmark(a)).unwrap();

    app.export_html().unwrap();
    assert!(app.tree.has_bookmark(a));
}

#[test]
fn test_failed_export_write_keeps_archive() {
    let (mut app, tmp) = setup();
    app.import_html(FLAT).unwrap();
    let a = app.tree.folder_bookmarks(ROOT_FOLDER_ID)[0].id;
    app.delete_item(ItemKey::bookmark(a)).unwrap();
    app.drain_notices();

    let path = tmp.path().join("missing_dir").join("out.html");
    let err = app.export_file(&path).unwrap_err();
    assert!(matches!(err, ActionError::Codec(CodecError::IoError(_))));
    assert!(app.tree.has_bookmark(a));
    assert_eq!(app.tree.folder(ARCHIVE_FOLDER_ID).unwrap().bookmarks.len(), 1);

    let notices = app.drain_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
    assert!(notices[0].text.starts_with("Bookmark file I/O error: Unable to write"));
}

#[test]
fn test_export_file_writes_document() {
    let (mut app, tmp) = setup();
    app.import_html(FLAT).unwrap();
    let path = tmp.path().join("out.html");
    assert_eq!(app.export_file(&path).unwrap(), 3);
    let written = std::fs::read_to_string(&path).unwrap();
    assert!(written.starts_with("<!DOCTYPE NETSCAPE-Bookmark-file-1>"));
    assert!(written.ends_with("</DL><p>\n"));
}

#[test]
fn test_import_missing_file_reports_error() {
    let (mut app, tmp) = setup();
    let err = app.import_file(&tmp.path().join("missing.html")).unwrap_err();
    assert!(err.to_string().contains("Unable to read selected file"));
    assert_eq!(app.undo_depth(), 0);
}

// ─── Selection, delete, undo ───

#[test]
fn test_range_delete_then_single_undo_restores_all() {
    let (mut app, _tmp) = setup();
    app.import_html(FLAT).unwrap();
    let columns = app.columns();
    let first = columns[0].items[0].key();
    let third = columns[0].items[2].key();

    app.click(0, first, ClickModifiers::default());
    app.click(0, third, ClickModifiers { shift: true, multi: false });
    assert_eq!(app.selection.state().selected_item_keys.len(), 3);

    let message = app.delete_selected().unwrap();
    assert_eq!(message, "Archived 3 bookmarks, deleted 0 folders and 0 archived bookmarks.");
    assert!(root_titles(&app).is_empty());
    assert_eq!(app.tree.folder(ARCHIVE_FOLDER_ID).unwrap().bookmarks.len(), 3);

    assert_eq!(app.undo().unwrap(), "Undid: Delete selected.");
    assert_eq!(root_titles(&app), vec!["a", "b", "c"]);
    assert!(app.tree.bookmarks().all(|b| !b.is_archived()));
    assert_eq!(app.selection.state().selected_item_keys.len(), 3);
}

#[test]
fn test_delete_archived_bookmark_is_permanent() {
    let (mut app, _tmp) = setup();
    app.import_html(FLAT).unwrap();
    let a = app.tree.folder_bookmarks(ROOT_FOLDER_ID)[0].id;
    assert_eq!(app.delete_item(ItemKey::bookmark(a)).unwrap(), "Bookmark moved to archive.");
    assert_eq!(app.delete_item(ItemKey::bookmark(a)).unwrap(), "Bookmark permanently deleted.");
    assert!(!app.tree.has_bookmark(a));
}

#[test]
fn test_delete_folder_archives_contents() {
    let (mut app, _tmp) = setup();
    app.import_html(NESTED).unwrap();
    let x = app.tree.flatten_bookmarks()[0].id;
    let folder_a = app.tree.folder(ROOT_FOLDER_ID).unwrap().folders[0];

    let message = app.delete_item(ItemKey::folder(folder_a)).unwrap();
    assert_eq!(message, "Folder deleted. Archived 1 bookmarks.");
    assert!(!app.tree.has_folder(folder_a));
    let archived = app.tree.bookmark(x).unwrap();
    assert!(archived.is_archived());
    assert_eq!(archived.archived_from_path.as_deref(), Some("Folder A/Folder B"));
}

#[test]
fn test_reserved_folders_cannot_be_deleted() {
    let (mut app, _tmp) = setup();
    for id in [ROOT_FOLDER_ID, ARCHIVE_FOLDER_ID] {
        let err = app.delete_item(ItemKey::folder(id)).unwrap_err();
        assert_eq!(err.to_string(), "Root folder cannot be deleted.");
    }
    assert_eq!(app.undo_depth(), 0);
}

#[test]
fn test_undo_with_empty_history() {
    let (mut app, _tmp) = setup();
    assert_eq!(app.undo().unwrap_err().to_string(), "Nothing to undo.");
}

#[test]
fn test_undo_history_is_bounded() {
    let (mut app, _tmp) = setup();
    for i in 0..UNDO_LIMIT + 3 {
        app.add_item(None, &format!("site{}.com", i)).unwrap();
    }
    assert_eq!(app.undo_depth(), UNDO_LIMIT);
}

// ─── Adding and editing ───

#[test]
fn test_add_url_uses_domain_as_title() {
    let (mut app, _tmp) = setup();
    let message = app.add_item(None, "example.com/path").unwrap();
    assert_eq!(message, "Added bookmark example.com.");
    let bookmark = &app.tree.folder_bookmarks(ROOT_FOLDER_ID)[0];
    assert_eq!(bookmark.url, "https://example.com/path");
}

#[test]
fn test_add_folder_path_and_nested_url() {
    let (mut app, _tmp) = setup();
    assert_eq!(app.add_item(None, "Work/Reading").unwrap(), "Folder created.");
    app.add_item(None, "Work/news.ycombinator.com").unwrap();

    let flat = app.tree.flatten_bookmarks();
    assert_eq!(flat.len(), 1);
    assert_eq!(flat[0].folder_path, "Work");
    assert_eq!(flat[0].title, "news.ycombinator.com");
}

#[test]
fn test_failed_add_records_no_undo_step() {
    let (mut app, _tmp) = setup();
    let err = app.add_item(None, "   ").unwrap_err();
    assert_eq!(err.to_string(), "Enter a URL or folder path.");
    let err = app.add_item(Some(999), "a.com").unwrap_err();
    assert_eq!(err.to_string(), "Select a valid folder first.");
    assert_eq!(app.undo_depth(), 0);
    assert_eq!(app.tree.bookmark_count(), 0);
}

#[test]
fn test_inline_add_targets_chosen_folder() {
    let (mut app, _tmp) = setup();
    app.create_folder("Inbox").unwrap();
    let inbox = app.tree.folder(ROOT_FOLDER_ID).unwrap().folders[0];

    app.start_inline_add(inbox);
    app.set_add_input("rust-lang.org");
    app.submit_inline_add().unwrap();
    assert_eq!(app.pending_input().add_input, "");
    assert_eq!(app.pending_input().inline_add_folder_id, Some(inbox));
    assert_eq!(app.tree.folder(inbox).unwrap().bookmarks.len(), 1);

    app.cancel_inline_add();
    assert_eq!(app.pending_input().inline_add_folder_id, None);
}

#[test]
fn test_bulk_add_counts_and_skips() {
    let (mut app, _tmp) = setup();
    let message = app.bulk_add("a.com\nnot a url\n\nhttps://b.org/x\n").unwrap();
    assert_eq!(message, "Bulk add complete: 2 bookmarks.");
    let notices = texts(&mut app);
    assert!(notices.contains(&"Skipped 1 invalid URL line(s).".to_string()));
    assert_eq!(app.tree.bookmark_count(), 2);
}

#[test]
fn test_bulk_add_without_valid_urls_rolls_back() {
    let (mut app, _tmp) = setup();
    let err = app.bulk_add("nope\nstill nope").unwrap_err();
    assert_eq!(err.to_string(), "No valid URLs were added.");
    assert_eq!(app.undo_depth(), 0);
    assert_eq!(app.bulk_add("   \n").unwrap_err().to_string(), "Paste one URL per line.");
}

#[test]
fn test_create_folder_relative_and_absolute() {
    let (mut app, _tmp) = setup();
    app.create_folder("Parent").unwrap();
    let parent = app.tree.folder(ROOT_FOLDER_ID).unwrap().folders[0];
    app.select_folder(parent);

    app.set_create_folder_path("Child");
    app.submit_create_folder().unwrap();
    assert_eq!(app.tree.folder(parent).unwrap().folders.len(), 1);
    assert_eq!(app.pending_input().create_folder_path, "");

    app.create_folder("Top/Level").unwrap();
    assert_eq!(app.tree.folder(ROOT_FOLDER_ID).unwrap().folders.len(), 2);
}

#[test]
fn test_rename_selected_folder() {
    let (mut app, _tmp) = setup();
    assert_eq!(
        app.rename_selected_folder("New").unwrap_err().to_string(),
        "Root folder cannot be renamed."
    );

    app.create_folder("Old").unwrap();
    let old = app.tree.folder(ROOT_FOLDER_ID).unwrap().folders[0];
    app.select_folder(old);
    assert_eq!(
        app.rename_selected_folder("  ").unwrap_err().to_string(),
        "Folder name cannot be empty."
    );
    assert_eq!(app.rename_selected_folder("Renamed").unwrap(), "Folder renamed.");
    assert_eq!(app.tree.folder(old).unwrap().name, "Renamed");
    assert_eq!(app.selection.state().rename_folder_name, "Renamed");
}

#[test]
fn test_edit_bookmark_validates_input() {
    let (mut app, _tmp) = setup();
    app.add_item(None, "a.com").unwrap();
    let id = app.tree.folder_bookmarks(ROOT_FOLDER_ID)[0].id;

    assert_eq!(
        app.edit_bookmark(id, " ", "b.com").unwrap_err().to_string(),
        "Bookmark title cannot be empty."
    );
    assert_eq!(
        app.edit_bookmark(id, "B", "not a url").unwrap_err().to_string(),
        "Enter a valid URL."
    );
    assert_eq!(
        app.edit_bookmark(999, "B", "b.com").unwrap_err().to_string(),
        "Bookmark not found."
    );
    assert_eq!(app.edit_bookmark(id, "B site", "b.com").unwrap(), "Bookmark updated.");
    let bookmark = app.tree.bookmark(id).unwrap();
    assert_eq!(bookmark.title, "B site");
    assert_eq!(bookmark.url, "https://b.com");
}

// ─── Moving ───

#[test]
fn test_move_folder_into_descendant_rolls_back() {
    let (mut app, _tmp) = setup();
    app.import_html(NESTED).unwrap();
    let folder_a = app.tree.folder(ROOT_FOLDER_ID).unwrap().folders[0];
    let folder_b = app.tree.folder(folder_a).unwrap().folders[0];
    let depth = app.undo_depth();
    let before = app.tree.snapshot();

    let err = app.move_folders(&[folder_a], folder_b).unwrap_err();
    assert_eq!(err.to_string(), "Cannot move folder into itself or its descendant.");
    assert_eq!(app.undo_depth(), depth);
    assert_eq!(app.tree.snapshot(), before);
}

#[test]
fn test_drag_bookmark_onto_folder() {
    let (mut app, _tmp) = setup();
    app.import_html(FLAT).unwrap();
    app.create_folder("Target").unwrap();
    let target = app.tree.folder(ROOT_FOLDER_ID).unwrap().folders[0];
    let a = app.tree.folder_bookmarks(ROOT_FOLDER_ID)[0].id;

    assert_eq!(app.start_drag(ItemKey::bookmark(a)), Some(DragPayload::Bookmarks(vec![a])));
    assert!(app.can_drop_on_folder(target));
    assert!(!app.can_drop_on_folder(ROOT_FOLDER_ID));
    assert_eq!(app.drop_on_folder(target).unwrap(), "Moved bookmark to Target.");
    assert_eq!(app.tree.bookmark(a).unwrap().parent_folder_id, target);
}

#[test]
fn test_drag_root_is_refused() {
    let (mut app, _tmp) = setup();
    assert_eq!(app.start_drag(ItemKey::folder(ROOT_FOLDER_ID)), None);
    assert_eq!(
        app.drop_on_folder(ROOT_FOLDER_ID).unwrap_err().to_string(),
        "Invalid drop target."
    );
}

#[test]
fn test_drop_bookmark_on_bookmark_creates_folder() {
    let (mut app, _tmp) = setup();
    app.import_html(FLAT).unwrap();
    let ids: Vec<i64> = app.tree.folder_bookmarks(ROOT_FOLDER_ID).iter().map(|b| b.id).collect();

    app.start_drag(ItemKey::bookmark(ids[0]));
    assert!(app.can_drop_on_bookmark(ids[1]));
    assert!(!app.can_drop_on_bookmark(ids[0]));
    let message = app.drop_on_bookmark(ids[1]).unwrap();
    assert_eq!(message, "Created Folder 1 with 2 bookmarks.");

    let folder = app.tree.folder(ROOT_FOLDER_ID).unwrap().folders[0];
    assert_eq!(app.tree.folder(folder).unwrap().bookmarks.len(), 2);
    assert_eq!(app.selection.state().selected_folder_id, folder);
    assert!(app.selection.is_key_selected(ItemKey::folder(folder)));

    app.undo().unwrap();
    assert_eq!(root_titles(&app).len(), 3);
    assert!(app.tree.folder(ROOT_FOLDER_ID).unwrap().folders.is_empty());
}

// ─── Duplicate policy ───

#[test]
fn test_duplicates_detected_but_kept_by_default() {
    let (mut app, _tmp) = setup();
    app.import_html(r#"<DL><DT><A HREF="https://a.com">A</A><DT><A HREF="https://a.com/">A slash</A></DL>"#)
        .unwrap();
    assert_eq!(app.tree.active_bookmark_count(), 2);
    let notices = app.drain_notices();
    assert!(notices
        .iter()
        .any(|n| n.level == NoticeLevel::Error && n.text == "Detected 1 duplicate bookmarks."));
}

#[test]
fn test_duplicates_archived_with_auto_delete() {
    let (mut app, _tmp) = setup();
    app.update_settings(&json!({"duplicateAutoDeleteEnabled": true})).unwrap();
    app.import_html(r#"<DL><DT><A HREF="https://a.com">A</A><DT><A HREF="https://a.com/">A slash</A></DL>"#)
        .unwrap();

    assert_eq!(app.tree.active_bookmark_count(), 1);
    let archived: Vec<_> = app.tree.bookmarks().filter(|b| b.is_archived()).collect();
    assert_eq!(archived.len(), 1);
    assert_eq!(archived[0].url, "https://a.com/");
    assert_eq!(archived[0].archived_from_path.as_deref(), Some(""));
    assert!(texts(&mut app).contains(&"Archived 1 duplicate bookmarks.".to_string()));
}

#[test]
fn test_enabling_auto_delete_cleans_existing_tree() {
    let (mut app, _tmp) = setup();
    app.add_item(None, "a.com").unwrap();
    app.add_item(None, "https://a.com/").unwrap();
    assert_eq!(app.tree.active_bookmark_count(), 2);

    app.update_settings(&json!({"duplicateAutoDeleteEnabled": true})).unwrap();
    assert_eq!(app.tree.active_bookmark_count(), 1);
}

// ─── Keyboard and settings ───

#[test]
fn test_shortcut_keys_resolve_to_actions() {
    let (mut app, _tmp) = setup();
    assert_eq!(app.handle_key(&KeyChord::plain("n")), KeyOutcome::Requested(ShortcutAction::Add));
    assert_eq!(app.handle_key(&KeyChord::plain("B")), KeyOutcome::Requested(ShortcutAction::BulkAdd));
    assert_eq!(app.handle_key(&KeyChord::plain("q")), KeyOutcome::Ignored);
    let ctrl_f = KeyChord { ctrl: true, ..KeyChord::plain("f") };
    assert_eq!(app.handle_key(&ctrl_f), KeyOutcome::Requested(ShortcutAction::Search));
}

#[test]
fn test_delete_and_undo_keys() {
    let (mut app, _tmp) = setup();
    app.import_html(FLAT).unwrap();
    let columns = app.columns();
    app.click(0, columns[0].items[0].key(), ClickModifiers::default());

    assert_eq!(app.handle_key(&KeyChord::plain("Backspace")), KeyOutcome::Handled);
    assert_eq!(app.tree.active_bookmark_count(), 2);

    let cmd_z = KeyChord { cmd: true, ..KeyChord::plain("z") };
    assert_eq!(app.handle_key(&cmd_z), KeyOutcome::Handled);
    assert_eq!(app.tree.active_bookmark_count(), 3);
}

#[test]
fn test_arrow_keys_move_selection() {
    let (mut app, _tmp) = setup();
    app.import_html(FLAT).unwrap();
    let columns = app.columns();
    let first = columns[0].items[0].key();
    let second = columns[0].items[1].key();
    app.click(0, first, ClickModifiers::default());

    assert_eq!(app.handle_key(&KeyChord::plain("ArrowDown")), KeyOutcome::Handled);
    assert_eq!(app.selection.state().selected_entry, Some(second));
    assert_eq!(second.kind, ItemKind::Bookmark);
}

#[test]
fn test_conflicting_shortcut_is_rejected() {
    let (mut app, _tmp) = setup();
    let err = app.update_settings(&json!({"shortcuts": {"search": "N"}})).unwrap_err();
    assert!(err.to_string().contains("Shortcut conflict"));
    assert_eq!(app.settings().shortcuts.search, "f");
}

#[test]
fn test_stored_settings_blob_drives_new_app() {
    let stored = settings_from_str(r#"{"defaultFolderDisplayMode":"bottom"}"#).unwrap();
    let mut app = BookmarkApp::new(stored);
    app.add_item(None, "Folder").unwrap();
    app.add_item(None, "a.com").unwrap();
    let columns = app.columns();
    assert_eq!(columns[0].items[0].kind, ItemKind::Bookmark);
}

// ─── Preview ───

#[test]
fn test_preview_follows_selected_bookmark() {
    let (mut app, _tmp) = setup();
    app.import_html(FLAT).unwrap();
    let ids: Vec<i64> = app.tree.folder_bookmarks(ROOT_FOLDER_ID).iter().map(|b| b.id).collect();

    app.select_bookmark(ids[0]);
    let first = app.take_preview_request().unwrap();
    assert_eq!(first.url, "https://a.com");
    assert!(app.preview_state().loading);

    app.select_bookmark(ids[1]);
    let second = app.take_preview_request().unwrap();
    assert!(!app.complete_preview(first.token, Err(PreviewError::Timeout)));

    let payload = PreviewPayload {
        image_url: Some("https://b.com/og.png".to_string()),
        fallback_image_urls: Some(vec!["https://b.com/favicon.ico".to_string()]),
        error: None,
    };
    assert!(app.complete_preview(second.token, Ok(payload)));
    assert_eq!(app.preview_state().image_url, "https://b.com/og.png");

    app.on_preview_image_error();
    assert_eq!(app.preview_state().image_url, "https://b.com/favicon.ico");
    app.on_preview_image_error();
    assert_eq!(app.preview_state().error, "No preview available");

    app.select_folder(ROOT_FOLDER_ID);
    assert_eq!(app.preview_state().url, "");
    assert!(app.take_preview_request().is_none());
}
