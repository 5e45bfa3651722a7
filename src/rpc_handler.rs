//! RPC method handler for the Bookmark Cowboy JSON-RPC protocol.
//!
//! Extracted from `rpc_server.rs` so it can be unit-tested independently.
//! The `handle_method` function dispatches JSON-RPC method calls to the
//! `BookmarkApp` held behind a mutex.

use std::path::Path;
use std::sync::Mutex;

use serde_json::{json, Value};

use crate::app::{BookmarkApp, DragPayload, KeyOutcome};
use crate::services::settings_engine::settings_to_blob;
use crate::services::shortcuts::KeyChord;
use crate::types::errors::PreviewError;
use crate::types::preview::PreviewPayload;
use crate::types::selection::{ClickModifiers, ItemKey, ItemKind, RootTab};
use crate::types::settings::{FolderDisplayMode, SortField};

fn parse_kind(params: &Value) -> Result<ItemKind, String> {
    match params.get("kind").and_then(|v| v.as_str()).ok_or("missing kind")? {
        "folder" => Ok(ItemKind::Folder),
        "bookmark" => Ok(ItemKind::Bookmark),
        other => Err(format!("invalid kind: {}", other)),
    }
}

fn parse_ids(params: &Value) -> Result<Vec<i64>, String> {
    let ids = params.get("ids").and_then(|v| v.as_array()).ok_or("missing ids")?;
    ids.iter()
        .map(|v| v.as_i64().ok_or_else(|| "invalid id".to_string()))
        .collect()
}

/// Dispatch a JSON-RPC method call to the appropriate handler.
///
/// Returns `Ok(Value)` on success or `Err(String)` with an error message.
pub fn handle_method(app: &Mutex<BookmarkApp>, method: &str, params: &Value) -> Result<Value, String> {
    match method {
        "ping" => Ok(json!({"pong": true})),

        // ─── Import / export ───
        "tree.import" => {
            let mut a = app.lock().map_err(|e| e.to_string())?;
            let message = if let Some(html) = params.get("html").and_then(|v| v.as_str()) {
                a.import_html(html)
            } else {
                let path = params.get("path").and_then(|v| v.as_str()).ok_or("missing html or path")?;
                a.import_file(Path::new(path))
            }
            .map_err(|e| e.to_string())?;
            Ok(json!({"message": message, "bookmarks": a.tree.bookmark_count()}))
        }
        "tree.export" => {
            let mut a = app.lock().map_err(|e| e.to_string())?;
            if let Some(path) = params.get("path").and_then(|v| v.as_str()) {
                let count = a.export_file(Path::new(path)).map_err(|e| e.to_string())?;
                return Ok(json!({"path": path, "count": count}));
            }
            let html = a.export_html().map_err(|e| e.to_string())?;
            Ok(json!({"html": html}))
        }
        "tree.stats" => {
            let a = app.lock().map_err(|e| e.to_string())?;
            Ok(json!({
                "folders": a.tree.folder_count(),
                "bookmarks": a.tree.bookmark_count(),
                "active": a.tree.active_bookmark_count(),
                "version": a.tree.version(),
            }))
        }
        "folder.summary" => {
            let id = params.get("id").and_then(|v| v.as_i64()).ok_or("missing id")?;
            let a = app.lock().map_err(|e| e.to_string())?;
            if !a.tree.has_folder(id) {
                return Err(format!("folder not found: {}", id));
            }
            serde_json::to_value(a.tree.folder_summary(id)).map_err(|e| e.to_string())
        }

        // ─── View ───
        "columns.get" => {
            let mut a = app.lock().map_err(|e| e.to_string())?;
            let columns = a.columns();
            serde_json::to_value(columns.as_ref()).map_err(|e| e.to_string())
        }
        "breadcrumbs.get" => {
            let a = app.lock().map_err(|e| e.to_string())?;
            let crumbs: Vec<Value> = a
                .breadcrumbs()
                .iter()
                .map(|f| json!({"id": f.id, "name": f.name}))
                .collect();
            Ok(json!(crumbs))
        }
        "search.set" => {
            let query = params.get("query").and_then(|v| v.as_str()).unwrap_or("");
            let mut a = app.lock().map_err(|e| e.to_string())?;
            a.set_search_query(query);
            Ok(json!({"ok": true}))
        }
        "view.sort" => {
            let field: SortField = serde_json::from_value(params.get("field").cloned().ok_or("missing field")?)
                .map_err(|e| format!("invalid field: {}", e))?;
            let mut a = app.lock().map_err(|e| e.to_string())?;
            Ok(json!({"message": a.set_sort_field(field)}))
        }
        "view.display" => {
            let mode: FolderDisplayMode = serde_json::from_value(params.get("mode").cloned().ok_or("missing mode")?)
                .map_err(|e| format!("invalid mode: {}", e))?;
            let mut a = app.lock().map_err(|e| e.to_string())?;
            Ok(json!({"message": a.set_folder_display_mode(mode)}))
        }

        // ─── Selection ───
        "selection.get" => {
            let a = app.lock().map_err(|e| e.to_string())?;
            serde_json::to_value(a.selection.state()).map_err(|e| e.to_string())
        }
        "selection.click" => {
            let column = params.get("column").and_then(|v| v.as_u64()).ok_or("missing column")? as usize;
            let id = params.get("id").and_then(|v| v.as_i64()).ok_or("missing id")?;
            let kind = parse_kind(params)?;
            let modifiers = ClickModifiers {
                shift: params.get("shift").and_then(|v| v.as_bool()).unwrap_or(false),
                multi: params.get("multi").and_then(|v| v.as_bool()).unwrap_or(false),
            };
            let mut a = app.lock().map_err(|e| e.to_string())?;
            a.click(column, ItemKey { kind, id }, modifiers);
            serde_json::to_value(a.selection.state()).map_err(|e| e.to_string())
        }
        "selection.folder" => {
            let id = params.get("id").and_then(|v| v.as_i64()).ok_or("missing id")?;
            let mut a = app.lock().map_err(|e| e.to_string())?;
            Ok(json!({"ok": a.select_folder(id)}))
        }
        "selection.bookmark" => {
            let id = params.get("id").and_then(|v| v.as_i64()).ok_or("missing id")?;
            let mut a = app.lock().map_err(|e| e.to_string())?;
            Ok(json!({"ok": a.select_bookmark(id)}))
        }
        "selection.tab" => {
            let tab: RootTab = serde_json::from_value(params.get("tab").cloned().ok_or("missing tab")?)
                .map_err(|e| format!("invalid tab: {}", e))?;
            let mut a = app.lock().map_err(|e| e.to_string())?;
            Ok(json!({"switched": a.switch_root_tab(tab)}))
        }
        "selection.key" => {
            let key = params.get("key").and_then(|v| v.as_str()).ok_or("missing key")?;
            let flag = |name: &str| params.get(name).and_then(|v| v.as_bool()).unwrap_or(false);
            let chord = KeyChord {
                key: key.to_string(),
                cmd: flag("cmd"),
                ctrl: flag("ctrl"),
                alt: flag("alt"),
                shift: flag("shift"),
            };
            let mut a = app.lock().map_err(|e| e.to_string())?;
            Ok(match a.handle_key(&chord) {
                KeyOutcome::Ignored => json!({"handled": false}),
                KeyOutcome::Handled => json!({"handled": true}),
                KeyOutcome::Requested(action) => json!({"handled": true, "open": action.as_str()}),
            })
        }

        // ─── Editing ───
        "item.add" => {
            let raw = params.get("raw").and_then(|v| v.as_str()).ok_or("missing raw")?;
            let folder_id = params.get("folderId").and_then(|v| v.as_i64());
            let mut a = app.lock().map_err(|e| e.to_string())?;
            let message = a.add_item(folder_id, raw).map_err(|e| e.to_string())?;
            Ok(json!({"message": message}))
        }
        "item.bulkAdd" => {
            let text = params.get("text").and_then(|v| v.as_str()).ok_or("missing text")?;
            let mut a = app.lock().map_err(|e| e.to_string())?;
            let message = a.bulk_add(text).map_err(|e| e.to_string())?;
            Ok(json!({"message": message}))
        }
        "folder.create" => {
            let path = params.get("path").and_then(|v| v.as_str()).ok_or("missing path")?;
            let mut a = app.lock().map_err(|e| e.to_string())?;
            let message = a.create_folder(path).map_err(|e| e.to_string())?;
            Ok(json!({"message": message}))
        }
        "folder.rename" => {
            let name = params.get("name").and_then(|v| v.as_str()).ok_or("missing name")?;
            let mut a = app.lock().map_err(|e| e.to_string())?;
            let message = a.rename_selected_folder(name).map_err(|e| e.to_string())?;
            Ok(json!({"message": message}))
        }
        "bookmark.edit" => {
            let id = params.get("id").and_then(|v| v.as_i64()).ok_or("missing id")?;
            let title = params.get("title").and_then(|v| v.as_str()).ok_or("missing title")?;
            let url = params.get("url").and_then(|v| v.as_str()).ok_or("missing url")?;
            let mut a = app.lock().map_err(|e| e.to_string())?;
            let message = a.edit_bookmark(id, title, url).map_err(|e| e.to_string())?;
            Ok(json!({"message": message}))
        }
        "items.move" => {
            let target = params.get("target").and_then(|v| v.as_i64()).ok_or("missing target")?;
            let ids = parse_ids(params)?;
            let kind = parse_kind(params)?;
            let mut a = app.lock().map_err(|e| e.to_string())?;
            let message = match kind {
                ItemKind::Bookmark => a.move_bookmarks(&ids, target),
                ItemKind::Folder => a.move_folders(&ids, target),
            }
            .map_err(|e| e.to_string())?;
            Ok(json!({"message": message}))
        }
        "drag.start" => {
            let id = params.get("id").and_then(|v| v.as_i64()).ok_or("missing id")?;
            let kind = parse_kind(params)?;
            let mut a = app.lock().map_err(|e| e.to_string())?;
            Ok(match a.start_drag(ItemKey { kind, id }) {
                Some(DragPayload::Bookmarks(ids)) => json!({"kind": "bookmark", "ids": ids}),
                Some(DragPayload::Folders(ids)) => json!({"kind": "folder", "ids": ids}),
                None => json!({"ids": []}),
            })
        }
        "drag.drop" => {
            let target = params.get("target").and_then(|v| v.as_i64()).ok_or("missing target")?;
            let kind = parse_kind(params)?;
            let mut a = app.lock().map_err(|e| e.to_string())?;
            let message = match kind {
                ItemKind::Folder => a.drop_on_folder(target),
                ItemKind::Bookmark => a.drop_on_bookmark(target),
            }
            .map_err(|e| e.to_string())?;
            Ok(json!({"message": message}))
        }
        "drag.cancel" => {
            let mut a = app.lock().map_err(|e| e.to_string())?;
            a.cancel_drag();
            Ok(json!({"ok": true}))
        }
        "items.delete" => {
            let mut a = app.lock().map_err(|e| e.to_string())?;
            let message = a.delete_selected().map_err(|e| e.to_string())?;
            Ok(json!({"message": message}))
        }
        "item.delete" => {
            let id = params.get("id").and_then(|v| v.as_i64()).ok_or("missing id")?;
            let kind = parse_kind(params)?;
            let mut a = app.lock().map_err(|e| e.to_string())?;
            let message = a.delete_item(ItemKey { kind, id }).map_err(|e| e.to_string())?;
            Ok(json!({"message": message}))
        }
        "undo" => {
            let mut a = app.lock().map_err(|e| e.to_string())?;
            let message = a.undo().map_err(|e| e.to_string())?;
            Ok(json!({"message": message}))
        }

        // ─── Settings ───
        "settings.get" => {
            let a = app.lock().map_err(|e| e.to_string())?;
            settings_to_blob(a.settings()).map_err(|e| e.to_string())
        }
        "settings.update" => {
            let mut a = app.lock().map_err(|e| e.to_string())?;
            a.update_settings(params).map_err(|e| e.to_string())?;
            settings_to_blob(a.settings()).map_err(|e| e.to_string())
        }

        // ─── Preview ───
        "preview.take" => {
            let mut a = app.lock().map_err(|e| e.to_string())?;
            serde_json::to_value(a.take_preview_request()).map_err(|e| e.to_string())
        }
        "preview.complete" => {
            let token = params.get("token").and_then(|v| v.as_u64()).ok_or("missing token")?;
            let result = match params.get("error").and_then(|v| v.as_str()) {
                Some(error) => Err(PreviewError::Failed(error.to_string())),
                None => {
                    let payload: PreviewPayload =
                        serde_json::from_value(params.get("payload").cloned().unwrap_or(json!({})))
                            .map_err(|e| format!("invalid payload: {}", e))?;
                    Ok(payload)
                }
            };
            let mut a = app.lock().map_err(|e| e.to_string())?;
            let applied = a.complete_preview(token, result);
            Ok(json!({"applied": applied, "state": a.preview_state()}))
        }
        "preview.imageError" => {
            let mut a = app.lock().map_err(|e| e.to_string())?;
            a.on_preview_image_error();
            serde_json::to_value(a.preview_state()).map_err(|e| e.to_string())
        }
        "preview.imageLoaded" => {
            let mut a = app.lock().map_err(|e| e.to_string())?;
            a.on_preview_image_loaded();
            serde_json::to_value(a.preview_state()).map_err(|e| e.to_string())
        }

        // ─── Notices ───
        "notices.drain" => {
            let mut a = app.lock().map_err(|e| e.to_string())?;
            serde_json::to_value(a.drain_notices()).map_err(|e| e.to_string())
        }

        _ => Err(format!("unknown method: {}", method)),
    }
}
