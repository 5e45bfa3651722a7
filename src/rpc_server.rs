//! Bookmark Cowboy RPC Server: JSON-RPC over stdin/stdout for a desktop shell.
//!
//! Protocol: one JSON object per line (newline-delimited JSON).
//! Request:  {"id":1, "method":"tree.import", "params":{"html":"..."}}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":"..."}
//!
//! Logs go to stderr so stdout carries protocol lines only.
//!
//! Settings live in the JSON file named by `BOOKMARK_COWBOY_SETTINGS`. The
//! server reads it at startup and rewrites it after every accepted
//! `settings.*` call. Without the variable, settings last for the session.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use bookmark_cowboy::app::BookmarkApp;
use bookmark_cowboy::rpc_handler::handle_method;
use bookmark_cowboy::services::settings_engine::{settings_from_str, settings_to_blob};
use bookmark_cowboy::types::settings::AppSettings;

use serde_json::{json, Value};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// A missing or unreadable file yields defaults.
fn load_settings(path: &Path) -> AppSettings {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return AppSettings::default(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read settings, using defaults");
            return AppSettings::default();
        }
    };
    settings_from_str(&raw).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "failed to parse settings, using defaults");
        AppSettings::default()
    })
}

fn save_settings(path: &Path, settings: &AppSettings) -> io::Result<()> {
    let blob = settings_to_blob(settings).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
    let text = serde_json::to_string_pretty(&blob)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, text)?;
    debug!(path = %path.display(), "saved settings");
    Ok(())
}

fn persist(app: &Mutex<BookmarkApp>, path: Option<&Path>) {
    let Some(path) = path else { return };
    let settings = match app.lock() {
        Ok(a) => a.settings().clone(),
        Err(e) => {
            warn!(error = %e, "app lock poisoned, settings not saved");
            return;
        }
    };
    if let Err(e) = save_settings(path, &settings) {
        warn!(path = %path.display(), error = %e, "failed to save settings");
    }
}

fn send(line: &Value) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", line)?;
    stdout.flush()
}

fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let settings_path = std::env::var_os("BOOKMARK_COWBOY_SETTINGS").map(PathBuf::from);
    let settings = settings_path.as_deref().map(load_settings).unwrap_or_default();
    let app = Mutex::new(BookmarkApp::new(settings));

    send(&json!({"event":"ready","version":env!("CARGO_PKG_VERSION")}))?;
    info!("rpc server ready");

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(_) => break,
        };
        if line.trim().is_empty() { continue; }

        let req: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "malformed request");
                send(&json!({"id":null,"error":format!("parse error: {}",e)}))?;
                continue;
            }
        };

        let id = req.get("id").cloned().unwrap_or(Value::Null);

        let method = req.get("method").and_then(|v| v.as_str()).unwrap_or("");
        let params = req.get("params").cloned().unwrap_or(json!({}));

        let response = match handle_method(&app, method, &params) {
            Ok(val) => {
                if method.starts_with("settings.") && method != "settings.get" {
                    persist(&app, settings_path.as_deref());
                }
                json!({"id": id, "result": val})
            }
            Err(err) => json!({"id": id, "error": err}),
        };
        send(&response)?;
    }
    Ok(())
}
