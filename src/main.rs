//! Bookmark Cowboy command-line front end.
//!
//! Imports a Netscape bookmark file and writes it back in canonical form.
//!
//! Usage: `bookmark-cowboy <input.html> [output.html] [--dedupe]`
//!
//! Without an output path the canonical file is printed to stdout. With
//! `--dedupe`, URL duplicates are moved to the archive, which the export
//! leaves out.

use std::path::Path;
use std::process::ExitCode;

use bookmark_cowboy::app::BookmarkApp;
use bookmark_cowboy::services::duplicate_policy::{DuplicatePolicyEngine, DuplicatePolicyTrait};
use bookmark_cowboy::types::settings::AppSettings;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn section(name: &str) {
    eprintln!("───────────────────────────────────────────────────────────────");
    eprintln!("  {}", name);
    eprintln!("───────────────────────────────────────────────────────────────");
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let dedupe = args.iter().any(|a| a == "--dedupe");
    let paths: Vec<&String> = args.iter().filter(|a| !a.starts_with("--")).collect();
    let Some(input) = paths.first() else {
        eprintln!("usage: bookmark-cowboy <input.html> [output.html] [--dedupe]");
        return ExitCode::from(2);
    };

    let mut app = BookmarkApp::new(AppSettings::default());
    if let Err(e) = app.import_file(Path::new(input.as_str())) {
        error!(error = %e, "import failed");
        return ExitCode::FAILURE;
    }

    if dedupe {
        let outcome = DuplicatePolicyEngine::new().enforce(&mut app.tree, true);
        if let Some(message) = outcome.message() {
            eprintln!("  {}", message);
        }
    }

    section(&format!("Bookmark Cowboy v{}", env!("CARGO_PKG_VERSION")));
    for notice in app.drain_notices() {
        eprintln!("  {}", notice.text);
    }
    eprintln!(
        "  {} folders, {} bookmarks ({} archived)",
        app.tree.folder_count(),
        app.tree.bookmark_count(),
        app.tree.bookmark_count() - app.tree.active_bookmark_count()
    );

    let result = match paths.get(1) {
        Some(output) => app
            .export_file(Path::new(output.as_str()))
            .map(|count| eprintln!("  Wrote {} bookmarks to {}", count, output)),
        None => app.export_html().map(|html| print!("{}", html)),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "export failed");
            ExitCode::FAILURE
        }
    }
}
