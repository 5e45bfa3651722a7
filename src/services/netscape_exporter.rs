//! Netscape Bookmark File writer.
//!
//! Produces the canonical form: fixed boilerplate, two-space indentation,
//! sibling folders ordered case-insensitively, bookmarks in the given order.

use std::collections::HashMap;

use tracing::debug;

use crate::types::bookmark::ExportBookmark;

const HEADER: [&str; 8] = [
    "<!DOCTYPE NETSCAPE-Bookmark-file-1>",
    "<!-- This is an automatically generated file.",
    "     It will be read and overwritten.",
    "     DO NOT EDIT! -->",
    "<META HTTP-EQUIV=\"Content-Type\" CONTENT=\"text/html; charset=UTF-8\">",
    "<TITLE>Bookmarks</TITLE>",
    "<H1>Bookmarks</H1>",
    "<DL><p>",
];

#[derive(Default)]
struct FolderNode<'a> {
    folders: HashMap<String, FolderNode<'a>>,
    bookmarks: Vec<&'a ExportBookmark>,
}

/// Escapes `&`, `<`, `>` and `"`. Ampersands go first so entities are not
/// double-escaped.
pub fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Splits a `/`-joined folder path into trimmed, non-empty segments.
pub fn split_folder_path(path: &str) -> Vec<String> {
    path.split('/')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// Serializes flat bookmark records into a Netscape bookmark document.
/// The output always ends with a newline.
pub fn build_bookmarks_html(bookmarks: &[ExportBookmark]) -> String {
    let mut root = FolderNode::default();
    for bookmark in bookmarks {
        let mut current = &mut root;
        for part in split_folder_path(&bookmark.folder_path) {
            current = current.folders.entry(part).or_default();
        }
        current.bookmarks.push(bookmark);
    }

    let mut lines: Vec<String> = HEADER.iter().map(|line| line.to_string()).collect();
    render_node(None, &root, 1, &mut lines);
    lines.push("</DL><p>".to_string());
    debug!(count = bookmarks.len(), "serialized bookmarks");

    let mut html = lines.join("\n");
    html.push('\n');
    html
}

fn indent(level: usize) -> String {
    "  ".repeat(level)
}

fn render_node(name: Option<&str>, node: &FolderNode<'_>, level: usize, lines: &mut Vec<String>) {
    let mut level = level;
    if let Some(name) = name {
        lines.push(format!("{}<DT><H3>{}</H3>", indent(level), escape_html(name)));
        lines.push(format!("{}<DL><p>", indent(level)));
        level += 1;
    }

    let mut names: Vec<&String> = node.folders.keys().collect();
    names.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b)));
    for folder_name in names {
        if let Some(child) = node.folders.get(folder_name) {
            render_node(Some(folder_name), child, level, lines);
        }
    }

    for bookmark in &node.bookmarks {
        let add_date = bookmark
            .add_date
            .as_deref()
            .filter(|date| !date.is_empty())
            .map(|date| format!(" ADD_DATE=\"{}\"", escape_html(date)))
            .unwrap_or_default();
        lines.push(format!(
            "{}<DT><A HREF=\"{}\"{}>{}</A>",
            indent(level),
            escape_html(&bookmark.url),
            add_date,
            escape_html(&bookmark.title)
        ));
    }

    if name.is_some() {
        lines.push(format!("{}</DL><p>", indent(level - 1)));
    }
}
