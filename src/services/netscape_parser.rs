//! Netscape Bookmark File parser.
//!
//! Walks nested `<DL>` lists and attributes every `<A>` to the folder named by
//! the nearest enclosing `<H3>`. Both exporter dialects are understood: the
//! folder's `<DL>` may nest inside its `<DT>` or directly follow it. A `<DD>`
//! description between the heading and the list is skipped over, including
//! when the tree builder has pulled the list inside the `<DD>`.

use std::collections::HashSet;

use tracing::debug;

use crate::services::markup::{DomNode, MarkupNode};
use crate::types::bookmark::RawBookmark;

/// Parses bookmark HTML into flat records in document order.
///
/// Never fails: markup without any `<DL>` falls back to collecting every
/// anchor at the top level.
pub fn parse_bookmarks(html: &str) -> Vec<RawBookmark> {
    let document = DomNode::parse_document(html);
    parse_document(&document)
}

/// Same as [`parse_bookmarks`] for an already parsed document.
pub fn parse_document<N: MarkupNode>(document: &N) -> Vec<RawBookmark> {
    let mut root_lists = Vec::new();
    collect_outermost(document, "dl", &mut root_lists);

    let mut parsed = Vec::new();
    if !root_lists.is_empty() {
        for list in &root_lists {
            parse_list(list, &[], &mut parsed);
        }
        debug!(count = parsed.len(), lists = root_lists.len(), "parsed bookmark lists");
        return parsed;
    }

    let mut anchors = Vec::new();
    collect_all(document, "a", &mut anchors);
    parsed.extend(anchors.iter().filter_map(|anchor| anchor_to_raw(anchor, &[])));
    debug!(count = parsed.len(), "no <DL> structure, used flat anchor scan");
    parsed
}

/// Collapses runs of whitespace and trims.
pub fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn parse_list<N: MarkupNode>(list: &N, folder_path: &[String], output: &mut Vec<RawBookmark>) {
    let children = structural_children(list);
    let mut consumed = HashSet::new();

    for (index, child) in children.iter().enumerate() {
        if consumed.contains(&index) {
            continue;
        }
        if child.is_element("dl") {
            parse_list(child, folder_path, output);
            continue;
        }
        if !child.is_element("dt") {
            continue;
        }

        let mut anchors = Vec::new();
        collect_same_level(child, "a", &mut anchors);
        output.extend(anchors.iter().filter_map(|a| anchor_to_raw(a, folder_path)));

        let nested = owned_lists(child);
        let Some(heading) = folder_heading(child) else {
            for nested_list in &nested {
                parse_list(nested_list, folder_path, output);
            }
            continue;
        };

        let mut next_path = folder_path.to_vec();
        next_path.push(heading);
        if !nested.is_empty() {
            for nested_list in &nested {
                parse_list(nested_list, &next_path, output);
            }
            continue;
        }

        let mut next = index + 1;
        while let Some(sibling) = children.get(next) {
            if sibling.is_element("dl") {
                consumed.insert(next);
                parse_list(sibling, &next_path, output);
                break;
            }
            if !sibling.is_element("dd") {
                break;
            }
            consumed.insert(next);
            let described = owned_lists(sibling);
            if !described.is_empty() {
                for nested_list in &described {
                    parse_list(nested_list, &next_path, output);
                }
                break;
            }
            next += 1;
        }
    }
}

/// Element children with `<p>` wrappers flattened away.
fn structural_children<N: MarkupNode>(node: &N) -> Vec<N> {
    let mut out = Vec::new();
    for child in node.element_children() {
        if child.is_element("p") {
            out.extend(structural_children(&child));
        } else {
            out.push(child);
        }
    }
    out
}

/// First non-empty `<H3>` of the `<DT>` whose nearest `<DL>` is the current list.
fn folder_heading<N: MarkupNode>(dt: &N) -> Option<String> {
    let mut headings = Vec::new();
    collect_same_level(dt, "h3", &mut headings);
    headings
        .iter()
        .map(|h| collapse_whitespace(&h.text_content()))
        .find(|name| !name.is_empty())
}

/// `<DL>` descendants of `dt` with no other `<DT>` in between.
fn owned_lists<N: MarkupNode>(dt: &N) -> Vec<N> {
    let mut out = Vec::new();
    for child in dt.element_children() {
        collect_owned_lists(&child, &mut out);
    }
    out
}

fn collect_owned_lists<N: MarkupNode>(node: &N, out: &mut Vec<N>) {
    if node.is_element("dt") {
        return;
    }
    if node.is_element("dl") {
        out.push(node.clone());
        return;
    }
    for child in node.element_children() {
        collect_owned_lists(&child, out);
    }
}

/// Descendants tagged `tag` that are not inside a nested `<DL>`.
fn collect_same_level<N: MarkupNode>(node: &N, tag: &str, out: &mut Vec<N>) {
    for child in node.element_children() {
        if child.is_element("dl") {
            continue;
        }
        if child.is_element(tag) {
            out.push(child.clone());
        }
        collect_same_level(&child, tag, out);
    }
}

/// Outermost descendants tagged `tag`; matches are not searched further.
fn collect_outermost<N: MarkupNode>(node: &N, tag: &str, out: &mut Vec<N>) {
    for child in node.element_children() {
        if child.is_element(tag) {
            out.push(child);
        } else {
            collect_outermost(&child, tag, out);
        }
    }
}

fn collect_all<N: MarkupNode>(node: &N, tag: &str, out: &mut Vec<N>) {
    for child in node.element_children() {
        if child.is_element(tag) {
            out.push(child.clone());
        }
        collect_all(&child, tag, out);
    }
}

fn anchor_to_raw<N: MarkupNode>(anchor: &N, folder_path: &[String]) -> Option<RawBookmark> {
    let title = collapse_whitespace(&anchor.text_content());
    let url = anchor.attribute("href").unwrap_or_default().trim().to_string();
    if title.is_empty() || url.is_empty() {
        return None;
    }
    let add_date = anchor.attribute("add_date").filter(|d| !d.is_empty());
    Some(RawBookmark {
        title,
        url,
        add_date,
        folder_path_segments: folder_path.to_vec(),
    })
}
