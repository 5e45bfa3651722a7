//! Fuzzy search and ordering helpers.

use std::cmp::Ordering;

use crate::services::url_tools::domain_from_url;
use crate::types::bookmark::BookmarkItem;
use crate::types::settings::SortField;

/// Case-insensitive subsequence match. An empty needle matches everything.
pub fn fuzzy_match(needle: &str, haystack: &str) -> bool {
    let needle = needle.to_lowercase();
    if needle.is_empty() {
        return true;
    }
    let mut wanted = needle.chars().peekable();
    for c in haystack.to_lowercase().chars() {
        if wanted.peek() == Some(&c) {
            wanted.next();
            if wanted.peek().is_none() {
                return true;
            }
        }
    }
    wanted.peek().is_none()
}

/// Whether a bookmark matches the (trimmed) query on title, url or domain.
pub fn bookmark_matches_query(bookmark: &BookmarkItem, query: &str) -> bool {
    let query = query.trim();
    if query.is_empty() {
        return true;
    }
    fuzzy_match(query, &bookmark.title)
        || fuzzy_match(query, &bookmark.url)
        || fuzzy_match(query, &domain_from_url(&bookmark.url))
}

/// Case-insensitive text ordering, ties broken by the exact text.
pub fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Orders two bookmarks by the given field.
pub fn compare_bookmarks(a: &BookmarkItem, b: &BookmarkItem, field: SortField) -> Ordering {
    match field {
        SortField::Title => compare_text(&a.title, &b.title),
        SortField::Url => compare_text(&a.url, &b.url),
        SortField::Domain => compare_text(&domain_from_url(&a.url), &domain_from_url(&b.url)),
    }
}
