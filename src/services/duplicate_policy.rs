//! Duplicate Policy Engine.
//!
//! Groups active bookmarks by their normalized URL. Within a group the lowest
//! id is kept; the others are duplicates that get archived when auto-delete is
//! on, or merely reported otherwise.

use std::collections::HashMap;

use tracing::info;

use crate::managers::tree_store::{TreeStore, TreeStoreTrait};
use crate::services::url_tools::normalize_url_for_dedup;
use crate::types::bookmark::BookmarkId;

/// Trait defining duplicate detection and enforcement.
pub trait DuplicatePolicyTrait {
    fn scan(&self, store: &TreeStore) -> Vec<BookmarkId>;
    fn enforce(&self, store: &mut TreeStore, auto_delete: bool) -> DuplicateOutcome;
}

/// What one enforcement pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateOutcome {
    /// No duplicates among active bookmarks.
    Clean,
    /// Duplicates were found and left in place.
    Detected(usize),
    /// Duplicates were moved to the archive.
    Archived(usize),
}

impl DuplicateOutcome {
    /// User-facing summary, `None` when there was nothing to report.
    pub fn message(&self) -> Option<String> {
        match self {
            DuplicateOutcome::Clean => None,
            DuplicateOutcome::Detected(n) => Some(format!("Detected {} duplicate bookmarks.", n)),
            DuplicateOutcome::Archived(n) => Some(format!("Archived {} duplicate bookmarks.", n)),
        }
    }
}

/// Stateless engine; the policy toggle is passed per call.
#[derive(Debug, Clone, Copy, Default)]
pub struct DuplicatePolicyEngine;

impl DuplicatePolicyEngine {
    pub fn new() -> Self {
        Self
    }
}

impl DuplicatePolicyTrait for DuplicatePolicyEngine {
    /// Duplicate ids in ascending order. Archived bookmarks are never
    /// considered, which makes enforcement idempotent.
    fn scan(&self, store: &TreeStore) -> Vec<BookmarkId> {
        let mut groups: HashMap<String, Vec<BookmarkId>> = HashMap::new();
        for bookmark in store.bookmarks().filter(|b| !b.is_archived()) {
            groups
                .entry(normalize_url_for_dedup(&bookmark.url))
                .or_default()
                .push(bookmark.id);
        }

        let mut duplicates: Vec<BookmarkId> = groups
            .into_values()
            .filter(|ids| ids.len() > 1)
            .flat_map(|mut ids| {
                ids.sort_unstable();
                ids.into_iter().skip(1)
            })
            .collect();
        duplicates.sort_unstable();
        duplicates
    }

    fn enforce(&self, store: &mut TreeStore, auto_delete: bool) -> DuplicateOutcome {
        let duplicates = self.scan(store);
        if duplicates.is_empty() {
            return DuplicateOutcome::Clean;
        }
        if !auto_delete {
            info!(count = duplicates.len(), "detected duplicate bookmarks");
            return DuplicateOutcome::Detected(duplicates.len());
        }

        let archived = duplicates
            .iter()
            .filter(|id| store.archive_bookmark(**id))
            .count();
        info!(count = archived, "archived duplicate bookmarks");
        DuplicateOutcome::Archived(archived)
    }
}
