//! Undo Stack.
//!
//! Bounded history of labelled snapshots captured before each mutating user
//! action. When full, recording drops the oldest entry. There is no redo.

use std::collections::VecDeque;

use tracing::debug;

use crate::types::errors::UndoError;

/// Maximum number of undo steps kept.
pub const UNDO_LIMIT: usize = 10;

/// Trait defining undo history operations.
pub trait UndoStackTrait<S> {
    fn record(&mut self, label: &str, snapshot: S);
    fn pop(&mut self) -> Result<UndoEntry<S>, UndoError>;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool;
    fn clear(&mut self);
}

/// One recorded step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoEntry<S> {
    pub label: String,
    pub snapshot: S,
}

#[derive(Debug, Clone)]
pub struct UndoStack<S> {
    entries: VecDeque<UndoEntry<S>>,
    limit: usize,
}

impl<S> UndoStack<S> {
    pub fn new() -> Self {
        Self::with_limit(UNDO_LIMIT)
    }

    /// A stack holding at most `limit` entries (at least one).
    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            limit: limit.max(1),
        }
    }

    /// Label of the step `pop` would undo.
    pub fn peek_label(&self) -> Option<&str> {
        self.entries.back().map(|e| e.label.as_str())
    }

    /// Labels oldest first.
    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.label.as_str()).collect()
    }
}

impl<S> Default for UndoStack<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> UndoStackTrait<S> for UndoStack<S> {
    fn record(&mut self, label: &str, snapshot: S) {
        if self.entries.len() == self.limit {
            self.entries.pop_front();
        }
        self.entries.push_back(UndoEntry {
            label: label.to_string(),
            snapshot,
        });
        debug!(label, depth = self.entries.len(), "recorded undo step");
    }

    fn pop(&mut self) -> Result<UndoEntry<S>, UndoError> {
        self.entries.pop_back().ok_or(UndoError::NothingToUndo)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}
