use std::fmt;

use super::bookmark::{BookmarkId, FolderId};

// === TreeError ===

/// Errors raised by structural operations on the bookmark tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeError {
    /// Input failed validation (empty name, empty url, invalid path).
    Validation(String),
    /// Moving the folder would place it inside itself or one of its descendants.
    Cycle {
        folder_id: FolderId,
        target_folder_id: FolderId,
    },
    /// Root and archive cannot be moved, renamed or deleted.
    ProtectedFolder(FolderId),
    /// The archive only receives bookmarks through the archive operation.
    ArchiveTarget,
    /// The folder was not found.
    FolderNotFound(FolderId),
    /// The bookmark was not found.
    BookmarkNotFound(BookmarkId),
    /// The tree indices disagree with the tree structure.
    Corrupted(String),
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeError::Validation(msg) => write!(f, "{}", msg),
            TreeError::Cycle { .. } => {
                write!(f, "Cannot move folder into itself or its descendant.")
            }
            TreeError::ProtectedFolder(id) => {
                write!(f, "Folder {} is reserved and cannot be changed", id)
            }
            TreeError::ArchiveTarget => write!(f, "Cannot create folders in Archive"),
            TreeError::FolderNotFound(id) => write!(f, "Folder not found: {}", id),
            TreeError::BookmarkNotFound(id) => write!(f, "Bookmark not found: {}", id),
            TreeError::Corrupted(msg) => write!(f, "Bookmark tree corrupted: {}", msg),
        }
    }
}

impl std::error::Error for TreeError {}

// === CodecError ===

/// Errors at the import/export I/O boundary. Parsing itself never fails.
#[derive(Debug)]
pub enum CodecError {
    /// Reading or writing the bookmark file failed.
    IoError(String),
    /// The file contained no usable bookmarks.
    Empty,
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::IoError(msg) => write!(f, "Bookmark file I/O error: {}", msg),
            CodecError::Empty => write!(f, "There are no bookmarks to export"),
        }
    }
}

impl std::error::Error for CodecError {}

// === UndoError ===

/// Errors related to the undo stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoError {
    /// The stack is empty.
    NothingToUndo,
}

impl fmt::Display for UndoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UndoError::NothingToUndo => write!(f, "Nothing to undo."),
        }
    }
}

impl std::error::Error for UndoError {}

// === SettingsError ===

/// Errors related to settings management.
#[derive(Debug)]
pub enum SettingsError {
    /// The settings blob could not be read or written as JSON.
    SerializationError(String),
    /// The provided settings key is invalid.
    InvalidKey(String),
    /// The provided settings value is invalid.
    InvalidValue(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::SerializationError(msg) => {
                write!(f, "Settings serialization error: {}", msg)
            }
            SettingsError::InvalidKey(key) => write!(f, "Invalid settings key: {}", key),
            SettingsError::InvalidValue(msg) => {
                write!(f, "Invalid settings value: {}", msg)
            }
        }
    }
}

impl std::error::Error for SettingsError {}

// === ShortcutError ===

/// Errors related to keyboard shortcut bindings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShortcutError {
    /// Two actions are bound to the same key.
    Conflict {
        first: String,
        second: String,
        key: String,
    },
}

impl fmt::Display for ShortcutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShortcutError::Conflict { first, second, key } => write!(
                f,
                "Shortcut conflict: {} and {} both use \"{}\".",
                first, second, key
            ),
        }
    }
}

impl std::error::Error for ShortcutError {}

// === PreviewError ===

/// Errors reported by the preview collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewError {
    /// The request was superseded by a newer one.
    Stale,
    /// The request did not finish in time.
    Timeout,
    /// The service reported a failure.
    Failed(String),
}

impl fmt::Display for PreviewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreviewError::Stale => write!(f, "Stale preview request"),
            PreviewError::Timeout => write!(f, "Preview request timed out"),
            PreviewError::Failed(msg) => write!(f, "Preview request failed: {}", msg),
        }
    }
}

impl std::error::Error for PreviewError {}

// === ActionError ===

/// Errors surfaced by top-level user actions.
#[derive(Debug)]
pub enum ActionError {
    /// The request was rejected by input validation.
    Validation(String),
    /// A tree operation failed.
    Tree(TreeError),
    /// Import or export failed.
    Codec(CodecError),
    /// Undo failed.
    Undo(UndoError),
    /// Settings could not be applied.
    Settings(String),
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionError::Validation(msg) => write!(f, "{}", msg),
            ActionError::Tree(e) => write!(f, "{}", e),
            ActionError::Codec(e) => write!(f, "{}", e),
            ActionError::Undo(e) => write!(f, "{}", e),
            ActionError::Settings(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for ActionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ActionError::Tree(e) => Some(e),
            ActionError::Codec(e) => Some(e),
            ActionError::Undo(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TreeError> for ActionError {
    fn from(e: TreeError) -> Self {
        ActionError::Tree(e)
    }
}

impl From<CodecError> for ActionError {
    fn from(e: CodecError) -> Self {
        ActionError::Codec(e)
    }
}

impl From<UndoError> for ActionError {
    fn from(e: UndoError) -> Self {
        ActionError::Undo(e)
    }
}
