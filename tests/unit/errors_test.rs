use bookmark_cowboy::types::errors::*;

// === TreeError Tests ===

#[test]
fn tree_error_display_variants() {
    assert_eq!(
        TreeError::Validation("Folder name cannot be empty.".to_string()).to_string(),
        "Folder name cannot be empty."
    );
    assert_eq!(
        TreeError::Cycle { folder_id: 3, target_folder_id: 5 }.to_string(),
        "Cannot move folder into itself or its descendant."
    );
    assert_eq!(
        TreeError::ProtectedFolder(0).to_string(),
        "Folder 0 is reserved and cannot be changed"
    );
    assert_eq!(TreeError::ArchiveTarget.to_string(), "Cannot create folders in Archive");
    assert_eq!(TreeError::FolderNotFound(42).to_string(), "Folder not found: 42");
    assert_eq!(TreeError::BookmarkNotFound(7).to_string(), "Bookmark not found: 7");
    assert_eq!(
        TreeError::Corrupted("archive holds subfolders".to_string()).to_string(),
        "Bookmark tree corrupted: archive holds subfolders"
    );
}

#[test]
fn tree_error_implements_error_trait() {
    let err: Box<dyn std::error::Error> = Box::new(TreeError::ArchiveTarget);
    assert!(err.source().is_none());
}

// === CodecError Tests ===

#[test]
fn codec_error_display_variants() {
    assert_eq!(
        CodecError::IoError("permission denied".to_string()).to_string(),
        "Bookmark file I/O error: permission denied"
    );
    assert_eq!(CodecError::Empty.to_string(), "There are no bookmarks to export");
}

// === UndoError Tests ===

#[test]
fn undo_error_display() {
    assert_eq!(UndoError::NothingToUndo.to_string(), "Nothing to undo.");
}

// === SettingsError Tests ===

#[test]
fn settings_error_display_variants() {
    assert_eq!(
        SettingsError::SerializationError("invalid JSON".to_string()).to_string(),
        "Settings serialization error: invalid JSON"
    );
    assert_eq!(
        SettingsError::InvalidKey("unknown.key".to_string()).to_string(),
        "Invalid settings key: unknown.key"
    );
    assert_eq!(
        SettingsError::InvalidValue("expected bool".to_string()).to_string(),
        "Invalid settings value: expected bool"
    );
}

// === ShortcutError Tests ===

#[test]
fn shortcut_error_display() {
    let err = ShortcutError::Conflict {
        first: "add".to_string(),
        second: "search".to_string(),
        key: "n".to_string(),
    };
    assert_eq!(err.to_string(), "Shortcut conflict: add and search both use \"n\".");
}

// === PreviewError Tests ===

#[test]
fn preview_error_display_variants() {
    assert_eq!(PreviewError::Stale.to_string(), "Stale preview request");
    assert_eq!(PreviewError::Timeout.to_string(), "Preview request timed out");
    assert_eq!(
        PreviewError::Failed("HTTP 500".to_string()).to_string(),
        "Preview request failed: HTTP 500"
    );
}

// === ActionError Tests ===

#[test]
fn action_error_displays_inner_message() {
    assert_eq!(
        ActionError::Validation("Select a valid folder first.".to_string()).to_string(),
        "Select a valid folder first."
    );
    assert_eq!(
        ActionError::from(TreeError::ArchiveTarget).to_string(),
        "Cannot create folders in Archive"
    );
    assert_eq!(ActionError::from(UndoError::NothingToUndo).to_string(), "Nothing to undo.");
    assert_eq!(
        ActionError::from(CodecError::Empty).to_string(),
        "There are no bookmarks to export"
    );
}

#[test]
fn action_error_exposes_source() {
    let err: Box<dyn std::error::Error> = Box::new(ActionError::Tree(TreeError::FolderNotFound(9)));
    assert_eq!(err.source().map(|s| s.to_string()), Some("Folder not found: 9".to_string()));

    let err: Box<dyn std::error::Error> = Box::new(ActionError::Validation("nope".to_string()));
    assert!(err.source().is_none());
}

// === Conversion Tests ===

#[test]
fn from_conversions_pick_matching_variant() {
    assert!(matches!(ActionError::from(TreeError::ArchiveTarget), ActionError::Tree(_)));
    assert!(matches!(ActionError::from(CodecError::Empty), ActionError::Codec(_)));
    assert!(matches!(ActionError::from(UndoError::NothingToUndo), ActionError::Undo(_)));
}
