use serde::{Deserialize, Serialize};

/// User preferences consumed by the core.
///
/// Missing fields in a persisted blob fall back to their defaults, so older
/// or partial settings files still load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    pub shortcuts: ShortcutBindings,
    pub default_sort_field: SortField,
    pub default_folder_display_mode: FolderDisplayMode,
    pub auto_sort_enabled: bool,
    pub duplicate_auto_delete_enabled: bool,
    pub clear_archive_after_export: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            shortcuts: ShortcutBindings::default(),
            default_sort_field: SortField::Title,
            default_folder_display_mode: FolderDisplayMode::Top,
            auto_sort_enabled: true,
            duplicate_auto_delete_enabled: false,
            clear_archive_after_export: true,
        }
    }
}

/// Single-key bindings for the main actions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct ShortcutBindings {
    pub add: String,
    pub bulk_add: String,
    pub delete: String,
    pub import: String,
    pub export: String,
    pub search: String,
}

impl Default for ShortcutBindings {
    fn default() -> Self {
        Self {
            add: "n".to_string(),
            bulk_add: "b".to_string(),
            delete: "backspace".to_string(),
            import: "i".to_string(),
            export: "e".to_string(),
            search: "f".to_string(),
        }
    }
}

impl ShortcutBindings {
    /// `(action, key)` pairs in a stable order.
    pub fn entries(&self) -> [(ShortcutAction, &str); 6] {
        [
            (ShortcutAction::Add, self.add.as_str()),
            (ShortcutAction::BulkAdd, self.bulk_add.as_str()),
            (ShortcutAction::Delete, self.delete.as_str()),
            (ShortcutAction::Import, self.import.as_str()),
            (ShortcutAction::Export, self.export.as_str()),
            (ShortcutAction::Search, self.search.as_str()),
        ]
    }

    pub fn get(&self, action: ShortcutAction) -> &str {
        match action {
            ShortcutAction::Add => &self.add,
            ShortcutAction::BulkAdd => &self.bulk_add,
            ShortcutAction::Delete => &self.delete,
            ShortcutAction::Import => &self.import,
            ShortcutAction::Export => &self.export,
            ShortcutAction::Search => &self.search,
        }
    }

    pub fn set(&mut self, action: ShortcutAction, key: String) {
        match action {
            ShortcutAction::Add => self.add = key,
            ShortcutAction::BulkAdd => self.bulk_add = key,
            ShortcutAction::Delete => self.delete = key,
            ShortcutAction::Import => self.import = key,
            ShortcutAction::Export => self.export = key,
            ShortcutAction::Search => self.search = key,
        }
    }

    /// Returns the action bound to `key`, if any.
    pub fn action_for(&self, key: &str) -> Option<ShortcutAction> {
        self.entries()
            .into_iter()
            .find(|(_, bound)| *bound == key)
            .map(|(action, _)| action)
    }
}

/// Actions that can be bound to a shortcut key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ShortcutAction {
    Add,
    BulkAdd,
    Delete,
    Import,
    Export,
    Search,
}

impl ShortcutAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShortcutAction::Add => "add",
            ShortcutAction::BulkAdd => "bulkAdd",
            ShortcutAction::Delete => "delete",
            ShortcutAction::Import => "import",
            ShortcutAction::Export => "export",
            ShortcutAction::Search => "search",
        }
    }
}

/// Field used to order bookmarks within a folder.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    #[default]
    Title,
    Url,
    Domain,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Title => "title",
            SortField::Url => "url",
            SortField::Domain => "domain",
        }
    }
}

/// Whether folders are listed before or after bookmarks in a column.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum FolderDisplayMode {
    #[default]
    Top,
    Bottom,
}

impl FolderDisplayMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FolderDisplayMode::Top => "top",
            FolderDisplayMode::Bottom => "bottom",
        }
    }
}
