// Bookmark Cowboy state managers
// Managers own mutable state: the bookmark tree, the selection cursor, the undo history.

pub mod selection_manager;
pub mod tree_store;
pub mod undo_manager;
