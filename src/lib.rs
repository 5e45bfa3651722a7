//! Bookmark Cowboy: a bookmark organizer core.
//!
//! Imports Netscape bookmark files into an in-memory folder tree, lets the
//! user reorganize it through a multi-column view with undo, and exports a
//! canonical bookmark file. This library crate exposes all modules for use by
//! the binaries and integration tests.

pub mod app;
pub mod managers;
pub mod rpc_handler;
pub mod services;
pub mod types;
