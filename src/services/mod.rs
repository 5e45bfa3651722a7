// Bookmark Cowboy services
// Services provide stateless engines: codec, url helpers, search, dedupe, settings, shortcuts, previews.

pub mod duplicate_policy;
pub mod id_allocator;
pub mod markup;
pub mod netscape_exporter;
pub mod netscape_parser;
pub mod preview;
pub mod search;
pub mod settings_engine;
pub mod shortcuts;
pub mod url_tools;
