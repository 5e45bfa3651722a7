//! Keyboard shortcut normalization and conflict detection.
//!
//! Bindings are plain strings such as `"n"` or `"ctrl+shift+k"`. Capturing
//! key events is the presentation layer's job; it hands the core a
//! [`KeyChord`] to serialize and resolve.

use std::collections::HashMap;

use crate::types::errors::ShortcutError;
use crate::types::settings::{ShortcutAction, ShortcutBindings};

/// Marker stored for an action with no key bound.
pub const UNASSIGNED: &str = "unassigned";

/// A key press with its modifier state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyChord {
    pub key: String,
    pub cmd: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
}

impl KeyChord {
    pub fn plain(key: &str) -> Self {
        Self {
            key: key.to_string(),
            ..Self::default()
        }
    }
}

/// Trims and lowercases a binding; empty becomes `unassigned` and `del`
/// is an alias of `backspace`.
pub fn normalize_shortcut_key(value: &str) -> String {
    let normalized = value.trim().to_lowercase();
    if normalized.is_empty() {
        return UNASSIGNED.to_string();
    }
    if normalized == "del" {
        return "backspace".to_string();
    }
    normalized
}

/// Serializes a chord as `cmd+ctrl+alt+shift+key`. A bare modifier press
/// yields `None`.
pub fn serialize_chord(chord: &KeyChord) -> Option<String> {
    let key = chord.key.to_lowercase();
    if matches!(key.as_str(), "meta" | "control" | "alt" | "shift") {
        return None;
    }

    let mut parts: Vec<&str> = Vec::new();
    if chord.cmd {
        parts.push("cmd");
    }
    if chord.ctrl {
        parts.push("ctrl");
    }
    if chord.alt {
        parts.push("alt");
    }
    if chord.shift {
        parts.push("shift");
    }
    let base = match key.as_str() {
        " " => "space",
        "esc" => "escape",
        "del" => "backspace",
        other => other,
    };
    parts.push(base);
    Some(normalize_shortcut_key(&parts.join("+")))
}

/// Normalizes every binding in place.
pub fn normalize_bindings(bindings: &mut ShortcutBindings) {
    for (action, key) in bindings.clone().entries() {
        bindings.set(action, normalize_shortcut_key(key));
    }
}

/// Reports the first pair of actions sharing a key. Unassigned actions never
/// conflict.
pub fn validate_shortcut_conflicts(bindings: &ShortcutBindings) -> Result<(), ShortcutError> {
    let mut seen: HashMap<&str, ShortcutAction> = HashMap::new();
    for (action, key) in bindings.entries() {
        if key == UNASSIGNED {
            continue;
        }
        if let Some(existing) = seen.get(key) {
            return Err(ShortcutError::Conflict {
                first: existing.as_str().to_string(),
                second: action.as_str().to_string(),
                key: key.to_string(),
            });
        }
        seen.insert(key, action);
    }
    Ok(())
}

/// Maps a key press to the bound action, if any.
pub fn resolve_shortcut(bindings: &ShortcutBindings, chord: &KeyChord) -> Option<ShortcutAction> {
    let serialized = serialize_chord(chord)?;
    if serialized == UNASSIGNED {
        return None;
    }
    bindings.action_for(&serialized)
}
