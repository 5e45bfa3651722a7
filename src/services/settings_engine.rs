//! Settings blob normalization.
//!
//! The host owns the persisted settings blob and hands it over as JSON. Every
//! [`AppSettings`] value the app consumes has been through here: missing
//! fields take their defaults, shortcut keys are normalized, and edits that
//! would bind one key to two actions are refused.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::services::shortcuts::{normalize_bindings, validate_shortcut_conflicts};
use crate::types::errors::SettingsError;
use crate::types::settings::AppSettings;

const SHORTCUTS_FIELD: &str = "shortcuts";

/// Normalizes every shortcut binding and rejects conflicting ones.
pub fn normalize_settings(mut settings: AppSettings) -> Result<AppSettings, SettingsError> {
    normalize_bindings(&mut settings.shortcuts);
    validate_shortcut_conflicts(&settings.shortcuts)
        .map_err(|e| SettingsError::InvalidValue(e.to_string()))?;
    Ok(settings)
}

/// Reads a stored blob over the defaults.
///
/// Conflicting bindings already in the blob are kept, with a warning, so the
/// user can still see and fix them.
pub fn settings_from_blob(blob: &Value) -> Result<AppSettings, SettingsError> {
    if !blob.is_object() {
        return Err(SettingsError::SerializationError(
            "settings blob must be a JSON object".to_string(),
        ));
    }
    let mut settings: AppSettings = serde_json::from_value(blob.clone())
        .map_err(|e| SettingsError::SerializationError(e.to_string()))?;
    normalize_bindings(&mut settings.shortcuts);
    if let Err(e) = validate_shortcut_conflicts(&settings.shortcuts) {
        warn!(error = %e, "stored shortcuts conflict, keeping them until edited");
    }
    Ok(settings)
}

/// Parses the stored text form. Blank text is a fresh install.
pub fn settings_from_str(raw: &str) -> Result<AppSettings, SettingsError> {
    if raw.trim().is_empty() {
        return Ok(AppSettings::default());
    }
    let blob: Value =
        serde_json::from_str(raw).map_err(|e| SettingsError::SerializationError(e.to_string()))?;
    settings_from_blob(&blob)
}

/// The camelCase blob layout the host persists.
pub fn settings_to_blob(settings: &AppSettings) -> Result<Value, SettingsError> {
    blob_fields(settings).map(Value::Object)
}

fn blob_fields(settings: &AppSettings) -> Result<Map<String, Value>, SettingsError> {
    match serde_json::to_value(settings) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(_) => Err(SettingsError::SerializationError(
            "settings did not serialize to an object".to_string(),
        )),
        Err(e) => Err(SettingsError::SerializationError(e.to_string())),
    }
}

/// Applies a partial blob on top of `current`.
///
/// Top-level fields are replaced; `shortcuts` is merged binding by binding.
/// Unknown fields are rejected, and so is a result with conflicting keys.
pub fn apply_settings_patch(current: &AppSettings, patch: &Value) -> Result<AppSettings, SettingsError> {
    let Value::Object(changes) = patch else {
        return Err(SettingsError::InvalidValue(
            "settings patch must be a JSON object".to_string(),
        ));
    };

    let mut fields = blob_fields(current)?;
    for (field, value) in changes {
        let Some(slot) = fields.get_mut(field) else {
            return Err(SettingsError::InvalidKey(field.clone()));
        };
        if field != SHORTCUTS_FIELD {
            *slot = value.clone();
            continue;
        }
        let (Value::Object(bindings), Value::Object(updates)) = (slot, value) else {
            return Err(SettingsError::InvalidValue(
                "shortcuts must be an object of key bindings".to_string(),
            ));
        };
        for (action, key) in updates {
            let Some(binding) = bindings.get_mut(action) else {
                return Err(SettingsError::InvalidKey(format!("{}.{}", SHORTCUTS_FIELD, action)));
            };
            *binding = key.clone();
        }
    }

    let merged: AppSettings = serde_json::from_value(Value::Object(fields))
        .map_err(|e| SettingsError::InvalidValue(e.to_string()))?;
    let settings = normalize_settings(merged)?;
    debug!(fields = changes.len(), "applied settings patch");
    Ok(settings)
}
