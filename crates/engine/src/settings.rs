//! Key-value settings consumed by the engine.
//!
//! The engine reads exactly two keys: the mode flag and the ordered group
//! list. Everything else about settings storage belongs to the embedding
//! application; the [`Settings`] trait is the seam.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use corpus_core::groups::Group;
use corpus_core::types::StoreMode;
use serde_json::Value;

use crate::error::EngineError;

/// Settings key of the persisted mode flag (`"filesystem"` | `"db"`).
pub const KEY_MODE: &str = "content_store.mode";

/// Settings key of the ordered group list (JSON array of groups).
pub const KEY_GROUPS: &str = "content_store.groups";

/// Key-value JSON settings storage.
pub trait Settings: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&self, key: &str, value: Value) -> Result<(), EngineError>;
}

// ---------------------------------------------------------------------------
// Typed accessors
// ---------------------------------------------------------------------------

/// Read the mode flag; missing or unrecognised values fall back to the
/// filesystem default.
pub fn load_mode(settings: &dyn Settings) -> StoreMode {
    settings
        .get(KEY_MODE)
        .and_then(|v| v.as_str().map(str::to_string))
        .and_then(|s| StoreMode::from_str(&s))
        .unwrap_or_default()
}

/// Persist the mode flag.
pub fn store_mode(settings: &dyn Settings, mode: StoreMode) -> Result<(), EngineError> {
    settings.set(KEY_MODE, Value::String(mode.as_str().to_string()))
}

/// Read the ordered group list; a missing or malformed blob is an empty
/// list.
pub fn load_groups(settings: &dyn Settings) -> Vec<Group> {
    settings
        .get(KEY_GROUPS)
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_default()
}

/// Persist the ordered group list.
pub fn store_groups(settings: &dyn Settings, groups: &[Group]) -> Result<(), EngineError> {
    let value = serde_json::to_value(groups)
        .map_err(|e| EngineError::Settings(format!("group list not serializable: {e}")))?;
    settings.set(KEY_GROUPS, value)
}

// ---------------------------------------------------------------------------
// MemorySettings
// ---------------------------------------------------------------------------

/// In-memory settings, mainly for tests and embedding without persistence.
#[derive(Debug, Default)]
pub struct MemorySettings {
    values: Mutex<HashMap<String, Value>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Settings for MemorySettings {
    fn get(&self, key: &str) -> Option<Value> {
        lock(&self.values).get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> Result<(), EngineError> {
        lock(&self.values).insert(key.to_string(), value);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// JsonFileSettings
// ---------------------------------------------------------------------------

/// Settings persisted as a single JSON object file.
///
/// The whole map is rewritten on every `set`; reads are served from memory.
#[derive(Debug)]
pub struct JsonFileSettings {
    path: PathBuf,
    values: Mutex<HashMap<String, Value>>,
}

impl JsonFileSettings {
    /// Open (or initialise) the settings file at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, EngineError> {
        let path = path.into();
        let values = if path.exists() {
            let text = fs::read_to_string(&path)
                .map_err(|e| EngineError::Settings(format!("{}: {e}", path.display())))?;
            serde_json::from_str(&text)
                .map_err(|e| EngineError::Settings(format!("{}: {e}", path.display())))?
        } else {
            HashMap::new()
        };
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    fn flush(&self, values: &HashMap<String, Value>) -> Result<(), EngineError> {
        let text = serde_json::to_string_pretty(values)
            .map_err(|e| EngineError::Settings(e.to_string()))?;
        fs::write(&self.path, text)
            .map_err(|e| EngineError::Settings(format!("{}: {e}", self.path.display())))
    }
}

impl Settings for JsonFileSettings {
    fn get(&self, key: &str) -> Option<Value> {
        lock(&self.values).get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> Result<(), EngineError> {
        let mut values = lock(&self.values);
        values.insert(key.to_string(), value);
        self.flush(&values)
    }
}

/// Lock a mutex, recovering the inner value if a writer panicked.
pub(crate) fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
