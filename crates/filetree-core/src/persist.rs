//! Persistence bridge: durable key/value storage for session state.
//!
//! Expansion, focus, settings and sort rule survive process restarts through
//! this boundary. Absence of a key is a valid initial state, never an error.
//! Writes must not fail the caller: implementations log and swallow storage
//! errors, since a failed write must not desynchronize the live session.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;

/// Key for the settings object.
pub const SETTINGS_KEY: &str = "settings";
/// Key for the expansion set (JSON array of folder paths).
pub const EXPANDED_FOLDERS_KEY: &str = "expanded-folder-paths";
/// Key for the focused folder (JSON string or null).
pub const LAST_FOCUSED_KEY: &str = "last-focused-folder";
/// Key for the folder sort rule.
pub const SORT_RULE_KEY: &str = "folder-sort-rule";

/// Durable string-key to JSON-value mapping.
pub trait PersistenceBridge {
    /// Read a value. `None` when the key has never been written.
    fn get(&self, key: &str) -> Option<Value>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: Value);
}

/// In-memory bridge for testing.
pub struct InMemoryBridge {
    values: RwLock<HashMap<String, Value>>,
}

impl InMemoryBridge {
    pub fn new() -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
        }
    }

    /// Seed a value before the store is constructed, as if written by a
    /// previous session.
    pub fn seed(&self, key: &str, value: Value) {
        self.values
            .write()
            .unwrap()
            .insert(key.to_string(), value);
    }
}

impl Default for InMemoryBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl PersistenceBridge for InMemoryBridge {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.read().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) {
        self.values
            .write()
            .unwrap()
            .insert(key.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_absent_key_is_none() {
        let bridge = InMemoryBridge::new();
        assert_eq!(bridge.get(SETTINGS_KEY), None);
    }

    #[test]
    fn test_set_then_get() {
        let bridge = InMemoryBridge::new();
        bridge.set(LAST_FOCUSED_KEY, json!("notes/daily"));
        assert_eq!(bridge.get(LAST_FOCUSED_KEY), Some(json!("notes/daily")));
    }

    #[test]
    fn test_set_replaces() {
        let bridge = InMemoryBridge::new();
        bridge.set(EXPANDED_FOLDERS_KEY, json!(["a"]));
        bridge.set(EXPANDED_FOLDERS_KEY, json!(["a", "b"]));
        assert_eq!(bridge.get(EXPANDED_FOLDERS_KEY), Some(json!(["a", "b"])));
    }
}
