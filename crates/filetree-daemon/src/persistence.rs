//! File-backed persistence for view state.
//!
//! State is stored as a single JSON object in `.filetree/state.json` within
//! the vault directory. Writes go through on every mutation; a failed write
//! is logged and swallowed so storage trouble never desynchronizes the live
//! session.

use crate::native_vault::STATE_DIR;
use filetree_core::persist::PersistenceBridge;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

/// Persistence bridge backed by a JSON file.
pub struct JsonStateFile {
    /// Path to the storage file.
    path: PathBuf,
    /// In-memory cache.
    values: Mutex<BTreeMap<String, Value>>,
}

impl JsonStateFile {
    /// Open storage at the specified vault directory.
    ///
    /// Reads `.filetree/state.json` if present; an absent or unreadable file
    /// is a valid empty initial state.
    pub fn new(vault_path: &Path) -> Self {
        let path = vault_path.join(STATE_DIR).join("state.json");
        let values = match Self::load_from(&path) {
            Ok(values) => values,
            Err(e) => {
                warn!("failed to load view state from {}: {}", path.display(), e);
                BTreeMap::new()
            }
        };
        Self {
            path,
            values: Mutex::new(values),
        }
    }

    fn load_from(path: &Path) -> anyhow::Result<BTreeMap<String, Value>> {
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    fn save(&self, values: &BTreeMap<String, Value>) -> anyhow::Result<()> {
        // Ensure directory exists
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(values)?;
        fs::write(&self.path, contents)?;
        Ok(())
    }
}

impl PersistenceBridge for JsonStateFile {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.lock().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) {
        let mut values = self.values.lock().unwrap();
        values.insert(key.to_string(), value);
        if let Err(e) = self.save(&values) {
            warn!("failed to persist view state: {}", e);
        }
    }
}
