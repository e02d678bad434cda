//! Debounced directory watcher for vault changes.
//!
//! Uses notify-debouncer-mini for efficient change detection. The watcher
//! emits raw signals (path touched / path removed); classification into
//! create-vs-modify happens against the store's snapshot in the event loop,
//! where the currently known paths live. Renames reach this boundary as a
//! remove plus a touch; true rename notifications come only from hosts that
//! report them.

use anyhow::Result;
use notify::RecursiveMode;
use notify_debouncer_mini::{DebouncedEvent, new_debouncer};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error};

/// Raw signal from the filesystem, not yet classified against the snapshot.
#[derive(Debug, Clone)]
pub struct VaultSignal {
    /// Path relative to the vault root, `/`-separated.
    pub path: String,
    pub kind: SignalKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    /// The path exists: created or modified.
    Touched,
    /// The path no longer exists.
    Removed,
}

/// Watcher over the vault directory.
pub struct VaultWatcher {
    /// Vault base path
    vault_path: PathBuf,
    /// Debouncer handle (must keep alive)
    _debouncer: notify_debouncer_mini::Debouncer<notify::RecommendedWatcher>,
    /// Receiver for signals
    signal_rx: mpsc::UnboundedReceiver<VaultSignal>,
}

impl VaultWatcher {
    /// Create a new watcher for the vault.
    ///
    /// Uses a 200ms debounce period to avoid rapid-fire events during saves
    /// and bulk moves.
    pub fn new(vault_path: PathBuf) -> Result<Self> {
        // Canonicalize the path to resolve symlinks; some platforms report
        // event paths against the resolved location.
        let vault_path = vault_path.canonicalize().unwrap_or(vault_path);

        let (signal_tx, signal_rx) = mpsc::unbounded_channel();
        let vault_path_clone = vault_path.clone();

        let mut debouncer = new_debouncer(
            Duration::from_millis(200),
            move |result: std::result::Result<Vec<DebouncedEvent>, notify::Error>| match result {
                Ok(events) => {
                    for event in events {
                        if let Some(signal) = classify(&event.path, &vault_path_clone) {
                            debug!("vault signal: {:?} - {}", signal.kind, signal.path);
                            if signal_tx.send(signal).is_err() {
                                // Receiver dropped
                                return;
                            }
                        }
                    }
                }
                Err(e) => {
                    error!("vault watcher error: {}", e);
                }
            },
        )?;

        debouncer
            .watcher()
            .watch(&vault_path, RecursiveMode::Recursive)?;

        Ok(Self {
            vault_path,
            _debouncer: debouncer,
            signal_rx,
        })
    }

    /// Receive the next signal. `None` once the watcher thread has stopped.
    pub async fn recv(&mut self) -> Option<VaultSignal> {
        self.signal_rx.recv().await
    }

    /// Get the vault path.
    pub fn vault_path(&self) -> &Path {
        &self.vault_path
    }
}

/// Map an absolute event path to a vault-relative signal.
///
/// Filters out paths the tree does not track: anything outside the vault,
/// hidden entries, and the state directory.
fn classify(path: &Path, vault_path: &Path) -> Option<VaultSignal> {
    let relative = path.strip_prefix(vault_path).ok()?;
    let relative_str = relative.to_str()?;

    if relative_str.is_empty() {
        return None;
    }
    // Skip hidden entries; this covers the .filetree state directory too.
    if relative_str.starts_with('.') || relative_str.contains("/.") {
        return None;
    }

    let kind = if path.exists() {
        SignalKind::Touched
    } else {
        SignalKind::Removed
    };

    Some(VaultSignal {
        path: relative_str.to_string(),
        kind,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_classify_existing_path_is_touched() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("docs")).unwrap();
        fs::write(temp.path().join("docs/a.md"), b"x").unwrap();

        let signal = classify(&temp.path().join("docs/a.md"), temp.path()).unwrap();
        assert_eq!(signal.path, "docs/a.md");
        assert_eq!(signal.kind, SignalKind::Touched);
    }

    #[test]
    fn test_classify_missing_path_is_removed() {
        let temp = TempDir::new().unwrap();
        let signal = classify(&temp.path().join("gone.md"), temp.path()).unwrap();
        assert_eq!(signal.path, "gone.md");
        assert_eq!(signal.kind, SignalKind::Removed);
    }

    #[test]
    fn test_classify_filters_state_dir_and_hidden() {
        let temp = TempDir::new().unwrap();
        assert!(classify(&temp.path().join(".filetree/state.json"), temp.path()).is_none());
        assert!(classify(&temp.path().join(".hidden.md"), temp.path()).is_none());
        assert!(classify(&temp.path().join("a/.hidden/b.md"), temp.path()).is_none());
    }

    #[test]
    fn test_classify_filters_paths_outside_the_vault() {
        let temp = TempDir::new().unwrap();
        let other = TempDir::new().unwrap();
        assert!(classify(&other.path().join("a.md"), temp.path()).is_none());
        assert!(classify(temp.path(), temp.path()).is_none());
    }
}
