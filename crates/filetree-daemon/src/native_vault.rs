//! Native vault adapter over std::fs.
//!
//! Paths crossing this boundary are vault-relative and `/`-separated, with
//! the empty path naming the vault root. Hidden entries and the daemon's own
//! state directory are invisible to the tree.

use filetree_core::node::{FileNode, FolderNode, VaultNode, join_path};
use filetree_core::vault::{Result, VaultAdapter, VaultError};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::warn;

/// Directory for persisted view state, excluded from the tree.
pub const STATE_DIR: &str = ".filetree";

/// Vault adapter backed by a real directory.
pub struct NativeVault {
    base_path: PathBuf,
}

impl NativeVault {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn full_path(&self, path: &str) -> PathBuf {
        if path.is_empty() {
            self.base_path.clone()
        } else {
            self.base_path.join(path)
        }
    }

    /// Stat a vault-relative path into a node. `None` when it doesn't exist.
    pub fn node_at(&self, path: &str) -> Option<VaultNode> {
        let metadata = fs::metadata(self.full_path(path)).ok()?;
        let created_ms = time_millis(metadata.created().ok());
        let modified_ms = time_millis(metadata.modified().ok());

        Some(if metadata.is_dir() {
            VaultNode::Folder(FolderNode {
                path: path.to_string(),
                created_ms,
                modified_ms,
            })
        } else {
            VaultNode::File(FileNode {
                path: path.to_string(),
                size: metadata.len(),
                created_ms,
                modified_ms,
            })
        })
    }

    fn collect_into(&self, dir: &Path, rel: &str, out: &mut Vec<VaultNode>) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("failed to list {}: {}", dir.display(), e);
                return;
            }
        };

        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().to_string();
            // Hidden entries (state directory included) are not part of the tree.
            if name.starts_with('.') {
                continue;
            }
            let child_rel = join_path(rel, &name);
            match self.node_at(&child_rel) {
                Some(node @ VaultNode::Folder(_)) => {
                    out.push(node);
                    self.collect_into(&entry.path(), &child_rel, out);
                }
                Some(node) => out.push(node),
                None => {}
            }
        }
    }
}

impl VaultAdapter for NativeVault {
    fn enumerate(&self) -> Box<dyn Iterator<Item = VaultNode> + '_> {
        let mut nodes = Vec::new();
        match self.node_at("") {
            Some(root) => nodes.push(root),
            None => {
                warn!("vault root {} does not exist", self.base_path.display());
                return Box::new(nodes.into_iter());
            }
        }
        let base = self.base_path.clone();
        self.collect_into(&base, "", &mut nodes);
        Box::new(nodes.into_iter())
    }

    fn exists(&self, path: &str) -> bool {
        self.full_path(path).exists()
    }

    fn create_note(&self, path: &str) -> Result<VaultNode> {
        let full = self.full_path(path);
        if full.exists() {
            return Err(VaultError::AlreadyExists(path.to_string()));
        }
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).map_err(|e| VaultError::Io(e.to_string()))?;
        }
        fs::write(&full, b"").map_err(|e| VaultError::Io(e.to_string()))?;
        self.node_at(path)
            .ok_or_else(|| VaultError::Io(format!("created note vanished: {}", path)))
    }

    fn show_notice(&self, message: &str) {
        // The daemon has no UI surface; notices land in the log.
        warn!("notice: {}", message);
    }
}

fn time_millis(time: Option<std::time::SystemTime>) -> u64 {
    time.and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
