//! Vault adapter boundary.
//!
//! The real vault (folder/file existence, create operations, change
//! notifications) lives outside this crate. `VaultAdapter` is the contract the
//! engine consumes; `InMemoryVault` is the test double.
//!
//! The change stream is best-effort: at-least-once, unordered across batches,
//! possibly duplicated. The store's reconciliation is written to tolerate
//! exactly that.

use crate::node::{FileNode, FolderNode, VaultNode, parent_of};
use std::collections::BTreeMap;
use std::sync::RwLock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("IO error: {0}")]
    Io(String),
}

pub type Result<T> = std::result::Result<T, VaultError>;

/// A single change notification from the vault.
#[derive(Debug, Clone)]
pub enum VaultChange {
    /// A node appeared. Re-delivery for an already-known path is valid.
    Created(VaultNode),
    /// A node's content/metadata changed; topology is unaffected.
    Modified(VaultNode),
    /// The node at this path disappeared.
    Deleted { path: String },
    /// The node at `old_path` now lives at the carried node's path.
    Renamed { node: VaultNode, old_path: String },
}

impl VaultChange {
    /// The path this change primarily refers to (the new path for renames).
    pub fn path(&self) -> &str {
        match self {
            VaultChange::Created(node) | VaultChange::Modified(node) => node.path(),
            VaultChange::Deleted { path } => path,
            VaultChange::Renamed { node, .. } => node.path(),
        }
    }

    /// Short tag for logging and events.
    pub fn kind(&self) -> &'static str {
        match self {
            VaultChange::Created(_) => "create",
            VaultChange::Modified(_) => "modify",
            VaultChange::Deleted { .. } => "delete",
            VaultChange::Renamed { .. } => "rename",
        }
    }
}

/// Contract with the external vault.
///
/// `enumerate` is a lazy, restartable enumeration of the vault's current
/// nodes, used once to populate the snapshot. The remaining operations are
/// invoked on demand by folder-note resolution; the engine itself performs
/// no I/O.
pub trait VaultAdapter {
    /// Enumerate all current nodes, root folder included.
    fn enumerate(&self) -> Box<dyn Iterator<Item = VaultNode> + '_>;

    /// Whether a node exists at this path.
    fn exists(&self, path: &str) -> bool;

    /// Create an empty document at this path, parents included.
    fn create_note(&self, path: &str) -> Result<VaultNode>;

    /// Request a user-visible notice from the host.
    fn show_notice(&self, message: &str);
}

/// In-memory vault for testing.
///
/// Holds a flat path-keyed node map plus a record of notices and created
/// notes so tests can assert on delegated side effects.
pub struct InMemoryVault {
    nodes: RwLock<BTreeMap<String, VaultNode>>,
    notices: RwLock<Vec<String>>,
}

impl InMemoryVault {
    /// Create a vault containing only the root folder.
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(String::new(), VaultNode::Folder(FolderNode::new("")));
        Self {
            nodes: RwLock::new(nodes),
            notices: RwLock::new(Vec::new()),
        }
    }

    /// Add a folder, creating missing ancestor folders.
    pub fn add_folder(&self, path: &str) -> VaultNode {
        self.ensure_parents(path);
        let node = VaultNode::Folder(FolderNode::new(path));
        self.nodes
            .write()
            .unwrap()
            .insert(path.to_string(), node.clone());
        node
    }

    /// Add a file, creating missing ancestor folders.
    pub fn add_file(&self, path: &str) -> VaultNode {
        self.ensure_parents(path);
        let node = VaultNode::File(FileNode::new(path));
        self.nodes
            .write()
            .unwrap()
            .insert(path.to_string(), node.clone());
        node
    }

    /// Remove a node if present.
    pub fn remove(&self, path: &str) {
        self.nodes.write().unwrap().remove(path);
    }

    /// Notices requested so far.
    pub fn notices(&self) -> Vec<String> {
        self.notices.read().unwrap().clone()
    }

    fn ensure_parents(&self, path: &str) {
        let mut nodes = self.nodes.write().unwrap();
        let mut current = path;
        while let Some(parent) = parent_of(current) {
            nodes
                .entry(parent.to_string())
                .or_insert_with(|| VaultNode::Folder(FolderNode::new(parent)));
            current = parent;
        }
    }
}

impl Default for InMemoryVault {
    fn default() -> Self {
        Self::new()
    }
}

impl VaultAdapter for InMemoryVault {
    fn enumerate(&self) -> Box<dyn Iterator<Item = VaultNode> + '_> {
        let nodes: Vec<VaultNode> = self.nodes.read().unwrap().values().cloned().collect();
        Box::new(nodes.into_iter())
    }

    fn exists(&self, path: &str) -> bool {
        self.nodes.read().unwrap().contains_key(path)
    }

    fn create_note(&self, path: &str) -> Result<VaultNode> {
        if self.exists(path) {
            return Err(VaultError::AlreadyExists(path.to_string()));
        }
        Ok(self.add_file(path))
    }

    fn show_notice(&self, message: &str) {
        self.notices.write().unwrap().push(message.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enumerate_includes_root() {
        let vault = InMemoryVault::new();
        let nodes: Vec<_> = vault.enumerate().collect();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].path(), "");
        assert!(nodes[0].is_folder());
    }

    #[test]
    fn test_add_file_creates_ancestors() {
        let vault = InMemoryVault::new();
        vault.add_file("a/b/c.md");

        assert!(vault.exists("a"));
        assert!(vault.exists("a/b"));
        assert!(vault.exists("a/b/c.md"));
    }

    #[test]
    fn test_enumerate_is_restartable() {
        let vault = InMemoryVault::new();
        vault.add_folder("notes");

        let first: Vec<_> = vault.enumerate().map(|n| n.path().to_string()).collect();
        let second: Vec<_> = vault.enumerate().map(|n| n.path().to_string()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_create_note_rejects_existing() {
        let vault = InMemoryVault::new();
        vault.add_file("notes/index.md");

        let result = vault.create_note("notes/index.md");
        assert!(matches!(result, Err(VaultError::AlreadyExists(_))));
    }

    #[test]
    fn test_notices_recorded() {
        let vault = InMemoryVault::new();
        vault.show_notice("no folder note");
        assert_eq!(vault.notices(), vec!["no folder note".to_string()]);
    }

    #[test]
    fn test_change_accessors() {
        let change = VaultChange::Renamed {
            node: VaultNode::Folder(FolderNode::new("renamed")),
            old_path: "original".into(),
        };
        assert_eq!(change.path(), "renamed");
        assert_eq!(change.kind(), "rename");

        let change = VaultChange::Deleted {
            path: "gone".into(),
        };
        assert_eq!(change.path(), "gone");
        assert_eq!(change.kind(), "delete");
    }
}
