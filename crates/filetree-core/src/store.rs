//! Tree synchronization store.
//!
//! Owns the cached snapshot of the vault topology plus the derived
//! presentation state (expansion set, focused folder, sort rule, display
//! settings). The snapshot is populated once from a full enumeration and
//! never recomputed afterwards: every subsequent update is an incremental
//! delta keyed by path.
//!
//! Reconciliation is idempotent and order-tolerant. The external change
//! stream is at-least-once and unordered across rapid bulk operations, so a
//! delete for an already-removed path, a duplicated create, or a child
//! arriving before its parent must all leave the store consistent.

use crate::events::{EventBus, Subscription, TreeEvent};
use crate::folder_note::{self, NoteResolution};
use crate::node::{FolderNode, Snapshot, VaultNode, parent_of};
use crate::persist::{
    EXPANDED_FOLDERS_KEY, LAST_FOCUSED_KEY, PersistenceBridge, SETTINGS_KEY, SORT_RULE_KEY,
};
use crate::settings::{SettingsChange, TreeViewSettings};
use crate::sort::{self, SortRule};
use crate::vault::{VaultAdapter, VaultChange};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info};

/// The aggregate root: one per presentation session.
pub struct FileTreeStore<P: PersistenceBridge> {
    /// Path-keyed copy of the vault topology. The root folder has the empty path.
    snapshot: Snapshot,
    /// Paths of folders whose parent is the root. Cached, incrementally maintained.
    top_level_folders: BTreeSet<String>,
    /// Folder paths currently expanded. Persisted across restarts.
    expanded_folder_paths: BTreeSet<String>,
    /// Currently focused folder, if any. Persisted across restarts.
    focused_path: Option<String>,
    sort_rule: SortRule,
    settings: TreeViewSettings,
    bridge: P,
    bus: Arc<EventBus>,
}

impl<P: PersistenceBridge> FileTreeStore<P> {
    /// Create an empty store, loading settings and sort rule from the bridge.
    ///
    /// Expansion and focus restoration are separate explicit steps
    /// (`restore_expanded_folder_paths`, `restore_last_focused_folder`)
    /// because they filter against the populated snapshot.
    pub fn new(bridge: P) -> Self {
        let settings = bridge
            .get(SETTINGS_KEY)
            .and_then(|value| serde_json::from_value(value).ok())
            .unwrap_or_default();
        let sort_rule = bridge
            .get(SORT_RULE_KEY)
            .and_then(|value| serde_json::from_value(value).ok())
            .unwrap_or_default();

        Self {
            snapshot: Snapshot::new(),
            top_level_folders: BTreeSet::new(),
            expanded_folder_paths: BTreeSet::new(),
            focused_path: None,
            sort_rule,
            settings,
            bridge,
            bus: Arc::new(EventBus::new()),
        }
    }

    /// One-time full load from the vault's restartable enumeration.
    ///
    /// Restarting the enumeration and calling this again replaces the
    /// snapshot wholesale; expansion and focus are untouched.
    pub fn populate<I>(&mut self, nodes: I)
    where
        I: IntoIterator<Item = VaultNode>,
    {
        self.snapshot.clear();
        self.top_level_folders.clear();
        for node in nodes {
            if node.is_folder() && node.parent_path() == Some("") {
                self.top_level_folders.insert(node.path().to_string());
            }
            self.snapshot.insert(node.path().to_string(), node);
        }
        info!("populated snapshot with {} nodes", self.snapshot.len());
    }

    /// Subscribe to store events. Drop the returned handle to unsubscribe.
    pub fn subscribe(
        &self,
        callback: impl Fn(TreeEvent) + Send + Sync + 'static,
    ) -> Subscription {
        self.bus.subscribe(callback)
    }

    // ========== Queries ==========

    /// The root folder node, once populated.
    pub fn root(&self) -> Option<&FolderNode> {
        match self.snapshot.get("") {
            Some(VaultNode::Folder(folder)) => Some(folder),
            _ => None,
        }
    }

    /// Whether a live node exists at this path.
    pub fn contains(&self, path: &str) -> bool {
        self.snapshot.contains_key(path) && self.is_live(path)
    }

    /// Folders whose parent is the root, unsorted.
    pub fn top_level_folders(&mut self) -> Vec<FolderNode> {
        let cached: Vec<String> = self.top_level_folders.iter().cloned().collect();
        let mut folders = Vec::with_capacity(cached.len());
        for path in cached {
            match self.snapshot.get(&path) {
                Some(VaultNode::Folder(folder)) => folders.push(folder.clone()),
                _ => {
                    self.top_level_folders.remove(&path);
                }
            }
        }
        folders
    }

    /// Direct folder children of a folder, unsorted. The caller applies the
    /// sort engine.
    ///
    /// Querying into a deleted subtree returns empty and evicts whatever
    /// dangling entries remain beneath it. Deletes never cascade eagerly,
    /// so this is where orphans actually get collected.
    pub fn folders_by_parent(&mut self, parent_path: &str) -> Vec<FolderNode> {
        if !self.is_live(parent_path) {
            debug!("query under dead path {}, pruning orphans", parent_path);
            self.evict_orphans(parent_path);
            return Vec::new();
        }
        self.snapshot
            .values()
            .filter_map(|node| match node {
                VaultNode::Folder(folder) if folder.parent_path() == Some(parent_path) => {
                    Some(folder.clone())
                }
                _ => None,
            })
            .collect()
    }

    /// Direct folder children sorted under the current rule and counting policy.
    pub fn sorted_folders_by_parent(&mut self, parent_path: &str) -> Vec<FolderNode> {
        let folders = self.folders_by_parent(parent_path);
        sort::sort_folders(
            &self.snapshot,
            folders,
            self.sort_rule,
            self.settings.include_subfolder_files_count,
        )
    }

    /// Whether a folder has folder children, without materializing them.
    pub fn has_folder_children(&self, path: &str) -> bool {
        self.is_live(path)
            && self
                .snapshot
                .values()
                .any(|node| node.is_folder() && node.parent_path() == Some(path))
    }

    /// File count for a folder under the current counting policy.
    pub fn file_count(&self, folder_path: &str) -> usize {
        if !self.is_live(folder_path) {
            return 0;
        }
        sort::file_count(
            &self.snapshot,
            folder_path,
            self.settings.include_subfolder_files_count,
        )
    }

    /// Resolve the folder note for a live folder under current settings.
    ///
    /// Never cached: the candidate path is a function of current settings.
    pub fn resolve_folder_note<V: VaultAdapter + ?Sized>(
        &self,
        vault: &V,
        folder_path: &str,
    ) -> NoteResolution {
        match self.snapshot.get(folder_path) {
            Some(VaultNode::Folder(folder)) if self.is_live(folder_path) => {
                folder_note::resolve(vault, folder, &self.settings)
            }
            _ => NoteResolution::Missing,
        }
    }

    pub fn settings(&self) -> &TreeViewSettings {
        &self.settings
    }

    pub fn sort_rule(&self) -> SortRule {
        self.sort_rule
    }

    pub fn bridge(&self) -> &P {
        &self.bridge
    }

    // ========== Expansion & focus ==========

    pub fn is_expanded(&self, path: &str) -> bool {
        self.expanded_folder_paths.contains(path)
    }

    /// Currently expanded folder paths.
    pub fn expanded_folder_paths(&self) -> impl Iterator<Item = &str> {
        self.expanded_folder_paths.iter().map(String::as_str)
    }

    /// Toggle a folder's expansion. Unknown or dead paths are ignored.
    pub fn toggle_expanded(&mut self, path: &str) {
        if !self.is_live_folder(path) {
            debug!("toggle for unknown folder {} ignored", path);
            return;
        }
        let expanded = if self.expanded_folder_paths.remove(path) {
            false
        } else {
            self.expanded_folder_paths.insert(path.to_string());
            true
        };
        self.persist_expanded();
        self.bus.emit(TreeEvent::ExpansionChanged {
            path: path.to_string(),
            expanded,
        });
    }

    pub fn collapse_all(&mut self) {
        self.expanded_folder_paths.clear();
        self.persist_expanded();
        self.bus.emit(TreeEvent::ExpansionReset);
    }

    /// Set or clear the focused folder. Unknown or dead paths are ignored.
    pub fn set_focused(&mut self, path: Option<&str>) {
        let next = match path {
            Some(p) if self.is_live_folder(p) => Some(p.to_string()),
            Some(p) => {
                debug!("focus on unknown folder {} ignored", p);
                return;
            }
            None => None,
        };
        if next == self.focused_path {
            return;
        }
        self.focused_path = next;
        self.persist_focused();
        self.bus.emit(TreeEvent::FocusChanged {
            path: self.focused_path.clone(),
        });
    }

    pub fn focused(&self) -> Option<&str> {
        self.focused_path.as_deref()
    }

    /// Restore the expansion set from the bridge, dropping paths that no
    /// longer name a live folder in the snapshot.
    pub fn restore_expanded_folder_paths(&mut self) {
        let persisted: Vec<String> = self
            .bridge
            .get(EXPANDED_FOLDERS_KEY)
            .and_then(|value| serde_json::from_value(value).ok())
            .unwrap_or_default();
        let total = persisted.len();
        self.expanded_folder_paths = persisted
            .into_iter()
            .filter(|path| self.is_live_folder(path))
            .collect();
        let kept = self.expanded_folder_paths.len();
        if kept < total {
            debug!("restored {} expanded folders, dropped {} stale", kept, total - kept);
        }
        self.bus.emit(TreeEvent::ExpansionReset);
    }

    /// Restore the focused folder from the bridge if it still names a live
    /// folder.
    pub fn restore_last_focused_folder(&mut self) {
        let persisted: Option<String> = self
            .bridge
            .get(LAST_FOCUSED_KEY)
            .and_then(|value| serde_json::from_value(value).ok());
        self.focused_path = persisted.filter(|path| self.is_live_folder(path));
        self.bus.emit(TreeEvent::FocusChanged {
            path: self.focused_path.clone(),
        });
    }

    // ========== Reconciliation ==========

    /// Reconcile a single vault change into the snapshot.
    ///
    /// Tolerates duplicates, reordering and stale references: a change for a
    /// path the snapshot no longer knows is a silent no-op, never an error.
    pub fn apply_vault_change(&mut self, change: VaultChange) {
        match change {
            VaultChange::Created(node) => self.on_created(node),
            VaultChange::Modified(node) => self.on_modified(node),
            VaultChange::Deleted { path } => self.on_deleted(&path),
            VaultChange::Renamed { node, old_path } => self.on_renamed(node, &old_path),
        }
    }

    /// Apply a settings mutation. Pure assignment: the snapshot's shape is
    /// unaffected, so no reconciliation is needed.
    pub fn apply_settings_change(&mut self, change: SettingsChange) {
        match &change {
            SettingsChange::FolderSortRule(rule) => {
                self.sort_rule = *rule;
                self.persist_sort_rule();
            }
            _ => {
                self.settings.apply(&change);
                self.persist_settings();
            }
        }
        self.bus.emit(TreeEvent::SettingsChanged);
    }

    fn on_created(&mut self, node: VaultNode) {
        let path = node.path().to_string();
        if node.is_folder() && node.parent_path() == Some("") {
            self.top_level_folders.insert(path.clone());
        }
        // Idempotent keyed insert: re-delivery overwrites in place.
        self.snapshot.insert(path.clone(), node);
        debug!("reconciled create: {}", path);
        self.bus.emit(TreeEvent::TreeChanged {
            change_type: "create".into(),
            path,
        });
    }

    fn on_modified(&mut self, node: VaultNode) {
        let path = node.path().to_string();
        match self.snapshot.get_mut(&path) {
            Some(existing) => {
                // Metadata refresh in place; no effect on expansion, focus
                // or topology.
                *existing = node;
                debug!("reconciled modify: {}", path);
                self.bus.emit(TreeEvent::TreeChanged {
                    change_type: "modify".into(),
                    path,
                });
            }
            None => debug!("modify for unknown path {} ignored", path),
        }
    }

    fn on_deleted(&mut self, path: &str) {
        if self.snapshot.remove(path).is_none() {
            debug!("delete for unknown path {} ignored", path);
            return;
        }
        // Descendants are not cascaded; child-materializing queries evict
        // them lazily.
        self.top_level_folders.remove(path);
        if self.expanded_folder_paths.remove(path) {
            self.persist_expanded();
        }
        if self.focused_path.as_deref() == Some(path) {
            self.focused_path = None;
            self.persist_focused();
            self.bus.emit(TreeEvent::FocusChanged { path: None });
        }
        debug!("reconciled delete: {}", path);
        self.bus.emit(TreeEvent::TreeChanged {
            change_type: "delete".into(),
            path: path.to_string(),
        });
    }

    fn on_renamed(&mut self, node: VaultNode, old_path: &str) {
        let new_path = node.path().to_string();
        // Identity-preserving: same logical node, new key. The old key may
        // already be gone if events arrived out of order.
        self.snapshot.remove(old_path);
        self.top_level_folders.remove(old_path);
        if node.is_folder() && node.parent_path() == Some("") {
            self.top_level_folders.insert(new_path.clone());
        }
        self.snapshot.insert(new_path.clone(), node);

        if self.expanded_folder_paths.remove(old_path) {
            self.expanded_folder_paths.insert(new_path.clone());
            self.persist_expanded();
        }
        if self.focused_path.as_deref() == Some(old_path) {
            self.focused_path = Some(new_path.clone());
            self.persist_focused();
            self.bus.emit(TreeEvent::FocusChanged {
                path: Some(new_path.clone()),
            });
        }
        debug!("reconciled rename: {} -> {}", old_path, new_path);
        self.bus.emit(TreeEvent::TreeChanged {
            change_type: "rename".into(),
            path: new_path,
        });
    }

    // ========== Liveness & lazy pruning ==========

    /// A path is live when it and every ancestor are present. The root is
    /// implicitly always present.
    fn is_live(&self, path: &str) -> bool {
        if path.is_empty() {
            return true;
        }
        if !self.snapshot.contains_key(path) {
            return false;
        }
        let mut current = path;
        while let Some(parent) = parent_of(current) {
            if !parent.is_empty() && !self.snapshot.contains_key(parent) {
                return false;
            }
            current = parent;
        }
        true
    }

    fn is_live_folder(&self, path: &str) -> bool {
        matches!(self.snapshot.get(path), Some(VaultNode::Folder(_))) && self.is_live(path)
    }

    /// Remove a dangling path and everything nested beneath it from the
    /// snapshot and the derived state.
    fn evict_orphans(&mut self, root: &str) {
        let prefix = format!("{}/", root);
        let dead: Vec<String> = self
            .snapshot
            .keys()
            .filter(|key| *key == root || key.starts_with(&prefix))
            .cloned()
            .collect();

        let mut expansion_changed = false;
        for path in &dead {
            self.snapshot.remove(path);
            self.top_level_folders.remove(path);
            expansion_changed |= self.expanded_folder_paths.remove(path);
            if self.focused_path.as_deref() == Some(path.as_str()) {
                self.focused_path = None;
                self.persist_focused();
                self.bus.emit(TreeEvent::FocusChanged { path: None });
            }
        }
        if expansion_changed {
            self.persist_expanded();
        }
        if !dead.is_empty() {
            debug!("evicted {} orphaned nodes under {}", dead.len(), root);
        }
    }

    // ========== Persistence ==========

    fn persist_expanded(&self) {
        let paths: Vec<&str> = self.expanded_folder_paths.iter().map(String::as_str).collect();
        self.bridge.set(EXPANDED_FOLDERS_KEY, serde_json::json!(paths));
    }

    fn persist_focused(&self) {
        self.bridge
            .set(LAST_FOCUSED_KEY, serde_json::json!(self.focused_path));
    }

    fn persist_settings(&self) {
        if let Ok(value) = serde_json::to_value(&self.settings) {
            self.bridge.set(SETTINGS_KEY, value);
        }
    }

    fn persist_sort_rule(&self) {
        if let Ok(value) = serde_json::to_value(self.sort_rule) {
            self.bridge.set(SORT_RULE_KEY, value);
        }
    }
}
