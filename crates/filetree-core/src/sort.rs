//! Sort engine: deterministic ordering of sibling folders.
//!
//! Pure functions over the snapshot. Results are total orders: every rule
//! breaks ties by path string ascending, so equal-key inputs (identical
//! timestamps, equal counts) order identically across repeated calls.

use crate::node::{FolderNode, Snapshot, VaultNode, parent_of};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Comparator selection for sibling folders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum SortRule {
    #[default]
    FolderNameAscending,
    FolderNameDescending,
    CreatedTimeAscending,
    CreatedTimeDescending,
    ModifiedTimeAscending,
    ModifiedTimeDescending,
    FilesCountAscending,
    FilesCountDescending,
}

/// Order a set of sibling folders under the given rule.
///
/// `include_subfolder_files` only affects ordering under the file-count
/// rules, where the counted value doubles as the sort key; elsewhere it
/// changes nothing here (the caller uses it for the displayed count).
pub fn sort_folders(
    snapshot: &Snapshot,
    mut folders: Vec<FolderNode>,
    rule: SortRule,
    include_subfolder_files: bool,
) -> Vec<FolderNode> {
    folders.sort_by(|a, b| {
        let primary = match rule {
            SortRule::FolderNameAscending => compare_names(a, b),
            SortRule::FolderNameDescending => compare_names(b, a),
            SortRule::CreatedTimeAscending => a.created_ms.cmp(&b.created_ms),
            SortRule::CreatedTimeDescending => b.created_ms.cmp(&a.created_ms),
            SortRule::ModifiedTimeAscending => a.modified_ms.cmp(&b.modified_ms),
            SortRule::ModifiedTimeDescending => b.modified_ms.cmp(&a.modified_ms),
            SortRule::FilesCountAscending => {
                let ca = file_count(snapshot, &a.path, include_subfolder_files);
                let cb = file_count(snapshot, &b.path, include_subfolder_files);
                ca.cmp(&cb)
            }
            SortRule::FilesCountDescending => {
                let ca = file_count(snapshot, &a.path, include_subfolder_files);
                let cb = file_count(snapshot, &b.path, include_subfolder_files);
                cb.cmp(&ca)
            }
        };
        primary.then_with(|| a.path.cmp(&b.path))
    });
    folders
}

fn compare_names(a: &FolderNode, b: &FolderNode) -> Ordering {
    a.name().to_lowercase().cmp(&b.name().to_lowercase())
}

/// Number of files under a folder.
///
/// Direct children only, or the whole subtree when `include_subfolders` is
/// set. Recomputed from the snapshot on every call; structural changes
/// therefore never leave a stale count behind.
pub fn file_count(snapshot: &Snapshot, folder_path: &str, include_subfolders: bool) -> usize {
    let mut count = 0;
    for node in snapshot.values() {
        match node {
            VaultNode::File(file) if parent_of(&file.path) == Some(folder_path) => count += 1,
            VaultNode::Folder(folder)
                if include_subfolders && parent_of(&folder.path) == Some(folder_path) =>
            {
                count += file_count(snapshot, &folder.path, true)
            }
            _ => {}
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::FileNode;

    fn folder(path: &str, created_ms: u64, modified_ms: u64) -> FolderNode {
        FolderNode {
            path: path.into(),
            created_ms,
            modified_ms,
        }
    }

    fn snapshot_with_files(files: &[&str]) -> Snapshot {
        let mut snapshot = Snapshot::new();
        snapshot.insert(String::new(), VaultNode::Folder(FolderNode::new("")));
        for path in files {
            snapshot.insert(path.to_string(), VaultNode::File(FileNode::new(*path)));
            // Register ancestor folders so counting can recurse through them.
            let mut current = *path;
            while let Some(parent) = parent_of(current) {
                snapshot
                    .entry(parent.to_string())
                    .or_insert_with(|| VaultNode::Folder(FolderNode::new(parent)));
                current = parent;
            }
        }
        snapshot
    }

    #[test]
    fn test_name_sort_is_case_insensitive() {
        let folders = vec![folder("zebra", 0, 0), folder("Apple", 0, 0), folder("mango", 0, 0)];
        let sorted = sort_folders(&Snapshot::new(), folders, SortRule::FolderNameAscending, false);
        let names: Vec<_> = sorted.iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["Apple", "mango", "zebra"]);
    }

    #[test]
    fn test_equal_keys_break_ties_by_path_ascending() {
        // Identical modified timestamps; order must come from the path.
        let folders = vec![folder("c", 0, 500), folder("a", 0, 500), folder("b", 0, 500)];
        let sorted = sort_folders(
            &Snapshot::new(),
            folders,
            SortRule::ModifiedTimeDescending,
            false,
        );
        let paths: Vec<_> = sorted.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_sort_is_deterministic_over_permutations() {
        let a = vec![folder("x", 3, 0), folder("y", 1, 0), folder("z", 3, 0)];
        let b = vec![folder("z", 3, 0), folder("x", 3, 0), folder("y", 1, 0)];

        let sorted_a = sort_folders(&Snapshot::new(), a, SortRule::CreatedTimeAscending, false);
        let sorted_b = sort_folders(&Snapshot::new(), b, SortRule::CreatedTimeAscending, false);
        assert_eq!(sorted_a, sorted_b);

        // Applying the sort to its own output changes nothing.
        let resorted = sort_folders(
            &Snapshot::new(),
            sorted_a.clone(),
            SortRule::CreatedTimeAscending,
            false,
        );
        assert_eq!(resorted, sorted_a);
    }

    #[test]
    fn test_file_count_direct_children_only() {
        let snapshot = snapshot_with_files(&["docs/a.md", "docs/b.md", "docs/sub/c.md"]);
        assert_eq!(file_count(&snapshot, "docs", false), 2);
    }

    #[test]
    fn test_file_count_includes_subfolders_when_enabled() {
        let snapshot = snapshot_with_files(&["docs/a.md", "docs/b.md", "docs/sub/c.md", "docs/sub/deep/d.md"]);
        assert_eq!(file_count(&snapshot, "docs", true), 4);
    }

    #[test]
    fn test_file_count_empty_folder() {
        let snapshot = snapshot_with_files(&["other/a.md"]);
        assert_eq!(file_count(&snapshot, "docs", false), 0);
        assert_eq!(file_count(&snapshot, "docs", true), 0);
    }

    #[test]
    fn test_files_count_rule_uses_counting_policy() {
        let snapshot = snapshot_with_files(&["one/a.md", "two/a.md", "two/sub/b.md", "two/sub/c.md"]);
        let folders = vec![folder("one", 0, 0), folder("two", 0, 0)];

        // Direct counts are equal (1 vs 1): tie broken by path.
        let sorted = sort_folders(
            &snapshot,
            folders.clone(),
            SortRule::FilesCountDescending,
            false,
        );
        assert_eq!(sorted[0].path, "one");

        // Subfolder counting makes "two" heavier (3 vs 1).
        let sorted = sort_folders(&snapshot, folders, SortRule::FilesCountDescending, true);
        assert_eq!(sorted[0].path, "two");
    }
}
