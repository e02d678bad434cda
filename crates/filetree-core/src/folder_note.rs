//! Folder-note resolution.
//!
//! Maps a folder to its associated document under the configured location
//! strategy, with a policy for the missing-note case. Resolution is invoked
//! on demand (folder focus/selection) and never cached: the candidate path
//! is a function of current settings.

use crate::node::{FolderNode, join_path};
use crate::settings::{FolderNoteLocation, MissingBehavior, TreeViewSettings};
use crate::vault::VaultAdapter;
use tracing::{debug, warn};

/// Placeholder substituted by the folder name in custom templates.
const FOLDER_PLACEHOLDER: &str = "{folder}";

/// Outcome of resolving a folder's note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteResolution {
    /// The candidate path exists in the vault.
    Found(String),
    /// The note was absent and has been created at the candidate path.
    Created(String),
    /// No note, per the configured missing behavior.
    Missing,
}

impl NoteResolution {
    /// The resolved note path, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            NoteResolution::Found(path) | NoteResolution::Created(path) => Some(path),
            NoteResolution::Missing => None,
        }
    }
}

/// Compute the candidate note path for a folder under a location strategy.
///
/// Custom templates substitute `{folder}` with the folder name and are
/// otherwise used verbatim as vault-relative paths; a template without the
/// placeholder is a valid fixed path. Returns `None` when the result is not
/// a usable path.
pub fn candidate_path(
    folder: &FolderNode,
    location: FolderNoteLocation,
    custom_template: &str,
) -> Option<String> {
    let candidate = match location {
        FolderNoteLocation::Index => join_path(&folder.path, "index.md"),
        FolderNoteLocation::Underscore => join_path(&folder.path, "_folder.md"),
        FolderNoteLocation::SameName => join_path(&folder.path, &format!("{}.md", folder.name())),
        FolderNoteLocation::Custom => custom_template.replace(FOLDER_PLACEHOLDER, folder.name()),
    };
    if is_valid_note_path(&candidate) {
        Some(candidate)
    } else {
        None
    }
}

/// Validate a vault-relative note path.
fn is_valid_note_path(path: &str) -> bool {
    if path.is_empty() {
        return false;
    }
    // Path traversal
    if path.split('/').any(|segment| segment == "..") {
        return false;
    }
    // Empty segments (a//b.md) and absolute paths
    if path.contains("//") || path.starts_with('/') {
        return false;
    }
    // Windows absolute paths and separators
    if path.len() >= 2 && path.as_bytes()[1] == b':' {
        return false;
    }
    if path.contains('\\') {
        return false;
    }
    // Null bytes and control characters
    if path.chars().any(|c| c.is_control()) {
        return false;
    }
    // Path length limit (filesystem safety)
    if path.len() > 1024 {
        return false;
    }
    true
}

/// Resolve a folder's note against the vault under the current settings.
///
/// The engine performs no I/O itself: existence checks, note creation and
/// user notices are all delegated through the adapter. A malformed custom
/// template is treated as "note missing", never as a fatal condition; with
/// no usable candidate the `Create` branch has nothing to create and
/// degrades to `Missing`.
pub fn resolve<V: VaultAdapter + ?Sized>(
    vault: &V,
    folder: &FolderNode,
    settings: &TreeViewSettings,
) -> NoteResolution {
    let candidate = candidate_path(
        folder,
        settings.folder_note_location,
        &settings.custom_folder_note_path,
    );

    let Some(candidate) = candidate else {
        debug!("no usable folder note path for \"{}\"", folder.path);
        if settings.folder_note_missing_behavior == MissingBehavior::Warn {
            vault.show_notice(&missing_notice(folder));
        }
        return NoteResolution::Missing;
    };

    if vault.exists(&candidate) {
        return NoteResolution::Found(candidate);
    }

    match settings.folder_note_missing_behavior {
        MissingBehavior::Ignore => NoteResolution::Missing,
        MissingBehavior::Warn => {
            vault.show_notice(&missing_notice(folder));
            NoteResolution::Missing
        }
        MissingBehavior::Create => match vault.create_note(&candidate) {
            Ok(_) => {
                debug!("created folder note at {}", candidate);
                NoteResolution::Created(candidate)
            }
            Err(e) => {
                warn!("failed to create folder note {}: {}", candidate, e);
                NoteResolution::Missing
            }
        },
    }
}

fn missing_notice(folder: &FolderNode) -> String {
    format!("No folder note found for \"{}\"", folder.name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::InMemoryVault;

    fn settings_with(
        location: FolderNoteLocation,
        template: &str,
        behavior: MissingBehavior,
    ) -> TreeViewSettings {
        TreeViewSettings {
            folder_note_location: location,
            custom_folder_note_path: template.into(),
            folder_note_missing_behavior: behavior,
            ..TreeViewSettings::default()
        }
    }

    #[test]
    fn test_candidate_paths_per_strategy() {
        let folder = FolderNode::new("Projects");

        assert_eq!(
            candidate_path(&folder, FolderNoteLocation::Index, ""),
            Some("Projects/index.md".into())
        );
        assert_eq!(
            candidate_path(&folder, FolderNoteLocation::Underscore, ""),
            Some("Projects/_folder.md".into())
        );
        assert_eq!(
            candidate_path(&folder, FolderNoteLocation::SameName, ""),
            Some("Projects/Projects.md".into())
        );
        assert_eq!(
            candidate_path(&folder, FolderNoteLocation::Custom, "notes/{folder}.md"),
            Some("notes/Projects.md".into())
        );
    }

    #[test]
    fn test_custom_template_without_placeholder_is_a_fixed_path() {
        let folder = FolderNode::new("Projects");
        assert_eq!(
            candidate_path(&folder, FolderNoteLocation::Custom, "meta/overview.md"),
            Some("meta/overview.md".into())
        );
    }

    #[test]
    fn test_nested_folder_substitutes_name_not_path() {
        let folder = FolderNode::new("work/Projects");
        assert_eq!(
            candidate_path(&folder, FolderNoteLocation::Custom, "{folder}/index.md"),
            Some("Projects/index.md".into())
        );
    }

    #[test]
    fn test_malformed_templates_yield_no_candidate() {
        let folder = FolderNode::new("Projects");
        for template in ["", "../{folder}.md", "/abs/{folder}.md", "a//b.md", "C:\\notes.md"] {
            assert_eq!(
                candidate_path(&folder, FolderNoteLocation::Custom, template),
                None,
                "template {:?} should be rejected",
                template
            );
        }
    }

    #[test]
    fn test_resolve_found() {
        let vault = InMemoryVault::new();
        vault.add_file("Projects/index.md");
        let folder = FolderNode::new("Projects");
        let settings = settings_with(FolderNoteLocation::Index, "", MissingBehavior::Ignore);

        assert_eq!(
            resolve(&vault, &folder, &settings),
            NoteResolution::Found("Projects/index.md".into())
        );
    }

    #[test]
    fn test_resolve_missing_ignore_has_no_side_effects() {
        let vault = InMemoryVault::new();
        vault.add_folder("Projects");
        let folder = FolderNode::new("Projects");
        let settings = settings_with(FolderNoteLocation::Index, "", MissingBehavior::Ignore);

        assert_eq!(resolve(&vault, &folder, &settings), NoteResolution::Missing);
        assert!(vault.notices().is_empty());
        assert!(!vault.exists("Projects/index.md"));
    }

    #[test]
    fn test_resolve_missing_warn_requests_notice() {
        let vault = InMemoryVault::new();
        vault.add_folder("Projects");
        let folder = FolderNode::new("Projects");
        let settings = settings_with(FolderNoteLocation::Index, "", MissingBehavior::Warn);

        assert_eq!(resolve(&vault, &folder, &settings), NoteResolution::Missing);
        assert_eq!(vault.notices().len(), 1);
        assert!(vault.notices()[0].contains("Projects"));
    }

    #[test]
    fn test_resolve_missing_create_requests_creation() {
        let vault = InMemoryVault::new();
        vault.add_folder("Projects");
        let folder = FolderNode::new("Projects");
        let settings = settings_with(
            FolderNoteLocation::Custom,
            "{folder}/index.md",
            MissingBehavior::Create,
        );

        // Creation requested for exactly the candidate path.
        assert_eq!(
            resolve(&vault, &folder, &settings),
            NoteResolution::Created("Projects/index.md".into())
        );
        assert!(vault.exists("Projects/index.md"));

        // A subsequent resolution now finds the created note.
        assert_eq!(
            resolve(&vault, &folder, &settings),
            NoteResolution::Found("Projects/index.md".into())
        );
    }

    #[test]
    fn test_malformed_template_defers_to_missing_policy() {
        let vault = InMemoryVault::new();
        vault.add_folder("Projects");
        let folder = FolderNode::new("Projects");

        // Ignore: silent.
        let settings = settings_with(FolderNoteLocation::Custom, "../escape.md", MissingBehavior::Ignore);
        assert_eq!(resolve(&vault, &folder, &settings), NoteResolution::Missing);
        assert!(vault.notices().is_empty());

        // Warn: notice requested.
        let settings = settings_with(FolderNoteLocation::Custom, "../escape.md", MissingBehavior::Warn);
        assert_eq!(resolve(&vault, &folder, &settings), NoteResolution::Missing);
        assert_eq!(vault.notices().len(), 1);

        // Create: nothing usable to create.
        let settings = settings_with(FolderNoteLocation::Custom, "../escape.md", MissingBehavior::Create);
        assert_eq!(resolve(&vault, &folder, &settings), NoteResolution::Missing);
        assert!(!vault.exists("../escape.md"));
    }

    #[test]
    fn test_root_folder_index_note() {
        let vault = InMemoryVault::new();
        vault.add_file("index.md");
        let root = FolderNode::new("");
        let settings = settings_with(FolderNoteLocation::Index, "", MissingBehavior::Ignore);

        assert_eq!(
            resolve(&vault, &root, &settings),
            NoteResolution::Found("index.md".into())
        );
    }
}
