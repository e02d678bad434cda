//! Display settings and the recognized settings mutations.
//!
//! The persisted shape uses camelCase field names so state written by older
//! plugin builds loads unchanged. Unknown persisted fields are ignored and
//! absent fields fall back to defaults, so a partial settings object from an
//! earlier version is a valid initial state.

use crate::sort::SortRule;
use serde::{Deserialize, Serialize};

/// How folders and files are arranged in the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LayoutMode {
    HorizontalSplit,
    VerticalSplit,
}

/// Vertical spacing between file items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FileItemSpacing {
    Compact,
    Comfortable,
}

/// Which click target expands a folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExpandTrigger {
    Icon,
    FolderName,
}

/// Where to look for a folder's note file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FolderNoteLocation {
    /// `<folder>/index.md`
    Index,
    /// `<folder>/_folder.md`
    Underscore,
    /// `<folder>/<folder name>.md`
    SameName,
    /// The `custom_folder_note_path` template, `{folder}` substituted.
    Custom,
}

/// What to do when no folder note is found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MissingBehavior {
    Ignore,
    Warn,
    Create,
}

/// All display settings, persisted as a single object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TreeViewSettings {
    pub open_on_startup: bool,
    pub layout_mode: LayoutMode,
    pub show_file_detail: bool,
    pub show_file_creation_date: bool,
    pub file_creation_date_format: String,
    pub show_hierarchy_lines: bool,
    pub show_folder_icon: bool,
    pub show_file_item_divider: bool,
    pub file_item_spacing: FileItemSpacing,
    pub highlight_action_bar: bool,
    pub auto_hide_action_bar: bool,
    pub expand_folder_on_click: ExpandTrigger,
    pub include_subfolder_files_count: bool,
    pub show_files_from_subfolders: bool,
    pub open_destination_folder_after_move: bool,
    pub hide_root_folder: bool,
    pub auto_open_folder_note: bool,
    pub bold_file_title: bool,
    pub folder_note_location: FolderNoteLocation,
    pub custom_folder_note_path: String,
    pub folder_note_missing_behavior: MissingBehavior,
}

impl Default for TreeViewSettings {
    fn default() -> Self {
        Self {
            open_on_startup: true,
            layout_mode: LayoutMode::HorizontalSplit,
            show_file_detail: true,
            show_file_creation_date: true,
            file_creation_date_format: "YYYY-MM-DD".into(),
            show_hierarchy_lines: false,
            show_folder_icon: true,
            show_file_item_divider: true,
            file_item_spacing: FileItemSpacing::Comfortable,
            highlight_action_bar: false,
            auto_hide_action_bar: false,
            expand_folder_on_click: ExpandTrigger::Icon,
            include_subfolder_files_count: false,
            show_files_from_subfolders: false,
            open_destination_folder_after_move: false,
            hide_root_folder: false,
            auto_open_folder_note: false,
            bold_file_title: false,
            folder_note_location: FolderNoteLocation::Index,
            custom_folder_note_path: "{folder}/index.md".into(),
            folder_note_missing_behavior: MissingBehavior::Ignore,
        }
    }
}

/// A recognized settings mutation, one strongly-typed variant per field.
///
/// The host delivers these instead of loose key/value pairs, so an
/// unrecognized key cannot exist at runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsChange {
    OpenOnStartup(bool),
    LayoutMode(LayoutMode),
    ShowFileDetail(bool),
    ShowFileCreationDate(bool),
    FileCreationDateFormat(String),
    ShowHierarchyLines(bool),
    ShowFolderIcon(bool),
    ShowFileItemDivider(bool),
    FileItemSpacing(FileItemSpacing),
    HighlightActionBar(bool),
    AutoHideActionBar(bool),
    ExpandFolderOnClick(ExpandTrigger),
    IncludeSubfolderFilesCount(bool),
    ShowFilesFromSubfolders(bool),
    OpenDestinationFolderAfterMove(bool),
    HideRootFolder(bool),
    AutoOpenFolderNote(bool),
    BoldFileTitle(bool),
    FolderNoteLocation(FolderNoteLocation),
    CustomFolderNotePath(String),
    FolderNoteMissingBehavior(MissingBehavior),
    /// Routed to the store's sort rule, not to the settings object.
    FolderSortRule(SortRule),
}

impl TreeViewSettings {
    /// Apply a settings mutation. Pure assignment; the snapshot's shape is
    /// never affected by settings changes.
    ///
    /// `FolderSortRule` is not a display setting and is a no-op here; the
    /// store routes it to its own sort rule.
    pub fn apply(&mut self, change: &SettingsChange) {
        match change {
            SettingsChange::OpenOnStartup(v) => self.open_on_startup = *v,
            SettingsChange::LayoutMode(v) => self.layout_mode = *v,
            SettingsChange::ShowFileDetail(v) => self.show_file_detail = *v,
            SettingsChange::ShowFileCreationDate(v) => self.show_file_creation_date = *v,
            SettingsChange::FileCreationDateFormat(v) => {
                self.file_creation_date_format = v.clone()
            }
            SettingsChange::ShowHierarchyLines(v) => self.show_hierarchy_lines = *v,
            SettingsChange::ShowFolderIcon(v) => self.show_folder_icon = *v,
            SettingsChange::ShowFileItemDivider(v) => self.show_file_item_divider = *v,
            SettingsChange::FileItemSpacing(v) => self.file_item_spacing = *v,
            SettingsChange::HighlightActionBar(v) => self.highlight_action_bar = *v,
            SettingsChange::AutoHideActionBar(v) => self.auto_hide_action_bar = *v,
            SettingsChange::ExpandFolderOnClick(v) => self.expand_folder_on_click = *v,
            SettingsChange::IncludeSubfolderFilesCount(v) => {
                self.include_subfolder_files_count = *v
            }
            SettingsChange::ShowFilesFromSubfolders(v) => self.show_files_from_subfolders = *v,
            SettingsChange::OpenDestinationFolderAfterMove(v) => {
                self.open_destination_folder_after_move = *v
            }
            SettingsChange::HideRootFolder(v) => self.hide_root_folder = *v,
            SettingsChange::AutoOpenFolderNote(v) => self.auto_open_folder_note = *v,
            SettingsChange::BoldFileTitle(v) => self.bold_file_title = *v,
            SettingsChange::FolderNoteLocation(v) => self.folder_note_location = *v,
            SettingsChange::CustomFolderNotePath(v) => self.custom_folder_note_path = v.clone(),
            SettingsChange::FolderNoteMissingBehavior(v) => {
                self.folder_note_missing_behavior = *v
            }
            SettingsChange::FolderSortRule(_) => {}
        }
    }
}
