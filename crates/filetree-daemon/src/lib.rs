//! filetree-daemon library: Exposes internal modules for testing.
//!
//! This is a thin library layer over the daemon components,
//! allowing integration tests to access internal types.

pub mod native_vault;
pub mod persistence;
pub mod watcher;

// Re-export key types for convenience
pub use native_vault::{NativeVault, STATE_DIR};
pub use persistence::JsonStateFile;
pub use watcher::{SignalKind, VaultSignal, VaultWatcher};
