//! filetree-daemon: Mirrors a directory tree into a live FileTreeStore.
//!
//! Headless host for the core engine: populates the store from a full
//! enumeration, then feeds debounced filesystem changes through the
//! reconciliation path and prints the derived folder tree after each change.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use filetree_core::persist::PersistenceBridge;
use filetree_core::store::FileTreeStore;
use filetree_core::vault::{VaultAdapter, VaultChange};
use filetree_daemon::native_vault::NativeVault;
use filetree_daemon::persistence::JsonStateFile;
use filetree_daemon::watcher::{SignalKind, VaultSignal, VaultWatcher};

#[derive(Parser, Debug)]
#[command(name = "filetree-daemon")]
#[command(about = "Live folder-tree mirror for a vault directory")]
struct Args {
    /// Path to the vault directory
    #[arg(short, long)]
    vault: PathBuf,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let vault = NativeVault::new(args.vault.clone());
    let bridge = JsonStateFile::new(&args.vault);
    let mut store = FileTreeStore::new(bridge);

    store.populate(vault.enumerate());
    store.restore_expanded_folder_paths();
    store.restore_last_focused_folder();

    let _subscription = store.subscribe(|event| debug!("store event: {:?}", event));

    print_tree(&mut store);

    let mut watcher = VaultWatcher::new(args.vault.clone())?;
    info!("watching {}", watcher.vault_path().display());

    loop {
        tokio::select! {
            signal = watcher.recv() => {
                let Some(signal) = signal else { break };
                if let Some(change) = to_change(&vault, &store, signal) {
                    store.apply_vault_change(change);
                    print_tree(&mut store);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Classify a raw watcher signal against the store's snapshot.
///
/// A touched path the store already knows is a modification; an unknown one
/// is a creation. Removal needs no node at all.
fn to_change<P: PersistenceBridge>(
    vault: &NativeVault,
    store: &FileTreeStore<P>,
    signal: VaultSignal,
) -> Option<VaultChange> {
    match signal.kind {
        SignalKind::Removed => Some(VaultChange::Deleted { path: signal.path }),
        SignalKind::Touched => {
            let node = vault.node_at(&signal.path)?;
            if store.contains(&signal.path) {
                Some(VaultChange::Modified(node))
            } else {
                Some(VaultChange::Created(node))
            }
        }
    }
}

/// Print the folder tree: expanded folders recurse, collapsed ones show an
/// affordance marker, every folder shows its file count under the current
/// counting policy.
fn print_tree<P: PersistenceBridge>(store: &mut FileTreeStore<P>) {
    let mut out = String::new();
    if !store.settings().hide_root_folder {
        out.push_str(&format!("/ ({})\n", store.file_count("")));
    }
    render_level(store, "", 0, &mut out);
    println!("{}", out.trim_end());
}

fn render_level<P: PersistenceBridge>(
    store: &mut FileTreeStore<P>,
    parent: &str,
    depth: usize,
    out: &mut String,
) {
    for folder in store.sorted_folders_by_parent(parent) {
        let marker = if store.is_expanded(&folder.path) {
            "▾"
        } else if store.has_folder_children(&folder.path) {
            "▸"
        } else {
            "·"
        };
        let focused = if store.focused() == Some(folder.path.as_str()) {
            " *"
        } else {
            ""
        };
        out.push_str(&format!(
            "{}{} {} ({}){}\n",
            "  ".repeat(depth + 1),
            marker,
            folder.name(),
            store.file_count(&folder.path),
            focused,
        ));
        if store.is_expanded(&folder.path) {
            render_level(store, &folder.path, depth + 1, out);
        }
    }
}
