//! Store event infrastructure.
//!
//! The store owns an explicit observer interface instead of an ambient
//! process-wide channel: the presentation layer calls `subscribe` and holds
//! the returned `Subscription`, dropping it to unsubscribe deterministically
//! at session teardown.

use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock, Weak};

/// Events emitted by the store after its state has been updated.
///
/// Consumers re-query derived views in response; the events carry enough to
/// decide whether a re-query is needed, not the derived data itself.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TreeEvent {
    /// A vault change was reconciled into the snapshot.
    TreeChanged {
        /// "create", "modify", "delete" or "rename".
        #[serde(rename = "changeType")]
        change_type: String,
        /// Path the change referred to (new path for renames).
        path: String,
    },
    /// A single folder was expanded or collapsed.
    ExpansionChanged { path: String, expanded: bool },
    /// The whole expansion set was replaced (collapse-all or restore).
    ExpansionReset,
    /// The focused folder changed.
    FocusChanged { path: Option<String> },
    /// A display setting or the sort rule changed.
    SettingsChanged,
}

/// Subscription handle that unsubscribes automatically when dropped.
///
/// Follows the disposer pattern: hold this value to keep receiving events,
/// drop it (or let it go out of scope) to unsubscribe.
pub struct Subscription {
    bus: Weak<EventBus>,
    id: usize,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.unsubscribe(self.id);
        }
    }
}

/// Event bus for publishing tree events to subscribers.
///
/// Wrap in `Arc` to enable subscriptions.
pub struct EventBus {
    callbacks: RwLock<Vec<(usize, Arc<dyn Fn(TreeEvent) + Send + Sync>)>>,
    next_id: AtomicUsize,
}

impl Default for EventBus {
    fn default() -> Self {
        Self {
            callbacks: RwLock::new(Vec::new()),
            next_id: AtomicUsize::new(0),
        }
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to events. Returns `Subscription` that unsubscribes on drop.
    ///
    /// Requires `self` to be wrapped in `Arc`.
    pub fn subscribe(
        self: &Arc<Self>,
        callback: impl Fn(TreeEvent) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.callbacks
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push((id, Arc::new(callback)));
        Subscription {
            bus: Arc::downgrade(self),
            id,
        }
    }

    fn unsubscribe(&self, id: usize) {
        // Use try_write to avoid deadlock if Drop runs during panic unwinding
        // while a read lock is held (e.g., during emit).
        if let Ok(mut guard) = self.callbacks.try_write() {
            guard.retain(|(i, _)| *i != id);
        }
    }

    /// Emit an event to all subscribers.
    pub fn emit(&self, event: TreeEvent) {
        // Clone the callback list to prevent deadlock if a callback calls subscribe.
        let callbacks: Vec<_> = self
            .callbacks
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();

        for callback in callbacks {
            callback(event.clone());
        }
    }
}
