//! Subscription registry for a single reactive property.
//!
//! Every [`ReactiveCell`](crate::ReactiveCell) owns one [`Dep`]. Watchers are
//! appended when they read the cell during their resolution pass and are
//! notified, in registration order, whenever the cell's value changes.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::watcher::Watcher;

/// An ordered list of watchers interested in one property.
///
/// The list is not de-duplicated. A watcher that reads the same property
/// twice while resolving is registered twice and updated twice; the second
/// update is a no-op because the watcher's own change check has already
/// absorbed the new value.
#[derive(Default)]
pub struct Dep {
    subscribers: Mutex<Vec<Arc<Watcher>>>,
}

impl Dep {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a watcher. Insertion order is notification order.
    pub fn add_subscriber(&self, watcher: Arc<Watcher>) {
        self.subscribers.lock().push(watcher);
    }

    /// Synchronously update every registered watcher in order.
    ///
    /// The list is snapshotted first so a watcher may read or write the
    /// owning property from inside its callback. Watchers added during a
    /// notification are first notified on the next one. A panicking callback
    /// aborts the remaining updates.
    #[tracing::instrument(skip_all, target = "strand_core::dep", level = "trace")]
    pub fn notify(&self) {
        let subscribers = self.subscribers.lock().clone();
        tracing::trace!(
            target: "strand_core::dep",
            subscriber_count = subscribers.len(),
            "notifying subscribers"
        );
        for watcher in &subscribers {
            watcher.update();
        }
    }

    /// Number of registrations (duplicates included).
    pub fn len(&self) -> usize {
        self.subscribers.lock().len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.subscribers.lock().is_empty()
    }

    /// Whether the watcher with `id` is registered.
    pub fn contains(&self, id: u64) -> bool {
        self.subscribers.lock().iter().any(|w| w.id() == id)
    }

    /// Ids of the registered watchers, in notification order.
    pub fn subscriber_ids(&self) -> Vec<u64> {
        self.subscribers.lock().iter().map(|w| w.id()).collect()
    }
}

impl fmt::Debug for Dep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dep")
            .field("subscribers", &self.subscriber_ids())
            .finish()
    }
}
