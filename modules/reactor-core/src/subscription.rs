//! Subscriber registry and unsubscribe handles.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Ordered set of callbacks notified after each committed dispatch.
///
/// Every `subscribe` call is an independent registration, even when the same
/// closure is registered twice. Registrations are only removed through
/// `Subscription::unsubscribe`.
pub struct SubscriberSet<T> {
    next_id: AtomicU64,
    entries: Mutex<Vec<(u64, Callback<T>)>>,
}

impl<T: 'static> SubscriberSet<T> {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            next_id: AtomicU64::new(1),
            entries: Mutex::new(Vec::new()),
        })
    }

    pub fn subscribe<F>(self: &Arc<Self>, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.entries.lock().push((id, Arc::new(callback)));

        let weak: Weak<Self> = Arc::downgrade(self);
        let registry: Weak<dyn Detach> = weak;
        Subscription { id, registry }
    }

    /// Call every registered callback in registration order.
    ///
    /// The list is snapshotted first, so callbacks added while notifying wait
    /// for the next round. A callback unsubscribed mid-round is skipped if it
    /// has not been reached yet. The round ends early once `superseded`
    /// returns `true`, i.e. a newer value has already been delivered.
    pub fn notify(&self, value: &T, superseded: impl Fn() -> bool) {
        let snapshot: Vec<(u64, Callback<T>)> = self
            .entries
            .lock()
            .iter()
            .map(|(id, callback)| (*id, Arc::clone(callback)))
            .collect();

        for (id, callback) in snapshot {
            if superseded() {
                break;
            }
            if !self.contains(id) {
                continue;
            }
            callback(value);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

trait Detach: Send + Sync {
    fn detach(&self, id: u64) -> bool;
    fn contains(&self, id: u64) -> bool;
}

impl<T: 'static> Detach for SubscriberSet<T> {
    fn detach(&self, id: u64) -> bool {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() != before
    }

    fn contains(&self, id: u64) -> bool {
        self.entries.lock().iter().any(|(entry_id, _)| *entry_id == id)
    }
}

/// Handle returned by `subscribe`. Dropping it does NOT unsubscribe.
pub struct Subscription {
    id: u64,
    registry: Weak<dyn Detach>,
}

impl Subscription {
    /// Remove exactly this registration. Returns `false` if it was already
    /// removed or the owning reactor is gone.
    pub fn unsubscribe(&self) -> bool {
        match self.registry.upgrade() {
            Some(registry) => registry.detach(self.id),
            None => false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|registry| registry.contains(self.id))
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}
