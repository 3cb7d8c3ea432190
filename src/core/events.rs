//! Publish/subscribe registry for client events.
//!
//! Listeners are registered per [`EventKind`] (or for every kind) and stored
//! as `Arc<dyn Fn(&Event)>`. Emission snapshots the matching listeners and
//! releases the lock before calling them, so a listener may subscribe,
//! unsubscribe or drive the client again without deadlocking:
//!   - a listener removed during emission is still called in that round;
//!   - a listener added during emission is first called on the next emit.

use crate::core::models::{Event, EventKind};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Handle returned by [`EventBus::on`], accepted by [`EventBus::off`].
pub type ListenerId = u64;

pub type ListenerFn = dyn Fn(&Event) + Send + Sync;

struct Listener {
    id: ListenerId,
    kind: Option<EventKind>,
    callback: Arc<ListenerFn>,
}

pub struct EventBus {
    listeners: Mutex<Vec<Listener>>,
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register `callback` for events of `kind`.
    pub fn on(
        &self,
        kind: EventKind,
        callback: impl Fn(&Event) + Send + Sync + 'static,
    ) -> ListenerId {
        self.register(Some(kind), Arc::new(callback))
    }

    /// Register `callback` for every event.
    pub fn on_any(&self, callback: impl Fn(&Event) + Send + Sync + 'static) -> ListenerId {
        self.register(None, Arc::new(callback))
    }

    fn register(&self, kind: Option<EventKind>, callback: Arc<ListenerFn>) -> ListenerId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.lock().push(Listener { id, kind, callback });
        id
    }

    /// Remove a listener. Unknown ids are ignored.
    pub fn off(&self, id: ListenerId) {
        self.listeners.lock().retain(|l| l.id != id);
    }

    pub fn emit(&self, event: &Event) {
        let kind = event.kind();
        let snapshot: Vec<Arc<ListenerFn>> = {
            let guard = self.listeners.lock();
            guard
                .iter()
                .filter(|l| l.kind.map_or(true, |k| k == kind))
                .map(|l| Arc::clone(&l.callback))
                .collect()
        };

        for callback in snapshot {
            callback(event);
        }
    }

    /// Listeners that would receive an event of `kind`.
    #[cfg(test)]
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.listeners
            .lock()
            .iter()
            .filter(|l| l.kind.map_or(true, |k| k == kind))
            .count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
