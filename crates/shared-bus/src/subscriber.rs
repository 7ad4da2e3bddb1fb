//! # Listener Subscriptions
//!
//! `on_message` hands back a [`Subscription`]. While any handle for a
//! listener is alive, the listener receives envelopes; when the last handle
//! drops, the listener is detached. No caller needs to keep the original
//! closure around to unregister it.

use crate::bus::Handler;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tracing::debug;

/// Identifier of a registered listener within one bus.
pub type ListenerId = u64;

struct ListenerEntry {
    id: ListenerId,
    handler: Handler,
    /// Live `Subscription` handles for this listener.
    handles: usize,
}

/// Registered listeners of one bus, in registration order.
#[derive(Default)]
pub(crate) struct ListenerTable {
    next_id: ListenerId,
    entries: Vec<ListenerEntry>,
}

impl ListenerTable {
    /// Register `handler`, or add a handle to it if the same `Arc` is
    /// already registered.
    pub(crate) fn register(&mut self, handler: Handler) -> (ListenerId, bool) {
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|entry| same_handler(&entry.handler, &handler))
        {
            entry.handles += 1;
            return (entry.id, false);
        }

        self.next_id += 1;
        let id = self.next_id;
        self.entries.push(ListenerEntry {
            id,
            handler,
            handles: 1,
        });
        (id, true)
    }

    /// Drop one handle; the listener goes when none remain.
    fn release(&mut self, id: ListenerId) -> bool {
        let Some(pos) = self.entries.iter().position(|entry| entry.id == id) else {
            return false;
        };
        let entry = &mut self.entries[pos];
        entry.handles = entry.handles.saturating_sub(1);
        if entry.handles == 0 {
            self.entries.remove(pos);
            return true;
        }
        false
    }

    /// Detach regardless of outstanding handles.
    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != before
    }

    /// Snapshot of the handlers so they can run without the lock held.
    pub(crate) fn handlers(&self) -> Vec<Handler> {
        self.entries.iter().map(|entry| entry.handler.clone()).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

// Compare data pointers only; vtable pointers for the same closure may
// differ between codegen units.
fn same_handler(a: &Handler, b: &Handler) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a).cast::<()>(),
        Arc::as_ptr(b).cast::<()>(),
    )
}

/// A handle keeping one listener attached.
///
/// Dropping it (or passing it to `MessageBus::remove_listener`) releases
/// the listener. Handles outliving their bus are inert.
#[must_use = "dropping a Subscription detaches the listener"]
pub struct Subscription {
    id: ListenerId,
    table: Weak<Mutex<ListenerTable>>,
    /// Set once the listener was detached explicitly.
    released: bool,
}

impl Subscription {
    pub(crate) fn new(id: ListenerId, table: &Arc<Mutex<ListenerTable>>) -> Self {
        Self {
            id,
            table: Arc::downgrade(table),
            released: false,
        }
    }

    /// Listener this handle keeps alive.
    #[must_use]
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Whether the listener is still attached.
    #[must_use]
    pub fn is_active(&self) -> bool {
        if self.released {
            return false;
        }
        self.table
            .upgrade()
            .is_some_and(|table| table.lock().entries.iter().any(|e| e.id == self.id))
    }

    /// Detach the listener now, even if other handles for it exist.
    pub(crate) fn detach(mut self) -> bool {
        self.released = true;
        match self.table.upgrade() {
            Some(table) => table.lock().remove(self.id),
            None => false,
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("released", &self.released)
            .finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let Some(table) = self.table.upgrade() else {
            return;
        };
        if table.lock().release(self.id) {
            debug!(listener = self.id, "Listener detached");
        }
    }
}
