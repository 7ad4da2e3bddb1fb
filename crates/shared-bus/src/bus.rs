//! # Message Bus
//!
//! One bus per execution context. Sends go out through whichever transport
//! the host offered; `poll` drains the inbox and runs listeners.

use crate::subscriber::{ListenerTable, Subscription};
use crate::transport::{Transport, TransportKind};
use parking_lot::Mutex;
use shared_types::{ContextId, Envelope, GameMessage, TabId};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// A message listener. Registering the same `Arc` twice yields one delivery.
pub type Handler = Arc<dyn Fn(&Envelope) + Send + Sync>;

/// Counters for one bus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusStats {
    /// Envelopes handed to the transport.
    pub sent: u64,
    /// Envelopes delivered to this context.
    pub received: u64,
    /// Sends with no transport or a failed publish, plus undecodable
    /// arrivals.
    pub dropped: u64,
}

/// Cross-context pub/sub endpoint for one context.
pub struct MessageBus {
    context: ContextId,
    transport: Mutex<Option<Box<dyn Transport>>>,
    listeners: Arc<Mutex<ListenerTable>>,
    sent: AtomicU64,
    received: AtomicU64,
    dropped: AtomicU64,
}

impl MessageBus {
    /// Bus for `context`. `None` means local-only play.
    #[must_use]
    pub fn new(context: ContextId, transport: Option<Box<dyn Transport>>) -> Self {
        Self {
            context,
            transport: Mutex::new(transport),
            listeners: Arc::new(Mutex::new(ListenerTable::default())),
            sent: AtomicU64::new(0),
            received: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Context this bus belongs to.
    #[must_use]
    pub fn context(&self) -> ContextId {
        self.context
    }

    /// Transport in use.
    #[must_use]
    pub fn transport_kind(&self) -> TransportKind {
        self.transport
            .lock()
            .as_ref()
            .map_or(TransportKind::None, |t| t.kind())
    }

    /// Publish `message` to every other live context.
    ///
    /// Never fails from the caller's view: without a transport, or when the
    /// publish is refused, the envelope is dropped and logged.
    pub fn send(&self, message: GameMessage, from_tab: Option<TabId>) {
        if let GameMessage::Unknown { kind, .. } = &message {
            warn!(context = %self.context, msg_type = %kind, "Sending unrecognized message type");
        }
        let envelope = Envelope::new(message, from_tab);

        let mut transport = self.transport.lock();
        let Some(transport) = transport.as_mut() else {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            trace!(msg_type = envelope.type_name(), "No transport, envelope dropped");
            return;
        };

        match transport.publish(&envelope) {
            Ok(()) => {
                self.sent.fetch_add(1, Ordering::Relaxed);
                debug!(
                    context = %self.context,
                    msg_type = envelope.type_name(),
                    from_tab = ?envelope.from_tab,
                    "Envelope sent"
                );
            }
            Err(e) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(
                    context = %self.context,
                    msg_type = envelope.type_name(),
                    error = %e,
                    "Envelope dropped"
                );
            }
        }
    }

    /// Register a listener for envelopes from other contexts.
    pub fn on_message(&self, handler: Handler) -> Subscription {
        let (id, fresh) = self.listeners.lock().register(handler);
        if fresh {
            debug!(context = %self.context, listener = id, "Listener registered");
        } else {
            debug!(context = %self.context, listener = id, "Listener already registered");
        }
        Subscription::new(id, &self.listeners)
    }

    /// Detach the listener behind `subscription`.
    ///
    /// Returns `false` if it was already gone.
    pub fn remove_listener(&self, subscription: Subscription) -> bool {
        let id = subscription.id();
        let removed = subscription.detach();
        if removed {
            debug!(context = %self.context, listener = id, "Listener removed");
        }
        removed
    }

    /// Registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Drain the inbox, run every listener on each envelope in arrival
    /// order, and return what was delivered.
    ///
    /// Handlers run with no bus lock held, so they may send or register.
    pub fn poll(&self) -> Vec<Envelope> {
        let arrived = match self.transport.lock().as_mut() {
            Some(transport) => transport.drain(),
            None => return Vec::new(),
        };

        let mut delivered = Vec::with_capacity(arrived.len());
        for item in arrived {
            match item {
                Ok(envelope) => delivered.push(envelope),
                Err(e) => {
                    self.dropped.fetch_add(1, Ordering::Relaxed);
                    warn!(context = %self.context, error = %e, "Malformed envelope dropped");
                }
            }
        }
        if delivered.is_empty() {
            return delivered;
        }

        self.received
            .fetch_add(delivered.len() as u64, Ordering::Relaxed);
        for envelope in &delivered {
            if let GameMessage::Unknown { kind, .. } = &envelope.message {
                debug!(context = %self.context, msg_type = %kind, "Unrecognized message type received");
            }
            // Re-read per envelope so a handler that unsubscribes takes
            // effect for the next one.
            let handlers = self.listeners.lock().handlers();
            for handler in handlers {
                handler(envelope);
            }
        }
        delivered
    }

    /// Counters since construction.
    #[must_use]
    pub fn stats(&self) -> BusStats {
        BusStats {
            sent: self.sent.load(Ordering::Relaxed),
            received: self.received.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for MessageBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageBus")
            .field("context", &self.context)
            .field("transport", &self.transport_kind())
            .field("listeners", &self.listener_count())
            .finish()
    }
}
