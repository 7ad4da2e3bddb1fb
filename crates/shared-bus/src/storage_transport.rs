//! # Storage-Event Transport
//!
//! Fallback for hosts without a broadcast channel. Each send writes a
//! nonced envelope to one well-known key; every other context sees the
//! change notification. The writer never does.
//!
//! ## Delivery
//!
//! Each write carries a fresh nonce, so back-to-back identical messages
//! still change the stored value and none are coalesced. Only the latest
//! envelope stays in storage; a context opened later does not see earlier
//! ones.

use crate::nonce_cache::RecentNonces;
use crate::transport::{Transport, TransportKind};
use shared_types::{
    BusError, Envelope, MessageError, StorageArea, StorageHandle, StorageWatcher, WireEnvelope,
};
use tracing::{debug, trace};
use uuid::Uuid;

/// One context's storage-event transport.
pub struct StorageEventTransport {
    storage: StorageHandle,
    key: String,
    watcher: StorageWatcher,
    nonces: RecentNonces,
}

impl StorageEventTransport {
    /// Watch `key` on behalf of the handle's context.
    ///
    /// Returns `None` when the host delivers no change notifications.
    #[must_use]
    pub fn new(storage: StorageHandle, key: &str) -> Option<Self> {
        let watcher = storage.watch()?;
        debug!(context = %storage.context(), key, "Storage-event transport ready");
        Some(Self {
            storage,
            key: key.to_string(),
            watcher,
            nonces: RecentNonces::new(),
        })
    }

    /// Storage key envelopes travel under.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Transport for StorageEventTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::StorageEvents
    }

    fn publish(&mut self, envelope: &Envelope) -> Result<(), BusError> {
        let mut wire = envelope.to_wire()?;
        let nonce = Uuid::new_v4().to_string();
        // Our own nonce would never come back, but keep the window honest.
        let _ = self.nonces.check_and_insert(&nonce);
        wire.nonce = Some(nonce);

        let raw = serde_json::to_string(&wire).map_err(MessageError::from)?;
        self.storage.set_item(&self.key, &raw)?;
        trace!(key = %self.key, msg_type = envelope.type_name(), "Envelope written");
        Ok(())
    }

    fn drain(&mut self) -> Vec<Result<Envelope, MessageError>> {
        let mut out = Vec::new();
        while let Some(change) = self.watcher.try_next() {
            if change.key != self.key {
                continue;
            }
            // Removal of the bus key carries no envelope.
            let Some(raw) = change.new_value else {
                continue;
            };

            let wire: WireEnvelope = match serde_json::from_str(&raw) {
                Ok(wire) => wire,
                Err(e) => {
                    out.push(Err(MessageError::from(e)));
                    continue;
                }
            };

            if let Some(nonce) = wire.nonce.as_deref() {
                if let Err(e) = self.nonces.check_and_insert(nonce) {
                    trace!(error = %e, "Duplicate envelope skipped");
                    continue;
                }
            }
            out.push(Envelope::from_wire(wire));
        }
        out
    }
}
