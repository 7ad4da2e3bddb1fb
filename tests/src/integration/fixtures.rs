//! Building blocks for scenarios that need finer control than a `Host`.

use parking_lot::Mutex;
use shared_bus::{
    BroadcastHub, BroadcastTransport, MessageBus, StorageEventTransport, Subscription, Transport,
    DEFAULT_BUS_KEY,
};
use shared_types::{ContextId, ContextKind, Envelope, OriginStorage, StorageHandle, TabId};
use lt_01_state_store::{StateStore, DEFAULT_STATE_KEY};
use std::sync::Arc;

/// Which transport a raw context should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Via {
    Broadcast,
    Storage,
}

/// A context made of a storage handle, a bus and a store, with no automaton.
pub struct RawContext {
    pub id: ContextId,
    pub storage: StorageHandle,
    pub bus: Arc<MessageBus>,
    pub store: StateStore,
}

impl RawContext {
    pub fn open(origin: &OriginStorage, hub: &BroadcastHub, via: Via, writer: ContextKind) -> Self {
        let id = ContextId::new();
        let storage = origin.handle(id);
        let transport: Box<dyn Transport> = match via {
            Via::Broadcast => Box::new(BroadcastTransport::new(hub, id)),
            Via::Storage => Box::new(
                StorageEventTransport::new(storage.clone(), DEFAULT_BUS_KEY)
                    .expect("origin delivers change events"),
            ),
        };
        let bus = Arc::new(MessageBus::new(id, Some(transport)));
        let store = StateStore::new(
            Arc::new(storage.clone()),
            DEFAULT_STATE_KEY,
            writer,
            Some(bus.clone()),
        );
        Self {
            id,
            storage,
            bus,
            store,
        }
    }

    pub fn tab(origin: &OriginStorage, hub: &BroadcastHub, via: Via, tab: u8) -> Self {
        Self::open(origin, hub, via, ContextKind::Tab(TabId(tab)))
    }
}

/// Everything a listener saw, kept alive by the returned subscription.
pub fn record(bus: &MessageBus) -> (Subscription, Arc<Mutex<Vec<Envelope>>>) {
    let seen: Arc<Mutex<Vec<Envelope>>> = Arc::default();
    let sink = seen.clone();
    let subscription = bus.on_message(Arc::new(move |envelope: &Envelope| {
        sink.lock().push(envelope.clone());
    }));
    (subscription, seen)
}
