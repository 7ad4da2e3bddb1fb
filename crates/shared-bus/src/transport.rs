//! # Transport Port
//!
//! A transport moves encoded envelopes between contexts. It is owned by one
//! context's bus and driven synchronously: `publish` on send, `drain` on
//! poll.

use crate::broadcast::{BroadcastHub, BroadcastTransport};
use crate::storage_transport::StorageEventTransport;
use shared_types::{BusError, ContextId, Envelope, MessageError, StorageHandle};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

/// Which transport a bus ended up with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    /// Direct broadcast channel.
    Broadcast,
    /// Nonced envelopes over storage change notifications.
    StorageEvents,
    /// Nothing available; local-only play.
    None,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Broadcast => "broadcast",
            Self::StorageEvents => "storage-events",
            Self::None => "none",
        })
    }
}

/// What the configuration asks for. Every choice still degrades when the
/// host cannot provide it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportPreference {
    /// Broadcast, else storage events, else none.
    #[default]
    Auto,
    /// Broadcast, else none.
    Broadcast,
    /// Storage events, else none.
    Storage,
    /// Never talk to other contexts.
    LocalOnly,
}

impl FromStr for TransportPreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "broadcast" => Ok(Self::Broadcast),
            "storage" | "storage-events" => Ok(Self::Storage),
            "none" | "local" | "local-only" => Ok(Self::LocalOnly),
            other => Err(format!("unknown transport preference: {other}")),
        }
    }
}

/// Moves envelopes for one context.
pub trait Transport: Send {
    /// Which transport this is.
    fn kind(&self) -> TransportKind;

    /// Publish to every other live context.
    ///
    /// # Errors
    ///
    /// Encoding failures and refused storage writes. The bus logs and drops.
    fn publish(&mut self, envelope: &Envelope) -> Result<(), BusError>;

    /// Everything that arrived since the last drain, decoded. Entries that
    /// failed to decode are returned as errors so the bus can count them.
    fn drain(&mut self) -> Vec<Result<Envelope, MessageError>>;
}

/// Pick a transport for `context` given what the host offers.
///
/// Returns `None` for local-only play; that is not an error.
pub fn select_transport(
    context: ContextId,
    preference: TransportPreference,
    hub: Option<&BroadcastHub>,
    storage: &StorageHandle,
    bus_key: &str,
) -> Option<Box<dyn Transport>> {
    let broadcast = || {
        hub.map(|hub| Box::new(BroadcastTransport::new(hub, context)) as Box<dyn Transport>)
    };
    let fallback = || {
        StorageEventTransport::new(storage.clone(), bus_key)
            .map(|t| Box::new(t) as Box<dyn Transport>)
    };

    let chosen = match preference {
        TransportPreference::Auto => broadcast().or_else(|| {
            debug!(context = %context, "Broadcast channel unavailable, trying storage events");
            fallback()
        }),
        TransportPreference::Broadcast => broadcast(),
        TransportPreference::Storage => fallback(),
        TransportPreference::LocalOnly => None,
    };

    match &chosen {
        Some(t) => info!(context = %context, transport = %t.kind(), "Transport selected"),
        None => debug!(
            context = %context,
            ?preference,
            "{}",
            BusError::TransportUnavailable
        ),
    }
    chosen
}
