//! # Host
//!
//! One origin: the storage area every context shares, plus the broadcast
//! channel when the host offers one. Contexts are opened against a host and
//! own everything else themselves.

use crate::config::RuntimeConfig;
use crate::context::ExecutionContext;
use crate::error::RuntimeError;
use crate::sink::{CollaboratorSink, TracingSink};
use crate::snapshot;
use lantern_telemetry::{metric_inc, STORE_RESETS};
use lt_01_state_store::StateStore;
use shared_bus::{select_transport, BroadcastHub, MessageBus};
use shared_types::{ContextId, ContextKind, GameState, OriginStorage, TabId};
use std::sync::Arc;
use tracing::{debug, info};

/// Shared resources of one origin.
pub struct Host {
    config: Arc<RuntimeConfig>,
    origin: OriginStorage,
    hub: Option<BroadcastHub>,
}

impl Host {
    /// Build the origin described by `config`.
    ///
    /// # Errors
    ///
    /// `RuntimeError::Config` if the configuration does not validate.
    pub fn new(config: RuntimeConfig) -> Result<Self, RuntimeError> {
        config.validate()?;

        let origin =
            OriginStorage::with_limits(config.storage.quota_bytes, config.storage.change_events);
        let hub = config.transport.broadcast_available.then(|| {
            BroadcastHub::with_capacity(&config.transport.channel, config.transport.channel_capacity)
        });

        info!(
            broadcast = hub.is_some(),
            change_events = config.storage.change_events,
            quota = ?config.storage.quota_bytes,
            ownership = %config.ownership,
            "Host ready"
        );

        Ok(Self {
            config: Arc::new(config),
            origin,
            hub,
        })
    }

    #[must_use]
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// The shared storage area.
    #[must_use]
    pub fn origin(&self) -> &OriginStorage {
        &self.origin
    }

    /// The broadcast channel, if the host has one.
    #[must_use]
    pub fn hub(&self) -> Option<&BroadcastHub> {
        self.hub.as_ref()
    }

    /// Open a context for `tab` whose effects are logged.
    pub fn open(&self, tab: TabId) -> Result<ExecutionContext, RuntimeError> {
        self.open_with(tab, Box::new(TracingSink))
    }

    /// Open a context for `tab` delivering effects to `sink`.
    ///
    /// # Errors
    ///
    /// `RuntimeError::UnknownTab` if no level is bound to `tab`.
    pub fn open_with(
        &self,
        tab: TabId,
        sink: Box<dyn CollaboratorSink>,
    ) -> Result<ExecutionContext, RuntimeError> {
        ExecutionContext::open(self, tab, sink)
    }

    /// Reset the game as the system writer. Every live context hears one
    /// `STATE_CHANGE` with no sender tab.
    pub fn reset(&self) -> GameState {
        let state = self.system_store().reset();
        metric_inc!(STORE_RESETS);
        state
    }

    /// Current document, as any context would read it.
    #[must_use]
    pub fn state(&self) -> GameState {
        self.system_store().get()
    }

    /// Restore the origin from the configured snapshot. Returns whether a
    /// snapshot was found. Call before opening any context.
    pub fn restore_snapshot(&self) -> Result<bool, RuntimeError> {
        match &self.config.storage.snapshot_path {
            Some(path) => snapshot::load(&self.origin, path),
            None => Ok(false),
        }
    }

    /// Save the origin to the configured snapshot path, if any.
    pub fn save_snapshot(&self) -> Result<(), RuntimeError> {
        match &self.config.storage.snapshot_path {
            Some(path) => snapshot::save(&self.origin, path),
            None => Ok(()),
        }
    }

    /// A short-lived store writing as `System`, with its own bus so that
    /// resets are announced like any other change.
    fn system_store(&self) -> StateStore {
        let id = ContextId::new();
        let storage = self.origin.handle(id);
        let transport = select_transport(
            id,
            self.config.transport.preference,
            self.hub.as_ref(),
            &storage,
            &self.config.storage.bus_key,
        );
        debug!(context = %id, "System writer opened");
        StateStore::new(
            Arc::new(storage),
            self.config.storage.state_key.clone(),
            ContextKind::System,
            Some(Arc::new(MessageBus::new(id, transport))),
        )
    }
}

impl std::fmt::Debug for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Host")
            .field("broadcast", &self.hub.is_some())
            .field("used_bytes", &self.origin.used_bytes())
            .finish()
    }
}
