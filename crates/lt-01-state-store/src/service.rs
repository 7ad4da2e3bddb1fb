//! # State Store Service
//!
//! One `StateStore` per context. It knows the storage area, the document
//! key, who it writes as, and (optionally) the bus it announces changes on.

use crate::domain::merge_tab_record;
use crate::ports::WritePolicy;
use serde_json::{Map, Value};
use shared_bus::MessageBus;
use shared_types::{
    ContextKind, GameMessage, GameState, StorageArea, StoreError, TabId, TabRecord,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Counters for one store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Documents persisted by `set`/`merge_field`.
    pub writes: u64,
    /// Updates refused by the area or the policy.
    pub dropped_writes: u64,
    /// Explicit resets.
    pub resets: u64,
    /// Missing or corrupt documents replaced by the default.
    pub recoveries: u64,
}

#[derive(Default)]
struct Counters {
    writes: AtomicU64,
    dropped_writes: AtomicU64,
    resets: AtomicU64,
    recoveries: AtomicU64,
}

/// Read-modify-write access to the shared document.
pub struct StateStore {
    area: Arc<dyn StorageArea>,
    key: String,
    writer: ContextKind,
    bus: Option<Arc<MessageBus>>,
    policy: Option<Arc<dyn WritePolicy>>,
    counters: Counters,
}

impl StateStore {
    /// Store writing as `writer` under `key`. Without a bus, changes are
    /// persisted but not announced.
    pub fn new(
        area: Arc<dyn StorageArea>,
        key: impl Into<String>,
        writer: ContextKind,
        bus: Option<Arc<MessageBus>>,
    ) -> Self {
        Self {
            area,
            key: key.into(),
            writer,
            bus,
            policy: None,
            counters: Counters::default(),
        }
    }

    /// Install a write policy.
    #[must_use]
    pub fn with_policy(mut self, policy: Arc<dyn WritePolicy>) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Who this store writes as.
    #[must_use]
    pub fn writer(&self) -> ContextKind {
        self.writer
    }

    /// Storage key of the document.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Current document. A missing or corrupt value is replaced by the
    /// default, which is persisted and returned.
    pub fn get(&self) -> GameState {
        match self.load() {
            Ok(state) => state,
            Err(e) => {
                self.counters.recoveries.fetch_add(1, Ordering::Relaxed);
                warn!(key = %self.key, error = %e, "Persisted state unusable, resetting to defaults");
                self.recover()
            }
        }
    }

    /// Apply `updater` to the current document, persist and announce it.
    ///
    /// Returns the document as persisted afterwards: the updated one, or the
    /// unchanged one if the write was dropped.
    pub fn set<F>(&self, updater: F) -> GameState
    where
        F: FnOnce(GameState) -> GameState,
    {
        match self.try_set(|state| Ok(updater(state))) {
            Ok(next) => next,
            Err(_) => self.get(),
        }
    }

    /// Like [`set`](Self::set) but lets the updater refuse, and reports
    /// whether the write happened.
    ///
    /// # Errors
    ///
    /// The updater's error, `StoreError::Rejected` from the policy, or
    /// `StoreError::WriteFailed` from the area. The document is unchanged
    /// and nothing is broadcast in every case.
    pub fn try_set<F>(&self, updater: F) -> Result<GameState, StoreError>
    where
        F: FnOnce(GameState) -> Result<GameState, StoreError>,
    {
        let current = self.get();
        let next = match updater(current.clone()) {
            Ok(next) => next,
            Err(e) => {
                debug!(writer = %self.writer, error = %e, "Update refused by updater");
                return Err(e);
            }
        };

        if let Some(policy) = &self.policy {
            if let Err(e) = policy.review(self.writer, &current, &next) {
                self.counters.dropped_writes.fetch_add(1, Ordering::Relaxed);
                warn!(writer = %self.writer, error = %e, "Write rejected by policy");
                return Err(e);
            }
        }

        if let Err(e) = self.persist(&next) {
            self.counters.dropped_writes.fetch_add(1, Ordering::Relaxed);
            warn!(key = %self.key, writer = %self.writer, error = %e, "Write dropped");
            return Err(e);
        }
        self.counters.writes.fetch_add(1, Ordering::Relaxed);

        self.announce(&next, self.writer.from_tab());
        Ok(next)
    }

    /// One tab's record. Absent tabs read as a fresh record.
    pub fn get_field(&self, tab: TabId) -> TabRecord {
        self.get().tab(tab).cloned().unwrap_or_default()
    }

    /// Shallow-merge `partial` into `tab`'s record and persist it through
    /// `set`. Invalid merges are logged and dropped; the unchanged document
    /// is returned.
    pub fn merge_field(&self, tab: TabId, partial: &Map<String, Value>) -> GameState {
        let result = self.try_set(|mut state| {
            let merged = merge_tab_record(&state.tab(tab).cloned().unwrap_or_default(), partial)?;
            state.tabs.insert(tab, merged);
            Ok(state)
        });
        match result {
            Ok(next) => next,
            Err(e) => {
                warn!(tab = %tab, error = %e, "Merge dropped");
                self.get()
            }
        }
    }

    /// Replace the document with the default and announce it with no
    /// sending tab.
    pub fn reset(&self) -> GameState {
        let fresh = GameState::default();
        self.counters.resets.fetch_add(1, Ordering::Relaxed);
        match self.persist(&fresh) {
            Ok(()) => {
                info!(key = %self.key, "Game state reset");
                self.announce(&fresh, None);
            }
            Err(e) => {
                self.counters.dropped_writes.fetch_add(1, Ordering::Relaxed);
                warn!(key = %self.key, error = %e, "Reset dropped");
            }
        }
        fresh
    }

    /// Counters since construction.
    #[must_use]
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            writes: self.counters.writes.load(Ordering::Relaxed),
            dropped_writes: self.counters.dropped_writes.load(Ordering::Relaxed),
            resets: self.counters.resets.load(Ordering::Relaxed),
            recoveries: self.counters.recoveries.load(Ordering::Relaxed),
        }
    }

    fn load(&self) -> Result<GameState, StoreError> {
        let raw = self
            .area
            .get_item(&self.key)
            .ok_or_else(|| StoreError::Corrupt("no document".to_string()))?;
        GameState::from_json(&raw).map_err(|e| StoreError::Corrupt(e.to_string()))
    }

    fn recover(&self) -> GameState {
        let fresh = GameState::default();
        if let Err(e) = self.persist(&fresh) {
            // Still usable in memory; the next write retries.
            warn!(key = %self.key, error = %e, "Could not persist default document");
        }
        fresh
    }

    fn persist(&self, state: &GameState) -> Result<(), StoreError> {
        let raw = state
            .to_json()
            .map_err(|e| StoreError::InvalidDocument(e.to_string()))?;
        self.area.set_item(&self.key, &raw)?;
        Ok(())
    }

    fn announce(&self, state: &GameState, from_tab: Option<TabId>) {
        if let Some(bus) = &self.bus {
            bus.send(GameMessage::StateChange(Box::new(state.clone())), from_tab);
        }
    }
}

impl std::fmt::Debug for StateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateStore")
            .field("key", &self.key)
            .field("writer", &self.writer)
            .field("announces", &self.bus.is_some())
            .field("policy", &self.policy.is_some())
            .finish()
    }
}
