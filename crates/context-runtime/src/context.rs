//! # Execution Context
//!
//! One open tab. Built once on open and owning its bus, store and
//! automaton; nothing here is global.
//!
//! ## Inputs
//!
//! | input | source | handled by |
//! |-------|--------|------------|
//! | milestone | local gameplay | `milestone` |
//! | envelope | other contexts | `pump` |
//! | visibility | the host | `hide` / `show` |
//!
//! A hidden context still drains its transport but does not act on what
//! arrives; it re-derives from the store when shown again. Narration is not
//! in the store, so narrator envelopes are held and replayed on show.

use crate::error::RuntimeError;
use crate::host::Host;
use crate::sink::CollaboratorSink;
use lantern_telemetry::{
    log_context_event, metric_add, AUTOMATON_TRANSITIONS, BUS_ENVELOPES_DROPPED,
    BUS_ENVELOPES_RECEIVED, BUS_ENVELOPES_SENT, CONTEXTS_OPEN, STORE_DROPPED_WRITES,
    STORE_RECOVERIES, STORE_WRITES,
};
use lt_01_state_store::{StateStore, StoreStats};
use lt_02_ownership::OwnershipPolicy;
use lt_03_trigger_automaton::{script_for, ContextPhase, Milestone, SideEffect, TriggerAutomaton};
use parking_lot::Mutex;
use shared_bus::{select_transport, BusStats, MessageBus, Subscription, TransportKind};
use shared_types::{ContextId, ContextKind, Envelope, GameMessage, GameState, TabId};
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::trace;

/// Final numbers of a closed context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextReport {
    pub tab: TabId,
    pub phase: ContextPhase,
    pub transport: TransportKind,
    pub transitions_applied: u64,
    /// Envelopes that arrived while hidden.
    pub missed_while_hidden: u64,
    pub bus: BusStats,
    pub store: StoreStats,
}

#[derive(Default)]
struct Reported {
    bus: BusStats,
    store: StoreStats,
    transitions: u64,
}

/// One live tab.
pub struct ExecutionContext {
    id: ContextId,
    tab: TabId,
    store: Arc<StateStore>,
    bus: Arc<MessageBus>,
    automaton: TriggerAutomaton,
    sink: Box<dyn CollaboratorSink>,
    inbox: Arc<Mutex<VecDeque<Envelope>>>,
    /// Narrator envelopes that arrived while hidden.
    held: Vec<Envelope>,
    subscription: Option<Subscription>,
    visible: bool,
    missed: u64,
    reported: Reported,
}

impl ExecutionContext {
    pub(crate) fn open(
        host: &Host,
        tab: TabId,
        sink: Box<dyn CollaboratorSink>,
    ) -> Result<Self, RuntimeError> {
        let script = script_for(tab).ok_or(RuntimeError::UnknownTab(tab))?;
        let config = host.config();

        let id = ContextId::new();
        let storage = host.origin().handle(id);
        let transport = select_transport(
            id,
            config.transport.preference,
            host.hub(),
            &storage,
            &config.storage.bus_key,
        );
        let bus = Arc::new(MessageBus::new(id, transport));

        let store = Arc::new(
            StateStore::new(
                Arc::new(storage),
                config.storage.state_key.clone(),
                ContextKind::Tab(tab),
                Some(bus.clone()),
            )
            .with_policy(Arc::new(OwnershipPolicy::new(config.ownership))),
        );

        let inbox: Arc<Mutex<VecDeque<Envelope>>> = Arc::default();
        let queue = inbox.clone();
        let subscription = bus.on_message(Arc::new(move |envelope: &Envelope| {
            queue.lock().push_back(envelope.clone());
        }));

        let automaton = TriggerAutomaton::new(script, store.clone(), bus.clone());

        let mut context = Self {
            id,
            tab,
            store,
            bus,
            automaton,
            sink,
            inbox,
            held: Vec::new(),
            subscription: Some(subscription),
            visible: true,
            missed: 0,
            reported: Reported::default(),
        };

        let effects = context.automaton.load();
        context.finish(&effects);
        CONTEXTS_OPEN.inc();
        log_context_event!(
            info,
            tab,
            id,
            "Context opened",
            transport = %context.bus.transport_kind(),
            phase = %context.automaton.phase()
        );
        Ok(context)
    }

    #[must_use]
    pub fn id(&self) -> ContextId {
        self.id
    }

    #[must_use]
    pub fn tab(&self) -> TabId {
        self.tab
    }

    #[must_use]
    pub fn phase(&self) -> ContextPhase {
        self.automaton.phase()
    }

    /// Transitions this context has persisted.
    #[must_use]
    pub fn transitions_applied(&self) -> u64 {
        self.automaton.transitions_applied()
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    #[must_use]
    pub fn transport_kind(&self) -> TransportKind {
        self.bus.transport_kind()
    }

    /// This context's store.
    #[must_use]
    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    /// This context's bus.
    #[must_use]
    pub fn bus(&self) -> &Arc<MessageBus> {
        &self.bus
    }

    /// Current document.
    #[must_use]
    pub fn state(&self) -> GameState {
        self.store.get()
    }

    /// Feed a local gameplay milestone.
    pub fn milestone(&mut self, milestone: &Milestone) -> Vec<SideEffect> {
        let effects = self.automaton.handle_milestone(milestone);
        self.finish(&effects);
        effects
    }

    /// Drain the transport and act on everything that arrived.
    pub fn pump(&mut self) -> Vec<SideEffect> {
        self.bus.poll();
        let pending: Vec<Envelope> = self.inbox.lock().drain(..).collect();

        if !self.visible {
            if !pending.is_empty() {
                self.missed += pending.len() as u64;
                trace!(tab = %self.tab, count = pending.len(), "Envelopes arrived while hidden");
            }
            self.held.extend(
                pending
                    .into_iter()
                    .filter(|e| matches!(e.message, GameMessage::NarratorTrigger { .. })),
            );
            self.finish(&[]);
            return Vec::new();
        }

        let mut effects = Vec::new();
        for envelope in &pending {
            effects.extend(self.automaton.handle_envelope(envelope));
        }
        self.finish(&effects);
        effects
    }

    /// The tab went to the background.
    pub fn hide(&mut self) {
        if self.visible {
            self.visible = false;
            log_context_event!(debug, self.tab, self.id, "Context hidden");
        }
    }

    /// The tab is visible again; catch up from the store.
    pub fn show(&mut self) -> Vec<SideEffect> {
        self.visible = true;
        let mut effects = self.automaton.visibility_restored();
        for envelope in std::mem::take(&mut self.held) {
            effects.extend(self.automaton.handle_envelope(&envelope));
        }
        log_context_event!(
            debug,
            self.tab,
            self.id,
            "Context shown",
            missed = self.missed,
            phase = %self.automaton.phase()
        );
        self.finish(&effects);
        effects
    }

    /// Detach from the bus and report.
    pub fn close(mut self) -> ContextReport {
        if let Some(subscription) = self.subscription.take() {
            self.bus.remove_listener(subscription);
        }
        self.record_metrics();
        CONTEXTS_OPEN.dec();

        let report = ContextReport {
            tab: self.tab,
            phase: self.automaton.phase(),
            transport: self.bus.transport_kind(),
            transitions_applied: self.automaton.transitions_applied(),
            missed_while_hidden: self.missed,
            bus: self.bus.stats(),
            store: self.store.stats(),
        };
        log_context_event!(
            info,
            self.tab,
            self.id,
            "Context closed",
            phase = %report.phase,
            transitions = report.transitions_applied
        );
        report
    }

    fn finish(&mut self, effects: &[SideEffect]) {
        for effect in effects {
            self.sink.perform(self.tab, effect);
        }
        self.record_metrics();
    }

    /// Push counter deltas since the last call to the process metrics.
    fn record_metrics(&mut self) {
        let label = self.tab.to_string();
        let labels = &[label.as_str()];
        let bus = self.bus.stats();
        let store = self.store.stats();
        let transitions = self.automaton.transitions_applied();
        let last = &self.reported;

        metric_add!(BUS_ENVELOPES_SENT, labels, bus.sent.saturating_sub(last.bus.sent));
        metric_add!(
            BUS_ENVELOPES_RECEIVED,
            labels,
            bus.received.saturating_sub(last.bus.received)
        );
        metric_add!(
            BUS_ENVELOPES_DROPPED,
            labels,
            bus.dropped.saturating_sub(last.bus.dropped)
        );
        metric_add!(STORE_WRITES, labels, store.writes.saturating_sub(last.store.writes));
        metric_add!(
            STORE_DROPPED_WRITES,
            labels,
            store.dropped_writes.saturating_sub(last.store.dropped_writes)
        );
        metric_add!(
            STORE_RECOVERIES,
            labels,
            store.recoveries.saturating_sub(last.store.recoveries)
        );
        metric_add!(
            AUTOMATON_TRANSITIONS,
            labels,
            transitions.saturating_sub(last.transitions)
        );

        self.reported = Reported {
            bus,
            store,
            transitions,
        };
    }
}

impl std::fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("id", &self.id)
            .field("tab", &self.tab)
            .field("phase", &self.automaton.phase())
            .field("visible", &self.visible)
            .finish()
    }
}
