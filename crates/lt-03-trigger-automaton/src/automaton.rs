//! # Trigger Automaton
//!
//! One per context. Turns milestones, inbound envelopes and visibility
//! changes into persisted transitions, announcements and local effects.
//!
//! ## Rules
//!
//! - A local milestone writes first, then announces, then emits effects.
//! - An inbound envelope is only a hint: the payload is ignored for
//!   cross-context facts and the store is re-read instead.
//! - One-shot transitions check and set their guard inside the same
//!   read-modify-write, so a duplicated or late envelope is a no-op.

use crate::domain::{ContextPhase, Milestone, Mutation, RenderCue, SideEffect, Transition};
use crate::levels::{finale, narration};
use crate::ports::LevelScript;
use lt_01_state_store::StateStore;
use shared_bus::MessageBus;
use shared_types::{Envelope, GameMessage, GameState, StoreError, TabId, TabPhase};
use std::sync::Arc;
use tracing::{debug, info, trace};

/// Re-derivation rounds per input. Each round applies at least one guarded
/// transition or stops, so this only bounds pathological scripts.
const MAX_SETTLE_ROUNDS: usize = 8;

/// Per-context automaton.
pub struct TriggerAutomaton {
    tab: TabId,
    script: Box<dyn LevelScript>,
    store: Arc<StateStore>,
    bus: Arc<MessageBus>,
    phase: ContextPhase,
    transitions_applied: u64,
}

impl TriggerAutomaton {
    /// Automaton for the script's tab. Call [`load`](Self::load) before
    /// feeding it input.
    pub fn new(script: Box<dyn LevelScript>, store: Arc<StateStore>, bus: Arc<MessageBus>) -> Self {
        Self {
            tab: script.tab(),
            script,
            store,
            bus,
            phase: ContextPhase::Uninitialized,
            transitions_applied: 0,
        }
    }

    #[must_use]
    pub fn tab(&self) -> TabId {
        self.tab
    }

    /// Phase as of the last document this automaton saw.
    #[must_use]
    pub fn phase(&self) -> ContextPhase {
        self.phase
    }

    /// Transitions this context has persisted.
    #[must_use]
    pub fn transitions_applied(&self) -> u64 {
        self.transitions_applied
    }

    /// First load: mark the tab visited and focused, rebuild the world, and
    /// catch up on anything other contexts did before this one opened.
    pub fn load(&mut self) -> Vec<SideEffect> {
        let mut effects = self.apply(
            Transition::new()
                .mutate(Mutation::AdvanceTab {
                    tab: self.tab,
                    phase: TabPhase::Visited,
                })
                .mutate(Mutation::FocusTab(self.tab)),
        );

        let state = self.store.get();
        self.observe(&state);
        info!(tab = %self.tab, script = self.script.name(), phase = %self.phase, "Context loaded");

        effects.push(SideEffect::Render(RenderCue::Phase(self.phase)));
        effects.extend(self.script.present(&state));
        effects.extend(self.settle());
        effects
    }

    /// A local milestone from a collaborator.
    pub fn handle_milestone(&mut self, milestone: &Milestone) -> Vec<SideEffect> {
        if self.phase.is_terminal() {
            debug!(tab = %self.tab, ?milestone, "Milestone ignored in post-completion");
            return Vec::new();
        }
        let state = self.store.get();
        let Some(transition) = self.script.on_milestone(milestone, &state) else {
            trace!(tab = %self.tab, ?milestone, "Milestone has no effect");
            return Vec::new();
        };
        debug!(tab = %self.tab, ?milestone, "Milestone accepted");

        let mut effects = self.apply(transition);
        effects.extend(self.settle());
        effects
    }

    /// An envelope from another context.
    pub fn handle_envelope(&mut self, envelope: &Envelope) -> Vec<SideEffect> {
        let message = &envelope.message;
        if let GameMessage::Unknown { kind, .. } = message {
            debug!(tab = %self.tab, msg_type = %kind, "Unknown message ignored");
            return Vec::new();
        }
        if let Some(target) = message.target() {
            if target != self.tab {
                return Vec::new();
            }
        }

        match message {
            GameMessage::NarratorTrigger { line_id, target_tab } => {
                self.narrate(line_id, *target_tab)
            }
            GameMessage::StateChange(_) | GameMessage::GameCompleteFinal => self.settle(),
            other if self.script.wants(other) => {
                debug!(tab = %self.tab, msg_type = other.type_name(), from = ?envelope.from_tab, "Re-deriving on envelope");
                self.settle()
            }
            _ => Vec::new(),
        }
    }

    /// The context became visible again. It may have missed envelopes while
    /// hidden, so it re-derives from the store.
    pub fn visibility_restored(&mut self) -> Vec<SideEffect> {
        let mut effects = self.apply(Transition::new().mutate(Mutation::FocusTab(self.tab)));
        let before = self.phase;
        effects.extend(self.settle());
        if self.phase != before {
            debug!(tab = %self.tab, from = %before, to = %self.phase, "Caught up on visibility restore");
        }
        effects
    }

    fn narrate(&mut self, line_id: &str, target: Option<TabId>) -> Vec<SideEffect> {
        if target.is_none() && self.store.get().meta.current_tab != self.tab {
            trace!(tab = %self.tab, line_id, "Untargeted narration left to the focused tab");
            return Vec::new();
        }
        self.apply(narration(line_id))
    }

    /// Apply derived transitions until the document calls for no more.
    fn settle(&mut self) -> Vec<SideEffect> {
        let mut effects = Vec::new();
        for _ in 0..MAX_SETTLE_ROUNDS {
            let state = self.store.get();
            self.observe(&state);

            let pending: Vec<Transition> = finale(self.tab, &state)
                .into_iter()
                .chain(self.script.derive(&state))
                .filter(|t| t.guard.is_some() && !t.is_applied(&state, self.tab))
                .collect();
            if pending.is_empty() {
                break;
            }

            let applied_before = self.transitions_applied;
            for transition in pending {
                effects.extend(self.apply(transition));
            }
            if self.transitions_applied == applied_before {
                break;
            }
        }
        effects
    }

    /// Persist, announce, then hand back effects. Nothing is announced or
    /// emitted if the write did not happen.
    fn apply(&mut self, transition: Transition) -> Vec<SideEffect> {
        if transition.is_stateless() {
            return self.publish(transition.announce, transition.effects);
        }
        let Transition {
            guard,
            mutations,
            announce,
            effects,
        } = transition;

        let tab = self.tab;
        let result = self.store.try_set(|mut state| {
            if let Some(guard) = &guard {
                if guard.is_set(&state, tab) {
                    return Err(StoreError::Abandoned("already applied".into()));
                }
                guard.marker(tab).apply(&mut state);
            }
            let mut changed = false;
            for mutation in &mutations {
                changed |= mutation.apply(&mut state);
            }
            if guard.is_none() && !changed {
                return Err(StoreError::Abandoned("nothing to change".into()));
            }
            Ok(state)
        });

        let state = match result {
            Ok(state) => state,
            Err(e) => {
                trace!(tab = %tab, error = %e, "Transition not applied");
                return Vec::new();
            }
        };

        self.transitions_applied += 1;
        let before = self.phase;
        self.observe(&state);
        if self.phase != before {
            info!(tab = %tab, from = %before, to = %self.phase, "Phase transition");
        }

        self.publish(announce, effects)
    }

    /// Send announcements, then play any narration they ask of this tab.
    /// A sender never hears its own envelope, so its own lines play here.
    fn publish(
        &mut self,
        announce: Vec<GameMessage>,
        mut effects: Vec<SideEffect>,
    ) -> Vec<SideEffect> {
        let tab = self.tab;
        let own_lines: Vec<(String, Option<TabId>)> = announce
            .iter()
            .filter_map(|message| match message {
                GameMessage::NarratorTrigger { line_id, target_tab }
                    if target_tab.map_or(true, |target| target == tab) =>
                {
                    Some((line_id.clone(), *target_tab))
                }
                _ => None,
            })
            .collect();

        for message in announce {
            self.bus.send(message, Some(tab));
        }
        for (line_id, target) in own_lines {
            effects.extend(self.narrate(&line_id, target));
        }
        effects
    }

    fn observe(&mut self, state: &GameState) {
        self.phase = ContextPhase::from_tab_phase(state.phase(self.tab));
    }
}

impl std::fmt::Debug for TriggerAutomaton {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriggerAutomaton")
            .field("tab", &self.tab)
            .field("script", &self.script.name())
            .field("phase", &self.phase)
            .field("transitions_applied", &self.transitions_applied)
            .finish()
    }
}
