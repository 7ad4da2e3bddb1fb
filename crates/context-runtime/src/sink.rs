//! # Collaborator Sink
//!
//! Where side effects go once the automaton has decided on them. The
//! renderer, audio and narration layers live outside this crate; a sink is
//! the seam they plug into.

use lt_03_trigger_automaton::SideEffect;
use parking_lot::Mutex;
use shared_types::TabId;
use std::sync::Arc;
use tracing::info;

/// Performs side effects for one context.
pub trait CollaboratorSink: Send {
    fn perform(&mut self, tab: TabId, effect: &SideEffect);
}

/// Logs every effect. The default when no collaborators are attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl CollaboratorSink for TracingSink {
    fn perform(&mut self, tab: TabId, effect: &SideEffect) {
        info!(tab = %tab, ?effect, "Side effect");
    }
}

/// Keeps every effect in memory, shared across clones.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    effects: Arc<Mutex<Vec<(TabId, SideEffect)>>>,
}

impl RecordingSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything performed so far, in order.
    #[must_use]
    pub fn effects(&self) -> Vec<(TabId, SideEffect)> {
        self.effects.lock().clone()
    }

    /// How many performed effects equal `effect`, across all tabs.
    #[must_use]
    pub fn count(&self, effect: &SideEffect) -> usize {
        self.effects.lock().iter().filter(|(_, e)| e == effect).count()
    }

    /// Effects performed in one tab.
    #[must_use]
    pub fn for_tab(&self, tab: TabId) -> Vec<SideEffect> {
        self.effects
            .lock()
            .iter()
            .filter(|(t, _)| *t == tab)
            .map(|(_, e)| e.clone())
            .collect()
    }
}

impl CollaboratorSink for RecordingSink {
    fn perform(&mut self, tab: TabId, effect: &SideEffect) {
        self.effects.lock().push((tab, effect.clone()));
    }
}
