//! Transitions and the milestones that cause them.

use crate::domain::effects::SideEffect;
use crate::domain::mutation::Mutation;
use serde::{Deserialize, Serialize};
use shared_types::{GameMessage, GameState, TabId};

/// Scalar progress notifications from the level's collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Milestone {
    /// The player stepped on a tile.
    TileReached(u32),
    /// An item was picked up.
    ItemCollected(String),
    SymbolFound(String),
    FragmentCollected(String),
    /// The level's input sequence was entered.
    SequenceCompleted,
    /// The player carried something back to an earlier tab.
    Backtracked { to: TabId },
    ExitReached,
}

/// Persisted "already applied" marker for one-shot transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Guard {
    /// A flag in the applying tab's own record.
    TabFlag(String),
    /// A line id in `narrative.shown`.
    Narrated(String),
}

impl Guard {
    /// Whether `state` already records this transition for `tab`.
    #[must_use]
    pub fn is_set(&self, state: &GameState, tab: TabId) -> bool {
        match self {
            Self::TabFlag(flag) => state.tab(tab).is_some_and(|r| r.flag(flag)),
            Self::Narrated(line) => state.narrative.has_shown(line),
        }
    }

    /// The mutation that records it.
    #[must_use]
    pub fn marker(&self, tab: TabId) -> Mutation {
        match self {
            Self::TabFlag(flag) => Mutation::SetTabFlag {
                tab,
                flag: flag.clone(),
            },
            Self::Narrated(line) => Mutation::MarkShown(line.clone()),
        }
    }
}

/// A unit of progress: writes, then announcements, then local effects.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Transition {
    /// Set for one-shot transitions.
    pub guard: Option<Guard>,
    pub mutations: Vec<Mutation>,
    /// Sent after the writes persist.
    pub announce: Vec<GameMessage>,
    /// Emitted last.
    pub effects: Vec<SideEffect>,
}

impl Transition {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A one-shot transition guarded by a flag in the tab's own record.
    #[must_use]
    pub fn once(flag: &str) -> Self {
        Self {
            guard: Some(Guard::TabFlag(flag.to_string())),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn mutate(mut self, mutation: Mutation) -> Self {
        self.mutations.push(mutation);
        self
    }

    #[must_use]
    pub fn announce(mut self, message: GameMessage) -> Self {
        self.announce.push(message);
        self
    }

    #[must_use]
    pub fn effect(mut self, effect: SideEffect) -> Self {
        self.effects.push(effect);
        self
    }

    /// Whether `state` already reflects this one-shot transition.
    #[must_use]
    pub fn is_applied(&self, state: &GameState, tab: TabId) -> bool {
        self.guard.as_ref().is_some_and(|g| g.is_set(state, tab))
    }

    /// Effects and announcements only; nothing to persist.
    #[must_use]
    pub fn is_stateless(&self) -> bool {
        self.guard.is_none() && self.mutations.is_empty()
    }
}
