//! # Level Script Port
//!
//! Everything level-specific lives behind this trait. The automaton owns
//! the generic part: guards, the read-modify-write, announcing, and the
//! behaviour every level shares (finale, narration).

use crate::domain::{Milestone, SideEffect, Transition};
use shared_types::{GameMessage, GameState, TabId};

/// The rules of one level.
pub trait LevelScript: Send + Sync {
    /// The tab this script runs in.
    fn tab(&self) -> TabId;

    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Whether an inbound message should trigger re-derivation, beyond the
    /// ones every level reacts to (`STATE_CHANGE`, `GAME_COMPLETE_FINAL`).
    fn wants(&self, _message: &GameMessage) -> bool {
        false
    }

    /// Transitions the document currently calls for. One-shot transitions
    /// must carry a guard; the automaton filters out applied ones.
    fn derive(&self, state: &GameState) -> Vec<Transition>;

    /// Reaction to a local milestone, given the current document.
    fn on_milestone(&self, milestone: &Milestone, state: &GameState) -> Option<Transition>;

    /// Effects that rebuild the level's world from the document when a
    /// context loads (objects another context already placed, ...).
    fn present(&self, _state: &GameState) -> Vec<SideEffect> {
        Vec::new()
    }
}
