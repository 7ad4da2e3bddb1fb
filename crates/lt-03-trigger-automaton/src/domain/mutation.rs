//! Document mutations.
//!
//! Transitions describe their writes as data so they can be applied inside
//! the store's read-modify-write against the freshest document. Every
//! mutation is idempotent: applying it to a document that already reflects
//! it changes nothing and reports `false`.

use serde::{Deserialize, Serialize};
use shared_types::{append_unique, GameState, TabId, TabPhase};

/// One idempotent write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mutation {
    /// Move a tab forward. Backward moves are ignored.
    AdvanceTab { tab: TabId, phase: TabPhase },
    /// Mark a tab's puzzle solved and move it to `solved`.
    Solve { tab: TabId },
    /// Set a per-tab flag.
    SetTabFlag { tab: TabId, flag: String },
    /// Append to a per-tab collection.
    AppendTabItem {
        tab: TabId,
        collection: String,
        id: String,
    },
    SetFlashlight,
    AppendCodeFragment(String),
    AppendMindFragment(String),
    /// Raise the unlock watermark.
    UnlockTab(TabId),
    /// Record a narration line as shown.
    MarkShown(String),
    SetActTwoComplete,
    SetGameComplete,
    /// Record which tab has focus.
    FocusTab(TabId),
}

impl Mutation {
    /// Apply to `state`. Returns whether anything changed.
    pub fn apply(&self, state: &mut GameState) -> bool {
        match self {
            Self::AdvanceTab { tab, phase } => state.tab_mut(*tab).advance(*phase),
            Self::Solve { tab } => {
                let record = state.tab_mut(*tab);
                let newly = !record.puzzle_solved;
                record.puzzle_solved = true;
                record.advance(TabPhase::Solved) | newly
            }
            Self::SetTabFlag { tab, flag } => {
                let record = state.tab_mut(*tab);
                if record.flag(flag) {
                    return false;
                }
                record.set_flag(flag, true);
                true
            }
            Self::AppendTabItem { tab, collection, id } => {
                state.tab_mut(*tab).append_to(collection, id)
            }
            Self::SetFlashlight => !std::mem::replace(&mut state.player.has_flashlight, true),
            Self::AppendCodeFragment(id) => append_unique(&mut state.player.code_fragments, id),
            Self::AppendMindFragment(id) => append_unique(&mut state.player.mind_fragments, id),
            Self::UnlockTab(tab) => {
                let before = state.meta.highest_tab_unlocked;
                state.meta.unlock(*tab);
                state.meta.highest_tab_unlocked != before
            }
            Self::MarkShown(line) => append_unique(&mut state.narrative.shown, line),
            Self::SetActTwoComplete => !std::mem::replace(&mut state.meta.act_two_complete, true),
            Self::SetGameComplete => !std::mem::replace(&mut state.meta.game_complete, true),
            Self::FocusTab(tab) => {
                let changed = state.meta.current_tab != *tab;
                state.meta.current_tab = *tab;
                changed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply_twice(m: &Mutation) -> (bool, bool, GameState) {
        let mut state = GameState::default();
        let first = m.apply(&mut state);
        let second = m.apply(&mut state);
        (first, second, state)
    }

    #[test]
    fn test_every_mutation_is_idempotent() {
        let all = vec![
            Mutation::AdvanceTab {
                tab: TabId(1),
                phase: TabPhase::Illuminated,
            },
            Mutation::Solve { tab: TabId(2) },
            Mutation::SetTabFlag {
                tab: TabId(3),
                flag: "backtrackedTo1".into(),
            },
            Mutation::AppendTabItem {
                tab: TabId(3),
                collection: "collectedSymbols".into(),
                id: "moon".into(),
            },
            Mutation::SetFlashlight,
            Mutation::AppendCodeFragment("c1".into()),
            Mutation::AppendMindFragment("m1".into()),
            Mutation::UnlockTab(TabId(3)),
            Mutation::MarkShown("intro".into()),
            Mutation::SetActTwoComplete,
            Mutation::SetGameComplete,
            Mutation::FocusTab(TabId(4)),
        ];
        for m in &all {
            let (first, second, _) = apply_twice(m);
            assert!(first, "{m:?} should change a fresh document");
            assert!(!second, "{m:?} should be a no-op the second time");
        }
    }

    #[test]
    fn test_advance_never_regresses() {
        let mut state = GameState::default();
        Mutation::AdvanceTab {
            tab: TabId(1),
            phase: TabPhase::PostCompletion,
        }
        .apply(&mut state);
        let changed = Mutation::AdvanceTab {
            tab: TabId(1),
            phase: TabPhase::Visited,
        }
        .apply(&mut state);

        assert!(!changed);
        assert_eq!(state.phase(TabId(1)), TabPhase::PostCompletion);
    }

    #[test]
    fn test_unlock_never_lowers() {
        let mut state = GameState::default();
        Mutation::UnlockTab(TabId(4)).apply(&mut state);
        assert!(!Mutation::UnlockTab(TabId(2)).apply(&mut state));
        assert_eq!(state.meta.highest_tab_unlocked, 4);
    }
}
