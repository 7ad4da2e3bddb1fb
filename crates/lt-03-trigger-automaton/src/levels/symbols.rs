//! Tab 3: collect symbols; carry the flashlight back to tab 1.

use super::SYMBOLS_REQUIRED;
use crate::domain::{
    AudioCue, ContextPhase, Milestone, Mutation, RenderCue, SideEffect, Transition,
};
use crate::ports::LevelScript;
use shared_types::{GameMessage, GameState, TabId, TabPhase};

const TAB: TabId = TabId(3);
const COLLECTION: &str = "collectedSymbols";

#[derive(Debug, Default, Clone, Copy)]
pub struct Symbols;

impl LevelScript for Symbols {
    fn tab(&self) -> TabId {
        TAB
    }

    fn name(&self) -> &'static str {
        "symbols"
    }

    fn derive(&self, _state: &GameState) -> Vec<Transition> {
        Vec::new()
    }

    fn on_milestone(&self, milestone: &Milestone, state: &GameState) -> Option<Transition> {
        let own = state.tab(TAB).cloned().unwrap_or_default();
        match milestone {
            Milestone::SymbolFound(id) => {
                let held = own.collection(COLLECTION);
                if held.contains(id) {
                    return None;
                }
                let total = held.len() + 1;
                let mut t = Transition::new()
                    .mutate(Mutation::AppendTabItem {
                        tab: TAB,
                        collection: COLLECTION.into(),
                        id: id.clone(),
                    })
                    .announce(GameMessage::NewSymbolFound {
                        symbol_id: id.clone(),
                        total,
                    })
                    .effect(SideEffect::Audio(AudioCue::Chime))
                    .effect(SideEffect::Render(RenderCue::Progress {
                        label: "symbols".into(),
                        count: total,
                        of: SYMBOLS_REQUIRED,
                    }));

                if total >= SYMBOLS_REQUIRED && !own.puzzle_solved {
                    t = t
                        .mutate(Mutation::Solve { tab: TAB })
                        .mutate(Mutation::UnlockTab(TabId(4)))
                        .announce(GameMessage::PuzzleSolved {
                            tab: TAB,
                            puzzle: "symbols".into(),
                        })
                        .announce(GameMessage::TabCompleted { tab: TAB })
                        .effect(SideEffect::Render(RenderCue::Phase(ContextPhase::Solved)));
                }
                Some(t)
            }
            Milestone::Backtracked { to } if *to == TabId(1) => {
                if !state.player.has_flashlight || own.flag("backtrackedTo1") {
                    return None;
                }
                Some(
                    Transition::new()
                        .mutate(Mutation::SetTabFlag {
                            tab: TAB,
                            flag: "backtrackedTo1".into(),
                        })
                        .announce(GameMessage::BacktrackTrigger {
                            target_tab: TabId(1),
                        })
                        .effect(SideEffect::Narrate("carry-the-light-back".into())),
                )
            }
            Milestone::ExitReached if own.state == TabPhase::Solved => Some(
                Transition::new()
                    .mutate(Mutation::AdvanceTab {
                        tab: TAB,
                        phase: TabPhase::PostCompletion,
                    })
                    .effect(SideEffect::Render(RenderCue::Phase(
                        ContextPhase::PostCompletion,
                    ))),
            ),
            _ => None,
        }
    }
}
