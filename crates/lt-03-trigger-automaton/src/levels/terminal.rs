//! Tab 4: the terminal. Code fragments, plus tab 1's bonus shard.

use super::CODE_FRAGMENTS_REQUIRED;
use crate::domain::{
    AudioCue, ContextPhase, Milestone, Mutation, RenderCue, SideEffect, Transition,
};
use crate::ports::LevelScript;
use shared_types::{GameMessage, GameState, TabId, TabPhase};

const TAB: TabId = TabId(4);

fn progress(count: usize) -> SideEffect {
    SideEffect::Render(RenderCue::Progress {
        label: "code".into(),
        count,
        of: CODE_FRAGMENTS_REQUIRED,
    })
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Terminal;

impl LevelScript for Terminal {
    fn tab(&self) -> TabId {
        TAB
    }

    fn name(&self) -> &'static str {
        "terminal"
    }

    fn wants(&self, message: &GameMessage) -> bool {
        matches!(message, GameMessage::TabCompleted { tab } if *tab == TabId(1))
    }

    fn derive(&self, state: &GameState) -> Vec<Transition> {
        let bonus_ready = state.tab(TabId(1)).is_some_and(|r| r.flag("collectedBonus"));
        if !bonus_ready {
            return Vec::new();
        }
        let held = state.player.code_fragments.len();
        let absorbed = state.player.code_fragments.iter().any(|f| f == "bonus-shard");
        vec![Transition::once("bonusAbsorbed")
            .mutate(Mutation::AppendCodeFragment("bonus-shard".into()))
            .effect(SideEffect::Narrate("terminal-absorbs-bonus".into()))
            .effect(progress(if absorbed { held } else { held + 1 }))]
    }

    fn on_milestone(&self, milestone: &Milestone, state: &GameState) -> Option<Transition> {
        let fragments = &state.player.code_fragments;
        let own = state.tab(TAB).cloned().unwrap_or_default();
        match milestone {
            Milestone::FragmentCollected(id) if !fragments.contains(id) => Some(
                Transition::new()
                    .mutate(Mutation::AppendCodeFragment(id.clone()))
                    .effect(SideEffect::Audio(AudioCue::Chime))
                    .effect(progress(fragments.len() + 1)),
            ),
            Milestone::SequenceCompleted if !own.puzzle_solved => {
                if fragments.len() < CODE_FRAGMENTS_REQUIRED {
                    return Some(
                        Transition::new().effect(SideEffect::Narrate("sequence-incomplete".into())),
                    );
                }
                Some(
                    Transition::new()
                        .mutate(Mutation::Solve { tab: TAB })
                        .mutate(Mutation::UnlockTab(TabId(5)))
                        .announce(GameMessage::PuzzleSolved {
                            tab: TAB,
                            puzzle: "terminal".into(),
                        })
                        .announce(GameMessage::TabCompleted { tab: TAB })
                        .effect(SideEffect::Audio(AudioCue::Unlock))
                        .effect(SideEffect::Render(RenderCue::Phase(ContextPhase::Solved))),
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
