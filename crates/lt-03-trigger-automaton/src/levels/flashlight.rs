//! Tab 2: the flashlight.

use crate::domain::{
    AudioCue, ContextPhase, Milestone, Mutation, RenderCue, SideEffect, Transition,
};
use crate::ports::LevelScript;
use shared_types::{GameMessage, GameState, TabId, TabPhase};

const TAB: TabId = TabId(2);

#[derive(Debug, Default, Clone, Copy)]
pub struct Flashlight;

impl LevelScript for Flashlight {
    fn tab(&self) -> TabId {
        TAB
    }

    fn name(&self) -> &'static str {
        "flashlight"
    }

    fn derive(&self, _state: &GameState) -> Vec<Transition> {
        Vec::new()
    }

    fn on_milestone(&self, milestone: &Milestone, state: &GameState) -> Option<Transition> {
        match milestone {
            Milestone::ItemCollected(item)
                if item == "flashlight" && !state.player.has_flashlight =>
            {
                Some(
                    Transition::new()
                        .mutate(Mutation::SetFlashlight)
                        .mutate(Mutation::Solve { tab: TAB })
                        .mutate(Mutation::UnlockTab(TabId(3)))
                        .announce(GameMessage::PuzzleSolved {
                            tab: TAB,
                            puzzle: "flashlight".into(),
                        })
                        .announce(GameMessage::TabCompleted { tab: TAB })
                        .effect(SideEffect::Audio(AudioCue::Unlock))
                        .effect(SideEffect::Render(RenderCue::Phase(ContextPhase::Solved))),
                )
            }
            Milestone::ExitReached if state.phase(TAB) == TabPhase::Solved => Some(
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
