//! Tab 5: mind fragments and the final sequence.

use super::MIND_FRAGMENTS_REQUIRED;
use crate::domain::{AudioCue, Milestone, Mutation, RenderCue, SideEffect, Transition};
use crate::ports::LevelScript;
use shared_types::{GameMessage, GameState, TabId};

const TAB: TabId = TabId(5);

#[derive(Debug, Default, Clone, Copy)]
pub struct Mind;

impl LevelScript for Mind {
    fn tab(&self) -> TabId {
        TAB
    }

    fn name(&self) -> &'static str {
        "mind"
    }

    fn derive(&self, _state: &GameState) -> Vec<Transition> {
        Vec::new()
    }

    fn on_milestone(&self, milestone: &Milestone, state: &GameState) -> Option<Transition> {
        let fragments = &state.player.mind_fragments;
        match milestone {
            Milestone::FragmentCollected(id) if !fragments.contains(id) => {
                let count = fragments.len() + 1;
                let mut t = Transition::new()
                    .mutate(Mutation::AppendMindFragment(id.clone()))
                    .effect(SideEffect::Audio(AudioCue::Whisper))
                    .effect(SideEffect::Render(RenderCue::Progress {
                        label: "mind".into(),
                        count,
                        of: MIND_FRAGMENTS_REQUIRED,
                    }));
                if count >= MIND_FRAGMENTS_REQUIRED && !state.meta.act_two_complete {
                    t = t
                        .mutate(Mutation::SetActTwoComplete)
                        .announce(GameMessage::MindFragmentsCollected { count })
                        .effect(SideEffect::Narrate("act-two-complete".into()));
                }
                Some(t)
            }
            Milestone::SequenceCompleted
                if state.meta.act_two_complete && !state.meta.game_complete =>
            {
                Some(
                    Transition::new()
                        .mutate(Mutation::SetGameComplete)
                        .mutate(Mutation::Solve { tab: TAB })
                        .announce(GameMessage::GameCompleteFinal),
                )
            }
            _ => None,
        }
    }
}
