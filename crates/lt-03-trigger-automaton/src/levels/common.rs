//! Behaviour every level shares.

use crate::domain::{
    AudioCue, ContextPhase, Guard, Mutation, RenderCue, SideEffect, Transition,
};
use shared_types::{GameState, TabId, TabPhase};

/// Once the game is complete, every tab shows the finale overlay once and
/// drops into post-completion.
#[must_use]
pub fn finale(tab: TabId, state: &GameState) -> Option<Transition> {
    if !state.meta.game_complete {
        return None;
    }
    Some(
        Transition::once("finaleShown")
            .mutate(Mutation::AdvanceTab {
                tab,
                phase: TabPhase::PostCompletion,
            })
            .effect(SideEffect::OpenOverlay("finale".to_string()))
            .effect(SideEffect::Audio(AudioCue::Finale))
            .effect(SideEffect::Render(RenderCue::Phase(
                ContextPhase::PostCompletion,
            ))),
    )
}

/// Narrate `line_id` in this tab, once across all tabs.
#[must_use]
pub fn narration(line_id: &str) -> Transition {
    Transition {
        guard: Some(Guard::Narrated(line_id.to_string())),
        ..Transition::default()
    }
    .effect(SideEffect::Audio(AudioCue::Whisper))
    .effect(SideEffect::Narrate(line_id.to_string()))
}
