//! Local side effects handed to the renderer, audio and narration
//! collaborators. The automaton decides; collaborators only perform.

use crate::domain::phase::ContextPhase;
use serde::{Deserialize, Serialize};

/// What the renderer should show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RenderCue {
    /// Redraw for a phase.
    Phase(ContextPhase),
    /// Update a progress counter ("symbols 2/3").
    Progress {
        label: String,
        count: usize,
        of: usize,
    },
}

/// Sound to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AudioCue {
    Chime,
    Unlock,
    Whisper,
    Finale,
}

/// One instruction for a collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SideEffect {
    Render(RenderCue),
    Audio(AudioCue),
    /// Show a narration line.
    Narrate(String),
    /// Spawn an object in the level.
    PlaceObject(String),
    /// Open a full-screen overlay.
    OpenOverlay(String),
}
