//! Context phase state machine.
//!
//! ```text
//! [UNINITIALIZED] ──load──→ [FIRST_VISIT_ACTIVE]
//!                                  │
//!                 ┌────────────────┴────────────────┐
//!                 ↓                                 ↓
//!           [ILLUMINATED]                       [SOLVED]
//!                 │                                 │
//!                 └────────────────┬────────────────┘
//!                                  ↓
//!                        [POST_COMPLETION] (terminal)
//! ```
//!
//! The phase is never stored on its own: it is read back from the tab's
//! persisted `state`, so every context showing the same level agrees.

use serde::{Deserialize, Serialize};
use shared_types::TabPhase;
use std::fmt;

/// Where one context is in its level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ContextPhase {
    /// Not loaded yet.
    #[default]
    Uninitialized,
    /// Loaded; the level's first-visit content is live.
    FirstVisitActive,
    /// Lit up from another tab.
    Illuminated,
    /// The level's own puzzle is done.
    Solved,
    /// Only post-completion content remains.
    PostCompletion,
}

impl ContextPhase {
    /// Phase corresponding to a persisted tab phase.
    #[must_use]
    pub const fn from_tab_phase(phase: TabPhase) -> Self {
        match phase {
            TabPhase::Unvisited => Self::Uninitialized,
            TabPhase::Visited => Self::FirstVisitActive,
            TabPhase::Illuminated => Self::Illuminated,
            TabPhase::Solved => Self::Solved,
            TabPhase::PostCompletion => Self::PostCompletion,
        }
    }

    /// No further transitions leave this phase.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::PostCompletion)
    }
}

impl fmt::Display for ContextPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Uninitialized => "uninitialized",
            Self::FirstVisitActive => "first-visit-active",
            Self::Illuminated => "illuminated",
            Self::Solved => "solved",
            Self::PostCompletion => "post-completion",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapping() {
        assert_eq!(
            ContextPhase::from_tab_phase(TabPhase::Visited),
            ContextPhase::FirstVisitActive
        );
        assert_eq!(
            ContextPhase::from_tab_phase(TabPhase::PostCompletion),
            ContextPhase::PostCompletion
        );
        assert!(ContextPhase::PostCompletion.is_terminal());
        assert!(!ContextPhase::Illuminated.is_terminal());
    }
}
