//! # lt-03-trigger-automaton
//!
//! Per-context progression logic.
//!
//! ## Role in System
//!
//! Each execution context runs one [`TriggerAutomaton`] over one
//! [`LevelScript`]. Collaborators feed it scalar [`Milestone`]s and receive
//! [`SideEffect`]s back; the automaton owns every write to the store and
//! every envelope on the bus.
//!
//! ## Cross-Context Flow
//!
//! ```text
//! [Tab 3] ──Backtracked──→ set(backtrackedTo1) ──→ BACKTRACK_TRIGGER ──→ [Bus]
//!                                                                          │
//!        ┌─────────────────────────────────────────────────────────────────┘
//!        ↓
//! [Tab 1, live]   re-read store ──→ derive ──→ illuminated (guarded, once)
//! [Tab 1, later]  load         ──→ derive ──→ illuminated (same path)
//! ```

pub mod automaton;
pub mod domain;
pub mod levels;
pub mod ports;

pub use automaton::TriggerAutomaton;
pub use domain::*;
pub use levels::script_for;
pub use ports::LevelScript;
