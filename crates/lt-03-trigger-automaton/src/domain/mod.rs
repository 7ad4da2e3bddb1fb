pub mod effects;
pub mod mutation;
pub mod phase;
pub mod transition;

pub use effects::*;
pub use mutation::Mutation;
pub use phase::ContextPhase;
pub use transition::{Guard, Milestone, Transition};
