//! # Write Policy Port
//!
//! Optional check run on every `set` between the updater and the persist.

use shared_types::{ContextKind, GameState, StoreError};

/// Reviews one document transition before it is persisted.
pub trait WritePolicy: Send + Sync {
    /// Decide on `before -> after` written by `writer`.
    ///
    /// # Errors
    ///
    /// `StoreError::Rejected` drops the write.
    fn review(
        &self,
        writer: ContextKind,
        before: &GameState,
        after: &GameState,
    ) -> Result<(), StoreError>;
}

/// Accepts everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

impl WritePolicy for AllowAll {
    fn review(&self, _: ContextKind, _: &GameState, _: &GameState) -> Result<(), StoreError> {
        Ok(())
    }
}
