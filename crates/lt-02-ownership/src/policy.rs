//! # Ownership Policy
//!
//! Write-time validation against the [`OwnershipTable`].

use crate::domain::{changed_paths, OwnershipTable};
use lt_01_state_store::WritePolicy;
use shared_types::{ContextKind, GameState, OwnershipError, StoreError};
use std::fmt;
use std::str::FromStr;
use tracing::{trace, warn};

/// How violations are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OwnershipMode {
    /// No diff is computed.
    Off,
    /// Violations are logged; the write goes ahead.
    #[default]
    Audit,
    /// Violations are logged and the write is dropped.
    Enforce,
}

impl fmt::Display for OwnershipMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Off => "off",
            Self::Audit => "audit",
            Self::Enforce => "enforce",
        })
    }
}

impl FromStr for OwnershipMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "audit" => Ok(Self::Audit),
            "enforce" => Ok(Self::Enforce),
            other => Err(format!("unknown ownership mode: {other}")),
        }
    }
}

/// Checks every store write against the partition.
#[derive(Debug, Clone, Default)]
pub struct OwnershipPolicy {
    table: OwnershipTable,
    mode: OwnershipMode,
}

impl OwnershipPolicy {
    /// Policy over the standard table.
    #[must_use]
    pub fn new(mode: OwnershipMode) -> Self {
        Self::with_table(OwnershipTable::standard(), mode)
    }

    #[must_use]
    pub fn with_table(table: OwnershipTable, mode: OwnershipMode) -> Self {
        Self { table, mode }
    }

    #[must_use]
    pub fn mode(&self) -> OwnershipMode {
        self.mode
    }

    /// Paths in `before -> after` that `writer` does not own.
    ///
    /// # Errors
    ///
    /// `OwnershipError::Violation` listing them, if any.
    pub fn check(
        &self,
        writer: ContextKind,
        before: &GameState,
        after: &GameState,
    ) -> Result<(), OwnershipError> {
        let changed = changed_paths(before, after);
        let paths = self.table.violations(writer, &changed);
        trace!(writer = %writer, changed = changed.len(), "Ownership diff");
        if paths.is_empty() {
            Ok(())
        } else {
            Err(OwnershipError::Violation { writer, paths })
        }
    }
}

impl WritePolicy for OwnershipPolicy {
    fn review(
        &self,
        writer: ContextKind,
        before: &GameState,
        after: &GameState,
    ) -> Result<(), StoreError> {
        if self.mode == OwnershipMode::Off {
            return Ok(());
        }
        let Err(OwnershipError::Violation { writer, paths }) = self.check(writer, before, after)
        else {
            return Ok(());
        };

        match self.mode {
            OwnershipMode::Enforce => {
                warn!(writer = %writer, path = ?paths, "Ownership violation, write refused");
                Err(StoreError::Rejected { writer, paths })
            }
            _ => {
                warn!(writer = %writer, path = ?paths, "Ownership violation");
                Ok(())
            }
        }
    }
}
