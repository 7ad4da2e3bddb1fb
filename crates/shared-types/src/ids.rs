//! # Identifiers
//!
//! - [`TabId`]: the level a context renders. Several contexts may share one
//!   (the same level opened in two tabs).
//! - [`ContextId`]: one running execution context. Unique per open tab and
//!   used for self-exclusion on the bus.
//! - [`ContextKind`]: the writer identity the ownership partition reasons
//!   about.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Number of levels shipped with the game.
pub const TAB_COUNT: u8 = 5;

/// Identifier of a level tab (`1..=TAB_COUNT`).
///
/// Serialized as a bare number in envelopes and as a string key inside
/// `GameState::tabs`, matching the persisted document layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub u8);

impl TabId {
    /// Create a tab id.
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    /// Numeric value of the id.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// All tabs known to the default document, in order.
    pub fn all() -> impl Iterator<Item = TabId> {
        (1..=TAB_COUNT).map(TabId)
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u8> for TabId {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl FromStr for TabId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u8>().map(TabId)
    }
}

/// Identity of one live execution context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextId(pub Uuid);

impl ContextId {
    /// Fresh random id; called once when a context opens.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ContextId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form is plenty to tell tabs apart in logs.
        let full = self.0.simple().to_string();
        f.write_str(&full[..8])
    }
}

/// The writer identity used by the ownership partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContextKind {
    /// A level context.
    Tab(TabId),
    /// Administrative writes (reset). Not tied to any level.
    System,
}

impl ContextKind {
    /// The `fromTab` value this writer stamps on envelopes.
    #[must_use]
    pub fn from_tab(self) -> Option<TabId> {
        match self {
            Self::Tab(tab) => Some(tab),
            Self::System => None,
        }
    }
}

impl From<Option<TabId>> for ContextKind {
    fn from(value: Option<TabId>) -> Self {
        value.map_or(Self::System, Self::Tab)
    }
}

impl fmt::Display for ContextKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tab(tab) => write!(f, "tab-{tab}"),
            Self::System => f.write_str("system"),
        }
    }
}
