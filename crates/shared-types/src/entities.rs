//! # Game State Document
//!
//! The entire game lives in one JSON document persisted under a single
//! storage key. Every context reads it whole and writes it whole.
//!
//! ## Layout
//!
//! ```text
//! tabs:      map<tabId, { state, puzzleSolved, ...flags, ...collections }>
//! player:    { hasFlashlight, codeFragments, mindFragments }
//! narrative: { shown }
//! meta:      { currentTab, highestTabUnlocked, gameComplete, actTwoComplete }
//! ```
//!
//! ## Invariants
//!
//! - A tab's `state` only moves forward (see [`TabPhase::rank`]).
//! - Append-only collections never hold duplicates and never shrink.
//! - `meta` flags are sticky and the unlock watermark only rises (see
//!   [`MetaRecord::unlock`]), so a replayed write cannot move them back.

use crate::ids::{TabId, TAB_COUNT};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Per-tab progress phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TabPhase {
    /// The tab has never been opened.
    #[default]
    Unvisited,
    /// Opened at least once; the first-visit content is active.
    Visited,
    /// Lit up by a trigger from another tab.
    Illuminated,
    /// The level's own puzzle is solved.
    Solved,
    /// Terminal: the level only offers post-completion content.
    PostCompletion,
}

impl TabPhase {
    /// Position in the forward-only ordering. `Illuminated` and `Solved` are
    /// alternative branches at the same rank.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Unvisited => 0,
            Self::Visited => 1,
            Self::Illuminated | Self::Solved => 2,
            Self::PostCompletion => 3,
        }
    }

    /// Whether moving from `self` to `next` is a forward step.
    #[must_use]
    pub const fn can_advance_to(self, next: TabPhase) -> bool {
        next.rank() > self.rank()
    }

    /// Wire name (`"post-completion"` etc).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unvisited => "unvisited",
            Self::Visited => "visited",
            Self::Illuminated => "illuminated",
            Self::Solved => "solved",
            Self::PostCompletion => "post-completion",
        }
    }
}

/// Append `id` to `items` unless already present. Returns whether it was added.
pub fn append_unique(items: &mut Vec<String>, id: &str) -> bool {
    if items.iter().any(|existing| existing == id) {
        return false;
    }
    items.push(id.to_string());
    true
}

/// Progress record of one tab.
///
/// Puzzle-specific flags and collections live in `extra` and are flattened
/// into the record on the wire, so `{"state":"visited","backtrackedTo1":true}`
/// round-trips without a schema change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TabRecord {
    /// Current phase.
    pub state: TabPhase,
    /// The level's own puzzle has been solved.
    #[serde(default)]
    pub puzzle_solved: bool,
    /// Per-tab flags and append-only collections.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TabRecord {
    /// Advance the phase, ignoring anything that is not a forward step.
    /// Returns whether the phase changed.
    pub fn advance(&mut self, next: TabPhase) -> bool {
        if self.state.can_advance_to(next) {
            self.state = next;
            true
        } else {
            false
        }
    }

    /// Read a boolean flag; absent or non-boolean reads as `false`.
    #[must_use]
    pub fn flag(&self, key: &str) -> bool {
        self.extra.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    /// Set a boolean flag.
    pub fn set_flag(&mut self, key: &str, value: bool) {
        self.extra.insert(key.to_string(), Value::Bool(value));
    }

    /// Read an append-only string collection. Non-string entries are skipped.
    #[must_use]
    pub fn collection(&self, key: &str) -> Vec<String> {
        match self.extra.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Append a unique id to a collection. Returns whether it was added.
    pub fn append_to(&mut self, key: &str, id: &str) -> bool {
        let mut items = self.collection(key);
        let added = append_unique(&mut items, id);
        if added {
            self.extra.insert(
                key.to_string(),
                Value::Array(items.into_iter().map(Value::String).collect()),
            );
        }
        added
    }
}

/// Cross-context player progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRecord {
    pub has_flashlight: bool,
    pub code_fragments: Vec<String>,
    pub mind_fragments: Vec<String>,
}

/// Log of narration lines already shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NarrativeRecord {
    pub shown: Vec<String>,
}

impl NarrativeRecord {
    /// Whether `line_id` has been shown in any context.
    #[must_use]
    pub fn has_shown(&self, line_id: &str) -> bool {
        self.shown.iter().any(|l| l == line_id)
    }
}

/// Global milestones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaRecord {
    /// The tab that last regained focus.
    pub current_tab: TabId,
    pub highest_tab_unlocked: u8,
    pub game_complete: bool,
    pub act_two_complete: bool,
}

impl Default for MetaRecord {
    fn default() -> Self {
        Self {
            current_tab: TabId(1),
            highest_tab_unlocked: 1,
            game_complete: false,
            act_two_complete: false,
        }
    }
}

impl MetaRecord {
    /// Raise the unlock watermark; never lowers it.
    pub fn unlock(&mut self, tab: TabId) {
        self.highest_tab_unlocked = self.highest_tab_unlocked.max(tab.get());
    }
}

/// The root document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub tabs: BTreeMap<TabId, TabRecord>,
    pub player: PlayerRecord,
    pub narrative: NarrativeRecord,
    pub meta: MetaRecord,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            tabs: (1..=TAB_COUNT)
                .map(|id| (TabId(id), TabRecord::default()))
                .collect(),
            player: PlayerRecord::default(),
            narrative: NarrativeRecord::default(),
            meta: MetaRecord::default(),
        }
    }
}

impl GameState {
    /// Record of `tab`, if the document has one.
    #[must_use]
    pub fn tab(&self, tab: TabId) -> Option<&TabRecord> {
        self.tabs.get(&tab)
    }

    /// Mutable record of `tab`, created on first access.
    pub fn tab_mut(&mut self, tab: TabId) -> &mut TabRecord {
        self.tabs.entry(tab).or_default()
    }

    /// Phase of `tab`; unknown tabs read as unvisited.
    #[must_use]
    pub fn phase(&self, tab: TabId) -> TabPhase {
        self.tab(tab).map(|t| t.state).unwrap_or_default()
    }

    /// Parse a persisted value. Anything that is not a structurally valid
    /// document is rejected whole; there is no partial repair.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Serialize for persistence.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_document_shape() {
        let value = serde_json::to_value(GameState::default()).unwrap();
        assert_eq!(value["tabs"]["1"]["state"], "unvisited");
        assert_eq!(value["tabs"]["5"]["puzzleSolved"], false);
        assert_eq!(value["player"]["hasFlashlight"], false);
        assert_eq!(value["player"]["codeFragments"], json!([]));
        assert_eq!(value["narrative"]["shown"], json!([]));
        assert_eq!(value["meta"]["currentTab"], 1);
        assert_eq!(value["meta"]["highestTabUnlocked"], 1);
        assert_eq!(value["meta"]["gameComplete"], false);
        assert_eq!(value["meta"]["actTwoComplete"], false);
    }

    #[test]
    fn test_phase_ordering() {
        assert!(TabPhase::Unvisited.can_advance_to(TabPhase::Visited));
        assert!(TabPhase::Visited.can_advance_to(TabPhase::Illuminated));
        assert!(TabPhase::Visited.can_advance_to(TabPhase::Solved));
        assert!(!TabPhase::Solved.can_advance_to(TabPhase::Illuminated));
        assert!(!TabPhase::PostCompletion.can_advance_to(TabPhase::Visited));
    }

    #[test]
    fn test_tab_record_never_regresses() {
        let mut record = TabRecord {
            state: TabPhase::Illuminated,
            ..TabRecord::default()
        };
        assert!(!record.advance(TabPhase::Visited));
        assert_eq!(record.state, TabPhase::Illuminated);
        assert!(record.advance(TabPhase::PostCompletion));
    }

    #[test]
    fn test_extra_fields_flatten() {
        let raw = json!({
            "state": "visited",
            "puzzleSolved": false,
            "backtrackedTo1": true,
            "collectedSymbols": ["moon"]
        });
        let record: TabRecord = serde_json::from_value(raw.clone()).unwrap();
        assert!(record.flag("backtrackedTo1"));
        assert_eq!(record.collection("collectedSymbols"), vec!["moon"]);
        assert_eq!(serde_json::to_value(&record).unwrap(), raw);
    }

    #[test]
    fn test_collection_append_is_unique() {
        let mut record = TabRecord::default();
        assert!(record.append_to("collectedSymbols", "sun"));
        assert!(!record.append_to("collectedSymbols", "sun"));
        assert!(record.append_to("collectedSymbols", "moon"));
        assert_eq!(record.collection("collectedSymbols"), vec!["sun", "moon"]);
    }

    #[test]
    fn test_meta_unlock_never_lowers() {
        let mut meta = MetaRecord::default();
        meta.unlock(TabId(4));
        meta.unlock(TabId(2));
        assert_eq!(meta.highest_tab_unlocked, 4);
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(GameState::from_json("{not json").is_err());
        assert!(GameState::from_json(r#"{"tabs":{}}"#).is_err());
        assert!(GameState::from_json(r#"{"tabs":{"1":{"state":"sideways"}},"player":{"hasFlashlight":false,"codeFragments":[],"mindFragments":[]},"narrative":{"shown":[]},"meta":{"currentTab":1,"highestTabUnlocked":1,"gameComplete":false,"actTwoComplete":false}}"#).is_err());
    }

    #[test]
    fn test_document_round_trip() {
        let mut state = GameState::default();
        state.tab_mut(TabId(3)).set_flag("backtrackedTo1", true);
        append_unique(&mut state.player.code_fragments, "c1");
        let raw = state.to_json().unwrap();
        assert_eq!(GameState::from_json(&raw).unwrap(), state);
    }
}
