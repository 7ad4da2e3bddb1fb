//! # Game Messages
//!
//! Closed union of everything contexts say to each other. Each variant maps
//! to one wire `type` string and carries a typed payload, so receivers match
//! exhaustively instead of probing optional fields.
//!
//! | Type                       | Payload                      |
//! |----------------------------|------------------------------|
//! | `STATE_CHANGE`             | the full `GameState`         |
//! | `TAB_COMPLETED`            | `{ tab }`                    |
//! | `BACKTRACK_TRIGGER`        | `{ targetTab }`              |
//! | `PUZZLE_SOLVED`            | `{ tab, puzzle }`            |
//! | `NARRATOR_TRIGGER`         | `{ lineId, targetTab? }`     |
//! | `NEW_SYMBOL_FOUND`         | `{ symbolId, total }`        |
//! | `MIND_FRAGMENTS_COLLECTED` | `{ count }`                  |
//! | `GAME_COMPLETE_FINAL`      | `{}`                         |
//!
//! Any other type decodes to [`GameMessage::Unknown`] and is ignored by the
//! automata.

use crate::entities::GameState;
use crate::errors::MessageError;
use crate::ids::TabId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Known message types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    StateChange,
    TabCompleted,
    BacktrackTrigger,
    PuzzleSolved,
    NarratorTrigger,
    NewSymbolFound,
    MindFragmentsCollected,
    GameCompleteFinal,
}

impl MessageType {
    /// Every known type, in declaration order.
    pub const ALL: [MessageType; 8] = [
        Self::StateChange,
        Self::TabCompleted,
        Self::BacktrackTrigger,
        Self::PuzzleSolved,
        Self::NarratorTrigger,
        Self::NewSymbolFound,
        Self::MindFragmentsCollected,
        Self::GameCompleteFinal,
    ];

    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StateChange => "STATE_CHANGE",
            Self::TabCompleted => "TAB_COMPLETED",
            Self::BacktrackTrigger => "BACKTRACK_TRIGGER",
            Self::PuzzleSolved => "PUZZLE_SOLVED",
            Self::NarratorTrigger => "NARRATOR_TRIGGER",
            Self::NewSymbolFound => "NEW_SYMBOL_FOUND",
            Self::MindFragmentsCollected => "MIND_FRAGMENTS_COLLECTED",
            Self::GameCompleteFinal => "GAME_COMPLETE_FINAL",
        }
    }

    /// Parse a wire name; `None` for types this build does not know.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == raw)
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TabPayload {
    tab: TabId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BacktrackPayload {
    target_tab: TabId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PuzzlePayload {
    tab: TabId,
    puzzle: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NarratorPayload {
    line_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    target_tab: Option<TabId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SymbolPayload {
    symbol_id: String,
    total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CountPayload {
    count: usize,
}

/// A message between contexts.
#[derive(Debug, Clone, PartialEq)]
pub enum GameMessage {
    /// The persisted document changed; carries the new document.
    StateChange(Box<GameState>),
    /// A tab reached post-completion or unlocked the next tab.
    TabCompleted { tab: TabId },
    /// A later tab changed something an earlier tab must react to.
    BacktrackTrigger { target_tab: TabId },
    /// A tab's own puzzle was solved.
    PuzzleSolved { tab: TabId, puzzle: String },
    /// Ask the targeted (or focused) tab to narrate a line once.
    NarratorTrigger {
        line_id: String,
        target_tab: Option<TabId>,
    },
    /// A symbol was collected; `total` is the running count.
    NewSymbolFound { symbol_id: String, total: usize },
    /// All mind fragments are in.
    MindFragmentsCollected { count: usize },
    /// The game is over.
    GameCompleteFinal,
    /// A type this build does not know. Kept, logged, never acted on.
    Unknown { kind: String, payload: Value },
}

impl GameMessage {
    /// Known type of this message, `None` for `Unknown`.
    #[must_use]
    pub fn message_type(&self) -> Option<MessageType> {
        Some(match self {
            Self::StateChange(_) => MessageType::StateChange,
            Self::TabCompleted { .. } => MessageType::TabCompleted,
            Self::BacktrackTrigger { .. } => MessageType::BacktrackTrigger,
            Self::PuzzleSolved { .. } => MessageType::PuzzleSolved,
            Self::NarratorTrigger { .. } => MessageType::NarratorTrigger,
            Self::NewSymbolFound { .. } => MessageType::NewSymbolFound,
            Self::MindFragmentsCollected { .. } => MessageType::MindFragmentsCollected,
            Self::GameCompleteFinal => MessageType::GameCompleteFinal,
            Self::Unknown { .. } => return None,
        })
    }

    /// Wire `type` string.
    #[must_use]
    pub fn type_name(&self) -> &str {
        match self {
            Self::Unknown { kind, .. } => kind,
            other => other
                .message_type()
                .map_or("UNKNOWN", MessageType::as_str),
        }
    }

    /// Explicit target tab, for messages that name one.
    #[must_use]
    pub fn target(&self) -> Option<TabId> {
        match self {
            Self::BacktrackTrigger { target_tab } => Some(*target_tab),
            Self::NarratorTrigger { target_tab, .. } => *target_tab,
            _ => None,
        }
    }

    /// Split into wire `type` and `payload`.
    pub fn to_wire(&self) -> Result<(String, Value), MessageError> {
        let payload = match self {
            Self::StateChange(state) => serde_json::to_value(state.as_ref())?,
            Self::TabCompleted { tab } => serde_json::to_value(TabPayload { tab: *tab })?,
            Self::BacktrackTrigger { target_tab } => serde_json::to_value(BacktrackPayload {
                target_tab: *target_tab,
            })?,
            Self::PuzzleSolved { tab, puzzle } => serde_json::to_value(PuzzlePayload {
                tab: *tab,
                puzzle: puzzle.clone(),
            })?,
            Self::NarratorTrigger {
                line_id,
                target_tab,
            } => serde_json::to_value(NarratorPayload {
                line_id: line_id.clone(),
                target_tab: *target_tab,
            })?,
            Self::NewSymbolFound { symbol_id, total } => serde_json::to_value(SymbolPayload {
                symbol_id: symbol_id.clone(),
                total: *total,
            })?,
            Self::MindFragmentsCollected { count } => {
                serde_json::to_value(CountPayload { count: *count })?
            }
            Self::GameCompleteFinal => Value::Object(Map::new()),
            Self::Unknown { payload, .. } => payload.clone(),
        };
        Ok((self.type_name().to_string(), payload))
    }

    /// Rebuild from wire `type` and `payload`.
    ///
    /// # Errors
    ///
    /// `MessageError::MalformedPayload` when a known type carries a payload
    /// of the wrong shape. Unknown types never fail.
    pub fn from_wire(kind: &str, payload: Value) -> Result<Self, MessageError> {
        let Some(message_type) = MessageType::parse(kind) else {
            return Ok(Self::Unknown {
                kind: kind.to_string(),
                payload,
            });
        };

        let malformed = |source: serde_json::Error| MessageError::MalformedPayload {
            kind: kind.to_string(),
            reason: source.to_string(),
        };

        Ok(match message_type {
            MessageType::StateChange => {
                Self::StateChange(Box::new(serde_json::from_value(payload).map_err(malformed)?))
            }
            MessageType::TabCompleted => {
                let p: TabPayload = serde_json::from_value(payload).map_err(malformed)?;
                Self::TabCompleted { tab: p.tab }
            }
            MessageType::BacktrackTrigger => {
                let p: BacktrackPayload = serde_json::from_value(payload).map_err(malformed)?;
                Self::BacktrackTrigger {
                    target_tab: p.target_tab,
                }
            }
            MessageType::PuzzleSolved => {
                let p: PuzzlePayload = serde_json::from_value(payload).map_err(malformed)?;
                Self::PuzzleSolved {
                    tab: p.tab,
                    puzzle: p.puzzle,
                }
            }
            MessageType::NarratorTrigger => {
                let p: NarratorPayload = serde_json::from_value(payload).map_err(malformed)?;
                Self::NarratorTrigger {
                    line_id: p.line_id,
                    target_tab: p.target_tab,
                }
            }
            MessageType::NewSymbolFound => {
                let p: SymbolPayload = serde_json::from_value(payload).map_err(malformed)?;
                Self::NewSymbolFound {
                    symbol_id: p.symbol_id,
                    total: p.total,
                }
            }
            MessageType::MindFragmentsCollected => {
                let p: CountPayload = serde_json::from_value(payload).map_err(malformed)?;
                Self::MindFragmentsCollected { count: p.count }
            }
            MessageType::GameCompleteFinal => Self::GameCompleteFinal,
        })
    }
}
