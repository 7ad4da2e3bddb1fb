//! # Envelope
//!
//! The ephemeral unit exchanged between contexts. Constructed at send time,
//! delivered zero or more times to zero or more live contexts, then dropped.
//! Never persisted as state, never acknowledged.
//!
//! ## Wire Shape
//!
//! ```json
//! { "type": "BACKTRACK_TRIGGER", "fromTab": 3, "payload": { "targetTab": 1 } }
//! ```
//!
//! The fallback transport adds a `nonce` string so that two identical sends
//! still change the stored value; receivers discard it.

use crate::errors::MessageError;
use crate::ids::TabId;
use crate::messages::GameMessage;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Raw envelope as it travels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    pub from_tab: Option<TabId>,
    pub payload: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
}

/// Typed envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// Sending tab; `None` for system writes such as reset.
    pub from_tab: Option<TabId>,
    pub message: GameMessage,
}

impl Envelope {
    /// Wrap a message.
    #[must_use]
    pub fn new(message: GameMessage, from_tab: Option<TabId>) -> Self {
        Self { from_tab, message }
    }

    /// Convert to the raw wire form (without a nonce).
    pub fn to_wire(&self) -> Result<WireEnvelope, MessageError> {
        let (kind, payload) = self.message.to_wire()?;
        Ok(WireEnvelope {
            kind,
            from_tab: self.from_tab,
            payload,
            nonce: None,
        })
    }

    /// Rebuild from the raw wire form. The nonce, if any, is dropped here.
    pub fn from_wire(wire: WireEnvelope) -> Result<Self, MessageError> {
        Ok(Self {
            from_tab: wire.from_tab,
            message: GameMessage::from_wire(&wire.kind, wire.payload)?,
        })
    }

    /// Serialize to a JSON string.
    pub fn encode(&self) -> Result<String, MessageError> {
        Ok(serde_json::to_string(&self.to_wire()?)?)
    }

    /// Parse from a JSON string.
    ///
    /// # Errors
    ///
    /// `MessageError::MalformedEnvelope` if the text is not an envelope,
    /// `MessageError::MalformedPayload` if a known type has a bad payload.
    pub fn decode(raw: &str) -> Result<Self, MessageError> {
        let wire: WireEnvelope = serde_json::from_str(raw)?;
        Self::from_wire(wire)
    }

    /// Wire type string.
    #[must_use]
    pub fn type_name(&self) -> &str {
        self.message.type_name()
    }
}
