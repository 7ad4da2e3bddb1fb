//! # Shared Types Crate
//!
//! This crate contains the game-state document, the identifiers of execution
//! contexts, the `Envelope` exchanged between them and the storage-area port
//! every context persists through.
//!
//! ## Design Principles
//!
//! - **Single Document**: The whole game lives in one JSON-serializable
//!   [`GameState`]; any value that fails to parse is replaced by defaults.
//! - **Closed Message Union**: Envelopes carry a [`GameMessage`] with one
//!   variant per message type, plus `Unknown` for forward compatibility.
//! - **Store Is Truth**: Envelope payloads are hints. Receivers re-read the
//!   persisted document before deciding anything.

pub mod entities;
pub mod envelope;
pub mod errors;
pub mod ids;
pub mod messages;
pub mod storage;

pub use entities::*;
pub use envelope::{Envelope, WireEnvelope};
pub use errors::*;
pub use ids::{ContextId, ContextKind, TabId};
pub use messages::{GameMessage, MessageType};
pub use storage::{OriginStorage, StorageArea, StorageChange, StorageHandle, StorageWatcher};
