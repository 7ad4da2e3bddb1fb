//! # Error Types
//!
//! The failure taxonomy shared by every context. None of these ever reach
//! the player: each is absorbed at the component boundary that raises it.
//!
//! | Failure               | Type                              | Handling                 |
//! |-----------------------|-----------------------------------|--------------------------|
//! | TransportUnavailable  | `BusError::TransportUnavailable`  | degrade, then local-only |
//! | StoreCorrupt          | `StoreError::Corrupt`             | full reset to defaults   |
//! | StoreWriteFailure     | `StorageError::QuotaExceeded`     | write dropped            |
//! | MalformedEnvelope     | `MessageError`                    | envelope dropped         |
//! | OwnershipViolation    | `OwnershipError::Violation`       | logged or write dropped  |

use crate::ids::ContextKind;
use thiserror::Error;

/// Errors from a storage area (the browser-storage analogue).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    /// Writing the value would exceed the origin's quota.
    #[error("Quota exceeded writing {key}: {bytes} bytes, quota {quota}")]
    QuotaExceeded {
        key: String,
        bytes: usize,
        quota: usize,
    },
}

/// Errors raised inside the state store.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The persisted value could not be parsed as a document.
    #[error("Persisted state is corrupt: {0}")]
    Corrupt(String),

    /// The storage area refused the write.
    #[error("Write failed: {0}")]
    WriteFailed(#[from] StorageError),

    /// An update would produce an invalid document or record.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// The write policy refused the update.
    #[error("Write rejected for {writer}: {paths:?}")]
    Rejected { writer: ContextKind, paths: Vec<String> },

    /// The updater chose not to write (already applied, nothing to do).
    #[error("Update abandoned: {0}")]
    Abandoned(String),
}

/// Errors from encoding or decoding envelopes.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MessageError {
    /// The envelope itself is not valid JSON of the expected shape.
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// A known type arrived with a payload of the wrong shape.
    #[error("Malformed {kind} payload: {reason}")]
    MalformedPayload { kind: String, reason: String },
}

impl From<serde_json::Error> for MessageError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedEnvelope(err.to_string())
    }
}

/// Errors from the message bus.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BusError {
    /// The host offers neither transport.
    #[error("No transport available")]
    TransportUnavailable,

    /// Encoding or decoding failed.
    #[error(transparent)]
    Message(#[from] MessageError),

    /// The fallback transport could not write its slot.
    #[error("Fallback transport write failed: {0}")]
    Storage(#[from] StorageError),
}

/// Errors from the ownership policy.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OwnershipError {
    /// A writer touched paths it does not own.
    #[error("{writer} wrote paths it does not own: {paths:?}")]
    Violation {
        writer: ContextKind,
        paths: Vec<String>,
    },
}
