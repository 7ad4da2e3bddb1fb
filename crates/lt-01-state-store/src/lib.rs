//! # lt-01-state-store
//!
//! The single persisted game-state document, shared by every context of an
//! origin.
//!
//! ## Role in System
//!
//! - **Single Source of Truth**: all cross-context progress lives in one
//!   JSON document under one storage key.
//! - **Change Broadcast**: every successful write publishes `STATE_CHANGE`
//!   carrying the new document, stamped with the writer's tab.
//! - **Silent Recovery**: a missing or corrupt document becomes the default;
//!   a refused write is dropped. Nothing surfaces to the player.
//!
//! ## Update Flow
//!
//! ```text
//! set(updater)
//!     │
//!     ├── read + parse ──(corrupt)──→ default
//!     ├── updater(current) ──→ next
//!     ├── WritePolicy::review(writer, current, next) ──(reject)──→ dropped
//!     ├── persist ──(quota)──→ dropped, no broadcast
//!     └── send STATE_CHANGE { next } fromTab = writer
//! ```
//!
//! There is no lock across the read-modify-write. Two contexts updating
//! the same path concurrently can lose one write; the ownership partition
//! keeps such paths rare.

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::*;
pub use ports::*;
pub use service::{StateStore, StoreStats};

/// Default storage key of the document.
pub const DEFAULT_STATE_KEY: &str = "lantern:game-state";
