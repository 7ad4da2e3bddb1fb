//! # Shared Bus - Cross-Context Message Bus
//!
//! Publish/subscribe between execution contexts that share nothing but an
//! origin. One [`MessageBus`] per context; no module-level singletons.
//!
//! ## Transports
//!
//! ```text
//! ┌──────────────┐   send()    ┌──────────────────────┐   poll()   ┌──────────────┐
//! │  Context A   │ ──────────→ │ BroadcastChannel     │ ─────────→ │  Context B   │
//! │              │             │   (primary)          │            │              │
//! │              │             ├──────────────────────┤            │              │
//! │              │ ──────────→ │ StorageEvents        │ ─────────→ │              │
//! └──────────────┘             │   (fallback, nonced) │            └──────────────┘
//!                              └──────────────────────┘
//! ```
//!
//! - **Primary**: direct broadcast channel; the sender never hears itself.
//! - **Fallback**: a nonced envelope written to a well-known storage key;
//!   peers see the change notification, which never fires in the writer.
//! - **None**: local-only play. Sends are dropped silently.
//!
//! ## Guarantees
//!
//! Best-effort, unordered across senders, ordered per sender under the
//! fallback, possibly duplicated. Receivers re-read the store and must be
//! idempotent.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod broadcast;
pub mod bus;
pub mod nonce_cache;
pub mod storage_transport;
pub mod subscriber;
pub mod transport;

// Re-export main types
pub use broadcast::{BroadcastHub, BroadcastTransport};
pub use bus::{BusStats, Handler, MessageBus};
pub use nonce_cache::RecentNonces;
pub use storage_transport::StorageEventTransport;
pub use subscriber::Subscription;
pub use transport::{select_transport, Transport, TransportKind, TransportPreference};

/// Default broadcast channel name.
pub const DEFAULT_CHANNEL: &str = "lantern";

/// Default storage key the fallback transport writes envelopes under.
pub const DEFAULT_BUS_KEY: &str = "lantern:bus";

/// Envelopes buffered per receiver on the broadcast channel before the
/// oldest are dropped.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;
