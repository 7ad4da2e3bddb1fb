//! # Lantern Context Runtime
//!
//! Opens execution contexts (one per tab) against a shared host and runs
//! them, either inline or on their own tokio tasks.
//!
//! ## Modular Structure
//!
//! - `config` - `RuntimeConfig` with `LANTERN_*` environment overrides
//! - `host` - the shared origin: storage area plus optional broadcast channel
//! - `context` - one tab: bus, store, ownership policy, automaton
//! - `driver` - task wrapper with a command channel and shutdown signal
//! - `sink` - where side effects go
//! - `snapshot` - origin persistence between runs
//! - `scenario` - the scripted playthrough behind `lantern-sim`
//!
//! ## Wiring of one context
//!
//! ```text
//! milestone ──→ TriggerAutomaton ──try_set──→ StateStore ──→ storage area
//!                  ↑        │                    │   (OwnershipPolicy)
//! envelope ──→ inbox        └──send──→ MessageBus ←──┘ STATE_CHANGE
//!                  │
//!                  └──effects──→ CollaboratorSink
//! ```

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod context;
pub mod driver;
pub mod error;
pub mod host;
pub mod scenario;
pub mod sink;
pub mod snapshot;

pub use config::{ConfigError, RuntimeConfig, StorageConfig, TransportConfig};
pub use context::{ContextReport, ExecutionContext};
pub use driver::{ContextCommand, ContextHandle, ContextStatus};
pub use error::RuntimeError;
pub use host::Host;
pub use scenario::{run_playthrough, run_playthrough_with, PlaythroughReport};
pub use sink::{CollaboratorSink, RecordingSink, TracingSink};
