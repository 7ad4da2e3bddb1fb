//! Runtime errors. Gameplay failures never surface here; these are setup,
//! snapshot and task plumbing failures.

use crate::config::ConfigError;
use lantern_telemetry::TelemetryError;
use shared_types::TabId;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Telemetry(#[from] TelemetryError),

    /// No level script exists for the tab.
    #[error("No level is bound to tab {0}")]
    UnknownTab(TabId),

    /// The context task has already stopped.
    #[error("Context for tab {0} is closed")]
    Closed(TabId),

    #[error("Snapshot I/O failed for {}: {source}", path.display())]
    SnapshotIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Snapshot is not valid JSON: {0}")]
    SnapshotFormat(#[from] serde_json::Error),

    #[error("Snapshot version {found} is not supported (expected {expected})")]
    SnapshotVersion { found: u32, expected: u32 },
}

impl RuntimeError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::SnapshotIo {
            path: path.to_path_buf(),
            source,
        }
    }
}
