//! # Lantern Telemetry
//!
//! Logging and metrics for the execution contexts.
//!
//! ## Components
//!
//! - **Logs**: `tracing` with an `EnvFilter`, plain or JSON lines.
//! - **Metrics**: Prometheus counters in a private registry, rendered in
//!   text exposition format on demand.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lantern_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() -> Result<(), lantern_telemetry::TelemetryError> {
//!     let _guard = init_telemetry(&TelemetryConfig::from_env())?;
//!     // contexts run here
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `LANTERN_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `LANTERN_JSON_LOGS` | `false` | JSON formatted logs |
//! | `LANTERN_SERVICE_NAME` | `lantern` | Name stamped on startup logs |

mod config;
mod logging;
mod metrics;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use metrics::{
    encode_metrics, register_metrics, MetricsHandle, AUTOMATON_TRANSITIONS, BUS_ENVELOPES_DROPPED,
    BUS_ENVELOPES_RECEIVED, BUS_ENVELOPES_SENT, CONTEXTS_OPEN, STORE_DROPPED_WRITES,
    STORE_RECOVERIES, STORE_RESETS, STORE_WRITES,
};
pub use tracing_setup::init_tracing;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and metrics.
///
/// Returns a guard to hold for the lifetime of the process.
///
/// # Errors
///
/// Fails if a global subscriber is already installed or the metrics
/// cannot be registered.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics = register_metrics()?;
    init_tracing(config)?;
    tracing::info!(
        service = %config.service_name,
        log_level = %config.log_level,
        json = config.json_logs,
        "Telemetry initialized"
    );
    Ok(TelemetryGuard { metrics })
}

/// Keeps telemetry alive.
pub struct TelemetryGuard {
    metrics: MetricsHandle,
}

impl TelemetryGuard {
    /// Metrics in Prometheus text format.
    pub fn render_metrics(&self) -> Result<String, TelemetryError> {
        self.metrics.render()
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::debug!("Telemetry shutting down");
    }
}

/// Increment a counter, optionally labelled.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}

/// Add to a counter, optionally labelled.
#[macro_export]
macro_rules! metric_add {
    ($metric:expr, $value:expr) => {
        $metric.inc_by($value)
    };
    ($metric:expr, $labels:expr, $value:expr) => {
        $metric.with_label_values($labels).inc_by($value)
    };
}
