//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for logs and metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Name stamped on startup logs
    pub service_name: String,

    /// Log level filter (trace, debug, info, warn, error), or any
    /// `EnvFilter` directive
    pub log_level: String,

    /// Whether to enable JSON formatted logs
    pub json_logs: bool,

    /// Include file and line in log lines
    pub source_locations: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "lantern".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            source_locations: false,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// - `LANTERN_SERVICE_NAME`: Service name (default: lantern)
    /// - `LANTERN_LOG_LEVEL` or `RUST_LOG`: Log level (default: info)
    /// - `LANTERN_JSON_LOGS`: JSON logs (default: false)
    /// - `LANTERN_LOG_SOURCE`: File and line in logs (default: false)
    pub fn from_env() -> Self {
        Self {
            service_name: env::var("LANTERN_SERVICE_NAME")
                .unwrap_or_else(|_| "lantern".to_string()),

            log_level: env::var("LANTERN_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),

            json_logs: env::var("LANTERN_JSON_LOGS")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),

            source_locations: env::var("LANTERN_LOG_SOURCE")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
        }
    }

    /// Same configuration at a different level.
    #[must_use]
    pub fn with_level(mut self, level: &str) -> Self {
        self.log_level = level.to_string();
        self
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
