//! # Runtime Configuration
//!
//! Everything a host needs to open contexts. Defaults describe a modern
//! host: broadcast channel available, storage change events delivered, no
//! quota, ownership audited.
//!
//! Every field can be overridden through a `LANTERN_` environment variable;
//! unparsable values are logged and the default is kept.

use lantern_telemetry::TelemetryConfig;
use lt_01_state_store::DEFAULT_STATE_KEY;
use lt_02_ownership::OwnershipMode;
use shared_bus::{TransportPreference, DEFAULT_BUS_KEY, DEFAULT_CHANNEL, DEFAULT_CHANNEL_CAPACITY};
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

/// Smallest quota that still fits a default document with room to grow.
pub const MIN_QUOTA_BYTES: usize = 1024;

/// Complete runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Persisted area configuration.
    pub storage: StorageConfig,
    /// Message bus configuration.
    pub transport: TransportConfig,
    /// How ownership violations are handled.
    pub ownership: OwnershipMode,
    /// How often a context drains its transport.
    pub pump_interval_ms: u64,
    /// Logs and metrics.
    pub telemetry: TelemetryConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            transport: TransportConfig::default(),
            ownership: OwnershipMode::default(),
            pump_interval_ms: 10,
            telemetry: TelemetryConfig::default(),
        }
    }
}

/// Persisted area configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Key the game-state document lives under.
    pub state_key: String,
    /// Key the fallback transport writes envelopes under.
    pub bus_key: String,
    /// Origin quota in bytes (keys plus values). `None` is unlimited.
    pub quota_bytes: Option<usize>,
    /// Whether the host delivers storage change notifications.
    pub change_events: bool,
    /// Where the origin is saved between runs, if anywhere.
    pub snapshot_path: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_key: DEFAULT_STATE_KEY.to_string(),
            bus_key: DEFAULT_BUS_KEY.to_string(),
            quota_bytes: None,
            change_events: true,
            snapshot_path: None,
        }
    }
}

/// Message bus configuration.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Which transport to prefer.
    pub preference: TransportPreference,
    /// Broadcast channel name.
    pub channel: String,
    /// Whether the host offers a broadcast channel at all.
    pub broadcast_available: bool,
    /// Frames buffered per receiver before the oldest are lost.
    pub channel_capacity: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            preference: TransportPreference::Auto,
            channel: DEFAULT_CHANNEL.to_string(),
            broadcast_available: true,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A storage key is empty.
    #[error("Storage key `{0}` must not be empty")]
    EmptyKey(&'static str),

    /// The state document and the bus slot would overwrite each other.
    #[error("State key and bus key are both `{0}`")]
    KeyCollision(String),

    /// The quota cannot hold a default document.
    #[error("Quota of {quota} bytes is below the minimum of {min}")]
    QuotaTooSmall { quota: usize, min: usize },

    /// A zero interval or capacity.
    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

impl RuntimeConfig {
    /// Defaults overridden from the process environment.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `LANTERN_STATE_KEY` | `storage.state_key` |
    /// | `LANTERN_BUS_KEY` | `storage.bus_key` |
    /// | `LANTERN_QUOTA_BYTES` | `storage.quota_bytes` |
    /// | `LANTERN_CHANGE_EVENTS` | `storage.change_events` |
    /// | `LANTERN_SNAPSHOT` | `storage.snapshot_path` |
    /// | `LANTERN_TRANSPORT` | `transport.preference` (`auto`, `broadcast`, `storage`, `none`) |
    /// | `LANTERN_CHANNEL` | `transport.channel` |
    /// | `LANTERN_BROADCAST` | `transport.broadcast_available` |
    /// | `LANTERN_OWNERSHIP` | `ownership` (`off`, `audit`, `enforce`) |
    /// | `LANTERN_PUMP_MS` | `pump_interval_ms` |
    ///
    /// Telemetry reads its own variables, see [`TelemetryConfig::from_env`].
    pub fn from_env() -> Self {
        let mut config = Self::from_lookup(|name| std::env::var(name).ok());
        config.telemetry = TelemetryConfig::from_env();
        config
    }

    /// Defaults overridden from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(key) = lookup("LANTERN_STATE_KEY") {
            config.storage.state_key = key;
        }
        if let Some(key) = lookup("LANTERN_BUS_KEY") {
            config.storage.bus_key = key;
        }
        if let Some(raw) = lookup("LANTERN_QUOTA_BYTES") {
            if raw.eq_ignore_ascii_case("none") || raw.is_empty() {
                config.storage.quota_bytes = None;
            } else if let Some(quota) = parse_or_warn::<usize>("LANTERN_QUOTA_BYTES", &raw) {
                config.storage.quota_bytes = Some(quota);
            }
        }
        if let Some(raw) = lookup("LANTERN_CHANGE_EVENTS") {
            if let Some(flag) = parse_flag("LANTERN_CHANGE_EVENTS", &raw) {
                config.storage.change_events = flag;
            }
        }
        if let Some(path) = lookup("LANTERN_SNAPSHOT") {
            config.storage.snapshot_path = Some(PathBuf::from(path));
        }
        if let Some(raw) = lookup("LANTERN_TRANSPORT") {
            if let Some(preference) = parse_or_warn("LANTERN_TRANSPORT", &raw) {
                config.transport.preference = preference;
            }
        }
        if let Some(channel) = lookup("LANTERN_CHANNEL") {
            config.transport.channel = channel;
        }
        if let Some(raw) = lookup("LANTERN_BROADCAST") {
            if let Some(flag) = parse_flag("LANTERN_BROADCAST", &raw) {
                config.transport.broadcast_available = flag;
            }
        }
        if let Some(raw) = lookup("LANTERN_OWNERSHIP") {
            if let Some(mode) = parse_or_warn("LANTERN_OWNERSHIP", &raw) {
                config.ownership = mode;
            }
        }
        if let Some(raw) = lookup("LANTERN_PUMP_MS") {
            if let Some(ms) = parse_or_warn("LANTERN_PUMP_MS", &raw) {
                config.pump_interval_ms = ms;
            }
        }
        config
    }

    /// Check the configuration before opening any context.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.state_key.is_empty() {
            return Err(ConfigError::EmptyKey("state_key"));
        }
        if self.storage.bus_key.is_empty() {
            return Err(ConfigError::EmptyKey("bus_key"));
        }
        if self.storage.state_key == self.storage.bus_key {
            return Err(ConfigError::KeyCollision(self.storage.state_key.clone()));
        }
        if let Some(quota) = self.storage.quota_bytes {
            if quota < MIN_QUOTA_BYTES {
                return Err(ConfigError::QuotaTooSmall {
                    quota,
                    min: MIN_QUOTA_BYTES,
                });
            }
        }
        if self.pump_interval_ms == 0 {
            return Err(ConfigError::Zero("pump_interval_ms"));
        }
        if self.transport.channel_capacity == 0 {
            return Err(ConfigError::Zero("channel_capacity"));
        }
        Ok(())
    }
}

fn parse_or_warn<T>(name: &str, raw: &str) -> Option<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw.parse() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(variable = name, value = raw, error = %e, "Ignoring unparsable setting");
            None
        }
    }
}

fn parse_flag(name: &str, raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => {
            warn!(variable = name, value = raw, "Ignoring unparsable flag");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = RuntimeConfig::from_lookup(|_| None);
        assert_eq!(config.storage.state_key, "lantern:game-state");
        assert_eq!(config.storage.bus_key, "lantern:bus");
        assert_eq!(config.ownership, OwnershipMode::Audit);
        assert_eq!(config.transport.preference, TransportPreference::Auto);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let config = RuntimeConfig::from_lookup(lookup(&[
            ("LANTERN_TRANSPORT", "storage"),
            ("LANTERN_OWNERSHIP", "enforce"),
            ("LANTERN_QUOTA_BYTES", "4096"),
            ("LANTERN_BROADCAST", "off"),
            ("LANTERN_PUMP_MS", "25"),
        ]));
        assert_eq!(config.transport.preference, TransportPreference::Storage);
        assert_eq!(config.ownership, OwnershipMode::Enforce);
        assert_eq!(config.storage.quota_bytes, Some(4096));
        assert!(!config.transport.broadcast_available);
        assert_eq!(config.pump_interval_ms, 25);
    }

    #[test]
    fn test_garbage_keeps_default() {
        let config = RuntimeConfig::from_lookup(lookup(&[
            ("LANTERN_TRANSPORT", "carrier-pigeon"),
            ("LANTERN_PUMP_MS", "soon"),
            ("LANTERN_CHANGE_EVENTS", "maybe"),
        ]));
        assert_eq!(config.transport.preference, TransportPreference::Auto);
        assert_eq!(config.pump_interval_ms, 10);
        assert!(config.storage.change_events);
    }

    #[test]
    fn test_validate_rejects_collisions_and_tiny_quota() {
        let config = RuntimeConfig::from_lookup(lookup(&[
            ("LANTERN_STATE_KEY", "k"),
            ("LANTERN_BUS_KEY", "k"),
        ]));
        assert_eq!(config.validate(), Err(ConfigError::KeyCollision("k".into())));

        let config = RuntimeConfig::from_lookup(lookup(&[("LANTERN_QUOTA_BYTES", "100")]));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::QuotaTooSmall { quota: 100, .. })
        ));

        let mut config = RuntimeConfig::default();
        config.pump_interval_ms = 0;
        assert_eq!(config.validate(), Err(ConfigError::Zero("pump_interval_ms")));
    }
}
