//! Prometheus metrics for Lantern contexts.
//!
//! All metrics follow the naming convention `lantern_<component>_<metric>`,
//! labelled by `tab` where a single context is the source.

use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

use crate::TelemetryError;

lazy_static! {
    /// Metrics registry for this process
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // BUS METRICS
    // =========================================================================

    /// Envelopes handed to a transport
    pub static ref BUS_ENVELOPES_SENT: IntCounterVec = IntCounterVec::new(
        Opts::new("lantern_bus_envelopes_sent_total", "Envelopes published by a context"),
        &["tab"]
    ).expect("metric creation failed");

    /// Envelopes delivered to listeners
    pub static ref BUS_ENVELOPES_RECEIVED: IntCounterVec = IntCounterVec::new(
        Opts::new("lantern_bus_envelopes_received_total", "Envelopes delivered to a context"),
        &["tab"]
    ).expect("metric creation failed");

    /// Envelopes lost to a missing transport, a refused publish or bad JSON
    pub static ref BUS_ENVELOPES_DROPPED: IntCounterVec = IntCounterVec::new(
        Opts::new("lantern_bus_envelopes_dropped_total", "Envelopes dropped by a context"),
        &["tab"]
    ).expect("metric creation failed");

    // =========================================================================
    // STORE METRICS
    // =========================================================================

    /// Documents persisted
    pub static ref STORE_WRITES: IntCounterVec = IntCounterVec::new(
        Opts::new("lantern_store_writes_total", "Game-state documents persisted"),
        &["tab"]
    ).expect("metric creation failed");

    /// Writes refused by quota or ownership policy
    pub static ref STORE_DROPPED_WRITES: IntCounterVec = IntCounterVec::new(
        Opts::new("lantern_store_dropped_writes_total", "Game-state writes dropped"),
        &["tab"]
    ).expect("metric creation failed");

    /// Missing or corrupt documents replaced by the default
    pub static ref STORE_RECOVERIES: IntCounterVec = IntCounterVec::new(
        Opts::new("lantern_store_recoveries_total", "Documents rebuilt from defaults"),
        &["tab"]
    ).expect("metric creation failed");

    /// Explicit resets
    pub static ref STORE_RESETS: IntCounter = IntCounter::new(
        "lantern_store_resets_total",
        "Game-state resets"
    ).expect("metric creation failed");

    // =========================================================================
    // AUTOMATON METRICS
    // =========================================================================

    /// Transitions persisted by automata
    pub static ref AUTOMATON_TRANSITIONS: IntCounterVec = IntCounterVec::new(
        Opts::new("lantern_automaton_transitions_total", "Transitions applied"),
        &["tab"]
    ).expect("metric creation failed");

    /// Contexts currently open
    pub static ref CONTEXTS_OPEN: IntGauge = IntGauge::new(
        "lantern_contexts_open",
        "Execution contexts currently open"
    ).expect("metric creation failed");
}

/// Handle proving the metrics were registered.
#[derive(Debug, Clone, Copy)]
pub struct MetricsHandle {
    _private: (),
}

impl MetricsHandle {
    /// Render every registered metric.
    pub fn render(&self) -> Result<String, TelemetryError> {
        encode_metrics()
    }
}

/// Register all metrics with [`REGISTRY`]. Safe to call more than once.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(BUS_ENVELOPES_SENT.clone()),
        Box::new(BUS_ENVELOPES_RECEIVED.clone()),
        Box::new(BUS_ENVELOPES_DROPPED.clone()),
        Box::new(STORE_WRITES.clone()),
        Box::new(STORE_DROPPED_WRITES.clone()),
        Box::new(STORE_RECOVERIES.clone()),
        Box::new(STORE_RESETS.clone()),
        Box::new(AUTOMATON_TRANSITIONS.clone()),
        Box::new(CONTEXTS_OPEN.clone()),
    ];

    for collector in collectors {
        match REGISTRY.register(collector) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }
    Ok(MetricsHandle { _private: () })
}

/// Encode the registry in Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&REGISTRY.gather(), &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_twice() {
        assert!(register_metrics().is_ok());
        assert!(register_metrics().is_ok());
    }

    #[test]
    fn test_encode_contains_counters() {
        let handle = register_metrics().unwrap();
        BUS_ENVELOPES_SENT.with_label_values(&["1"]).inc();
        let text = handle.render().unwrap();
        assert!(text.contains("lantern_bus_envelopes_sent_total"));
    }
}
