//! # lantern-sim
//!
//! Runs the scripted playthrough with one tokio task per tab and prints the
//! final game-state document to stdout.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration from `LANTERN_*` variables
//! 2. Initialize logging and metrics
//! 3. Build the host, restoring the snapshot if one is configured
//! 4. Play through every level
//! 5. Save the snapshot, print the document
//!
//! Pass `--metrics` to also print the Prometheus counters to stderr.

use anyhow::{Context, Result};
use context_runtime::{run_playthrough, Host, RuntimeConfig};
use lantern_telemetry::init_telemetry;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let print_metrics = std::env::args().any(|arg| arg == "--metrics");

    let config = RuntimeConfig::from_env();
    let telemetry = init_telemetry(&config.telemetry).context("Failed to initialize telemetry")?;

    let host = Host::new(config).context("Invalid runtime configuration")?;
    if host.restore_snapshot().context("Failed to restore snapshot")? {
        info!("Resuming from snapshot");
    }

    let report = run_playthrough(&host)
        .await
        .context("Playthrough failed")?;

    for context in &report.contexts {
        info!(
            tab = %context.tab,
            phase = %context.phase,
            transport = %context.transport,
            transitions = context.transitions_applied,
            sent = context.bus.sent,
            received = context.bus.received,
            dropped_writes = context.store.dropped_writes,
            "Context report"
        );
    }

    host.save_snapshot().context("Failed to save snapshot")?;

    let document = report
        .state
        .to_json()
        .context("Failed to encode final document")?;
    println!("{document}");

    if print_metrics {
        eprintln!("{}", telemetry.render_metrics()?);
    }
    Ok(())
}
