//! # Service Broker Runtime
//!
//! Starts telemetry, binds a service broker with demo methods and a client
//! broker to the two ends of an in-memory bus, runs one round of calls and
//! prints the resulting metrics.
//!
//! ## Startup Sequence
//!
//! 1. Initialize telemetry (`BROKER_LOG_LEVEL`, `BROKER_JSON_LOGS`, ...)
//! 2. Load runtime configuration (`BROKER_CHANNEL`, `BROKER_CALL_TIMEOUT_MS`, ...)
//! 3. Create both brokers and register the demo methods
//! 4. Run the demo calls
//! 5. Print the dispatch snapshot and Prometheus metrics

use anyhow::{Context, Result};
use broker_runtime::{BrokerRuntime, RuntimeConfig};
use broker_telemetry::{init_telemetry, TelemetryConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let telemetry = init_telemetry(TelemetryConfig::from_env())
        .context("Failed to initialize telemetry")?;

    let config = RuntimeConfig::from_env();
    let runtime = BrokerRuntime::start(config).context("Failed to start broker runtime")?;

    let reports = runtime.run_demo().await;
    let failed = reports.iter().filter(|r| r.result.is_err()).count();

    let snapshot = runtime.metrics();
    info!(
        calls = reports.len(),
        failed,
        dispatched = snapshot.dispatched,
        responded = snapshot.responded,
        dropped = snapshot.dropped(),
        handler_failed = snapshot.handler_failed,
        "Demo round finished"
    );

    let exposition = telemetry
        .metrics()
        .encode()
        .context("Failed to encode metrics")?;
    println!("{exposition}");

    Ok(())
}
