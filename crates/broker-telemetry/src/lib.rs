//! # Broker Telemetry
//!
//! Logging and metrics setup for processes hosting service brokers.
//!
//! ## Components
//!
//! - **Logs**: `tracing-subscriber` with an `EnvFilter` and a pretty or JSON
//!   `fmt` layer
//! - **Metrics**: Prometheus counters, gauges and histograms in a dedicated
//!   registry, encodable as text
//!
//! ## Usage
//!
//! ```rust,ignore
//! use broker_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let _guard = init_telemetry(TelemetryConfig::from_env())?;
//!     // Application code here
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `BROKER_SERVICE_NAME` | `service-broker` | Service name in logs |
//! | `BROKER_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter |
//! | `BROKER_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `BROKER_JSON_LOGS` | `false` | JSON instead of pretty logs |

mod config;
pub mod metrics;
mod tracing_setup;

pub use config::{parse_flag, TelemetryConfig};
pub use metrics::{
    register_metrics, MetricsHandle, BROKER_CALLS, BROKER_CALL_DURATION,
    BROKER_DISPATCH_OUTCOMES, BROKER_PENDING_CALLS,
};
pub use tracing_setup::env_filter;

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
/// Returns a guard that should be held for the lifetime of the application.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    // Metrics first; they do not depend on the subscriber
    let metrics = register_metrics()?;

    tracing_setup::init_tracing(&config)?;

    Ok(TelemetryGuard {
        service_name: config.service_name,
        metrics,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    service_name: String,
    metrics: MetricsHandle,
}

impl TelemetryGuard {
    /// The registered metrics.
    pub fn metrics(&self) -> &MetricsHandle {
        &self.metrics
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry");
    }
}
