//! Prometheus metrics for the service broker.
//!
//! All metrics follow the naming convention: `broker_<area>_<metric>_<unit>`
//!
//! ## Metric Types
//!
//! - **Counter**: dispatch outcomes per channel, client calls per method
//! - **Gauge**: client calls awaiting a result
//! - **Histogram**: client call round-trip time

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, CounterVec, Encoder, Gauge, HistogramOpts, HistogramVec, Opts, Registry,
    TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Registry holding every broker metric
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // DISPATCH METRICS (service side)
    // =========================================================================

    /// Inbound envelopes and continuations by outcome
    pub static ref BROKER_DISPATCH_OUTCOMES: CounterVec = CounterVec::new(
        Opts::new("broker_dispatch_outcomes_total", "Dispatch outcomes by channel"),
        &["channel", "outcome"]  // outcome: dispatched/unknown_method/.../responded
    ).expect("metric creation failed");

    // =========================================================================
    // CALL METRICS (client side)
    // =========================================================================

    /// Client calls by method and result
    pub static ref BROKER_CALLS: CounterVec = CounterVec::new(
        Opts::new("broker_client_calls_total", "Client calls by method"),
        &["method", "result"]  // result: ok/timeout/error
    ).expect("metric creation failed");

    /// Round-trip time of client calls that expect a result
    pub static ref BROKER_CALL_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "broker_client_call_duration_seconds",
            "Time from request sent to result received"
        ).buckets(exponential_buckets(0.0001, 2.0, 15).expect("valid buckets")),
        &["method"]
    ).expect("metric creation failed");

    /// Client calls awaiting a result
    pub static ref BROKER_PENDING_CALLS: Gauge = Gauge::new(
        "broker_client_pending_calls",
        "Client calls awaiting a result"
    ).expect("metric creation failed");
}

/// Handle to the registered metrics.
pub struct MetricsHandle {
    registry: Registry,
}

impl MetricsHandle {
    /// Encode all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, TelemetryError> {
        encode_registry(&self.registry)
    }
}

/// Register all metrics with the broker registry.
///
/// Repeated calls are harmless.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Dispatch
        Box::new(BROKER_DISPATCH_OUTCOMES.clone()),
        // Calls
        Box::new(BROKER_CALLS.clone()),
        Box::new(BROKER_CALL_DURATION.clone()),
        Box::new(BROKER_PENDING_CALLS.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle {
        registry: REGISTRY.clone(),
    })
}

fn encode_registry(registry: &Registry) -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = registry.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
