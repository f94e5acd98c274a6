//! # Broker Runtime
//!
//! Wires both ends of an in-memory bus:
//!
//! ```text
//!   ClientMessageBroker ── client end ══ InMemoryMessageBus ══ service end ── ServiceMessageBroker
//!                                                                               │
//!                                                          FanOutObserver ◀─────┘
//!                                                     (BrokerMetrics + Prometheus)
//! ```

use std::sync::Arc;

use broker_telemetry::{BROKER_CALLS, BROKER_CALL_DURATION, BROKER_PENDING_CALLS};
use serde_json::Value;
use service_broker::{
    BrokerConfig, BrokerError, BrokerMetrics, ClientError, ClientMessageBroker, FnArg,
    JsonSerializer, MetricsSnapshot, ServiceMessageBroker, ServiceMessageBrokerFactory,
};
use shared_bus::InMemoryMessageBus;
use shared_types::TypeDescriptor;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::RuntimeConfig;
use crate::observer::{FanOutObserver, PrometheusObserver};
use crate::services::register_demo_methods;

/// Errors starting the runtime.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Failed to create service broker: {0}")]
    Broker(#[from] BrokerError),

    #[error("Failed to create client broker: {0}")]
    Client(#[from] ClientError),
}

/// Outcome of one demo call.
#[derive(Debug)]
pub struct CallReport {
    pub method: &'static str,
    pub result: Result<Option<Value>, ClientError>,
}

/// The running service and client brokers.
pub struct BrokerRuntime {
    config: RuntimeConfig,
    broker: ServiceMessageBroker,
    client: ClientMessageBroker,
    metrics: Arc<BrokerMetrics>,
    // Keeps the client end's channel links alive.
    _client_end: InMemoryMessageBus,
}

impl BrokerRuntime {
    /// Create both ends and register the demo methods.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(config: RuntimeConfig) -> Result<Self, RuntimeError> {
        let (service_end, client_end) = InMemoryMessageBus::pair_with_capacity(config.bus_capacity);
        let serializer = Arc::new(JsonSerializer::new());
        let metrics = Arc::new(BrokerMetrics::new());

        let observer = FanOutObserver::new()
            .with(metrics.clone())
            .with(Arc::new(PrometheusObserver));
        let factory = ServiceMessageBrokerFactory::new(Arc::new(service_end), serializer.clone())
            .with_observer(Arc::new(observer))
            .with_config(BrokerConfig {
                dispatch_on_host_loop: config.dispatch_on_host_loop,
            });

        let broker = factory.create_broker(&config.channel)?;
        register_demo_methods(&broker);

        let client = ClientMessageBroker::new(&client_end, serializer, &config.channel)?;

        info!(
            channel = %config.channel,
            capacity = config.bus_capacity,
            host_loop = config.dispatch_on_host_loop,
            "Broker runtime started"
        );

        Ok(Self {
            config,
            broker,
            client,
            metrics,
            _client_end: client_end,
        })
    }

    pub fn broker(&self) -> &ServiceMessageBroker {
        &self.broker
    }

    pub fn client(&self) -> &ClientMessageBroker {
        &self.client
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Call `method` with the configured timeout, recording call metrics.
    pub async fn call(
        &self,
        method: &str,
        args: Vec<FnArg>,
        return_type: Option<TypeDescriptor>,
    ) -> Result<Option<Value>, ClientError> {
        let timer = BROKER_CALL_DURATION
            .with_label_values(&[method])
            .start_timer();
        let expects_result = return_type.is_some();

        if expects_result {
            BROKER_PENDING_CALLS.inc();
        }
        let result = self
            .client
            .call_with_timeout(method, args, return_type, self.config.call_timeout)
            .await;
        if expects_result {
            BROKER_PENDING_CALLS.dec();
        }

        let label = match &result {
            Ok(_) => "ok",
            Err(ClientError::Timeout { .. }) => "timeout",
            Err(_) => "error",
        };
        BROKER_CALLS.with_label_values(&[method, label]).inc();
        if expects_result && result.is_ok() {
            timer.observe_duration();
        } else {
            timer.stop_and_discard();
        }

        result
    }

    /// Exercise every demo method once, including the failure paths.
    ///
    /// Calls run concurrently; the slow echo is issued first and still
    /// completes last.
    pub async fn run_demo(&self) -> Vec<CallReport> {
        let (slow, sum, greet, divide, by_zero, notify, missing) = tokio::join!(
            self.call(
                "slow_echo",
                vec![FnArg::primitive("late"), FnArg::new(100, TypeDescriptor::INT)],
                Some(TypeDescriptor::PRIMITIVE),
            ),
            self.call(
                "sum",
                vec![
                    FnArg::new(2, TypeDescriptor::INT),
                    FnArg::new(3, TypeDescriptor::INT)
                ],
                Some(TypeDescriptor::INT),
            ),
            self.call(
                "greet",
                vec![FnArg::new("broker", TypeDescriptor::STRING)],
                Some(TypeDescriptor::STRING),
            ),
            self.call(
                "divide",
                vec![
                    FnArg::new(7.0, TypeDescriptor::FLOAT),
                    FnArg::new(2.0, TypeDescriptor::FLOAT)
                ],
                Some(TypeDescriptor::FLOAT),
            ),
            self.call(
                "divide",
                vec![
                    FnArg::new(1.0, TypeDescriptor::FLOAT),
                    FnArg::new(0.0, TypeDescriptor::FLOAT)
                ],
                Some(TypeDescriptor::FLOAT),
            ),
            self.call(
                "notify",
                vec![FnArg::new("demo finished", TypeDescriptor::STRING)],
                None,
            ),
            self.call("missing", vec![], Some(TypeDescriptor::INT)),
        );

        let reports = vec![
            CallReport { method: "slow_echo", result: slow },
            CallReport { method: "sum", result: sum },
            CallReport { method: "greet", result: greet },
            CallReport { method: "divide", result: divide },
            CallReport { method: "divide", result: by_zero },
            CallReport { method: "notify", result: notify },
            CallReport { method: "missing", result: missing },
        ];

        for report in &reports {
            match &report.result {
                Ok(value) => info!(method = report.method, ?value, "Call completed"),
                Err(e) => warn!(method = report.method, error = %e, "Call failed"),
            }
        }

        reports
    }
}
