//! Dispatch observers backed by the telemetry crate.

use std::sync::Arc;

use broker_telemetry::BROKER_DISPATCH_OUTCOMES;
use service_broker::{DispatchEvent, DispatchObserver};

/// Counts dispatch outcomes in `broker_dispatch_outcomes_total`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PrometheusObserver;

impl DispatchObserver for PrometheusObserver {
    fn observe(&self, channel: &str, event: &DispatchEvent) {
        BROKER_DISPATCH_OUTCOMES
            .with_label_values(&[channel, event.outcome()])
            .inc_by(event.envelopes() as f64);
    }
}

/// Forwards every event to each observer in turn.
#[derive(Default, Clone)]
pub struct FanOutObserver {
    observers: Vec<Arc<dyn DispatchObserver>>,
}

impl FanOutObserver {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, observer: Arc<dyn DispatchObserver>) -> Self {
        self.observers.push(observer);
        self
    }
}

impl DispatchObserver for FanOutObserver {
    fn observe(&self, channel: &str, event: &DispatchEvent) {
        for observer in &self.observers {
            observer.observe(channel, event);
        }
    }
}
