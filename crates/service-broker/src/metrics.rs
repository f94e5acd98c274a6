//! Dispatch counters
//!
//! An in-process `DispatchObserver` that counts outcomes.
//!
//! ## Usage
//!
//! ```ignore
//! use service_broker::metrics::BrokerMetrics;
//!
//! let metrics = Arc::new(BrokerMetrics::new());
//! let factory = ServiceMessageBrokerFactory::new(bus, serializer)
//!     .with_observer(metrics.clone());
//!
//! // ... later
//! let snapshot = metrics.snapshot();
//! println!("dropped: {}", snapshot.dropped());
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use crate::ports::{DispatchEvent, DispatchObserver};

/// Thread-safe outcome counters.
#[derive(Debug, Default)]
pub struct BrokerMetrics {
    /// Envelopes the bus overwrote before delivery
    pub lost: AtomicU64,
    /// Handlers invoked
    pub dispatched: AtomicU64,
    /// Requests for unregistered methods
    pub unknown_method: AtomicU64,
    /// Non-request envelopes seen
    pub ignored: AtomicU64,
    /// Undecodable envelopes
    pub malformed: AtomicU64,
    /// Requests with the wrong argument count
    pub arity_mismatch: AtomicU64,
    /// Requests with an undecodable argument
    pub decode_failed: AtomicU64,
    /// Handler failures, sync or async
    pub handler_failed: AtomicU64,
    /// Result envelopes sent
    pub responded: AtomicU64,
    /// Results that could not be serialized
    pub response_failed: AtomicU64,
}

/// Point-in-time copy of `BrokerMetrics`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub lost: u64,
    pub dispatched: u64,
    pub unknown_method: u64,
    pub ignored: u64,
    pub malformed: u64,
    pub arity_mismatch: u64,
    pub decode_failed: u64,
    pub handler_failed: u64,
    pub responded: u64,
    pub response_failed: u64,
}

impl MetricsSnapshot {
    /// Inbound envelopes that never reached a handler.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.lost
            + self.unknown_method
            + self.ignored
            + self.malformed
            + self.arity_mismatch
            + self.decode_failed
    }
}

impl BrokerMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy the current counter values.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            lost: self.lost.load(Ordering::Relaxed),
            dispatched: self.dispatched.load(Ordering::Relaxed),
            unknown_method: self.unknown_method.load(Ordering::Relaxed),
            ignored: self.ignored.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            arity_mismatch: self.arity_mismatch.load(Ordering::Relaxed),
            decode_failed: self.decode_failed.load(Ordering::Relaxed),
            handler_failed: self.handler_failed.load(Ordering::Relaxed),
            responded: self.responded.load(Ordering::Relaxed),
            response_failed: self.response_failed.load(Ordering::Relaxed),
        }
    }

    fn counter(&self, event: &DispatchEvent) -> &AtomicU64 {
        match event {
            DispatchEvent::Lost { .. } => &self.lost,
            DispatchEvent::Dispatched { .. } => &self.dispatched,
            DispatchEvent::UnknownMethod { .. } => &self.unknown_method,
            DispatchEvent::Ignored { .. } => &self.ignored,
            DispatchEvent::Malformed { .. } => &self.malformed,
            DispatchEvent::ArityMismatch { .. } => &self.arity_mismatch,
            DispatchEvent::DecodeFailed { .. } => &self.decode_failed,
            DispatchEvent::HandlerFailed { .. } => &self.handler_failed,
            DispatchEvent::Responded { .. } => &self.responded,
            DispatchEvent::ResponseFailed { .. } => &self.response_failed,
        }
    }
}

impl DispatchObserver for BrokerMetrics {
    fn observe(&self, _channel: &str, event: &DispatchEvent) {
        self.counter(event)
            .fetch_add(event.envelopes(), Ordering::Relaxed);
    }
}
