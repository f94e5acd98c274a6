//! Dispatch observer port
//!
//! The protocol has no error envelope, so unknown methods, decode failures and
//! handler failures produce nothing on the wire. This hook is where they
//! become visible: every inbound envelope and every completed continuation is
//! reported exactly once per outcome.

use shared_types::EnvelopeKind;

/// One observable outcome of broker dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchEvent {
    /// Inbound envelopes overwritten by the bus before they were received.
    Lost { count: u64 },
    /// The handler was invoked.
    Dispatched { method: String, id: String },
    /// No method of that name is registered; dropped.
    UnknownMethod { method: String, id: String },
    /// A well-formed envelope that is not a request; ignored.
    Ignored { kind: EnvelopeKind, id: String },
    /// The raw envelope could not be decoded; dropped.
    Malformed { reason: String },
    /// Argument count differs from the signature; handler not invoked.
    ArityMismatch {
        method: String,
        id: String,
        expected: usize,
        received: usize,
    },
    /// An argument failed to deserialize; handler not invoked.
    DecodeFailed {
        method: String,
        id: String,
        index: usize,
        reason: String,
    },
    /// The handler failed synchronously or its async value rejected.
    HandlerFailed {
        method: String,
        id: String,
        reason: String,
    },
    /// A result envelope was sent.
    Responded { method: String, id: String },
    /// The resolved value could not be serialized or encoded; nothing sent.
    ResponseFailed {
        method: String,
        id: String,
        reason: String,
    },
}

impl DispatchEvent {
    /// Short label, suitable as a metric dimension.
    #[must_use]
    pub fn outcome(&self) -> &'static str {
        match self {
            DispatchEvent::Lost { .. } => "lost",
            DispatchEvent::Dispatched { .. } => "dispatched",
            DispatchEvent::UnknownMethod { .. } => "unknown_method",
            DispatchEvent::Ignored { .. } => "ignored",
            DispatchEvent::Malformed { .. } => "malformed",
            DispatchEvent::ArityMismatch { .. } => "arity_mismatch",
            DispatchEvent::DecodeFailed { .. } => "decode_failed",
            DispatchEvent::HandlerFailed { .. } => "handler_failed",
            DispatchEvent::Responded { .. } => "responded",
            DispatchEvent::ResponseFailed { .. } => "response_failed",
        }
    }
}

impl DispatchEvent {
    /// Number of envelopes this outcome accounts for.
    #[must_use]
    pub fn envelopes(&self) -> u64 {
        match self {
            DispatchEvent::Lost { count } => *count,
            _ => 1,
        }
    }
}

/// Receives dispatch outcomes for a broker's channel.
///
/// Called from the broker's own task; implementations must not block.
pub trait DispatchObserver: Send + Sync {
    /// Record one outcome on `channel`.
    fn observe(&self, channel: &str, event: &DispatchEvent);
}

/// Observer that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl DispatchObserver for NoopObserver {
    fn observe(&self, _channel: &str, _event: &DispatchEvent) {}
}
