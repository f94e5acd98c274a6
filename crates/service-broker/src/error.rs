//! Error types for the broker

use shared_bus::BusError;
use shared_types::{TypeDescriptor, WireError};
use thiserror::Error;

/// Errors surfaced when creating brokers.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// The transport refused the channel; passed through unchanged.
    #[error("Transport error: {0}")]
    Transport(#[from] BusError),

    /// Brokers run as tokio tasks and need a runtime to be spawned on.
    #[error("No tokio runtime available to run the broker for channel {0}")]
    NoRuntime(String),
}

/// Errors from marshalling a value against a type descriptor.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SerializerError {
    #[error("Unknown type descriptor: {0}")]
    UnknownType(TypeDescriptor),

    #[error("Type mismatch for {expected}: {reason}")]
    TypeMismatch {
        expected: TypeDescriptor,
        reason: String,
    },
}

/// Errors raised by method handlers, synchronously or by their async value.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HandlerError {
    #[error("Invalid argument {index}: {reason}")]
    InvalidArgument { index: usize, reason: String },

    #[error("Missing argument {0}")]
    MissingArgument(usize),

    #[error("Handler failed: {0}")]
    Failed(String),

    #[error("Handler panicked: {0}")]
    Panicked(String),
}

impl HandlerError {
    /// Shorthand for an application-level failure.
    pub fn failed(reason: impl Into<String>) -> Self {
        HandlerError::Failed(reason.into())
    }
}

/// Errors on the calling side of a channel.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Transport error: {0}")]
    Transport(#[from] BusError),

    #[error("Wire error: {0}")]
    Wire(#[from] WireError),

    #[error("Argument {index} could not be serialized: {source}")]
    Argument {
        index: usize,
        #[source]
        source: SerializerError,
    },

    #[error("Result for {id} could not be deserialized: {source}")]
    Result {
        id: String,
        #[source]
        source: SerializerError,
    },

    #[error("No result for {id} within {timeout_ms}ms")]
    Timeout { id: String, timeout_ms: u64 },

    #[error("Call {0} abandoned: channel closed")]
    Disconnected(String),

    #[error("No tokio runtime available to listen on channel {0}")]
    NoRuntime(String),
}
