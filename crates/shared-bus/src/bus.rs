//! # Message Bus
//!
//! The capability set a broker consumes from its transport.

use thiserror::Error;

use crate::publisher::ChannelSink;
use crate::subscriber::ChannelSubscription;

/// Errors from channel binding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    /// Channel names must be non-empty.
    #[error("Invalid channel name: {0:?}")]
    InvalidChannelName(String),

    /// `to`/`from` was called before `init_channel`.
    #[error("Channel {0} has not been initialized")]
    ChannelNotInitialized(String),

    /// The channel is already bound with a different delivery context.
    #[error("Channel {channel} already bound with run_on_host_loop={bound}, requested {requested}")]
    ConflictingBinding {
        channel: String,
        bound: bool,
        requested: bool,
    },
}

/// One end of a message-oriented transport.
///
/// Implementations must deliver the envelopes of one subscription in the
/// order they were sent.
pub trait MessageBus: Send + Sync {
    /// Bind `channel` on this end.
    ///
    /// `run_on_host_loop` selects the delivery context; it is a transport
    /// concern and carries no meaning for the caller's own logic.
    fn init_channel(&self, channel: &str, run_on_host_loop: bool) -> Result<(), BusError>;

    /// The send side of `channel`.
    fn to(&self, channel: &str) -> Result<ChannelSink, BusError>;

    /// A new subscription to the receive side of `channel`.
    fn from(&self, channel: &str) -> Result<ChannelSubscription, BusError>;
}
