//! # Channel Sink
//!
//! The sending side of one channel direction.

use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Handle for sending envelopes on a channel.
///
/// Cheap to clone; all clones feed the same direction.
#[derive(Clone)]
pub struct ChannelSink {
    channel: Arc<str>,
    sender: broadcast::Sender<Value>,
    /// Shared with the owning bus end.
    sent: Arc<AtomicU64>,
}

impl ChannelSink {
    pub(crate) fn new(
        channel: Arc<str>,
        sender: broadcast::Sender<Value>,
        sent: Arc<AtomicU64>,
    ) -> Self {
        Self {
            channel,
            sender,
            sent,
        }
    }

    /// Send one envelope.
    ///
    /// # Returns
    ///
    /// The number of subscriptions that received the envelope. Zero means it
    /// was dropped; it is not retried.
    pub fn send(&self, envelope: Value) -> usize {
        // Always increment counter (send was attempted)
        self.sent.fetch_add(1, Ordering::Relaxed);

        match self.sender.send(envelope) {
            Ok(receivers) => {
                debug!(channel = %self.channel, receivers, "Envelope sent");
                receivers
            }
            Err(_) => {
                warn!(channel = %self.channel, "Envelope dropped (no receivers)");
                0
            }
        }
    }

    /// The channel this sink sends on.
    #[must_use]
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Number of live subscriptions on the far side.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
