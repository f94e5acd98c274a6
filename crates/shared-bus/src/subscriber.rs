//! # Channel Subscription
//!
//! The receiving side of one channel direction.

use futures::{Stream, StreamExt};
use serde_json::Value;
use std::pin::Pin;
use std::task::{Context, Poll};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tracing::debug;

/// Errors from subscription operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubscriptionError {
    /// Every sender of the channel is gone.
    #[error("Channel closed")]
    Closed,
}

/// One step of a subscription.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    /// The next envelope, in send order.
    Envelope(Value),
    /// This many envelopes were overwritten before they could be received.
    Lagged(u64),
}

/// A subscription to the inbound side of a channel.
///
/// Receives every envelope sent after it was created, in send order.
pub struct ChannelSubscription {
    channel: String,
    receiver: broadcast::Receiver<Value>,
}

impl ChannelSubscription {
    pub(crate) fn new(channel: String, receiver: broadcast::Receiver<Value>) -> Self {
        Self { channel, receiver }
    }

    /// Receive the next envelope.
    ///
    /// # Returns
    ///
    /// - `Some(envelope)` - The next envelope
    /// - `None` - The channel was closed (bus dropped)
    pub async fn recv(&mut self) -> Option<Value> {
        loop {
            match self.next_delivery().await? {
                Delivery::Envelope(envelope) => return Some(envelope),
                Delivery::Lagged(count) => {
                    debug!(channel = %self.channel, lagged = count, "Subscriber lagged, envelopes dropped");
                }
            }
        }
    }

    /// Receive the next envelope, or the size of a lag gap.
    ///
    /// Unlike `recv`, envelopes lost to a full queue are reported instead of
    /// skipped. Returns `None` once the channel is closed.
    pub async fn next_delivery(&mut self) -> Option<Delivery> {
        match self.receiver.recv().await {
            Ok(envelope) => Some(Delivery::Envelope(envelope)),
            Err(broadcast::error::RecvError::Lagged(count)) => Some(Delivery::Lagged(count)),
            Err(broadcast::error::RecvError::Closed) => None,
        }
    }

    /// Try to receive the next envelope without waiting.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(envelope))` - An envelope was available
    /// - `Ok(None)` - Nothing available yet
    /// - `Err(SubscriptionError::Closed)` - The channel was closed
    pub fn try_recv(&mut self) -> Result<Option<Value>, SubscriptionError> {
        loop {
            match self.receiver.try_recv() {
                Ok(envelope) => return Ok(Some(envelope)),
                Err(broadcast::error::TryRecvError::Empty) => return Ok(None),
                Err(broadcast::error::TryRecvError::Closed) => {
                    return Err(SubscriptionError::Closed)
                }
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
            }
        }
    }

    /// The channel this subscription listens on.
    #[must_use]
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Convert into a `Stream` of envelopes.
    #[must_use]
    pub fn into_stream(self) -> ChannelStream {
        ChannelStream {
            channel: self.channel,
            inner: BroadcastStream::new(self.receiver),
        }
    }
}

/// A stream of inbound envelopes.
///
/// Lag gaps are skipped; the stream ends when the channel closes.
pub struct ChannelStream {
    channel: String,
    inner: BroadcastStream<Value>,
}

impl ChannelStream {
    /// The channel this stream listens on.
    #[must_use]
    pub fn channel(&self) -> &str {
        &self.channel
    }
}

impl Stream for ChannelStream {
    type Item = Value;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match self.inner.poll_next_unpin(cx) {
                Poll::Ready(Some(Ok(envelope))) => return Poll::Ready(Some(envelope)),
                Poll::Ready(Some(Err(BroadcastStreamRecvError::Lagged(count)))) => {
                    debug!(channel = %self.channel, lagged = count, "Stream lagged, envelopes dropped");
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
