//! # In-Memory Message Bus
//!
//! Two linked bus ends sharing one set of channels.
//!
//! Uses `tokio::sync::broadcast` per channel direction. Suitable for a single
//! process; a cross-process deployment would implement `MessageBus` over a
//! real pipe or socket instead.

use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

use crate::bus::{BusError, MessageBus};
use crate::publisher::ChannelSink;
use crate::subscriber::ChannelSubscription;
use crate::DEFAULT_CHANNEL_CAPACITY;

/// Which end of the link a bus handle is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

/// Both directions of one named channel.
struct ChannelLink {
    name: Arc<str>,
    /// Left end sends, right end receives.
    rightward: broadcast::Sender<Value>,
    /// Right end sends, left end receives.
    leftward: broadcast::Sender<Value>,
}

/// State shared by both ends.
struct Links {
    capacity: usize,
    channels: RwLock<HashMap<String, Arc<ChannelLink>>>,
}

impl Links {
    fn link(&self, channel: &str) -> Arc<ChannelLink> {
        if let Some(link) = self.channels.read().get(channel) {
            return link.clone();
        }

        self.channels
            .write()
            .entry(channel.to_string())
            .or_insert_with(|| {
                let (rightward, _) = broadcast::channel(self.capacity);
                let (leftward, _) = broadcast::channel(self.capacity);
                Arc::new(ChannelLink {
                    name: Arc::from(channel),
                    rightward,
                    leftward,
                })
            })
            .clone()
    }
}

/// A channel bound on one end.
#[derive(Debug, Clone, Copy)]
struct ChannelBinding {
    run_on_host_loop: bool,
}

/// One end of an in-memory duplex transport.
///
/// Create both ends with [`InMemoryMessageBus::pair`]; whatever one end sends
/// with `to(ch)` arrives at the other end's `from(ch)`.
pub struct InMemoryMessageBus {
    side: Side,
    links: Arc<Links>,
    /// Channels initialized on this end.
    bindings: RwLock<HashMap<String, ChannelBinding>>,
    /// Envelopes sent from this end.
    sent: Arc<AtomicU64>,
}

impl InMemoryMessageBus {
    /// Create two linked bus ends with default capacity.
    #[must_use]
    pub fn pair() -> (Self, Self) {
        Self::pair_with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create two linked bus ends with the given per-direction capacity.
    #[must_use]
    pub fn pair_with_capacity(capacity: usize) -> (Self, Self) {
        let links = Arc::new(Links {
            capacity,
            channels: RwLock::new(HashMap::new()),
        });
        (Self::end(Side::Left, links.clone()), Self::end(Side::Right, links))
    }

    fn end(side: Side, links: Arc<Links>) -> Self {
        Self {
            side,
            links,
            bindings: RwLock::new(HashMap::new()),
            sent: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Whether `channel` was bound on this end to run on the host loop.
    ///
    /// `None` if the channel has not been initialized here.
    #[must_use]
    pub fn runs_on_host_loop(&self, channel: &str) -> Option<bool> {
        self.bindings
            .read()
            .get(channel)
            .map(|binding| binding.run_on_host_loop)
    }

    /// Whether `channel` has been initialized on this end.
    #[must_use]
    pub fn is_initialized(&self, channel: &str) -> bool {
        self.bindings.read().contains_key(channel)
    }

    /// Total envelopes sent from this end across all channels.
    #[must_use]
    pub fn envelopes_sent(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }

    /// Per-direction buffer capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.links.capacity
    }

    fn bound_link(&self, channel: &str) -> Result<Arc<ChannelLink>, BusError> {
        if !self.is_initialized(channel) {
            return Err(BusError::ChannelNotInitialized(channel.to_string()));
        }
        Ok(self.links.link(channel))
    }
}

impl MessageBus for InMemoryMessageBus {
    fn init_channel(&self, channel: &str, run_on_host_loop: bool) -> Result<(), BusError> {
        if channel.is_empty() {
            return Err(BusError::InvalidChannelName(channel.to_string()));
        }

        let mut bindings = self.bindings.write();
        if let Some(existing) = bindings.get(channel) {
            if existing.run_on_host_loop != run_on_host_loop {
                return Err(BusError::ConflictingBinding {
                    channel: channel.to_string(),
                    bound: existing.run_on_host_loop,
                    requested: run_on_host_loop,
                });
            }
            return Ok(());
        }

        // Materialize the link so the far end sees the same senders.
        self.links.link(channel);
        bindings.insert(channel.to_string(), ChannelBinding { run_on_host_loop });

        debug!(channel, side = ?self.side, run_on_host_loop, "Channel initialized");
        Ok(())
    }

    fn to(&self, channel: &str) -> Result<ChannelSink, BusError> {
        let link = self.bound_link(channel)?;
        let sender = match self.side {
            Side::Left => link.rightward.clone(),
            Side::Right => link.leftward.clone(),
        };
        Ok(ChannelSink::new(link.name.clone(), sender, self.sent.clone()))
    }

    fn from(&self, channel: &str) -> Result<ChannelSubscription, BusError> {
        let link = self.bound_link(channel)?;
        let receiver = match self.side {
            Side::Left => link.leftward.subscribe(),
            Side::Right => link.rightward.subscribe(),
        };
        debug!(channel, side = ?self.side, "New channel subscription");
        Ok(ChannelSubscription::new(channel.to_string(), receiver))
    }
}
