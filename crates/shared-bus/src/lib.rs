//! # Shared Bus - Named Channels for Broker Traffic
//!
//! The transport a broker sits on. A bus end hands out, per named channel,
//! an outbound sink and an inbound subscription:
//!
//! ```text
//!   end A                                         end B
//! ┌──────────────┐        to("ch") ──────▶      ┌──────────────┐
//! │              │ ──────────────────────────▶  │ from("ch")   │
//! │ from("ch")   │  ◀──────────────────────────  │              │
//! └──────────────┘      ◀────── to("ch")        └──────────────┘
//! ```
//!
//! ## Contract
//!
//! - A channel must be initialized on a bus end before `to`/`from` succeed.
//! - Re-initializing with the same flag is a no-op; a different flag is an error.
//! - Delivery is in send order per direction. Nothing is retried.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod bus;
pub mod memory;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use bus::{BusError, MessageBus};
pub use memory::InMemoryMessageBus;
pub use publisher::ChannelSink;
pub use subscriber::{ChannelStream, ChannelSubscription, Delivery, SubscriptionError};

/// Maximum envelopes to buffer per channel direction before slow receivers lag.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
