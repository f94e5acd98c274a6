//! # Runtime Configuration
//!
//! Environment-driven settings for the composition root. Unparseable values
//! are logged and replaced by the default.

use std::env;
use std::time::Duration;

use broker_telemetry::parse_flag;
use shared_bus::DEFAULT_CHANNEL_CAPACITY;
use tracing::warn;

/// Complete runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Channel the demo broker serves.
    pub channel: String,
    /// Per-direction buffer of the in-memory bus.
    pub bus_capacity: usize,
    /// Delivery context flag passed to `init_channel`.
    pub dispatch_on_host_loop: bool,
    /// How long a client call waits for its result.
    pub call_timeout: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            channel: "demo".to_string(),
            bus_capacity: DEFAULT_CHANNEL_CAPACITY,
            dispatch_on_host_loop: true,
            call_timeout: Duration::from_millis(2_000),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `BROKER_CHANNEL`: channel name (default: demo)
    /// - `BROKER_BUS_CAPACITY`: bus buffer per direction (default: 1000)
    /// - `BROKER_HOST_LOOP`: dispatch on the host loop (default: true)
    /// - `BROKER_CALL_TIMEOUT_MS`: client call timeout (default: 2000)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(channel) = lookup("BROKER_CHANNEL") {
            if channel.is_empty() {
                warn!("BROKER_CHANNEL is empty, using default");
            } else {
                config.channel = channel;
            }
        }

        if let Some(capacity) = lookup("BROKER_BUS_CAPACITY") {
            match capacity.parse::<usize>() {
                Ok(n) if n > 0 => config.bus_capacity = n,
                _ => warn!(value = %capacity, "BROKER_BUS_CAPACITY must be a positive integer"),
            }
        }

        if let Some(flag) = lookup("BROKER_HOST_LOOP") {
            config.dispatch_on_host_loop = parse_flag(&flag);
        }

        if let Some(timeout) = lookup("BROKER_CALL_TIMEOUT_MS") {
            match timeout.parse::<u64>() {
                Ok(ms) => config.call_timeout = Duration::from_millis(ms),
                Err(_) => warn!(value = %timeout, "BROKER_CALL_TIMEOUT_MS must be milliseconds"),
            }
        }

        config
    }
}
