//! Broker configuration

/// Configuration applied by a broker factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrokerConfig {
    /// Delivery context requested from the transport when a broker is created
    /// without an explicit flag.
    pub dispatch_on_host_loop: bool,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            dispatch_on_host_loop: true,
        }
    }
}
