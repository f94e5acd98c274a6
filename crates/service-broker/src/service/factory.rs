//! Broker factory
//!
//! Binds brokers to channels on a message bus. Each created broker runs as
//! its own tokio task on the current runtime.

use std::sync::Arc;

use shared_bus::MessageBus;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::info;

use super::broker::{BrokerActor, ServiceMessageBroker};
use crate::domain::BrokerConfig;
use crate::error::BrokerError;
use crate::ports::{DispatchObserver, NoopObserver, Serializer};

/// Creates `ServiceMessageBroker`s sharing one bus, serializer and observer.
#[derive(Clone)]
pub struct ServiceMessageBrokerFactory {
    bus: Arc<dyn MessageBus>,
    serializer: Arc<dyn Serializer>,
    observer: Arc<dyn DispatchObserver>,
    config: BrokerConfig,
}

impl ServiceMessageBrokerFactory {
    pub fn new(bus: Arc<dyn MessageBus>, serializer: Arc<dyn Serializer>) -> Self {
        Self {
            bus,
            serializer,
            observer: Arc::new(NoopObserver),
            config: BrokerConfig::default(),
        }
    }

    /// Report dispatch outcomes of every broker created from here on.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn DispatchObserver>) -> Self {
        self.observer = observer;
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: BrokerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &BrokerConfig {
        &self.config
    }

    /// Create a broker on `channel` using the configured delivery context.
    ///
    /// # Errors
    ///
    /// See [`create_broker_with`](Self::create_broker_with).
    pub fn create_broker(&self, channel: &str) -> Result<ServiceMessageBroker, BrokerError> {
        self.create_broker_with(channel, self.config.dispatch_on_host_loop)
    }

    /// Initialize `channel` on the bus and start a broker serving it.
    ///
    /// The broker starts with no registered methods and is subscribed before
    /// this returns, so no envelope sent afterwards is missed.
    ///
    /// # Errors
    ///
    /// `NoRuntime` if called outside a tokio runtime; otherwise `Transport`
    /// with the bus error unchanged if the channel cannot be initialized or
    /// bound.
    pub fn create_broker_with(
        &self,
        channel: &str,
        run_on_host_loop: bool,
    ) -> Result<ServiceMessageBroker, BrokerError> {
        let runtime =
            Handle::try_current().map_err(|_| BrokerError::NoRuntime(channel.to_string()))?;

        self.bus.init_channel(channel, run_on_host_loop)?;
        let sink = self.bus.to(channel)?;
        let inbound = self.bus.from(channel)?;

        let channel: Arc<str> = Arc::from(channel);
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let actor = BrokerActor::new(
            channel.clone(),
            self.serializer.clone(),
            self.observer.clone(),
            sink,
            inbound,
            commands_rx,
        );
        runtime.spawn(actor.run());

        info!(channel = %channel, run_on_host_loop, "Broker created");
        Ok(ServiceMessageBroker::new(channel, commands_tx))
    }
}
