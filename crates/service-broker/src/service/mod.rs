//! Service layer: the broker actor and the factory that binds it to channels.

mod broker;
mod factory;

pub use broker::ServiceMessageBroker;
pub use factory::ServiceMessageBrokerFactory;
