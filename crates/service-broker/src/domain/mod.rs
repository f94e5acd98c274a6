//! Domain layer: registry, signatures, handler inputs/outputs. No I/O.

pub mod config;
pub mod invocation;
pub mod registry;
pub mod signature;

pub use config::BrokerConfig;
pub use invocation::{Arguments, Invocation, PendingValue};
pub use registry::{MethodRegistration, MethodRegistry};
pub use signature::MethodSignature;
