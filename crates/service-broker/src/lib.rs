//! # Service Broker
//!
//! Remote-method dispatch over a message bus channel. A host registers named
//! methods with positional type signatures; the broker decodes inbound
//! requests, invokes the matching handler and, when the handler yields an
//! asynchronous value and a return type was declared, sends the serialized
//! value back tagged with the request's correlation id.
//!
//! ## Architecture
//!
//! This crate follows Hexagonal Architecture (Ports & Adapters):
//!
//! - **Domain Layer** (`domain/`): Pure logic, no I/O
//!   - `MethodRegistry`: name to registration, last write wins
//!   - `MethodSignature`: ordered argument descriptors
//!   - `Arguments` / `Invocation`: what a handler receives and returns
//!   - `BrokerConfig`: factory defaults
//!
//! - **Ports Layer** (`ports/`): Trait definitions
//!   - `MethodHandler`: Driving port, implemented by registered methods
//!   - `Serializer`: Driven port, marshals values against descriptors
//!   - `DispatchObserver`: Driven port, receives every dispatch outcome
//!
//! - **Service Layer** (`service/`): Orchestration
//!   - `ServiceMessageBrokerFactory`: binds brokers to channels
//!   - `ServiceMessageBroker`: handle to one channel's broker task
//!
//! - **Adapters Layer** (`adapters/`)
//!   - `JsonSerializer`: built-in descriptors plus registered codecs
//!
//! - **Client** (`client/`): the calling side of the protocol
//!
//! ## Wire Protocol
//!
//! ```text
//! request: {"kind": "request", "method": "sum", "args": [2, 3], "id": "r1"}
//! result:  {"kind": "result",  "value": 5, "id": "r1"}
//! ```
//!
//! There is no error envelope. Unknown methods, malformed envelopes, argument
//! failures and handler failures send nothing; they are logged and reported
//! to the `DispatchObserver`.
//!
//! ## Usage Example
//!
//! ```ignore
//! use service_broker::{
//!     Arguments, HandlerError, Invocation, JsonSerializer, ServiceMessageBrokerFactory,
//! };
//! use shared_bus::InMemoryMessageBus;
//! use shared_types::TypeDescriptor;
//! use std::sync::Arc;
//!
//! let (service_end, client_end) = InMemoryMessageBus::pair();
//! let factory = ServiceMessageBrokerFactory::new(
//!     Arc::new(service_end),
//!     Arc::new(JsonSerializer::new()),
//! );
//!
//! let broker = factory.create_broker("calc")?;
//! broker.register_method(
//!     "sum",
//!     [TypeDescriptor::INT, TypeDescriptor::INT],
//!     |args: Arguments| -> Result<Invocation, HandlerError> {
//!         let (a, b): (i64, i64) = (args.get(0)?, args.get(1)?);
//!         Ok(Invocation::resolved(a + b))
//!     },
//!     Some(TypeDescriptor::INT),
//! );
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod adapters;
pub mod client;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod service;

// Re-exports for convenience
pub use adapters::{JsonSerializer, TypeCodec, TypedCodec};
pub use client::{ClientMessageBroker, FnArg};
pub use domain::{
    Arguments, BrokerConfig, Invocation, MethodRegistration, MethodRegistry, MethodSignature,
    PendingValue,
};
pub use error::{BrokerError, ClientError, HandlerError, SerializerError};
pub use metrics::{BrokerMetrics, MetricsSnapshot};
pub use ports::{DispatchEvent, DispatchObserver, MethodHandler, NoopObserver, Serializer};
pub use service::{ServiceMessageBroker, ServiceMessageBrokerFactory};
