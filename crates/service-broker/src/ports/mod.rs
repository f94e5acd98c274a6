//! Ports: the traits the broker is driven through.

pub mod handler;
pub mod observer;
pub mod serializer;

pub use handler::MethodHandler;
pub use observer::{DispatchEvent, DispatchObserver, NoopObserver};
pub use serializer::Serializer;
