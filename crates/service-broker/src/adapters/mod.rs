//! Adapters: concrete implementations of the ports.

pub mod json_serializer;

pub use json_serializer::{JsonSerializer, TypeCodec, TypedCodec};
