//! Serializer port (driven by the broker)

use serde_json::Value;
use shared_types::TypeDescriptor;

use crate::error::SerializerError;

/// Type-aware marshalling between host values and wire values.
///
/// The broker passes descriptors through untouched; all encoding rules live
/// behind this trait.
pub trait Serializer: Send + Sync {
    /// Encode `value` for the wire according to `ty`.
    fn serialize(&self, value: Value, ty: &TypeDescriptor) -> Result<Value, SerializerError>;

    /// Decode `wire` into a host value according to `ty`.
    fn deserialize(&self, wire: Value, ty: &TypeDescriptor) -> Result<Value, SerializerError>;
}
