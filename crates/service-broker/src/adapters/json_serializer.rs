//! JSON serializer adapter
//!
//! Implements the `Serializer` port over `serde_json::Value`.
//!
//! ## Built-in Descriptors
//!
//! | Descriptor  | Accepted wire values       |
//! |-------------|----------------------------|
//! | `primitive` | anything, passed through   |
//! | `int`       | numbers representable as i64 |
//! | `float`     | any number                 |
//! | `bool`      | booleans                   |
//! | `string`    | strings                    |
//!
//! Other descriptors need a codec registered with `register_codec` or
//! `register_type`; unregistered ones fail with `UnknownType`.

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use shared_types::TypeDescriptor;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::SerializerError;
use crate::ports::Serializer;

/// Encoding rules for one application-defined descriptor.
pub trait TypeCodec: Send + Sync {
    /// Host value to wire value.
    fn encode(&self, value: Value) -> Result<Value, String>;

    /// Wire value to host value.
    fn decode(&self, wire: Value) -> Result<Value, String>;
}

/// Codec that validates values by round-tripping them through `T`.
pub struct TypedCodec<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> TypedCodec<T> {
    /// Create the codec.
    #[must_use]
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for TypedCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TypedCodec<T>
where
    T: Serialize + DeserializeOwned,
{
    fn round_trip(value: Value) -> Result<Value, String> {
        let typed: T = serde_json::from_value(value).map_err(|e| e.to_string())?;
        serde_json::to_value(typed).map_err(|e| e.to_string())
    }
}

impl<T> TypeCodec for TypedCodec<T>
where
    T: Serialize + DeserializeOwned,
{
    fn encode(&self, value: Value) -> Result<Value, String> {
        Self::round_trip(value)
    }

    fn decode(&self, wire: Value) -> Result<Value, String> {
        Self::round_trip(wire)
    }
}

/// `Serializer` over JSON values with a registry of custom codecs.
#[derive(Default)]
pub struct JsonSerializer {
    codecs: RwLock<HashMap<TypeDescriptor, Arc<dyn TypeCodec>>>,
}

impl JsonSerializer {
    /// A serializer that knows only the built-in descriptors.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `codec` for `descriptor`, replacing any previous one.
    ///
    /// Built-in descriptors always take precedence.
    pub fn register_codec(&self, descriptor: TypeDescriptor, codec: impl TypeCodec + 'static) {
        self.codecs.write().insert(descriptor, Arc::new(codec));
    }

    /// Install a codec for `descriptor` that validates through `T`.
    pub fn register_type<T>(&self, descriptor: TypeDescriptor)
    where
        T: Serialize + DeserializeOwned + 'static,
    {
        self.register_codec(descriptor, TypedCodec::<T>::new());
    }

    /// Whether `descriptor` can be marshalled.
    #[must_use]
    pub fn supports(&self, descriptor: &TypeDescriptor) -> bool {
        is_builtin(descriptor) || self.codecs.read().contains_key(descriptor)
    }

    fn codec(&self, ty: &TypeDescriptor) -> Result<Arc<dyn TypeCodec>, SerializerError> {
        self.codecs
            .read()
            .get(ty)
            .cloned()
            .ok_or_else(|| SerializerError::UnknownType(ty.clone()))
    }
}

fn is_builtin(ty: &TypeDescriptor) -> bool {
    [
        TypeDescriptor::PRIMITIVE,
        TypeDescriptor::INT,
        TypeDescriptor::FLOAT,
        TypeDescriptor::BOOL,
        TypeDescriptor::STRING,
    ]
    .contains(ty)
}

fn mismatch(ty: &TypeDescriptor, value: &Value) -> SerializerError {
    SerializerError::TypeMismatch {
        expected: ty.clone(),
        reason: format!("got {value}"),
    }
}

/// Check `value` against a built-in descriptor.
///
/// `None` if `ty` is not built in.
fn check_builtin(value: Value, ty: &TypeDescriptor) -> Option<Result<Value, SerializerError>> {
    let accepted = if *ty == TypeDescriptor::PRIMITIVE {
        true
    } else if *ty == TypeDescriptor::INT {
        value.as_i64().is_some()
    } else if *ty == TypeDescriptor::FLOAT {
        value.is_number()
    } else if *ty == TypeDescriptor::BOOL {
        value.is_boolean()
    } else if *ty == TypeDescriptor::STRING {
        value.is_string()
    } else {
        return None;
    };

    Some(if accepted {
        Ok(value)
    } else {
        Err(mismatch(ty, &value))
    })
}

impl Serializer for JsonSerializer {
    fn serialize(&self, value: Value, ty: &TypeDescriptor) -> Result<Value, SerializerError> {
        if let Some(result) = check_builtin(value.clone(), ty) {
            return result;
        }
        self.codec(ty)?
            .encode(value)
            .map_err(|reason| SerializerError::TypeMismatch {
                expected: ty.clone(),
                reason,
            })
    }

    fn deserialize(&self, wire: Value, ty: &TypeDescriptor) -> Result<Value, SerializerError> {
        if let Some(result) = check_builtin(wire.clone(), ty) {
            return result;
        }
        self.codec(ty)?
            .decode(wire)
            .map_err(|reason| SerializerError::TypeMismatch {
                expected: ty.clone(),
                reason,
            })
    }
}
