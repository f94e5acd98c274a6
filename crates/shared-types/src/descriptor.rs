//! # Type Descriptors
//!
//! Opaque handles naming how a value is encoded on the wire.

use std::borrow::Cow;
use std::fmt;

/// An opaque handle the serializer uses to pick encoding rules for a value.
///
/// The broker never looks inside a descriptor; it only stores the ones given
/// at registration time and hands them back to the serializer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeDescriptor(Cow<'static, str>);

impl TypeDescriptor {
    /// Values that are already wire-safe and pass through unchanged.
    pub const PRIMITIVE: TypeDescriptor = TypeDescriptor::builtin("primitive");

    /// Signed 64-bit integers.
    pub const INT: TypeDescriptor = TypeDescriptor::builtin("int");

    /// 64-bit floating point numbers.
    pub const FLOAT: TypeDescriptor = TypeDescriptor::builtin("float");

    /// Booleans.
    pub const BOOL: TypeDescriptor = TypeDescriptor::builtin("bool");

    /// UTF-8 strings.
    pub const STRING: TypeDescriptor = TypeDescriptor::builtin("string");

    const fn builtin(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Create a descriptor for an application-defined type.
    #[must_use]
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    /// The descriptor's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
