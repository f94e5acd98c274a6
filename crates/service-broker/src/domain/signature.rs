//! Method signatures

use shared_types::TypeDescriptor;

/// The ordered parameter types of a registered method.
///
/// Fixed at registration; a request must supply exactly `len()` arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodSignature(Vec<TypeDescriptor>);

impl MethodSignature {
    /// A signature with the given parameter types.
    #[must_use]
    pub fn new(params: Vec<TypeDescriptor>) -> Self {
        Self(params)
    }

    /// A signature with no parameters.
    #[must_use]
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the method takes no parameters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parameter types in order.
    pub fn params(&self) -> impl ExactSizeIterator<Item = &TypeDescriptor> {
        self.0.iter()
    }
}

impl From<Vec<TypeDescriptor>> for MethodSignature {
    fn from(params: Vec<TypeDescriptor>) -> Self {
        Self(params)
    }
}

impl<const N: usize> From<[TypeDescriptor; N]> for MethodSignature {
    fn from(params: [TypeDescriptor; N]) -> Self {
        Self(params.into())
    }
}
