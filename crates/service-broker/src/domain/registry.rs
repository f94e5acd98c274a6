//! Method registry
//!
//! ## Overwrite Contract
//!
//! Names are unique keys. Registering a name that is already present replaces
//! the previous registration outright (last write wins); this is the defined
//! behavior, not an error. Registrations are never removed.

use shared_types::TypeDescriptor;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::domain::signature::MethodSignature;
use crate::ports::MethodHandler;

/// One registered method.
#[derive(Clone)]
pub struct MethodRegistration {
    name: String,
    signature: MethodSignature,
    handler: Arc<dyn MethodHandler>,
    return_type: Option<TypeDescriptor>,
}

impl MethodRegistration {
    /// Bundle a method for registration.
    pub fn new(
        name: impl Into<String>,
        signature: impl Into<MethodSignature>,
        handler: impl MethodHandler,
        return_type: Option<TypeDescriptor>,
    ) -> Self {
        Self {
            name: name.into(),
            signature: signature.into(),
            handler: Arc::new(handler),
            return_type,
        }
    }

    /// The method name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared parameter types.
    #[must_use]
    pub fn signature(&self) -> &MethodSignature {
        &self.signature
    }

    /// The handler.
    #[must_use]
    pub fn handler(&self) -> &dyn MethodHandler {
        self.handler.as_ref()
    }

    /// The declared return type; `None` means fire-and-forget.
    #[must_use]
    pub fn return_type(&self) -> Option<&TypeDescriptor> {
        self.return_type.as_ref()
    }
}

impl fmt::Debug for MethodRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodRegistration")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .field("return_type", &self.return_type)
            .finish_non_exhaustive()
    }
}

/// Method registrations keyed by name.
#[derive(Debug, Default)]
pub struct MethodRegistry {
    methods: HashMap<String, MethodRegistration>,
}

impl MethodRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `registration`, replacing any method of the same name.
    ///
    /// Returns the replaced registration, if there was one.
    pub fn register(&mut self, registration: MethodRegistration) -> Option<MethodRegistration> {
        self.methods.insert(registration.name.clone(), registration)
    }

    /// Look up a method by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&MethodRegistration> {
        self.methods.get(name)
    }

    /// Whether `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Number of registered methods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.methods.keys().cloned().collect();
        names.sort();
        names
    }
}
