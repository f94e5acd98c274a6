//! Handler inputs and outputs
//!
//! `Arguments` is what a handler receives after every positional argument has
//! been deserialized against its declared type. `Invocation` is what it hands
//! back on the same turn: either nothing, or an asynchronous value that the
//! broker resolves and, if a return type was declared, sends back.

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::future::Future;

use crate::error::HandlerError;

/// An asynchronous handler result, not yet resolved.
pub type PendingValue = BoxFuture<'static, Result<Value, HandlerError>>;

/// Deserialized positional arguments for one call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    values: Vec<Value>,
}

impl Arguments {
    /// Wrap already-deserialized values.
    #[must_use]
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Extract argument `index` as `T`.
    ///
    /// # Errors
    ///
    /// `MissingArgument` if out of range, `InvalidArgument` if the value does
    /// not fit `T`.
    pub fn get<T: DeserializeOwned>(&self, index: usize) -> Result<T, HandlerError> {
        let value = self
            .values
            .get(index)
            .ok_or(HandlerError::MissingArgument(index))?;
        T::deserialize(value).map_err(|e| HandlerError::InvalidArgument {
            index,
            reason: e.to_string(),
        })
    }

    /// Borrow argument `index` in its deserialized JSON form.
    #[must_use]
    pub fn raw(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Take the underlying values.
    #[must_use]
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

/// What a handler produced on its dispatch turn.
pub enum Invocation {
    /// No asynchronous value; nothing is ever sent back.
    Absent,
    /// An asynchronous value the broker will await.
    Pending(PendingValue),
}

impl Invocation {
    /// No result.
    #[must_use]
    pub fn absent() -> Self {
        Invocation::Absent
    }

    /// An asynchronous result produced by `future`.
    pub fn pending<F, T>(future: F) -> Self
    where
        F: Future<Output = Result<T, HandlerError>> + Send + 'static,
        T: Serialize + 'static,
    {
        Invocation::Pending(
            future
                .map(|outcome| {
                    outcome.and_then(|value| {
                        serde_json::to_value(value).map_err(|e| HandlerError::Failed(e.to_string()))
                    })
                })
                .boxed(),
        )
    }

    /// An asynchronous result that is already resolved.
    pub fn resolved<T>(value: T) -> Self
    where
        T: Serialize + Send + 'static,
    {
        Self::pending(futures::future::ready(Ok(value)))
    }

    /// Whether the handler produced an asynchronous value.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Invocation::Pending(_))
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Invocation::Absent => f.write_str("Absent"),
            Invocation::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}
