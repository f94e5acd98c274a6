//! Method handler port (driven by the broker)

use crate::domain::{Arguments, Invocation};
use crate::error::HandlerError;

/// A callable registered under a method name.
///
/// Invoked synchronously on the broker's dispatch turn with arguments already
/// deserialized against the method's signature. Returning `Err` is a
/// synchronous failure: nothing is sent back for that request.
pub trait MethodHandler: Send + Sync + 'static {
    /// Invoke the method.
    fn invoke(&self, args: Arguments) -> Result<Invocation, HandlerError>;
}

impl<F> MethodHandler for F
where
    F: Fn(Arguments) -> Result<Invocation, HandlerError> + Send + Sync + 'static,
{
    fn invoke(&self, args: Arguments) -> Result<Invocation, HandlerError> {
        self(args)
    }
}
