//! # Demo Service Methods
//!
//! | Method      | Signature        | Returns  | Behavior                          |
//! |-------------|------------------|----------|-----------------------------------|
//! | `sum`       | `[int, int]`     | `int`    | resolved immediately              |
//! | `greet`     | `[string]`       | `string` | resolved immediately              |
//! | `divide`    | `[float, float]` | `float`  | rejects on a zero divisor         |
//! | `slow_echo` | `[primitive, int]` | `primitive` | resolves after the given ms  |
//! | `notify`    | `[string]`       | -        | fire-and-forget, logs the message |

use std::time::Duration;

use service_broker::{Arguments, HandlerError, Invocation, ServiceMessageBroker};
use shared_types::TypeDescriptor;
use tracing::info;

/// Register every demo method on `broker`.
pub fn register_demo_methods(broker: &ServiceMessageBroker) {
    broker.register_method(
        "sum",
        [TypeDescriptor::INT, TypeDescriptor::INT],
        sum,
        Some(TypeDescriptor::INT),
    );
    broker.register_method(
        "greet",
        [TypeDescriptor::STRING],
        greet,
        Some(TypeDescriptor::STRING),
    );
    broker.register_method(
        "divide",
        [TypeDescriptor::FLOAT, TypeDescriptor::FLOAT],
        divide,
        Some(TypeDescriptor::FLOAT),
    );
    broker.register_method(
        "slow_echo",
        [TypeDescriptor::PRIMITIVE, TypeDescriptor::INT],
        slow_echo,
        Some(TypeDescriptor::PRIMITIVE),
    );
    broker.register_method("notify", [TypeDescriptor::STRING], notify, None);
}

fn sum(args: Arguments) -> Result<Invocation, HandlerError> {
    let a: i64 = args.get(0)?;
    let b: i64 = args.get(1)?;
    let total = a
        .checked_add(b)
        .ok_or_else(|| HandlerError::failed("integer overflow"))?;
    Ok(Invocation::resolved(total))
}

fn greet(args: Arguments) -> Result<Invocation, HandlerError> {
    let name: String = args.get(0)?;
    Ok(Invocation::resolved(format!("Hello, {name}!")))
}

fn divide(args: Arguments) -> Result<Invocation, HandlerError> {
    let dividend: f64 = args.get(0)?;
    let divisor: f64 = args.get(1)?;
    Ok(Invocation::pending(async move {
        if divisor == 0.0 {
            return Err(HandlerError::failed("division by zero"));
        }
        Ok(dividend / divisor)
    }))
}

fn slow_echo(args: Arguments) -> Result<Invocation, HandlerError> {
    let delay_ms: u64 = args.get(1)?;
    let value = args.into_values().swap_remove(0);
    Ok(Invocation::pending(async move {
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        Ok(value)
    }))
}

fn notify(args: Arguments) -> Result<Invocation, HandlerError> {
    let message: String = args.get(0)?;
    info!(message = %message, "Notification received");
    Ok(Invocation::absent())
}
