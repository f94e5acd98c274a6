//! # Broker Runtime Library
//!
//! Exposes the composition root's pieces for testing. The entry point is the
//! `main.rs` binary.
//!
//! - `config`: environment-driven `RuntimeConfig`
//! - `observer`: Prometheus-backed and fan-out `DispatchObserver`s
//! - `services`: demo methods registered on the service side
//! - `runtime`: `BrokerRuntime`, both ends of the bus plus a demo round

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod config;
pub mod observer;
pub mod runtime;
pub mod services;

pub use config::RuntimeConfig;
pub use observer::{FanOutObserver, PrometheusObserver};
pub use runtime::{BrokerRuntime, CallReport, RuntimeError};
pub use services::register_demo_methods;
