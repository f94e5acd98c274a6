//! Integration flows across shared-types, shared-bus and service-broker.

pub mod concurrency;
pub mod failure_paths;
pub mod round_trip;
