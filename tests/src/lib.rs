//! # Service Broker Test Suite
//!
//! Cross-crate flows between a service broker and its callers over the
//! in-memory bus.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── fixtures.rs       # Bus pair harness, recording observer
//!     ├── round_trip.rs     # Request in, correlated result out
//!     ├── failure_paths.rs  # Everything that is dropped instead of answered
//!     └── concurrency.rs    # Out-of-order completion, ordering of dispatch
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p broker-tests
//! cargo test -p broker-tests integration::failure_paths::
//! ```

#![allow(dead_code)]

pub mod integration;
