//! # Error Types
//!
//! Errors raised while converting envelopes to and from their wire form.

use thiserror::Error;

/// Errors related to envelope encoding.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WireError {
    /// The raw map is not a well-formed envelope.
    #[error("Malformed envelope: {0}")]
    Malformed(String),

    /// The envelope could not be encoded.
    #[error("Envelope encoding failed: {0}")]
    Encode(String),
}
