//! # Shared Types Crate
//!
//! This crate contains the wire-level vocabulary of the broker protocol:
//! the `Envelope` variants that cross a channel and the `TypeDescriptor`
//! handles the serializer uses to marshal values.
//!
//! ## Design Principles
//!
//! - **Closed Envelope Set**: every message on a channel is one of the
//!   `Envelope` variants, selected by its `kind` tag. Unknown tags fail to
//!   decode instead of being guessed at.
//! - **Opaque Correlation**: the `id` of a request is chosen by the caller and
//!   echoed verbatim in the matching result. Nothing here interprets it.
//! - **Opaque Types**: a `TypeDescriptor` is only a name. Encoding rules live in
//!   the serializer, never in the envelope.

pub mod descriptor;
pub mod envelope;
pub mod errors;

pub use descriptor::TypeDescriptor;
pub use envelope::{Envelope, EnvelopeKind, RequestEnvelope, ResultEnvelope};
pub use errors::WireError;
