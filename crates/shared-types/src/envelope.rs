//! # Channel Envelopes
//!
//! The discrete message units exchanged over a broker channel.
//!
//! ## Wire Shapes
//!
//! ```text
//! request (inbound to the service side):
//!     { "kind": "request", "method": <string>, "args": [<wire value>...], "id": <string> }
//!
//! result (outbound from the service side):
//!     { "kind": "result", "value": <wire value>, "id": <string> }
//! ```
//!
//! The transport carries envelopes as already-decoded JSON maps; this module
//! converts between those maps and the closed `Envelope` variant set.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::errors::WireError;

/// A call request addressed to a named method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    /// Name of the method to invoke.
    pub method: String,
    /// Positional arguments, still in wire form.
    #[serde(default)]
    pub args: Vec<Value>,
    /// Caller-chosen correlation token, echoed in the result.
    pub id: String,
}

impl RequestEnvelope {
    /// Create a request envelope.
    pub fn new(method: impl Into<String>, args: Vec<Value>, id: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            args,
            id: id.into(),
        }
    }
}

/// The serialized result of a completed asynchronous call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    /// The result value, serialized with the method's return type.
    pub value: Value,
    /// The `id` of the originating request.
    pub id: String,
}

impl ResultEnvelope {
    /// Create a result envelope.
    pub fn new(value: Value, id: impl Into<String>) -> Self {
        Self {
            value,
            id: id.into(),
        }
    }
}

/// Every message that may cross a broker channel.
///
/// Dispatch on the `kind` tag is an exhaustive match over this enum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Envelope {
    /// `kind = "request"`
    Request(RequestEnvelope),
    /// `kind = "result"`
    Result(ResultEnvelope),
}

/// The `kind` tag of an envelope, for logging and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EnvelopeKind {
    /// A call request.
    Request,
    /// A call result.
    Result,
}

impl EnvelopeKind {
    /// The tag as it appears on the wire.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvelopeKind::Request => "request",
            EnvelopeKind::Result => "result",
        }
    }
}

impl fmt::Display for EnvelopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Envelope {
    /// Decode one raw envelope received from the transport.
    ///
    /// # Errors
    ///
    /// Returns `WireError::Malformed` if the map is missing a required field,
    /// carries a field of the wrong shape, or has an unknown `kind`.
    pub fn decode(raw: Value) -> Result<Self, WireError> {
        serde_json::from_value(raw).map_err(|e| WireError::Malformed(e.to_string()))
    }

    /// Encode this envelope into the map form the transport carries.
    ///
    /// # Errors
    ///
    /// Returns `WireError::Encode` if a contained value cannot be represented.
    pub fn encode(&self) -> Result<Value, WireError> {
        serde_json::to_value(self).map_err(|e| WireError::Encode(e.to_string()))
    }

    /// The `kind` tag of this envelope.
    #[must_use]
    pub fn kind(&self) -> EnvelopeKind {
        match self {
            Envelope::Request(_) => EnvelopeKind::Request,
            Envelope::Result(_) => EnvelopeKind::Result,
        }
    }

    /// The correlation id carried by this envelope.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Envelope::Request(request) => &request.id,
            Envelope::Result(result) => &result.id,
        }
    }
}

impl From<RequestEnvelope> for Envelope {
    fn from(request: RequestEnvelope) -> Self {
        Envelope::Request(request)
    }
}

impl From<ResultEnvelope> for Envelope {
    fn from(result: ResultEnvelope) -> Self {
        Envelope::Result(result)
    }
}
