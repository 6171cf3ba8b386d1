//! Typed errors for payload registration, conversion and construction.

use thiserror::Error;

/// Every way the payload registry can refuse an input.
///
/// Branch on the variant, never on the message.
#[derive(Debug, Error)]
pub enum PayloadError {
    /// Payload type name is empty
    #[error("payload type name must not be empty")]
    InvalidPayloadType,

    /// Initiator produced no payload
    #[error("payload initiator returned no payload")]
    InitiatorInvalidResult,

    /// Initiator produced a primitive or anonymous type
    #[error("payload type `{type_name}` is not a named structured type")]
    InvalidPayloadName { type_name: &'static str },

    /// Name already taken in this registry
    #[error("payload type `{name}` is already registered")]
    DuplicatePayloadType { name: String },

    /// No registration for the value's type
    #[error("payload of type `{type_name}` is not registered")]
    PayloadNotRegistered { type_name: &'static str },

    /// Registered, but this instance cannot be encoded
    #[error("payload `{name}` cannot be serialized: {source}")]
    PayloadCannotBeSerialized {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    /// No registration under this name
    #[error("unknown payload type `{name}`")]
    UnknownPayloadType { name: String },

    /// Data is not bytes, text or a raw JSON fragment
    #[error("unsupported payload data: {form}")]
    UnsupportedPayloadData { form: &'static str },

    /// A payload was asked for as a different concrete type
    #[error("payload type mismatch: expected `{expected}`, found `{found}`")]
    PayloadTypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    /// Malformed data, passed through from serde_json untouched
    #[error(transparent)]
    Decode(#[from] serde_json::Error),
}

impl PayloadError {
    /// True when the encoding layer rejected the data as malformed JSON.
    pub fn is_decode_syntax(&self) -> bool {
        match self {
            PayloadError::Decode(err) => err.is_syntax() || err.is_eof(),
            _ => false,
        }
    }

    /// The pass-through decode error, if this is one.
    pub fn as_decode(&self) -> Option<&serde_json::Error> {
        match self {
            PayloadError::Decode(err) => Some(err),
            _ => None,
        }
    }
}

/// Result type alias for payload operations.
pub type PayloadResult<T> = std::result::Result<T, PayloadError>;
