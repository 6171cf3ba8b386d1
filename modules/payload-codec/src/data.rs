//! Source forms accepted by `create_payload`.

use serde_json::value::RawValue;
use serde_json::Value;

use crate::error::{PayloadError, PayloadResult};

/// Encoded payload data handed to `create_payload`.
///
/// Bytes, text and raw JSON fragments are equivalent wire sources. A
/// `serde_json::Value` has already been decoded and is rejected with
/// [`PayloadError::UnsupportedPayloadData`].
#[derive(Debug, Clone, Copy)]
pub enum PayloadData<'a> {
    Bytes(&'a [u8]),
    Text(&'a str),
    Raw(&'a RawValue),
    Structured(&'a Value),
}

impl<'a> PayloadData<'a> {
    /// The encoded bytes, or an error if this is not a wire source form.
    pub fn source(&self) -> PayloadResult<&'a [u8]> {
        match *self {
            PayloadData::Bytes(bytes) => Ok(bytes),
            PayloadData::Text(text) => Ok(text.as_bytes()),
            PayloadData::Raw(raw) => Ok(raw.get().as_bytes()),
            PayloadData::Structured(value) => Err(PayloadError::UnsupportedPayloadData {
                form: structured_form(value),
            }),
        }
    }
}

fn structured_form(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "decoded string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl<'a> From<&'a [u8]> for PayloadData<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        PayloadData::Bytes(bytes)
    }
}

impl<'a, const N: usize> From<&'a [u8; N]> for PayloadData<'a> {
    fn from(bytes: &'a [u8; N]) -> Self {
        PayloadData::Bytes(bytes)
    }
}

impl<'a> From<&'a Vec<u8>> for PayloadData<'a> {
    fn from(bytes: &'a Vec<u8>) -> Self {
        PayloadData::Bytes(bytes)
    }
}

impl<'a> From<&'a str> for PayloadData<'a> {
    fn from(text: &'a str) -> Self {
        PayloadData::Text(text)
    }
}

impl<'a> From<&'a String> for PayloadData<'a> {
    fn from(text: &'a String) -> Self {
        PayloadData::Text(text)
    }
}

impl<'a> From<&'a RawValue> for PayloadData<'a> {
    fn from(raw: &'a RawValue) -> Self {
        PayloadData::Raw(raw)
    }
}

impl<'a> From<&'a Box<RawValue>> for PayloadData<'a> {
    fn from(raw: &'a Box<RawValue>) -> Self {
        PayloadData::Raw(raw)
    }
}

impl<'a> From<&'a Value> for PayloadData<'a> {
    fn from(value: &'a Value) -> Self {
        PayloadData::Structured(value)
    }
}
