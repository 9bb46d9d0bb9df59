//! Value definitions
//!
//! The tree of typed frames produced by the decoder and consumed by the
//! encoder.

use bytes::Bytes;

/// Wire tag for simple strings
pub const SIMPLE_STRING_TAG: u8 = b'+';

/// Wire tag for bulk strings
pub const BULK_STRING_TAG: u8 = b'$';

/// Wire tag for arrays
pub const ARRAY_TAG: u8 = b'*';

/// A single protocol frame, possibly containing nested frames
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Short status text; must not contain `\r\n`
    SimpleString(Bytes),

    /// Length-prefixed, binary-safe payload
    BulkString(Bytes),

    /// Ordered sequence of child frames
    Array(Vec<Value>),
}

impl Value {
    /// Create a simple string value
    pub fn simple(payload: impl Into<Bytes>) -> Self {
        Value::SimpleString(payload.into())
    }

    /// Create a bulk string value
    pub fn bulk(payload: impl Into<Bytes>) -> Self {
        Value::BulkString(payload.into())
    }

    /// Create an array value
    pub fn array(elements: Vec<Value>) -> Self {
        Value::Array(elements)
    }

    /// `+OK`
    pub fn ok() -> Self {
        Value::simple(Bytes::from_static(b"OK"))
    }

    /// `+PONG`
    pub fn pong() -> Self {
        Value::simple(Bytes::from_static(b"PONG"))
    }

    /// Payload of either string variant
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Value::SimpleString(payload) | Value::BulkString(payload) => Some(payload),
            Value::Array(_) => None,
        }
    }

    /// Children of an array
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(elements) => Some(elements),
            _ => None,
        }
    }

    /// Consume an array into its children
    pub fn into_array(self) -> Option<Vec<Value>> {
        match self {
            Value::Array(elements) => Some(elements),
            _ => None,
        }
    }

    /// The tag byte this value is framed with
    pub fn tag(&self) -> u8 {
        match self {
            Value::SimpleString(_) => SIMPLE_STRING_TAG,
            Value::BulkString(_) => BULK_STRING_TAG,
            Value::Array(_) => ARRAY_TAG,
        }
    }

    /// Human-readable variant name (for logs and error messages)
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::SimpleString(_) => "simple string",
            Value::BulkString(_) => "bulk string",
            Value::Array(_) => "array",
        }
    }
}
