//! Protocol Module
//!
//! Defines the wire protocol for client-server communication: a subset of
//! RESP limited to simple strings, bulk strings and arrays.
//!
//! ### Request Format
//! ```text
//! *<argc>\r\n
//! $<len>\r\n<command name>\r\n
//! $<len>\r\n<argument>\r\n
//! ...
//! ```
//!
//! ### Commands
//! - PING            → `+PONG`
//! - ECHO <message>  → `$<len>\r\n<message>\r\n`
//! - GET <key>       → `+<value>` (empty when the key is absent)
//! - SET <key> <val> → `+OK`
//! - anything else   → `-ERR unknown command '<name>'`

mod value;
mod command;
mod response;
mod codec;

pub use value::{Value, ARRAY_TAG, BULK_STRING_TAG, SIMPLE_STRING_TAG};
pub use command::Command;
pub use response::Response;
pub use codec::{
    decode, encode, encode_into, encode_response, read_response, read_value, write_response,
    write_value, Decoder, CRLF, DEFAULT_MAX_DEPTH, ERROR_TAG, MAX_BULK_LEN, MAX_LINE_LEN,
};
