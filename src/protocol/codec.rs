//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! ```text
//! Simple string:  +<bytes>\r\n
//! Bulk string:    $<decimal length>\r\n<raw bytes>\r\n
//! Array:          *<decimal count>\r\n<count encoded frames>
//! Error (reply):  -<text>\r\n
//! ```
//!
//! Bulk strings and arrays are framed only by their explicit length or
//! count. Only the length/count lines and simple strings are scanned for
//! the `\r\n` terminator.

use std::io::{BufRead, ErrorKind, Read, Write};

use bytes::{BufMut, Bytes, BytesMut};

use super::value::{ARRAY_TAG, BULK_STRING_TAG, SIMPLE_STRING_TAG};
use super::{Response, Value};
use crate::error::{EmberError, Result};

/// Line terminator
pub const CRLF: &[u8] = b"\r\n";

/// Wire tag for error replies
pub const ERROR_TAG: u8 = b'-';

/// Default maximum array nesting depth
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Maximum length of a single text line (simple string or length header)
pub const MAX_LINE_LEN: usize = 64 * 1024;

/// Maximum bulk string payload (512 MB)
pub const MAX_BULK_LEN: usize = 512 * 1024 * 1024;

/// Upper bound on up-front element allocation for arrays
const ARRAY_PREALLOC_LIMIT: usize = 1024;

// =============================================================================
// Decoding
// =============================================================================

/// Streaming frame decoder
///
/// Stateless apart from its nesting limit; every call consumes exactly one
/// top-level frame from the reader it is given.
#[derive(Debug, Clone, Copy)]
pub struct Decoder {
    max_depth: usize,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl Decoder {
    /// Create a decoder accepting at most `max_depth` levels of nested arrays
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Maximum nesting depth this decoder accepts
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Read one complete top-level frame
    ///
    /// Returns `EmberError::EndOfStream` if the stream is closed before the
    /// first byte of the frame. Any failure after that point discards the
    /// partially decoded frame.
    pub fn read_value<R: BufRead>(&self, reader: &mut R) -> Result<Value> {
        self.read_frame(reader, 0)
    }

    fn read_frame<R: BufRead>(&self, reader: &mut R, depth: usize) -> Result<Value> {
        let tag = match read_tag(reader)? {
            Some(tag) => tag,
            None if depth == 0 => return Err(EmberError::EndOfStream),
            None => {
                return Err(EmberError::Truncated(
                    "stream ended before element type tag".to_string(),
                ))
            }
        };

        match tag {
            SIMPLE_STRING_TAG => read_simple_string(reader),
            BULK_STRING_TAG => read_bulk_string(reader),
            ARRAY_TAG => self.read_array(reader, depth),
            other => Err(EmberError::Malformed(format!(
                "unknown type tag: 0x{:02x}",
                other
            ))),
        }
    }

    fn read_array<R: BufRead>(&self, reader: &mut R, depth: usize) -> Result<Value> {
        if depth >= self.max_depth {
            return Err(EmberError::TooDeep(self.max_depth));
        }

        let line = read_line(reader)?;
        let count = parse_length(&line, "array length")?;

        // Non-positive counts (including the conventional null `*-1`) decode
        // as an empty array.
        let count = usize::try_from(count).unwrap_or(0);

        let mut elements = Vec::with_capacity(count.min(ARRAY_PREALLOC_LIMIT));
        for index in 0..count {
            let element = self
                .read_frame(reader, depth + 1)
                .map_err(|source| EmberError::InElement {
                    index,
                    source: Box::new(source),
                })?;
            elements.push(element);
        }

        Ok(Value::Array(elements))
    }
}

/// Read one complete top-level frame with the default nesting limit
pub fn read_value<R: BufRead>(reader: &mut R) -> Result<Value> {
    Decoder::default().read_value(reader)
}

/// Decode the first frame in `bytes`
///
/// Trailing bytes after the first frame are ignored.
pub fn decode(mut bytes: &[u8]) -> Result<Value> {
    read_value(&mut bytes)
}

/// Read the type tag, or `None` on a clean end of stream
fn read_tag<R: BufRead>(reader: &mut R) -> Result<Option<u8>> {
    let mut tag = [0u8; 1];
    loop {
        match reader.read(&mut tag) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(tag[0])),
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

/// Read up to the first `\r\n` and return the line without it
///
/// A `\n` that is not preceded by `\r` is part of the line.
fn read_line<R: BufRead>(reader: &mut R) -> Result<Vec<u8>> {
    let limit = MAX_LINE_LEN + CRLF.len();
    let mut line = Vec::new();

    loop {
        let budget = limit.saturating_sub(line.len()) as u64;
        let read = reader.by_ref().take(budget).read_until(b'\n', &mut line)?;

        if line.ends_with(CRLF) {
            line.truncate(line.len() - CRLF.len());
            return Ok(line);
        }
        if line.len() >= limit {
            return Err(EmberError::Malformed(format!(
                "line exceeds {} bytes without terminator",
                MAX_LINE_LEN
            )));
        }
        if read == 0 {
            return Err(EmberError::Truncated(
                "stream ended before line terminator".to_string(),
            ));
        }
    }
}

fn parse_length(line: &[u8], what: &str) -> Result<i64> {
    std::str::from_utf8(line)
        .ok()
        .and_then(|text| text.parse::<i64>().ok())
        .ok_or_else(|| {
            EmberError::Malformed(format!(
                "failed to parse {}: {:?}",
                what,
                String::from_utf8_lossy(line)
            ))
        })
}

fn read_simple_string<R: BufRead>(reader: &mut R) -> Result<Value> {
    let line = read_line(reader)?;
    Ok(Value::SimpleString(Bytes::from(line)))
}

fn read_bulk_string<R: BufRead>(reader: &mut R) -> Result<Value> {
    let line = read_line(reader)?;
    let declared = parse_length(&line, "bulk string length")?;

    let len = usize::try_from(declared).map_err(|_| {
        EmberError::Malformed(format!("negative bulk string length: {}", declared))
    })?;
    if len > MAX_BULK_LEN {
        return Err(EmberError::Malformed(format!(
            "bulk string too large: {} bytes (max {})",
            len, MAX_BULK_LEN
        )));
    }

    // Payload plus its trailing terminator, read incrementally so a bogus
    // length on a short stream never allocates the full amount.
    let expected = len + CRLF.len();
    let mut payload = Vec::with_capacity(expected.min(64 * 1024));
    let read = reader
        .by_ref()
        .take(expected as u64)
        .read_to_end(&mut payload)?;

    if read < expected {
        return Err(EmberError::Truncated(format!(
            "bulk string: expected {} bytes, got {}",
            expected, read
        )));
    }

    // The trailing two bytes are dropped without checking them.
    payload.truncate(len);
    Ok(Value::BulkString(Bytes::from(payload)))
}

// =============================================================================
// Encoding
// =============================================================================

/// Encode a value tree to wire bytes
pub fn encode(value: &Value) -> Bytes {
    let mut dst = BytesMut::new();
    encode_into(value, &mut dst);
    dst.freeze()
}

/// Append the wire encoding of `value` to `dst`
pub fn encode_into(value: &Value, dst: &mut BytesMut) {
    match value {
        Value::SimpleString(payload) => {
            dst.reserve(1 + payload.len() + CRLF.len());
            dst.put_u8(SIMPLE_STRING_TAG);
            dst.put_slice(payload);
            dst.put_slice(CRLF);
        }
        Value::BulkString(payload) => {
            put_header(dst, BULK_STRING_TAG, payload.len());
            dst.reserve(payload.len() + CRLF.len());
            dst.put_slice(payload);
            dst.put_slice(CRLF);
        }
        Value::Array(elements) => {
            put_header(dst, ARRAY_TAG, elements.len());
            for element in elements {
                encode_into(element, dst);
            }
        }
    }
}

/// `<tag><decimal len>\r\n`
fn put_header(dst: &mut BytesMut, tag: u8, len: usize) {
    let digits = len.to_string();
    dst.reserve(1 + digits.len() + CRLF.len());
    dst.put_u8(tag);
    dst.put_slice(digits.as_bytes());
    dst.put_slice(CRLF);
}

/// Write a value to a stream and flush it
pub fn write_value<W: Write>(writer: &mut W, value: &Value) -> Result<()> {
    writer.write_all(&encode(value))?;
    writer.flush()?;
    Ok(())
}

// =============================================================================
// Responses
// =============================================================================

/// Encode a reply to wire bytes
pub fn encode_response(response: &Response) -> Bytes {
    match response {
        Response::Value(value) => encode(value),
        Response::Error(message) => {
            let mut dst = BytesMut::with_capacity(1 + message.len() + CRLF.len());
            dst.put_u8(ERROR_TAG);
            dst.put_slice(message.as_bytes());
            dst.put_slice(CRLF);
            dst.freeze()
        }
    }
}

/// Write a reply to a stream and flush it
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    writer.write_all(&encode_response(response))?;
    writer.flush()?;
    Ok(())
}

/// Read one reply (client side)
///
/// Error lines are recognized here only; the request decoder never
/// accepts them.
pub fn read_response<R: BufRead>(reader: &mut R) -> Result<Response> {
    let tag = reader.fill_buf()?.first().copied();

    match tag {
        None => Err(EmberError::EndOfStream),
        Some(ERROR_TAG) => {
            reader.consume(1);
            let line = read_line(reader)?;
            Ok(Response::Error(String::from_utf8_lossy(&line).into_owned()))
        }
        Some(_) => read_value(reader).map(Response::Value),
    }
}
