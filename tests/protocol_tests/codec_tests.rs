//! Codec Tests
//!
//! Tests for frame encoding/decoding.

use std::io::{BufReader, Cursor, Read};

use bytes::Bytes;
use emberkv::protocol::{
    decode, encode, encode_response, read_response, read_value, write_response, write_value,
    Decoder, Response, Value, DEFAULT_MAX_DEPTH, MAX_LINE_LEN,
};
use emberkv::EmberError;
use proptest::prelude::*;

// =============================================================================
// Helper Functions
// =============================================================================

fn bulk(s: &str) -> Value {
    Value::bulk(s.to_string())
}

fn simple(s: &str) -> Value {
    Value::simple(s.to_string())
}

/// Reader that hands out at most `chunk` bytes per read, like a slow socket.
struct Trickle {
    data: Vec<u8>,
    pos: usize,
    chunk: usize,
}

impl Read for Trickle {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.chunk.min(buf.len()).min(self.data.len() - self.pos);
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

// =============================================================================
// Decoding Tests
// =============================================================================

#[test]
fn test_decode_simple_string() {
    let value = decode(b"+OK\r\n").unwrap();
    assert_eq!(value, simple("OK"));
}

#[test]
fn test_decode_bulk_string() {
    let value = decode(b"$5\r\nhello\r\n").unwrap();
    assert_eq!(value, bulk("hello"));
}

#[test]
fn test_decode_bulk_string_array() {
    let value = decode(b"*2\r\n$5\r\nhello\r\n$4\r\nmanh\r\n").unwrap();
    assert_eq!(value, Value::array(vec![bulk("hello"), bulk("manh")]));
}

#[test]
fn test_decode_empty_simple_string() {
    assert_eq!(decode(b"+\r\n").unwrap(), simple(""));
}

#[test]
fn test_decode_empty_bulk_string() {
    assert_eq!(decode(b"$0\r\n\r\n").unwrap(), bulk(""));
}

#[test]
fn test_decode_simple_string_with_lone_newline() {
    // A \n not preceded by \r is payload, not a terminator
    let value = decode(b"+foo\nbar\r\n").unwrap();
    assert_eq!(value, simple("foo\nbar"));
}

#[test]
fn test_decode_nested_arrays() {
    let value = decode(b"*2\r\n*1\r\n+a\r\n*2\r\n$1\r\nb\r\n*0\r\n").unwrap();
    assert_eq!(
        value,
        Value::array(vec![
            Value::array(vec![simple("a")]),
            Value::array(vec![bulk("b"), Value::array(vec![])]),
        ])
    );
}

#[test]
fn test_decode_mixed_array() {
    let value = decode(b"*3\r\n+OK\r\n$3\r\nfoo\r\n*0\r\n").unwrap();
    assert_eq!(
        value,
        Value::array(vec![simple("OK"), bulk("foo"), Value::array(vec![])])
    );
}

#[test]
fn test_decode_zero_count_array() {
    assert_eq!(decode(b"*0\r\n").unwrap(), Value::array(vec![]));
}

#[test]
fn test_decode_negative_count_array_is_empty() {
    assert_eq!(decode(b"*-1\r\n").unwrap(), Value::array(vec![]));
    assert_eq!(decode(b"*-7\r\n").unwrap(), Value::array(vec![]));
}

#[test]
fn test_decode_bulk_string_binary_safe() {
    let payload: Vec<u8> = b"a\r\nb\rc\n\0\xff".to_vec();
    let mut wire = format!("${}\r\n", payload.len()).into_bytes();
    wire.extend_from_slice(&payload);
    wire.extend_from_slice(b"\r\n");

    let value = decode(&wire).unwrap();
    assert_eq!(value, Value::bulk(payload.clone()));
    assert_eq!(encode(&value), Bytes::from(wire));
}

#[test]
fn test_decode_bulk_string_trailer_not_verified() {
    // The two bytes after the payload are discarded unchecked
    assert_eq!(decode(b"$3\r\nabcXY").unwrap(), bulk("abc"));
}

#[test]
fn test_decode_ignores_trailing_bytes() {
    assert_eq!(decode(b"+one\r\n+two\r\n").unwrap(), simple("one"));
}

#[test]
fn test_decode_accepts_explicit_plus_sign_length() {
    assert_eq!(decode(b"$+2\r\nhi\r\n").unwrap(), bulk("hi"));
}

// =============================================================================
// Error Handling Tests
// =============================================================================

#[test]
fn test_empty_stream_is_end_of_stream() {
    let err = decode(b"").unwrap_err();
    assert!(err.is_end_of_stream());
}

#[test]
fn test_unknown_type_tag() {
    let err = decode(b":1\r\n").unwrap_err();
    assert!(matches!(err, EmberError::Malformed(_)));
    assert!(err.to_string().contains("unknown type tag"));
}

#[test]
fn test_inline_command_rejected() {
    let err = decode(b"PING\r\n").unwrap_err();
    assert!(matches!(err, EmberError::Malformed(_)));
}

#[test]
fn test_non_integer_bulk_length() {
    let err = decode(b"$abc\r\nhello\r\n").unwrap_err();
    assert!(matches!(err, EmberError::Malformed(_)));
    assert!(err.to_string().contains("bulk string length"));
}

#[test]
fn test_non_integer_array_count() {
    let err = decode(b"*x\r\n").unwrap_err();
    assert!(matches!(err, EmberError::Malformed(_)));
    assert!(err.to_string().contains("array length"));
}

#[test]
fn test_negative_bulk_length_fails_cleanly() {
    let err = decode(b"$-1\r\n").unwrap_err();
    assert!(matches!(err, EmberError::Malformed(_)));
    assert!(err.to_string().contains("negative bulk string length"));

    // Rejected right after the length line; the payload is left unread
    let mut reader: &[u8] = b"$-2\r\nxx";
    let err = read_value(&mut reader).unwrap_err();
    assert!(matches!(err, EmberError::Malformed(_)));
    assert_eq!(reader, b"xx");

    let wire = format!("${}\r\n", i64::MIN);
    assert!(matches!(
        decode(wire.as_bytes()),
        Err(EmberError::Malformed(_))
    ));
}

#[test]
fn test_truncated_bulk_string() {
    // Declared 5 bytes, fewer than 7 follow
    let err = decode(b"$5\r\nhel").unwrap_err();
    assert!(matches!(err, EmberError::Truncated(_)));
}

#[test]
fn test_bulk_string_missing_trailer_is_truncated() {
    let err = decode(b"$5\r\nhello").unwrap_err();
    assert!(matches!(err, EmberError::Truncated(_)));
}

#[test]
fn test_truncated_simple_string() {
    let err = decode(b"+OK").unwrap_err();
    assert!(matches!(err, EmberError::Truncated(_)));
}

#[test]
fn test_simple_string_lone_newline_without_terminator_is_truncated() {
    let err = decode(b"+OK\n").unwrap_err();
    assert!(matches!(err, EmberError::Truncated(_)));
}

#[test]
fn test_truncated_length_line() {
    let err = decode(b"$5").unwrap_err();
    assert!(matches!(err, EmberError::Truncated(_)));
}

#[test]
fn test_missing_array_element_is_truncated_not_end_of_stream() {
    let err = decode(b"*2\r\n$1\r\na\r\n").unwrap_err();
    match err {
        EmberError::InElement { index, source } => {
            assert_eq!(index, 1);
            assert!(matches!(*source, EmberError::Truncated(_)));
        }
        other => panic!("Expected InElement error, got {:?}", other),
    }
}

#[test]
fn test_element_error_carries_index() {
    let err = decode(b"*3\r\n+a\r\n+b\r\n?oops\r\n").unwrap_err();
    assert!(err.to_string().contains("element 2"));
    assert!(matches!(err.root_cause(), EmberError::Malformed(_)));
}

#[test]
fn test_nested_element_error_carries_every_index() {
    let err = decode(b"*2\r\n+a\r\n*2\r\n+b\r\n$x\r\n").unwrap_err();
    match &err {
        EmberError::InElement { index: 1, source } => match &**source {
            EmberError::InElement { index: 1, source } => {
                assert!(matches!(&**source, EmberError::Malformed(_)));
            }
            other => panic!("Expected nested InElement, got {:?}", other),
        },
        other => panic!("Expected InElement at 1, got {:?}", other),
    }
}

#[test]
fn test_line_too_long() {
    let mut wire = vec![b'+'];
    wire.extend(std::iter::repeat(b'a').take(MAX_LINE_LEN + 10));
    wire.extend_from_slice(b"\r\n");

    let err = decode(&wire).unwrap_err();
    assert!(matches!(err, EmberError::Malformed(_)));
}

#[test]
fn test_huge_declared_length_with_short_stream() {
    // Must not try to allocate the declared size up front
    let err = decode(b"$100000000\r\nabc").unwrap_err();
    assert!(matches!(err, EmberError::Truncated(_)));
}

#[test]
fn test_bulk_length_above_limit() {
    let err = decode(b"$999999999999\r\n").unwrap_err();
    assert!(matches!(err, EmberError::Malformed(_)));
}

// =============================================================================
// Nesting Depth Tests
// =============================================================================

#[test]
fn test_depth_limit_rejects_deep_nesting() {
    let decoder = Decoder::new(2);
    assert_eq!(decoder.max_depth(), 2);
    let mut reader: &[u8] = b"*1\r\n*1\r\n*0\r\n";

    let err = decoder.read_value(&mut reader).unwrap_err();
    assert!(matches!(err.root_cause(), EmberError::TooDeep(2)));
}

#[test]
fn test_depth_limit_allows_nesting_within_limit() {
    let decoder = Decoder::new(2);
    let mut reader: &[u8] = b"*1\r\n*0\r\n";

    let value = decoder.read_value(&mut reader).unwrap();
    assert_eq!(value, Value::array(vec![Value::array(vec![])]));
}

#[test]
fn test_default_depth_rejects_pathological_input() {
    assert_eq!(Decoder::default().max_depth(), DEFAULT_MAX_DEPTH);
    let wire = b"*1\r\n".repeat(10_000);
    let err = decode(&wire).unwrap_err();
    assert!(matches!(err.root_cause(), EmberError::TooDeep(_)));
}

// =============================================================================
// Encoding Tests
// =============================================================================

#[test]
fn test_encode_bulk_string() {
    assert_eq!(&encode(&bulk("hello"))[..], b"$5\r\nhello\r\n");
}

#[test]
fn test_encode_simple_string() {
    assert_eq!(&encode(&Value::ok())[..], b"+OK\r\n");
    assert_eq!(&encode(&Value::pong())[..], b"+PONG\r\n");
}

#[test]
fn test_encode_array() {
    let value = Value::array(vec![bulk("hello"), bulk("manh")]);
    assert_eq!(&encode(&value)[..], b"*2\r\n$5\r\nhello\r\n$4\r\nmanh\r\n");
}

#[test]
fn test_encode_empty_array() {
    assert_eq!(&encode(&Value::array(vec![]))[..], b"*0\r\n");
}

#[test]
fn test_encode_empty_bulk_string() {
    assert_eq!(&encode(&bulk(""))[..], b"$0\r\n\r\n");
}

#[test]
fn test_encode_error_response() {
    let response = Response::unknown_command("foo");
    assert_eq!(
        &encode_response(&response)[..],
        b"-ERR unknown command 'foo'\r\n"
    );
}

// =============================================================================
// Stream I/O Tests
// =============================================================================

#[test]
fn test_stream_multiple_values() {
    let values = vec![
        simple("OK"),
        bulk("with\r\ncrlf"),
        Value::array(vec![bulk("SET"), bulk("k"), bulk("v")]),
        Value::array(vec![]),
    ];

    let mut buffer = Vec::new();
    for value in &values {
        write_value(&mut buffer, value).unwrap();
    }

    let mut cursor = Cursor::new(buffer);
    for expected in &values {
        assert_eq!(&read_value(&mut cursor).unwrap(), expected);
    }
    assert!(read_value(&mut cursor).unwrap_err().is_end_of_stream());
}

#[test]
fn test_stream_decodes_across_small_reads() {
    let wire = b"*2\r\n$6\r\nhel\nlo\r\n+a\nb\r\n".to_vec();
    let mut reader = BufReader::with_capacity(
        2,
        Trickle {
            data: wire,
            pos: 0,
            chunk: 1,
        },
    );

    let value = read_value(&mut reader).unwrap();
    assert_eq!(value, Value::array(vec![bulk("hel\nlo"), simple("a\nb")]));
}

#[test]
fn test_stream_write_read_responses() {
    let responses = vec![
        Response::Value(Value::pong()),
        Response::unknown_command("foo"),
        Response::Value(bulk("hi")),
        Response::ok(),
    ];

    let mut buffer = Vec::new();
    for response in &responses {
        write_response(&mut buffer, response).unwrap();
    }

    let mut cursor = Cursor::new(buffer);
    for expected in &responses {
        assert_eq!(&read_response(&mut cursor).unwrap(), expected);
    }
    assert!(read_response(&mut cursor).unwrap_err().is_end_of_stream());
}

// =============================================================================
// Round-trip Properties
// =============================================================================

fn arb_value() -> impl Strategy<Value = Value> {
    // Simple strings may contain lone \r or \n, but never the pair
    let simple_payload = prop::collection::vec(any::<u8>(), 0..32)
        .prop_filter("no CRLF", |bytes| !bytes.windows(2).any(|w| w == b"\r\n"))
        .prop_map(Value::simple);
    let bulk_payload = prop::collection::vec(any::<u8>(), 0..64).prop_map(Value::bulk);

    let leaf = prop_oneof![simple_payload, bulk_payload];
    leaf.prop_recursive(4, 64, 8, |inner| {
        prop::collection::vec(inner, 0..8).prop_map(Value::array)
    })
}

proptest! {
    #[test]
    fn decode_inverts_encode(value in arb_value()) {
        let wire = encode(&value);
        let decoded = decode(&wire).unwrap();
        prop_assert_eq!(decoded, value);
    }

    #[test]
    fn decode_consumes_exactly_one_frame(first in arb_value(), second in arb_value()) {
        let mut wire = encode(&first).to_vec();
        wire.extend_from_slice(&encode(&second));

        let mut reader: &[u8] = &wire;
        prop_assert_eq!(read_value(&mut reader).unwrap(), first);
        prop_assert_eq!(read_value(&mut reader).unwrap(), second);
        prop_assert!(reader.is_empty());
    }

    #[test]
    fn truncated_frames_never_decode(value in arb_value(), cut in any::<prop::sample::Index>()) {
        let wire = encode(&value);
        let cut = cut.index(wire.len());
        prop_assert!(decode(&wire[..cut]).is_err());
    }
}
