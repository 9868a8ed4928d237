//! Frame Codec Tests
//!
//! Tests for WebSocket frame encoding/decoding.

use std::io::Cursor;

use webconfig::network::frame::{encode_frame, read_frame, write_frame, Frame, OpCode};
use webconfig::WebConfigError;

const MASK: [u8; 4] = [0x37, 0xfa, 0x21, 0x3d];
const MAX: usize = 64 * 1024;

// =============================================================================
// Encoding Tests
// =============================================================================

#[test]
fn test_encode_unmasked_text_rfc_example() {
    // RFC 6455 §5.7: single-frame unmasked text "Hello"
    let bytes = encode_frame(&Frame::text("Hello"), None);
    assert_eq!(bytes, vec![0x81, 0x05, 0x48, 0x65, 0x6c, 0x6c, 0x6f]);
}

#[test]
fn test_encode_masked_text_rfc_example() {
    // RFC 6455 §5.7: single-frame masked text "Hello"
    let bytes = encode_frame(&Frame::text("Hello"), Some(MASK));
    assert_eq!(
        bytes,
        vec![0x81, 0x85, 0x37, 0xfa, 0x21, 0x3d, 0x7f, 0x9f, 0x4d, 0x51, 0x58]
    );
}

#[test]
fn test_encode_fragment_clears_fin() {
    let bytes = encode_frame(&Frame::text("Hel").fragment(), None);
    assert_eq!(bytes[0], 0x01);
}

#[test]
fn test_encode_extended_lengths() {
    let medium = encode_frame(&Frame::binary(vec![0u8; 300]), None);
    assert_eq!(medium[1], 126);
    assert_eq!(u16::from_be_bytes([medium[2], medium[3]]), 300);
    assert_eq!(medium.len(), 4 + 300);

    let large = encode_frame(&Frame::binary(vec![0u8; 70_000]), None);
    assert_eq!(large[1], 127);
    assert_eq!(large.len(), 10 + 70_000);
}

// =============================================================================
// Decoding Tests
// =============================================================================

#[test]
fn test_read_masked_text() {
    let bytes = encode_frame(&Frame::text("cfg#x=1"), Some(MASK));
    let frame = read_frame(&mut Cursor::new(bytes), MAX, true).unwrap();

    assert!(frame.is_complete_text());
    assert_eq!(frame.as_text(), Some("cfg#x=1"));
}

#[test]
fn test_read_unmasked_on_client_side() {
    let bytes = encode_frame(&Frame::text("msg#Done"), None);
    let frame = read_frame(&mut Cursor::new(bytes), MAX, false).unwrap();
    assert_eq!(frame, Frame::text("msg#Done"));
}

#[test]
fn test_read_extended_length_masked() {
    let payload = "k=".to_string() + &"v".repeat(1000);
    let bytes = encode_frame(&Frame::text(payload.clone()), Some(MASK));
    let frame = read_frame(&mut Cursor::new(bytes), MAX, true).unwrap();
    assert_eq!(frame.as_text(), Some(payload.as_str()));
}

#[test]
fn test_read_rejects_unmasked_client_frame() {
    let bytes = encode_frame(&Frame::text("x"), None);
    let result = read_frame(&mut Cursor::new(bytes), MAX, true);
    assert!(matches!(result, Err(WebConfigError::Frame(_))));
}

#[test]
fn test_read_rejects_oversized_payload() {
    let bytes = encode_frame(&Frame::binary(vec![1u8; 200]), Some(MASK));
    let result = read_frame(&mut Cursor::new(bytes), 100, true);
    assert!(matches!(result, Err(WebConfigError::Frame(_))));
}

#[test]
fn test_read_rejects_unknown_opcode() {
    let bytes = vec![0x83, 0x80, 0, 0, 0, 0];
    let result = read_frame(&mut Cursor::new(bytes), MAX, true);
    assert!(matches!(result, Err(WebConfigError::Frame(_))));
}

#[test]
fn test_read_rejects_reserved_bits() {
    let bytes = vec![0xC1, 0x80, 0, 0, 0, 0];
    let result = read_frame(&mut Cursor::new(bytes), MAX, true);
    assert!(matches!(result, Err(WebConfigError::Frame(_))));
}

#[test]
fn test_read_rejects_fragmented_control_frame() {
    let bytes = encode_frame(&Frame::ping(&b"x"[..]).fragment(), Some(MASK));
    let result = read_frame(&mut Cursor::new(bytes), MAX, true);
    assert!(matches!(result, Err(WebConfigError::Frame(_))));
}

#[test]
fn test_read_truncated_frame_is_io_error() {
    let mut bytes = encode_frame(&Frame::text("Hello"), Some(MASK));
    bytes.truncate(bytes.len() - 2);
    let result = read_frame(&mut Cursor::new(bytes), MAX, true);
    assert!(matches!(result, Err(WebConfigError::Io(_))));
}

#[test]
fn test_read_control_frames() {
    let mut stream = Vec::new();
    write_frame(&mut stream, &Frame::ping(&b"hi"[..]), Some(MASK)).unwrap();
    write_frame(&mut stream, &Frame::close(), Some(MASK)).unwrap();

    let mut cursor = Cursor::new(stream);
    let ping = read_frame(&mut cursor, MAX, true).unwrap();
    let close = read_frame(&mut cursor, MAX, true).unwrap();

    assert_eq!(ping.opcode, OpCode::Ping);
    assert_eq!(&ping.payload[..], b"hi");
    assert_eq!(close.opcode, OpCode::Close);
    assert!(close.payload.is_empty());
}

#[test]
fn test_frame_kind_helpers() {
    assert!(Frame::text("a").is_complete_text());
    assert!(!Frame::text("a").fragment().is_complete_text());
    assert!(!Frame::binary(&b"a"[..]).is_complete_text());
    assert!(!Frame::continuation(&b"a"[..], true).is_complete_text());
    assert!(OpCode::Close.is_control());
    assert!(!OpCode::Text.is_control());
}
