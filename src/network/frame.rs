//! WebSocket frame codec
//!
//! RFC 6455 framing over blocking streams.
//!
//! ## Frame Format
//! ```text
//! ┌─┬───┬────────┬─┬─────────┬──────────────────┬───────────┬──────────┐
//! │F│RSV│ OpCode │M│ Len (7) │ Ext Len (0/2/8)  │ Mask (0/4)│ Payload  │
//! └─┴───┴────────┴─┴─────────┴──────────────────┴───────────┴──────────┘
//! ```
//! Client → server frames are masked, server → client frames are not.

use std::io::{Read, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;

use crate::error::{Result, WebConfigError};

/// Largest possible frame header: 2 + 8 (length) + 4 (mask)
pub const MAX_HEADER_SIZE: usize = 14;

/// Control frame payloads are capped by the RFC
pub const MAX_CONTROL_PAYLOAD: usize = 125;

const FIN_BIT: u8 = 0x80;
const RSV_BITS: u8 = 0x70;
const OPCODE_BITS: u8 = 0x0F;
const MASK_BIT: u8 = 0x80;
const LEN_BITS: u8 = 0x7F;

/// Frame opcodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    Continuation = 0x0,
    Text = 0x1,
    Binary = 0x2,
    Close = 0x8,
    Ping = 0x9,
    Pong = 0xA,
}

impl OpCode {
    fn from_u8(byte: u8) -> Result<Self> {
        match byte {
            0x0 => Ok(OpCode::Continuation),
            0x1 => Ok(OpCode::Text),
            0x2 => Ok(OpCode::Binary),
            0x8 => Ok(OpCode::Close),
            0x9 => Ok(OpCode::Ping),
            0xA => Ok(OpCode::Pong),
            _ => Err(WebConfigError::Frame(format!(
                "Unknown opcode: 0x{:x}",
                byte
            ))),
        }
    }

    /// Close, ping and pong
    pub fn is_control(self) -> bool {
        (self as u8) & 0x8 != 0
    }
}

/// A single WebSocket frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Final fragment of a message
    pub fin: bool,

    pub opcode: OpCode,

    /// Unmasked payload
    pub payload: Bytes,
}

impl Frame {
    fn new(opcode: OpCode, payload: impl Into<Bytes>) -> Self {
        Self {
            fin: true,
            opcode,
            payload: payload.into(),
        }
    }

    /// Final text frame
    pub fn text(text: impl Into<String>) -> Self {
        let text: String = text.into();
        Self::new(OpCode::Text, text)
    }

    /// Final binary frame
    pub fn binary(data: impl Into<Bytes>) -> Self {
        Self::new(OpCode::Binary, data)
    }

    pub fn ping(data: impl Into<Bytes>) -> Self {
        Self::new(OpCode::Ping, data)
    }

    pub fn pong(data: impl Into<Bytes>) -> Self {
        Self::new(OpCode::Pong, data)
    }

    /// Close frame without status code
    pub fn close() -> Self {
        Self::new(OpCode::Close, Bytes::new())
    }

    /// Mark this frame as a non-final fragment
    pub fn fragment(mut self) -> Self {
        self.fin = false;
        self
    }

    /// Continuation of a fragmented message
    pub fn continuation(data: impl Into<Bytes>, fin: bool) -> Self {
        Self {
            fin,
            opcode: OpCode::Continuation,
            payload: data.into(),
        }
    }

    /// A whole text message carried by this one frame
    pub fn is_complete_text(&self) -> bool {
        self.fin && self.opcode == OpCode::Text
    }

    /// Payload as text, if it is valid UTF-8
    pub fn as_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.payload).ok()
    }
}

// =============================================================================
// Encoding
// =============================================================================

/// Encode a frame, masking the payload when `mask` is given
pub fn encode_frame(frame: &Frame, mask: Option<[u8; 4]>) -> Vec<u8> {
    let len = frame.payload.len();
    let mut bytes = Vec::with_capacity(MAX_HEADER_SIZE + len);

    let fin = if frame.fin { FIN_BIT } else { 0 };
    bytes.push(fin | frame.opcode as u8);

    let mask_bit = if mask.is_some() { MASK_BIT } else { 0 };
    if len < 126 {
        bytes.push(mask_bit | len as u8);
    } else if len <= u16::MAX as usize {
        bytes.push(mask_bit | 126);
        bytes.extend_from_slice(&(len as u16).to_be_bytes());
    } else {
        bytes.push(mask_bit | 127);
        bytes.extend_from_slice(&(len as u64).to_be_bytes());
    }

    match mask {
        Some(key) => {
            bytes.extend_from_slice(&key);
            bytes.extend(
                frame
                    .payload
                    .iter()
                    .enumerate()
                    .map(|(i, b)| b ^ key[i % 4]),
            );
        }
        None => bytes.extend_from_slice(&frame.payload),
    }

    bytes
}

/// Write a frame and flush
pub fn write_frame<W: Write>(writer: &mut W, frame: &Frame, mask: Option<[u8; 4]>) -> Result<()> {
    writer.write_all(&encode_frame(frame, mask))?;
    writer.flush()?;
    Ok(())
}

/// Masking key for client frames.
///
/// Masking only defeats proxy cache poisoning, so clock-derived bytes are
/// enough here.
pub fn generate_mask() -> [u8; 4] {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() ^ (d.as_secs() as u32))
        .unwrap_or(0x5A5A_5A5A);
    nanos.to_be_bytes()
}

// =============================================================================
// Decoding
// =============================================================================

/// Read one frame from a stream.
///
/// `expect_masked` is true on the server side, where every client frame must
/// be masked. Payloads above `max_payload` are rejected before being read.
pub fn read_frame<R: Read>(reader: &mut R, max_payload: usize, expect_masked: bool) -> Result<Frame> {
    let mut header = [0u8; 2];
    reader.read_exact(&mut header)?;

    if header[0] & RSV_BITS != 0 {
        return Err(WebConfigError::Frame("Reserved bits set".to_string()));
    }

    let fin = header[0] & FIN_BIT != 0;
    let opcode = OpCode::from_u8(header[0] & OPCODE_BITS)?;
    let masked = header[1] & MASK_BIT != 0;

    if masked != expect_masked {
        return Err(WebConfigError::Frame(format!(
            "Unexpected masking: masked={}, expected={}",
            masked, expect_masked
        )));
    }

    let payload_len = match header[1] & LEN_BITS {
        126 => {
            let mut len = [0u8; 2];
            reader.read_exact(&mut len)?;
            u16::from_be_bytes(len) as u64
        }
        127 => {
            let mut len = [0u8; 8];
            reader.read_exact(&mut len)?;
            u64::from_be_bytes(len)
        }
        n => n as u64,
    };

    if opcode.is_control() && (!fin || payload_len > MAX_CONTROL_PAYLOAD as u64) {
        return Err(WebConfigError::Frame(format!(
            "Invalid control frame: fin={}, len={}",
            fin, payload_len
        )));
    }

    if payload_len > max_payload as u64 {
        return Err(WebConfigError::Frame(format!(
            "Payload too large: {} bytes (max {})",
            payload_len, max_payload
        )));
    }

    let mask = if masked {
        let mut key = [0u8; 4];
        reader.read_exact(&mut key)?;
        Some(key)
    } else {
        None
    };

    let mut payload = vec![0u8; payload_len as usize];
    reader.read_exact(&mut payload)?;

    if let Some(key) = mask {
        for (i, byte) in payload.iter_mut().enumerate() {
            *byte ^= key[i % 4];
        }
    }

    Ok(Frame {
        fin,
        opcode,
        payload: Bytes::from(payload),
    })
}
