//! WebSocket push frames and upgrade handshake (RFC 6455 subset).
//!
//! The server only ever sends: single, unfragmented, unmasked text frames.
//!
//! ```text
//!  0               1               2               3
//! +-+-+-+-+-------+-+-------------+-------------------------------+
//! |F|R|R|R| opcode|M| Payload len |    Extended payload length    |
//! |I|S|S|S|  (4)  |A|     (7)     |             (16/64)           |
//! |N|V|V|V|       |S|             |   (if payload len==126/127)   |
//! +-+-+-+-+-------+-+-------------+-------------------------------+
//! ```
//!
//! Decoding exists for tests and tooling; it never indexes raw buffers.

use base64::Engine;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use sha1::{Digest, Sha1};

use crate::error::{Result, SysGuardError};
use crate::protocol::http::{ResponseHead, StatusCode};

/// RFC 6455 GUID appended to the client key before hashing.
const WS_GUID: &str = "258EAFA5-E914-47DA-95CA-C5AB0DC85B11";

/// FIN bit of the first header byte.
pub const FIN: u8 = 0x80;
/// Text frame opcode.
pub const OPCODE_TEXT: u8 = 0x1;
/// Longest payload encoded directly in the 7-bit length field.
pub const MAX_SHORT_LEN: usize = 125;
/// Longest payload encoded with the 16-bit extended length.
pub const MAX_MEDIUM_LEN: usize = 65535;

const LEN_16: u8 = 126;
const LEN_64: u8 = 127;
const MASK_BIT: u8 = 0x80;

/// Compute `Sec-WebSocket-Accept`: base64(SHA-1(key ++ GUID)).
pub fn compute_accept_key(client_key: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(client_key.as_bytes());
    hasher.update(WS_GUID.as_bytes());
    base64::engine::general_purpose::STANDARD.encode(hasher.finalize())
}

/// `101 Switching Protocols` head for a given client key.
pub fn switching_protocols(client_key: &str) -> ResponseHead {
    ResponseHead::new(StatusCode::SwitchingProtocols)
        .header("Upgrade", "websocket")
        .header("Connection", "Upgrade")
        .header("Sec-WebSocket-Accept", compute_accept_key(client_key))
}

/// Header length in bytes for a text frame carrying `payload_len` bytes.
pub fn header_len(payload_len: usize) -> usize {
    if payload_len <= MAX_SHORT_LEN {
        2
    } else if payload_len <= MAX_MEDIUM_LEN {
        4
    } else {
        10
    }
}

/// Write a FIN text frame header for `payload_len` bytes (no mask).
pub fn put_text_header(dst: &mut impl BufMut, payload_len: usize) {
    dst.put_u8(FIN | OPCODE_TEXT);
    if payload_len <= MAX_SHORT_LEN {
        dst.put_u8(payload_len as u8);
    } else if payload_len <= MAX_MEDIUM_LEN {
        dst.put_u8(LEN_16);
        dst.put_u16(payload_len as u16);
    } else {
        dst.put_u8(LEN_64);
        dst.put_u64(payload_len as u64);
    }
}

/// Encode a complete text frame (header + payload) into one contiguous buffer.
pub fn encode_text_frame(payload: &[u8]) -> Bytes {
    let mut dst = BytesMut::with_capacity(header_len(payload.len()) + payload.len());
    put_text_header(&mut dst, payload.len());
    dst.put_slice(payload);
    dst.freeze()
}

/// Parsed frame header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub fin: bool,
    pub opcode: u8,
    pub masked: bool,
    pub payload_len: u64,
    /// Bytes consumed by the header (mask key included).
    pub header_len: usize,
}

/// Decode a frame header from the front of `buf`.
pub fn decode_header(mut buf: &[u8]) -> Result<FrameHeader> {
    let total = buf.remaining();
    if total < 2 {
        return Err(SysGuardError::BadRequest("frame header too short".into()));
    }

    let b0 = buf.get_u8();
    let b1 = buf.get_u8();
    let masked = (b1 & MASK_BIT) != 0;

    let payload_len = match b1 & !MASK_BIT {
        LEN_16 => {
            if buf.remaining() < 2 {
                return Err(SysGuardError::BadRequest("missing 16-bit length".into()));
            }
            u64::from(buf.get_u16())
        }
        LEN_64 => {
            if buf.remaining() < 8 {
                return Err(SysGuardError::BadRequest("missing 64-bit length".into()));
            }
            buf.get_u64()
        }
        short => u64::from(short),
    };

    if masked {
        if buf.remaining() < 4 {
            return Err(SysGuardError::BadRequest("mask bit set but key missing".into()));
        }
        buf.advance(4);
    }

    Ok(FrameHeader {
        fin: (b0 & FIN) != 0,
        opcode: b0 & 0x0f,
        masked,
        payload_len,
        header_len: total - buf.remaining(),
    })
}
