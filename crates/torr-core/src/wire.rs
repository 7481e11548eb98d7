//! torr wire format: framing for one request and one response per
//! connection.
//!
//! Every message on a connection is preceded by a 4-byte big-endian length.
//! A length of zero means "no message": the peer had nothing to answer with.
//! This is distinct from a present message whose body happens to be empty
//! of content.
//!
//! The header is a zerocopy type so its layout is checked at compile time.
//! There is no unsafe code in this module.

use static_assertions::assert_eq_size;
use zerocopy::byteorder::{BigEndian, U32};
use zerocopy::{AsBytes, FromBytes, FromZeroes};

use crate::message::Message;

// ── Frame Header ─────────────────────────────────────────────────────────────

/// Length prefix preceding every message body.
///
/// Wire size: 4 bytes.
#[derive(Debug, Clone, Copy, AsBytes, FromBytes, FromZeroes)]
#[repr(C)]
pub struct FrameHeader {
    /// Body length in bytes, big-endian. Zero = no message.
    pub length: U32<BigEndian>,
}

assert_eq_size!(FrameHeader, [u8; 4]);

impl FrameHeader {
    pub fn new(length: u32) -> Self {
        Self {
            length: U32::new(length),
        }
    }

    /// The header announcing that no message follows.
    pub fn empty() -> Self {
        Self::new(0)
    }

    pub fn length(&self) -> u32 {
        self.length.get()
    }

    pub fn is_empty(&self) -> bool {
        self.length() == 0
    }

    /// Parse a header from exactly `FRAME_HEADER_LEN` bytes.
    pub fn parse(bytes: &[u8; FRAME_HEADER_LEN]) -> Self {
        // A 4-byte array always has the right size; read_from only fails on
        // length mismatch.
        Self::read_from(&bytes[..]).unwrap_or_else(Self::empty)
    }
}

// ── Constants ────────────────────────────────────────────────────────────────

/// Size of the length prefix.
pub const FRAME_HEADER_LEN: usize = std::mem::size_of::<FrameHeader>();

/// Default upper bound on an announced body length. A peer announcing more
/// is treated as broken before anything is allocated.
pub const MAX_FRAME_BYTES: usize = 64 * 1024 * 1024;

// ── Encoding ─────────────────────────────────────────────────────────────────

/// Serialize a message body (without the length prefix).
pub fn encode_body(message: &Message) -> Result<Vec<u8>, FrameError> {
    serde_json::to_vec(message).map_err(FrameError::Encode)
}

/// Serialize a message as a complete frame: header followed by body.
pub fn encode_frame(message: &Message) -> Result<Vec<u8>, FrameError> {
    let body = encode_body(message)?;
    let length = u32::try_from(body.len()).map_err(|_| FrameError::TooLarge(body.len()))?;
    let mut frame = Vec::with_capacity(FRAME_HEADER_LEN + body.len());
    frame.extend_from_slice(FrameHeader::new(length).as_bytes());
    frame.extend_from_slice(&body);
    Ok(frame)
}

/// Parse a message body read from a frame.
pub fn decode_body(body: &[u8]) -> Result<Message, FrameError> {
    serde_json::from_slice(body).map_err(FrameError::Decode)
}

// ── Errors ───────────────────────────────────────────────────────────────────

/// Errors that can arise when framing or interpreting wire data.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("frame length {0} exceeds maximum")]
    TooLarge(usize),

    #[error("failed to encode message: {0}")]
    Encode(serde_json::Error),

    #[error("failed to decode message: {0}")]
    Decode(serde_json::Error),
}

// ── Tests ────────────────────────────────────────────────────────────────────
