//! Frame header: `length` followed by the message-type byte.
//!
//! `length` counts the whole frame, header included. Up to 255 it takes a
//! single byte; beyond that the frame starts with the `0x01` marker followed by
//! a big-endian u16, which makes the header two bytes longer.

use bytes::{Buf, BufMut};

use super::buf_ext::BufExt;
use super::error::{DecodeError, EncodeError};

pub const EXTENDED_LENGTH_MARKER: u8 = 0x01;

/// Length byte + type byte.
pub const SHORT_HEADER_LEN: usize = 2;
/// Marker + u16 length + type byte.
pub const EXTENDED_HEADER_LEN: usize = 4;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Header {
    pub length: u16,
    pub message_type: u8,
}

impl Header {
    /// Derives the header for a payload of `payload_len` bytes. The length is
    /// always computed here, never taken from a caller.
    pub fn for_payload(message_type: u8, payload_len: usize) -> Result<Header, EncodeError> {
        let short = payload_len + SHORT_HEADER_LEN;
        let total = if short <= u8::MAX as usize {
            short
        } else {
            payload_len + EXTENDED_HEADER_LEN
        };
        let length = u16::try_from(total).map_err(|_| EncodeError::FrameTooLarge(payload_len))?;
        Ok(Header {
            length,
            message_type,
        })
    }

    pub fn is_extended(&self) -> bool {
        self.length as usize > u8::MAX as usize
    }

    /// Number of bytes the header itself occupies on the wire.
    pub fn encoded_len(&self) -> usize {
        if self.is_extended() {
            EXTENDED_HEADER_LEN
        } else {
            SHORT_HEADER_LEN
        }
    }

    pub fn payload_len(&self) -> usize {
        (self.length as usize).saturating_sub(self.encoded_len())
    }

    pub fn encode(&self, buf: &mut impl BufMut) {
        if self.is_extended() {
            buf.put_u8(EXTENDED_LENGTH_MARKER);
            buf.put_u16(self.length);
        } else {
            buf.put_u8(self.length as u8);
        }
        buf.put_u8(self.message_type);
    }

    /// Reads a header and returns it with the number of bytes it occupied.
    pub fn decode(buf: &mut impl Buf) -> Result<(Header, usize), DecodeError> {
        let first = buf.checked_u8()?;
        let (length, header_len) = if first == EXTENDED_LENGTH_MARKER {
            (buf.checked_u16()?, EXTENDED_HEADER_LEN)
        } else {
            (first as u16, SHORT_HEADER_LEN)
        };
        if (length as usize) < header_len {
            return Err(DecodeError::InvalidLength(length));
        }
        let message_type = buf.checked_u8()?;
        Ok((
            Header {
                length,
                message_type,
            },
            header_len,
        ))
    }
}
