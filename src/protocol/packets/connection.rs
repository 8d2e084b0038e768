use bytes::{BufMut, Bytes, BytesMut};

use super::Packet;
use crate::protocol::buf_ext::BufExt;
use crate::protocol::error::DecodeError;
use crate::protocol::flags::Flags;

/// Protocol id carried by CONNECT.
pub const PROTOCOL_ID: u8 = 0x01;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connect {
    pub will: bool,
    pub clean_session: bool,
    pub protocol_id: u8,
    /// Keep-alive in seconds.
    pub duration: u16,
    pub client_id: String,
}

impl Connect {
    pub fn new(client_id: impl Into<String>, duration: u16) -> Self {
        Connect {
            will: false,
            clean_session: true,
            protocol_id: PROTOCOL_ID,
            duration,
            client_id: client_id.into(),
        }
    }

    fn flags(&self) -> Flags {
        Flags::default()
            .with_will(self.will)
            .with_clean_session(self.clean_session)
    }
}

impl Packet for Connect {
    fn payload_len(&self) -> usize {
        4 + self.client_id.len()
    }

    fn encode_payload(&self, buf: &mut BytesMut) {
        buf.put_u8(self.flags().bits());
        buf.put_u8(self.protocol_id);
        buf.put_u16(self.duration);
        buf.put_slice(self.client_id.as_bytes());
    }

    fn decode_payload(buf: &mut Bytes) -> Result<Self, DecodeError> {
        let flags = Flags::from_byte(buf.checked_u8()?);
        let protocol_id = buf.checked_u8()?;
        let duration = buf.checked_u16()?;
        Ok(Connect {
            will: flags.will(),
            clean_session: flags.clean_session(),
            protocol_id,
            duration,
            client_id: buf.rest_string()?,
        })
    }
}

super::return_code_packet!(ConnAck);

/// Keep-alive ping. A sleeping client names itself in `client_id`; an
/// active one leaves it empty.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PingReq {
    pub client_id: String,
}

impl Packet for PingReq {
    fn payload_len(&self) -> usize {
        self.client_id.len()
    }

    fn encode_payload(&self, buf: &mut BytesMut) {
        buf.put_slice(self.client_id.as_bytes());
    }

    fn decode_payload(buf: &mut Bytes) -> Result<Self, DecodeError> {
        Ok(PingReq {
            client_id: buf.rest_string()?,
        })
    }
}

/// A zero duration is a plain disconnect and is sent without the field; a
/// non-zero one asks the gateway to treat the client as asleep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Disconnect {
    pub duration: u16,
}

impl Packet for Disconnect {
    fn payload_len(&self) -> usize {
        if self.duration == 0 { 0 } else { 2 }
    }

    fn encode_payload(&self, buf: &mut BytesMut) {
        if self.duration != 0 {
            buf.put_u16(self.duration);
        }
    }

    fn decode_payload(buf: &mut Bytes) -> Result<Self, DecodeError> {
        if buf.is_empty() {
            return Ok(Disconnect::default());
        }
        Ok(Disconnect {
            duration: buf.checked_u16()?,
        })
    }
}
