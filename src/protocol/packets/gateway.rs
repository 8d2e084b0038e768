use bytes::{BufMut, Bytes, BytesMut};

use super::Packet;
use crate::protocol::buf_ext::BufExt;
use crate::protocol::error::DecodeError;

/// Periodic gateway presence broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Advertise {
    pub gateway_id: u8,
    /// Seconds until the next ADVERTISE.
    pub duration: u16,
}

impl Packet for Advertise {
    fn payload_len(&self) -> usize {
        3
    }

    fn encode_payload(&self, buf: &mut BytesMut) {
        buf.put_u8(self.gateway_id);
        buf.put_u16(self.duration);
    }

    fn decode_payload(buf: &mut Bytes) -> Result<Self, DecodeError> {
        let gateway_id = buf.checked_u8()?;
        let duration = buf.checked_u16()?;
        Ok(Advertise {
            gateway_id,
            duration,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchGw {
    pub radius: u8,
}

impl Packet for SearchGw {
    fn payload_len(&self) -> usize {
        1
    }

    fn encode_payload(&self, buf: &mut BytesMut) {
        buf.put_u8(self.radius);
    }

    fn decode_payload(buf: &mut Bytes) -> Result<Self, DecodeError> {
        Ok(SearchGw {
            radius: buf.checked_u8()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GwInfo {
    pub gateway_id: u8,
    /// Only present when sent by a client on behalf of a gateway.
    pub gateway_address: Bytes,
}

impl Packet for GwInfo {
    fn payload_len(&self) -> usize {
        1 + self.gateway_address.len()
    }

    fn encode_payload(&self, buf: &mut BytesMut) {
        buf.put_u8(self.gateway_id);
        buf.put_slice(&self.gateway_address);
    }

    fn decode_payload(buf: &mut Bytes) -> Result<Self, DecodeError> {
        let gateway_id = buf.checked_u8()?;
        Ok(GwInfo {
            gateway_id,
            gateway_address: buf.rest(),
        })
    }
}
