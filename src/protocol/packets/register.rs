use bytes::{BufMut, Bytes, BytesMut};

use super::Packet;
use crate::protocol::buf_ext::BufExt;
use crate::protocol::error::DecodeError;

/// Asks for a topic id for `topic_name`. Clients send `topic_id` 0.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Register {
    pub topic_id: u16,
    pub message_id: u16,
    pub topic_name: String,
}

impl Packet for Register {
    fn payload_len(&self) -> usize {
        4 + self.topic_name.len()
    }

    fn encode_payload(&self, buf: &mut BytesMut) {
        buf.put_u16(self.topic_id);
        buf.put_u16(self.message_id);
        buf.put_slice(self.topic_name.as_bytes());
    }

    fn decode_payload(buf: &mut Bytes) -> Result<Self, DecodeError> {
        let topic_id = buf.checked_u16()?;
        let message_id = buf.checked_u16()?;
        Ok(Register {
            topic_id,
            message_id,
            topic_name: buf.rest_string()?,
        })
    }
}

super::topic_ack_packet!(RegAck);
