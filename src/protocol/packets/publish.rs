use bytes::{BufMut, Bytes, BytesMut};

use super::Packet;
use crate::protocol::buf_ext::BufExt;
use crate::protocol::error::DecodeError;
use crate::protocol::flags::Flags;
use crate::protocol::{QoS, TopicIdType};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Publish {
    pub dup: bool,
    pub qos: QoS,
    pub retain: bool,
    pub topic_id_type: TopicIdType,
    pub topic_id: u16,
    pub message_id: u16,
    pub data: Bytes,
}

impl Publish {
    fn flags(&self) -> Flags {
        Flags::default()
            .with_dup(self.dup)
            .with_qos(self.qos)
            .with_retain(self.retain)
            .with_topic_id_type(self.topic_id_type)
    }
}

impl Packet for Publish {
    fn payload_len(&self) -> usize {
        5 + self.data.len()
    }

    fn encode_payload(&self, buf: &mut BytesMut) {
        buf.put_u8(self.flags().bits());
        buf.put_u16(self.topic_id);
        buf.put_u16(self.message_id);
        buf.put_slice(&self.data);
    }

    fn decode_payload(buf: &mut Bytes) -> Result<Self, DecodeError> {
        let flags = Flags::from_byte(buf.checked_u8()?);
        let topic_id = buf.checked_u16()?;
        let message_id = buf.checked_u16()?;
        Ok(Publish {
            dup: flags.dup(),
            qos: flags.qos(),
            retain: flags.retain(),
            topic_id_type: flags.topic_id_type(),
            topic_id,
            message_id,
            data: buf.rest(),
        })
    }
}

super::topic_ack_packet!(PubAck);
super::message_id_packet!(
    /// QoS 2, third step.
    PubComp
);
super::message_id_packet!(
    /// QoS 2, first step.
    PubRec
);
super::message_id_packet!(
    /// QoS 2, second step.
    PubRel
);
