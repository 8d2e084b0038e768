use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::Packet;
use crate::protocol::buf_ext::BufExt;
use crate::protocol::error::DecodeError;
use crate::protocol::flags::Flags;
use crate::protocol::{QoS, TopicIdType};

/// The topic of a SUBSCRIBE or UNSUBSCRIBE. The variant decides both the
/// `TopicIdType` bits and which field is on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicRef {
    Name(String),
    Predefined(u16),
    Short(String),
}

impl TopicRef {
    pub fn topic_id_type(&self) -> TopicIdType {
        match self {
            TopicRef::Name(_) => TopicIdType::Normal,
            TopicRef::Predefined(_) => TopicIdType::Predefined,
            TopicRef::Short(_) => TopicIdType::Short,
        }
    }

    fn wire_len(&self) -> usize {
        match self {
            TopicRef::Name(name) | TopicRef::Short(name) => name.len(),
            TopicRef::Predefined(_) => 2,
        }
    }

    fn encode(&self, buf: &mut BytesMut) {
        match self {
            TopicRef::Name(name) | TopicRef::Short(name) => buf.put_slice(name.as_bytes()),
            TopicRef::Predefined(id) => buf.put_u16(*id),
        }
    }

    fn decode(topic_id_type: TopicIdType, buf: &mut Bytes) -> Result<Self, DecodeError> {
        match topic_id_type {
            TopicIdType::Normal => Ok(TopicRef::Name(buf.rest_string()?)),
            TopicIdType::Predefined => Ok(TopicRef::Predefined(buf.checked_u16()?)),
            TopicIdType::Short => match buf.remaining() {
                2 => Ok(TopicRef::Short(buf.rest_string()?)),
                n => Err(DecodeError::InvalidShortTopic(n)),
            },
            TopicIdType::Reserved => Err(DecodeError::ReservedTopicIdType),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscribe {
    pub dup: bool,
    pub qos: QoS,
    pub message_id: u16,
    pub topic: TopicRef,
}

impl Packet for Subscribe {
    fn payload_len(&self) -> usize {
        3 + self.topic.wire_len()
    }

    fn encode_payload(&self, buf: &mut BytesMut) {
        let flags = Flags::default()
            .with_dup(self.dup)
            .with_qos(self.qos)
            .with_topic_id_type(self.topic.topic_id_type());
        buf.put_u8(flags.bits());
        buf.put_u16(self.message_id);
        self.topic.encode(buf);
    }

    fn decode_payload(buf: &mut Bytes) -> Result<Self, DecodeError> {
        let flags = Flags::from_byte(buf.checked_u8()?);
        let message_id = buf.checked_u16()?;
        Ok(Subscribe {
            dup: flags.dup(),
            qos: flags.qos(),
            message_id,
            topic: TopicRef::decode(flags.topic_id_type(), buf)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SubAck {
    /// Granted QoS.
    pub qos: QoS,
    pub topic_id: u16,
    pub message_id: u16,
    pub return_code: crate::protocol::ReturnCode,
}

impl Packet for SubAck {
    fn payload_len(&self) -> usize {
        6
    }

    fn encode_payload(&self, buf: &mut BytesMut) {
        buf.put_u8(Flags::default().with_qos(self.qos).bits());
        buf.put_u16(self.topic_id);
        buf.put_u16(self.message_id);
        buf.put_u8(self.return_code as u8);
    }

    fn decode_payload(buf: &mut Bytes) -> Result<Self, DecodeError> {
        let flags = Flags::from_byte(buf.checked_u8()?);
        let topic_id = buf.checked_u16()?;
        let message_id = buf.checked_u16()?;
        let return_code = crate::protocol::ReturnCode::from_u8(buf.checked_u8()?)?;
        Ok(SubAck {
            qos: flags.qos(),
            topic_id,
            message_id,
            return_code,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unsubscribe {
    pub message_id: u16,
    pub topic: TopicRef,
}

impl Packet for Unsubscribe {
    fn payload_len(&self) -> usize {
        3 + self.topic.wire_len()
    }

    fn encode_payload(&self, buf: &mut BytesMut) {
        let flags = Flags::default().with_topic_id_type(self.topic.topic_id_type());
        buf.put_u8(flags.bits());
        buf.put_u16(self.message_id);
        self.topic.encode(buf);
    }

    fn decode_payload(buf: &mut Bytes) -> Result<Self, DecodeError> {
        let flags = Flags::from_byte(buf.checked_u8()?);
        let message_id = buf.checked_u16()?;
        Ok(Unsubscribe {
            message_id,
            topic: TopicRef::decode(flags.topic_id_type(), buf)?,
        })
    }
}

super::message_id_packet!(UnsubAck);
