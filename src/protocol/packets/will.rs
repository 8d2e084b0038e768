use bytes::{BufMut, Bytes, BytesMut};

use super::Packet;
use crate::protocol::QoS;
use crate::protocol::buf_ext::BufExt;
use crate::protocol::error::DecodeError;
use crate::protocol::flags::Flags;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WillTopicDetails {
    pub qos: QoS,
    pub retain: bool,
    pub topic: String,
}

/// Payload shared by WILLTOPIC and WILLTOPICUPD. `None` is the empty form,
/// which clears the will.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WillTopic {
    pub details: Option<WillTopicDetails>,
}

impl Packet for WillTopic {
    fn payload_len(&self) -> usize {
        match &self.details {
            None => 0,
            Some(d) => 1 + d.topic.len(),
        }
    }

    fn encode_payload(&self, buf: &mut BytesMut) {
        if let Some(d) = &self.details {
            let flags = Flags::default().with_qos(d.qos).with_retain(d.retain);
            buf.put_u8(flags.bits());
            buf.put_slice(d.topic.as_bytes());
        }
    }

    fn decode_payload(buf: &mut Bytes) -> Result<Self, DecodeError> {
        if buf.is_empty() {
            return Ok(WillTopic { details: None });
        }
        let flags = Flags::from_byte(buf.checked_u8()?);
        Ok(WillTopic {
            details: Some(WillTopicDetails {
                qos: flags.qos(),
                retain: flags.retain(),
                topic: buf.rest_string()?,
            }),
        })
    }
}

/// Payload shared by WILLMSG and WILLMSGUPD.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WillMsg {
    pub message: Bytes,
}

impl Packet for WillMsg {
    fn payload_len(&self) -> usize {
        self.message.len()
    }

    fn encode_payload(&self, buf: &mut BytesMut) {
        buf.put_slice(&self.message);
    }

    fn decode_payload(buf: &mut Bytes) -> Result<Self, DecodeError> {
        Ok(WillMsg {
            message: buf.rest(),
        })
    }
}

super::return_code_packet!(WillTopicResp);
super::return_code_packet!(WillMsgResp);
