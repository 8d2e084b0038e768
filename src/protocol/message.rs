//! The closed set of messages and the frame-level codec.

use bytes::{Buf, Bytes, BytesMut};

use super::MessageType;
use super::error::{DecodeError, EncodeError};
use super::header::Header;
use super::packets::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Advertise(Advertise),
    SearchGw(SearchGw),
    GwInfo(GwInfo),
    Connect(Connect),
    ConnAck(ConnAck),
    WillTopicReq,
    WillTopic(WillTopic),
    WillMsgReq,
    WillMsg(WillMsg),
    Register(Register),
    RegAck(RegAck),
    Publish(Publish),
    PubAck(PubAck),
    PubComp(PubComp),
    PubRec(PubRec),
    PubRel(PubRel),
    Subscribe(Subscribe),
    SubAck(SubAck),
    Unsubscribe(Unsubscribe),
    UnsubAck(UnsubAck),
    PingReq(PingReq),
    PingResp,
    Disconnect(Disconnect),
    WillTopicUpd(WillTopic),
    WillTopicResp(WillTopicResp),
    WillMsgUpd(WillMsg),
    WillMsgResp(WillMsgResp),
}

impl Message {
    pub fn message_type(&self) -> MessageType {
        match self {
            Message::Advertise(_) => MessageType::Advertise,
            Message::SearchGw(_) => MessageType::SearchGw,
            Message::GwInfo(_) => MessageType::GwInfo,
            Message::Connect(_) => MessageType::Connect,
            Message::ConnAck(_) => MessageType::ConnAck,
            Message::WillTopicReq => MessageType::WillTopicReq,
            Message::WillTopic(_) => MessageType::WillTopic,
            Message::WillMsgReq => MessageType::WillMsgReq,
            Message::WillMsg(_) => MessageType::WillMsg,
            Message::Register(_) => MessageType::Register,
            Message::RegAck(_) => MessageType::RegAck,
            Message::Publish(_) => MessageType::Publish,
            Message::PubAck(_) => MessageType::PubAck,
            Message::PubComp(_) => MessageType::PubComp,
            Message::PubRec(_) => MessageType::PubRec,
            Message::PubRel(_) => MessageType::PubRel,
            Message::Subscribe(_) => MessageType::Subscribe,
            Message::SubAck(_) => MessageType::SubAck,
            Message::Unsubscribe(_) => MessageType::Unsubscribe,
            Message::UnsubAck(_) => MessageType::UnsubAck,
            Message::PingReq(_) => MessageType::PingReq,
            Message::PingResp => MessageType::PingResp,
            Message::Disconnect(_) => MessageType::Disconnect,
            Message::WillTopicUpd(_) => MessageType::WillTopicUpd,
            Message::WillTopicResp(_) => MessageType::WillTopicResp,
            Message::WillMsgUpd(_) => MessageType::WillMsgUpd,
            Message::WillMsgResp(_) => MessageType::WillMsgResp,
        }
    }

    fn payload_len(&self) -> usize {
        match self {
            Message::WillTopicReq | Message::WillMsgReq | Message::PingResp => 0,
            Message::Advertise(p) => p.payload_len(),
            Message::SearchGw(p) => p.payload_len(),
            Message::GwInfo(p) => p.payload_len(),
            Message::Connect(p) => p.payload_len(),
            Message::ConnAck(p) => p.payload_len(),
            Message::WillTopic(p) | Message::WillTopicUpd(p) => p.payload_len(),
            Message::WillMsg(p) | Message::WillMsgUpd(p) => p.payload_len(),
            Message::Register(p) => p.payload_len(),
            Message::RegAck(p) => p.payload_len(),
            Message::Publish(p) => p.payload_len(),
            Message::PubAck(p) => p.payload_len(),
            Message::PubComp(p) => p.payload_len(),
            Message::PubRec(p) => p.payload_len(),
            Message::PubRel(p) => p.payload_len(),
            Message::Subscribe(p) => p.payload_len(),
            Message::SubAck(p) => p.payload_len(),
            Message::Unsubscribe(p) => p.payload_len(),
            Message::UnsubAck(p) => p.payload_len(),
            Message::PingReq(p) => p.payload_len(),
            Message::Disconnect(p) => p.payload_len(),
            Message::WillTopicResp(p) => p.payload_len(),
            Message::WillMsgResp(p) => p.payload_len(),
        }
    }

    fn encode_payload(&self, buf: &mut BytesMut) {
        match self {
            Message::WillTopicReq | Message::WillMsgReq | Message::PingResp => {}
            Message::Advertise(p) => p.encode_payload(buf),
            Message::SearchGw(p) => p.encode_payload(buf),
            Message::GwInfo(p) => p.encode_payload(buf),
            Message::Connect(p) => p.encode_payload(buf),
            Message::ConnAck(p) => p.encode_payload(buf),
            Message::WillTopic(p) | Message::WillTopicUpd(p) => p.encode_payload(buf),
            Message::WillMsg(p) | Message::WillMsgUpd(p) => p.encode_payload(buf),
            Message::Register(p) => p.encode_payload(buf),
            Message::RegAck(p) => p.encode_payload(buf),
            Message::Publish(p) => p.encode_payload(buf),
            Message::PubAck(p) => p.encode_payload(buf),
            Message::PubComp(p) => p.encode_payload(buf),
            Message::PubRec(p) => p.encode_payload(buf),
            Message::PubRel(p) => p.encode_payload(buf),
            Message::Subscribe(p) => p.encode_payload(buf),
            Message::SubAck(p) => p.encode_payload(buf),
            Message::Unsubscribe(p) => p.encode_payload(buf),
            Message::UnsubAck(p) => p.encode_payload(buf),
            Message::PingReq(p) => p.encode_payload(buf),
            Message::Disconnect(p) => p.encode_payload(buf),
            Message::WillTopicResp(p) => p.encode_payload(buf),
            Message::WillMsgResp(p) => p.encode_payload(buf),
        }
    }

    fn decode_payload(message_type: MessageType, buf: &mut Bytes) -> Result<Self, DecodeError> {
        let msg = match message_type {
            MessageType::Advertise => Message::Advertise(Advertise::decode_payload(buf)?),
            MessageType::SearchGw => Message::SearchGw(SearchGw::decode_payload(buf)?),
            MessageType::GwInfo => Message::GwInfo(GwInfo::decode_payload(buf)?),
            MessageType::Connect => Message::Connect(Connect::decode_payload(buf)?),
            MessageType::ConnAck => Message::ConnAck(ConnAck::decode_payload(buf)?),
            MessageType::WillTopicReq => Message::WillTopicReq,
            MessageType::WillTopic => Message::WillTopic(WillTopic::decode_payload(buf)?),
            MessageType::WillMsgReq => Message::WillMsgReq,
            MessageType::WillMsg => Message::WillMsg(WillMsg::decode_payload(buf)?),
            MessageType::Register => Message::Register(Register::decode_payload(buf)?),
            MessageType::RegAck => Message::RegAck(RegAck::decode_payload(buf)?),
            MessageType::Publish => Message::Publish(Publish::decode_payload(buf)?),
            MessageType::PubAck => Message::PubAck(PubAck::decode_payload(buf)?),
            MessageType::PubComp => Message::PubComp(PubComp::decode_payload(buf)?),
            MessageType::PubRec => Message::PubRec(PubRec::decode_payload(buf)?),
            MessageType::PubRel => Message::PubRel(PubRel::decode_payload(buf)?),
            MessageType::Subscribe => Message::Subscribe(Subscribe::decode_payload(buf)?),
            MessageType::SubAck => Message::SubAck(SubAck::decode_payload(buf)?),
            MessageType::Unsubscribe => Message::Unsubscribe(Unsubscribe::decode_payload(buf)?),
            MessageType::UnsubAck => Message::UnsubAck(UnsubAck::decode_payload(buf)?),
            MessageType::PingReq => Message::PingReq(PingReq::decode_payload(buf)?),
            MessageType::PingResp => Message::PingResp,
            MessageType::Disconnect => Message::Disconnect(Disconnect::decode_payload(buf)?),
            MessageType::WillTopicUpd => Message::WillTopicUpd(WillTopic::decode_payload(buf)?),
            MessageType::WillTopicResp => {
                Message::WillTopicResp(WillTopicResp::decode_payload(buf)?)
            }
            MessageType::WillMsgUpd => Message::WillMsgUpd(WillMsg::decode_payload(buf)?),
            MessageType::WillMsgResp => Message::WillMsgResp(WillMsgResp::decode_payload(buf)?),
        };
        Ok(msg)
    }

    pub fn encode(&self) -> Result<Bytes, EncodeError> {
        encode(self)
    }
}

/// Decodes exactly one frame. `datagram` must hold the whole frame and
/// nothing else.
pub fn decode(datagram: &[u8]) -> Result<Message, DecodeError> {
    let mut cursor = datagram;
    let (header, header_len) = Header::decode(&mut cursor)?;

    let declared = header.length as usize;
    if declared != datagram.len() {
        return Err(DecodeError::LengthMismatch {
            declared,
            actual: datagram.len(),
        });
    }

    let message_type = match MessageType::from_u8(header.message_type) {
        Some(t) => t,
        None if header.message_type == MessageType::ENCAPSULATED => {
            return Err(DecodeError::Encapsulated);
        }
        None => return Err(DecodeError::UnknownMessageType(header.message_type)),
    };

    let mut payload = Bytes::copy_from_slice(&datagram[header_len..]);
    let msg = Message::decode_payload(message_type, &mut payload)?;
    if payload.has_remaining() {
        return Err(DecodeError::LengthMismatch {
            declared,
            actual: declared - payload.remaining(),
        });
    }
    Ok(msg)
}

pub fn encode(msg: &Message) -> Result<Bytes, EncodeError> {
    let payload_len = msg.payload_len();
    let header = Header::for_payload(msg.message_type().code(), payload_len)?;

    let mut buf = BytesMut::with_capacity(header.length as usize);
    header.encode(&mut buf);
    msg.encode_payload(&mut buf);
    debug_assert_eq!(buf.len(), header.length as usize);
    Ok(buf.freeze())
}
