//! Packet codec
//!
//! Everything needed to turn a UDP datagram into a typed [`Message`] and back:
//! - `header`: the variable-length frame header (1 or 3 length bytes)
//! - `flags`: the shared flag byte used by CONNECT, PUBLISH, SUBSCRIBE, ...
//! - `packets`: one struct per message kind with its payload layout
//! - `message`: the closed [`Message`] sum type plus [`decode`] / [`encode`]
//!
//! The codec is pure: no shared state, no I/O. Callers hand it exactly one
//! datagram and get exactly one message (or a [`DecodeError`]) back.

mod buf_ext;
pub mod error;
pub mod flags;
pub mod header;
pub mod message;
pub mod packets;

pub use error::{DecodeError, EncodeError};
pub use flags::Flags;
pub use header::Header;
pub use message::{Message, decode, encode};

/// UDP-safe ceiling for a single datagram.
pub const MAX_DATAGRAM_SIZE: usize = 1500;

/// Valid client ids are 1..=23 bytes long.
pub const MAX_CLIENT_ID_LEN: usize = 23;

/// Topic id 0 is reserved and means "no id".
pub const NO_TOPIC_ID: u16 = 0;

/// Message-type codes carried in the second header byte.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MessageType {
    Advertise = 0x00,
    SearchGw = 0x01,
    GwInfo = 0x02,
    Connect = 0x04,
    ConnAck = 0x05,
    WillTopicReq = 0x06,
    WillTopic = 0x07,
    WillMsgReq = 0x08,
    WillMsg = 0x09,
    Register = 0x0A,
    RegAck = 0x0B,
    Publish = 0x0C,
    PubAck = 0x0D,
    PubComp = 0x0E,
    PubRec = 0x0F,
    PubRel = 0x10,
    Subscribe = 0x12,
    SubAck = 0x13,
    Unsubscribe = 0x14,
    UnsubAck = 0x15,
    PingReq = 0x16,
    PingResp = 0x17,
    Disconnect = 0x18,
    WillTopicUpd = 0x1A,
    WillTopicResp = 0x1B,
    WillMsgUpd = 0x1C,
    WillMsgResp = 0x1D,
}

impl MessageType {
    /// Code of an encapsulated message. Recognised but not handled.
    pub const ENCAPSULATED: u8 = 0xFE;

    pub const fn from_u8(code: u8) -> Option<Self> {
        let t = match code {
            0x00 => MessageType::Advertise,
            0x01 => MessageType::SearchGw,
            0x02 => MessageType::GwInfo,
            0x04 => MessageType::Connect,
            0x05 => MessageType::ConnAck,
            0x06 => MessageType::WillTopicReq,
            0x07 => MessageType::WillTopic,
            0x08 => MessageType::WillMsgReq,
            0x09 => MessageType::WillMsg,
            0x0A => MessageType::Register,
            0x0B => MessageType::RegAck,
            0x0C => MessageType::Publish,
            0x0D => MessageType::PubAck,
            0x0E => MessageType::PubComp,
            0x0F => MessageType::PubRec,
            0x10 => MessageType::PubRel,
            0x12 => MessageType::Subscribe,
            0x13 => MessageType::SubAck,
            0x14 => MessageType::Unsubscribe,
            0x15 => MessageType::UnsubAck,
            0x16 => MessageType::PingReq,
            0x17 => MessageType::PingResp,
            0x18 => MessageType::Disconnect,
            0x1A => MessageType::WillTopicUpd,
            0x1B => MessageType::WillTopicResp,
            0x1C => MessageType::WillMsgUpd,
            0x1D => MessageType::WillMsgResp,
            _ => return None,
        };
        Some(t)
    }

    pub const fn code(self) -> u8 {
        self as u8
    }

    pub const fn name(self) -> &'static str {
        match self {
            MessageType::Advertise => "ADVERTISE",
            MessageType::SearchGw => "SEARCHGW",
            MessageType::GwInfo => "GWINFO",
            MessageType::Connect => "CONNECT",
            MessageType::ConnAck => "CONNACK",
            MessageType::WillTopicReq => "WILLTOPICREQ",
            MessageType::WillTopic => "WILLTOPIC",
            MessageType::WillMsgReq => "WILLMSGREQ",
            MessageType::WillMsg => "WILLMSG",
            MessageType::Register => "REGISTER",
            MessageType::RegAck => "REGACK",
            MessageType::Publish => "PUBLISH",
            MessageType::PubAck => "PUBACK",
            MessageType::PubComp => "PUBCOMP",
            MessageType::PubRec => "PUBREC",
            MessageType::PubRel => "PUBREL",
            MessageType::Subscribe => "SUBSCRIBE",
            MessageType::SubAck => "SUBACK",
            MessageType::Unsubscribe => "UNSUBSCRIBE",
            MessageType::UnsubAck => "UNSUBACK",
            MessageType::PingReq => "PINGREQ",
            MessageType::PingResp => "PINGRESP",
            MessageType::Disconnect => "DISCONNECT",
            MessageType::WillTopicUpd => "WILLTOPICUPD",
            MessageType::WillTopicResp => "WILLTOPICRESP",
            MessageType::WillMsgUpd => "WILLMSGUPD",
            MessageType::WillMsgResp => "WILLMSGRESP",
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Return code carried by CONNACK, REGACK, PUBACK, SUBACK and the will responses.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ReturnCode {
    #[default]
    Accepted = 0x00,
    RejectedCongestion = 0x01,
    RejectedInvalidTopicId = 0x02,
    RejectedNotSupported = 0x03,
}

impl ReturnCode {
    pub fn from_u8(value: u8) -> Result<Self, DecodeError> {
        match value {
            0x00 => Ok(ReturnCode::Accepted),
            0x01 => Ok(ReturnCode::RejectedCongestion),
            0x02 => Ok(ReturnCode::RejectedInvalidTopicId),
            0x03 => Ok(ReturnCode::RejectedNotSupported),
            other => Err(DecodeError::InvalidReturnCode(other)),
        }
    }
}

/// How a topic is referenced on the wire (low two bits of the flag byte).
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum TopicIdType {
    /// Topic id assigned by REGISTER, or a full topic name in SUBSCRIBE.
    #[default]
    Normal = 0x00,
    Predefined = 0x01,
    Short = 0x02,
    Reserved = 0x03,
}

impl TopicIdType {
    pub const fn from_bits(bits: u8) -> Self {
        match bits & flags::TOPIC_ID_TYPE {
            0x00 => TopicIdType::Normal,
            0x01 => TopicIdType::Predefined,
            0x02 => TopicIdType::Short,
            _ => TopicIdType::Reserved,
        }
    }
}

/// Delivery level from the two QoS bits.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum QoS {
    #[default]
    AtMostOnce = 0,
    AtLeastOnce = 1,
    ExactlyOnce = 2,
    /// Encoded as 0b11: publish without a connection, never acknowledged.
    FireAndForget = 3,
}

impl QoS {
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => QoS::AtMostOnce,
            1 => QoS::AtLeastOnce,
            2 => QoS::ExactlyOnce,
            _ => QoS::FireAndForget,
        }
    }

    /// QoS 1 and 2 expect an acknowledgement.
    // QoS 3 gets no PUBACK even though its bits are non-zero.
    pub const fn requires_ack(self) -> bool {
        matches!(self, QoS::AtLeastOnce | QoS::ExactlyOnce)
    }
}

#[cfg(test)]
mod tests;
