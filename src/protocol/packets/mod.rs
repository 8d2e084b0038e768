//! Per-type payload layouts.
//!
//! Each packet knows how long its payload is, how to write it and how to read
//! it back. Framing (the header) is handled one level up in `message`.

mod connection;
mod gateway;
mod publish;
mod register;
mod subscribe;
mod will;

use bytes::{Bytes, BytesMut};

use super::error::DecodeError;

pub use connection::{ConnAck, Connect, Disconnect, PROTOCOL_ID, PingReq};
pub use gateway::{Advertise, GwInfo, SearchGw};
pub use publish::{PubAck, PubComp, PubRec, PubRel, Publish};
pub use register::{RegAck, Register};
pub use subscribe::{SubAck, Subscribe, TopicRef, UnsubAck, Unsubscribe};
pub use will::{WillMsg, WillMsgResp, WillTopic, WillTopicDetails, WillTopicResp};

pub trait Packet: Sized {
    fn payload_len(&self) -> usize;

    fn encode_payload(&self, buf: &mut BytesMut);

    /// `buf` holds exactly this packet's payload.
    fn decode_payload(buf: &mut Bytes) -> Result<Self, DecodeError>;
}

/// Packets whose whole payload is a single return code.
macro_rules! return_code_packet {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        pub struct $name {
            pub return_code: $crate::protocol::ReturnCode,
        }

        impl $crate::protocol::packets::Packet for $name {
            fn payload_len(&self) -> usize {
                1
            }

            fn encode_payload(&self, buf: &mut ::bytes::BytesMut) {
                ::bytes::BufMut::put_u8(buf, self.return_code as u8);
            }

            fn decode_payload(
                buf: &mut ::bytes::Bytes,
            ) -> Result<Self, $crate::protocol::DecodeError> {
                use $crate::protocol::buf_ext::BufExt;
                let return_code = $crate::protocol::ReturnCode::from_u8(buf.checked_u8()?)?;
                Ok($name { return_code })
            }
        }
    };
}

/// Packets whose whole payload is a message id.
macro_rules! message_id_packet {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        pub struct $name {
            pub message_id: u16,
        }

        impl $crate::protocol::packets::Packet for $name {
            fn payload_len(&self) -> usize {
                2
            }

            fn encode_payload(&self, buf: &mut ::bytes::BytesMut) {
                ::bytes::BufMut::put_u16(buf, self.message_id);
            }

            fn decode_payload(
                buf: &mut ::bytes::Bytes,
            ) -> Result<Self, $crate::protocol::DecodeError> {
                use $crate::protocol::buf_ext::BufExt;
                Ok($name {
                    message_id: buf.checked_u16()?,
                })
            }
        }
    };
}

/// `topicId:u16 msgId:u16 returnCode:u8` acknowledgements.
macro_rules! topic_ack_packet {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        pub struct $name {
            pub topic_id: u16,
            pub message_id: u16,
            pub return_code: $crate::protocol::ReturnCode,
        }

        impl $crate::protocol::packets::Packet for $name {
            fn payload_len(&self) -> usize {
                5
            }

            fn encode_payload(&self, buf: &mut ::bytes::BytesMut) {
                ::bytes::BufMut::put_u16(buf, self.topic_id);
                ::bytes::BufMut::put_u16(buf, self.message_id);
                ::bytes::BufMut::put_u8(buf, self.return_code as u8);
            }

            fn decode_payload(
                buf: &mut ::bytes::Bytes,
            ) -> Result<Self, $crate::protocol::DecodeError> {
                use $crate::protocol::buf_ext::BufExt;
                let topic_id = buf.checked_u16()?;
                let message_id = buf.checked_u16()?;
                let return_code = $crate::protocol::ReturnCode::from_u8(buf.checked_u8()?)?;
                Ok($name {
                    topic_id,
                    message_id,
                    return_code,
                })
            }
        }
    };
}

pub(crate) use {message_id_packet, return_code_packet, topic_ack_packet};
