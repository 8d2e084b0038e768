//! The shared flag byte.
//!
//! Bit layout (MSB first): `DUP | QoS(2) | Retain | Will | CleanSession | TopicIdType(2)`.

use super::{QoS, TopicIdType};

pub const TOPIC_ID_TYPE: u8 = 0x03;
pub const CLEAN_SESSION: u8 = 0x04;
pub const WILL: u8 = 0x08;
pub const RETAIN: u8 = 0x10;
pub const QOS: u8 = 0x60;
pub const DUP: u8 = 0x80;

const QOS_SHIFT: u8 = 5;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct Flags(u8);

impl Flags {
    pub const fn from_byte(byte: u8) -> Self {
        Flags(byte)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn dup(self) -> bool {
        self.0 & DUP == DUP
    }

    pub const fn qos(self) -> QoS {
        QoS::from_bits((self.0 & QOS) >> QOS_SHIFT)
    }

    pub const fn retain(self) -> bool {
        self.0 & RETAIN == RETAIN
    }

    pub const fn will(self) -> bool {
        self.0 & WILL == WILL
    }

    pub const fn clean_session(self) -> bool {
        self.0 & CLEAN_SESSION == CLEAN_SESSION
    }

    pub const fn topic_id_type(self) -> TopicIdType {
        TopicIdType::from_bits(self.0)
    }

    pub const fn with_dup(self, on: bool) -> Self {
        self.with_bit(DUP, on)
    }

    pub const fn with_qos(self, qos: QoS) -> Self {
        Flags((self.0 & !QOS) | (((qos as u8) << QOS_SHIFT) & QOS))
    }

    pub const fn with_retain(self, on: bool) -> Self {
        self.with_bit(RETAIN, on)
    }

    pub const fn with_will(self, on: bool) -> Self {
        self.with_bit(WILL, on)
    }

    pub const fn with_clean_session(self, on: bool) -> Self {
        self.with_bit(CLEAN_SESSION, on)
    }

    pub const fn with_topic_id_type(self, t: TopicIdType) -> Self {
        Flags((self.0 & !TOPIC_ID_TYPE) | ((t as u8) & TOPIC_ID_TYPE))
    }

    const fn with_bit(self, mask: u8, on: bool) -> Self {
        if on { Flags(self.0 | mask) } else { Flags(self.0 & !mask) }
    }
}
