use thiserror::Error;

/// Malformed input. The datagram that produced it is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("truncated frame: needed {needed} more bytes, {remaining} remaining")]
    Truncated { needed: usize, remaining: usize },

    #[error("declared length {declared} does not match {actual} bytes received")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("declared length {0} is shorter than its own header")]
    InvalidLength(u16),

    #[error("unknown message type 0x{0:02X}")]
    UnknownMessageType(u8),

    #[error("encapsulated messages are not supported")]
    Encapsulated,

    #[error("invalid return code 0x{0:02X}")]
    InvalidReturnCode(u8),

    #[error("reserved topic id type")]
    ReservedTopicIdType,

    #[error("short topic name must be 2 bytes, got {0}")]
    InvalidShortTopic(usize),

    #[error("text field is not valid UTF-8")]
    InvalidUtf8,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("payload of {0} bytes does not fit a 16-bit frame length")]
    FrameTooLarge(usize),
}
