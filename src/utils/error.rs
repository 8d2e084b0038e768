//! Error types shared across the gateway.
//!
//! Decode failures live next to the codec (`protocol::DecodeError`) and
//! session failures next to the stores (`persistence::SessionError`); this
//! module wraps them into [`BrokerError`] for the outer layers.

use std::net::SocketAddr;

use thiserror::Error;

use crate::persistence::SessionError;
use crate::protocol::{DecodeError, EncodeError, MAX_CLIENT_ID_LEN, MessageType};

/// A well-formed packet whose content the gateway refuses. Logged and dropped
/// without a reply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("zero-length client id not allowed")]
    EmptyClientId,

    #[error("client id of {0} bytes is longer than {MAX_CLIENT_ID_LEN}")]
    ClientIdTooLong(usize),
}

#[derive(Debug, Error)]
pub enum BrokerError {
    /// The listening socket could not be bound. Fatal.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid listen address {0}")]
    Address(String),

    #[error("i/o error sending to {addr}: {source}")]
    Send {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("no reply from {0}")]
    NoReply(SocketAddr),

    #[error("expected {expected}, got {got}")]
    UnexpectedReply {
        expected: MessageType,
        got: MessageType,
    },
}

/// Checks the length rule for client ids.
pub fn validate_client_id(client_id: &str) -> Result<&str, ValidationError> {
    match client_id.len() {
        0 => Err(ValidationError::EmptyClientId),
        n if n > MAX_CLIENT_ID_LEN => Err(ValidationError::ClientIdTooLong(n)),
        _ => Ok(client_id),
    }
}
