//! The `persistence` module keeps client sessions.
//!
//! A session records what a client told the gateway at CONNECT time and the
//! topics it subscribed to, so a client that reconnects without the
//! clean-session flag can pick up where it left off.
//!
//! Two backends implement [`SessionStore`]: an in-memory map and an embedded
//! `sled` database holding JSON snapshots.

pub mod memory;
pub mod session;
pub mod sled_store;

use std::fmt::Debug;
use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::config::{SessionBackend, SessionSettings};

pub use memory::MemorySessionStore;
pub use session::{ConnectInfo, ConnectState, RetainedMessage, Session, SessionSnapshot, WillPlaceholder};
pub use sled_store::SledSessionStore;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session {0} not found")]
    NotFound(String),

    #[error("session {0} is already initialized")]
    AlreadyInitialized(String),

    #[error("session {0} is not initialized")]
    NotInitialized(String),

    #[error("session storage error: {0}")]
    Storage(#[from] sled::Error),

    #[error("session serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Session provider contract.
pub trait SessionStore: Send + Sync + Debug {
    /// Creates a fresh session, replacing any previous one with the same id.
    /// An empty id is replaced by a generated one.
    fn create(&self, id: &str) -> Result<Arc<Session>, SessionError>;

    fn get(&self, id: &str) -> Result<Arc<Session>, SessionError>;

    fn delete(&self, id: &str) -> Result<(), SessionError>;

    /// Makes the current state of a live session durable.
    fn save(&self, id: &str) -> Result<(), SessionError>;

    fn count(&self) -> usize;

    fn close(&self) -> Result<(), SessionError>;
}

pub(crate) fn session_id_or_generated(id: &str) -> String {
    if id.is_empty() {
        uuid::Uuid::new_v4().to_string()
    } else {
        id.to_string()
    }
}

/// Opens the backend selected in the configuration.
pub fn open_store(settings: &SessionSettings) -> Result<Arc<dyn SessionStore>, SessionError> {
    match settings.backend {
        SessionBackend::Memory => {
            info!("Using in-memory session store");
            Ok(Arc::new(MemorySessionStore::new()))
        }
        SessionBackend::Sled => {
            info!("Using sled session store at {}", settings.path);
            Ok(Arc::new(SledSessionStore::open(&settings.path)?))
        }
    }
}

#[cfg(test)]
mod tests;
