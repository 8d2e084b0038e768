use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::protocol::packets::Publish;

/// A connected client.
///
/// Identity fields are immutable after CONNECT. The topic table and the
/// in-flight publishes sit behind a per-client lock, so packets from the same
/// address serialize on it without touching the registry lock.
#[derive(Debug)]
pub struct Client {
    /// Identifier supplied in CONNECT (1..=23 bytes).
    pub client_id: String,

    /// Source address of the client's datagrams; replies go here.
    pub addr: SocketAddr,

    /// Set when CONNECT carried the Will flag. The will itself is not captured.
    pub will: bool,

    state: Mutex<ClientState>,
}

#[derive(Debug, Default)]
struct ClientState {
    registered_topics: HashMap<u16, String>,
    pending_messages: HashMap<u16, Publish>,
}

impl Client {
    pub fn new(client_id: impl Into<String>, addr: SocketAddr) -> Self {
        Self {
            client_id: client_id.into(),
            addr,
            will: false,
            state: Mutex::new(ClientState::default()),
        }
    }

    pub fn with_will(mut self, will: bool) -> Self {
        self.will = will;
        self
    }

    fn state(&self) -> MutexGuard<'_, ClientState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registry key: `address:port`.
    pub fn addr_string(&self) -> String {
        self.addr.to_string()
    }

    pub fn register(&self, topic_id: u16, topic: impl Into<String>) {
        self.state().registered_topics.insert(topic_id, topic.into());
    }

    pub fn unregister(&self, topic_id: u16) -> Option<String> {
        self.state().registered_topics.remove(&topic_id)
    }

    pub fn registered(&self, topic_id: u16) -> bool {
        self.state().registered_topics.contains_key(&topic_id)
    }

    pub fn registered_topic(&self, topic_id: u16) -> Option<String> {
        self.state().registered_topics.get(&topic_id).cloned()
    }

    /// Finds the id this client registered for `topic`.
    pub fn registered_id(&self, topic: &str) -> Option<u16> {
        self.state()
            .registered_topics
            .iter()
            .find(|(_, name)| name.as_str() == topic)
            .map(|(id, _)| *id)
    }

    /// Keeps one in-flight publish per topic id; a newer one replaces it.
    pub fn add_pending_message(&self, publish: Publish) {
        self.state()
            .pending_messages
            .insert(publish.topic_id, publish);
    }

    /// Removes and returns the in-flight publish for `topic_id`.
    pub fn fetch_pending_message(&self, topic_id: u16) -> Option<Publish> {
        self.state().pending_messages.remove(&topic_id)
    }

    pub fn pending_count(&self) -> usize {
        self.state().pending_messages.len()
    }
}

impl fmt::Display for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.client_id)
    }
}
