use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, PoisonError, RwLock};

use super::Client;

/// All known clients, keyed by `address:port`.
///
/// A reconnect from the same address replaces the previous record. Two
/// addresses announcing the same client id are both kept; nothing arbitrates
/// between them.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: RwLock<HashMap<String, Arc<Client>>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_client(&self, addr: &SocketAddr) -> Option<Arc<Client>> {
        self.clients
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&addr.to_string())
            .cloned()
    }

    /// Inserts or replaces the record for the client's address. Returns
    /// `true` when the address was not known before.
    pub fn add_client(&self, client: Client) -> bool {
        let key = client.addr_string();
        self.clients
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, Arc::new(client))
            .is_none()
    }

    pub fn remove_client(&self, key: &str) -> Option<Arc<Client>> {
        self.clients
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
    }

    /// Snapshot of every client. The registry lock is released on return,
    /// so callers may do I/O with the result.
    pub fn clients(&self) -> Vec<Arc<Client>> {
        self.clients
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    /// Clients whose registration table maps `topic_id` to `topic`.
    pub fn subscribers_of(&self, topic_id: u16, topic: &str) -> Vec<Arc<Client>> {
        self.clients
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|c| c.registered_topic(topic_id).as_deref() == Some(topic))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.clients
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
