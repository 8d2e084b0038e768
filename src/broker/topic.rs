//! Topic registry
//!
//! Bidirectional mapping between topic names and the 16-bit ids used on the
//! wire. Ids are handed out strictly increasing from 1; id 0 means "none".
//! Entries are never removed.
//!
//! All operations go through one `RwLock`. Lookups by id are O(1); lookups by
//! name scan the table, which is fine at sensor-network scale.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::protocol::NO_TOPIC_ID;

#[derive(Debug, Default)]
struct TopicTable {
    names: HashMap<u16, String>,
    next: u16,
}

impl TopicTable {
    fn find(&self, name: &str) -> u16 {
        self.names
            .iter()
            .find(|(_, n)| n.as_str() == name)
            .map(|(id, _)| *id)
            .unwrap_or(NO_TOPIC_ID)
    }

    fn insert(&mut self, name: &str) -> Option<u16> {
        let id = self.next.checked_add(1)?;
        self.next = id;
        self.names.insert(id, name.to_string());
        Some(id)
    }
}

#[derive(Debug, Default)]
pub struct TopicRegistry {
    table: RwLock<TopicTable>,
}

impl TopicRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains_topic(&self, name: &str) -> bool {
        self.get_id(name) != NO_TOPIC_ID
    }

    pub fn contains_id(&self, id: u16) -> bool {
        !self.get_topic(id).is_empty()
    }

    /// Returns 0 when the name is unknown.
    pub fn get_id(&self, name: &str) -> u16 {
        self.table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .find(name)
    }

    /// Returns an empty string when the id is unknown.
    pub fn get_topic(&self, id: u16) -> String {
        self.table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .names
            .get(&id)
            .cloned()
            .unwrap_or_default()
    }

    /// Unconditionally allocates the next id for `name`. Returns 0 once the
    /// id space is exhausted. Prefer [`TopicRegistry::get_or_create`].
    pub fn put_topic(&self, name: &str) -> u16 {
        self.table
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name)
            .unwrap_or(NO_TOPIC_ID)
    }

    /// Resolves `name` to its id, allocating one if it has never been seen.
    /// The lookup and the insert happen under the same write lock, so two
    /// callers racing on a new name always get the same id.
    pub fn get_or_create(&self, name: &str) -> u16 {
        let mut table = self.table.write().unwrap_or_else(PoisonError::into_inner);
        match table.find(name) {
            NO_TOPIC_ID => table.insert(name).unwrap_or(NO_TOPIC_ID),
            id => id,
        }
    }

    pub fn len(&self) -> usize {
        self.table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .names
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Whether a topic name contains a `+` or `#` wildcard level.
pub fn contains_wildcard(topic: &str) -> bool {
    topic.split('/').any(|level| level == "+" || level == "#")
}

/// Names that may be given an id: non-empty and wildcard-free.
pub fn is_registrable(topic: &str) -> bool {
    !topic.is_empty() && !contains_wildcard(topic)
}
