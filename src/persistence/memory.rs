use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use super::{Session, SessionError, SessionStore, session_id_or_generated};

/// Sessions that live as long as the process.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, Arc<Session>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn create(&self, id: &str) -> Result<Arc<Session>, SessionError> {
        let id = session_id_or_generated(id);
        let session = Arc::new(Session::new(id.clone()));
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::clone(&session));
        Ok(session)
    }

    fn get(&self, id: &str) -> Result<Arc<Session>, SessionError> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(id.to_string()))
    }

    fn delete(&self, id: &str) -> Result<(), SessionError> {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
        Ok(())
    }

    // nothing to flush
    fn save(&self, _id: &str) -> Result<(), SessionError> {
        Ok(())
    }

    fn count(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn close(&self) -> Result<(), SessionError> {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        Ok(())
    }
}
