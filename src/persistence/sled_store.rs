use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use sled::Db;
use tracing::debug;

use super::{Session, SessionError, SessionSnapshot, SessionStore, session_id_or_generated};

const SESSIONS_TREE: &str = "sessions";

/// Sessions persisted as JSON snapshots in a `sled` tree.
///
/// Sessions handed out are kept in a live cache; `save` writes the cached
/// state back. A session that is not cached is loaded from disk on `get`.
pub struct SledSessionStore {
    db: Db,
    tree: sled::Tree,
    live: RwLock<HashMap<String, Arc<Session>>>,
}

impl SledSessionStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        let db = sled::open(path)?;
        let tree = db.open_tree(SESSIONS_TREE)?;
        Ok(Self {
            db,
            tree,
            live: RwLock::new(HashMap::new()),
        })
    }

    fn persist(&self, snapshot: &SessionSnapshot) -> Result<(), SessionError> {
        let serialized = serde_json::to_vec(snapshot)?;
        self.tree.insert(snapshot.id.as_bytes(), serialized)?;
        Ok(())
    }

    fn cache(&self, session: Arc<Session>) -> Arc<Session> {
        self.live
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(session.id(), Arc::clone(&session));
        session
    }
}

impl SessionStore for SledSessionStore {
    fn create(&self, id: &str) -> Result<Arc<Session>, SessionError> {
        let session = Session::new(session_id_or_generated(id));
        self.persist(&session.snapshot())?;
        Ok(self.cache(Arc::new(session)))
    }

    fn get(&self, id: &str) -> Result<Arc<Session>, SessionError> {
        if let Some(session) = self
            .live
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
        {
            return Ok(Arc::clone(session));
        }

        let stored = self
            .tree
            .get(id.as_bytes())?
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?;
        let snapshot: SessionSnapshot = serde_json::from_slice(&stored)?;
        debug!("Loaded session {} from disk", id);
        Ok(self.cache(Arc::new(Session::from_snapshot(snapshot))))
    }

    fn delete(&self, id: &str) -> Result<(), SessionError> {
        self.live
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
        self.tree.remove(id.as_bytes())?;
        Ok(())
    }

    fn save(&self, id: &str) -> Result<(), SessionError> {
        let session = self
            .live
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?;
        self.persist(&session.snapshot())
    }

    fn count(&self) -> usize {
        self.tree.len()
    }

    /// Flushes to disk and drops the live cache. Stored sessions are kept.
    fn close(&self) -> Result<(), SessionError> {
        self.db.flush()?;
        self.live
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        Ok(())
    }
}

impl std::fmt::Debug for SledSessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SledSessionStore")
            .field("db", &"sled::Db")
            .field("sessions", &self.tree.len())
            .finish()
    }
}
