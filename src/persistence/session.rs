use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::SessionError;
use crate::protocol::QoS;
use crate::protocol::packets::Connect;

/// The parts of a CONNECT a session remembers.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct ConnectInfo {
    pub client_id: String,
    pub clean_session: bool,
    pub will: bool,
    pub duration: u16,
}

impl From<&Connect> for ConnectInfo {
    fn from(connect: &Connect) -> Self {
        ConnectInfo {
            client_id: connect.client_id.clone(),
            clean_session: connect.clean_session,
            will: connect.will,
            duration: connect.duration,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectState {
    #[default]
    Active,
    /// Sleeping for the given number of seconds.
    Asleep(u16),
    Disconnected,
}

/// Reserved for the will a client announced with the Will flag. The topic and
/// message exchange that would fill it is not handled by the gateway.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct WillPlaceholder {
    pub topic: String,
    pub qos: u8,
    pub retain: bool,
    pub message: Vec<u8>,
}

/// Last publish a client sent with the Retain flag.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RetainedMessage {
    pub topic_id: u16,
    pub qos: u8,
    pub data: Vec<u8>,
}

/// Serializable form of a session.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionSnapshot {
    pub id: String,
    pub initialized: bool,
    pub connect: Option<ConnectInfo>,
    pub state: ConnectState,
    pub will: Option<WillPlaceholder>,
    pub retained: Option<RetainedMessage>,
    /// Subscribed topic name to granted QoS.
    pub topics: BTreeMap<String, u8>,
    /// Unix seconds of the last connect or state change.
    pub updated_at: i64,
}

#[derive(Debug)]
pub struct Session {
    inner: Mutex<SessionSnapshot>,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self::from_snapshot(SessionSnapshot {
            id: id.into(),
            ..SessionSnapshot::default()
        })
    }

    pub fn from_snapshot(snapshot: SessionSnapshot) -> Self {
        Self {
            inner: Mutex::new(snapshot),
        }
    }

    fn inner(&self) -> MutexGuard<'_, SessionSnapshot> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn id(&self) -> String {
        self.inner().id.clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner().clone()
    }

    pub fn is_initialized(&self) -> bool {
        self.inner().initialized
    }

    /// First CONNECT for this session. Runs once.
    pub fn init(&self, connect: ConnectInfo) -> Result<(), SessionError> {
        let mut inner = self.inner();
        if inner.initialized {
            return Err(SessionError::AlreadyInitialized(inner.id.clone()));
        }
        inner.will = connect.will.then(WillPlaceholder::default);
        inner.topics.clear();
        inner.connect = Some(connect);
        inner.state = ConnectState::Active;
        inner.initialized = true;
        inner.updated_at = Utc::now().timestamp();
        Ok(())
    }

    /// Later CONNECT on a resumed session.
    pub fn update(&self, connect: ConnectInfo) {
        let mut inner = self.inner();
        inner.connect = Some(connect);
        inner.state = ConnectState::Active;
        inner.updated_at = Utc::now().timestamp();
    }

    pub fn connect_info(&self) -> Option<ConnectInfo> {
        self.inner().connect.clone()
    }

    pub fn state(&self) -> ConnectState {
        self.inner().state
    }

    pub fn set_state(&self, state: ConnectState) {
        let mut inner = self.inner();
        inner.state = state;
        inner.updated_at = Utc::now().timestamp();
    }

    pub fn updated_at(&self) -> i64 {
        self.inner().updated_at
    }

    pub fn will(&self) -> Option<WillPlaceholder> {
        self.inner().will.clone()
    }

    pub fn retain_message(&self, message: RetainedMessage) {
        self.inner().retained = Some(message);
    }

    pub fn retained(&self) -> Option<RetainedMessage> {
        self.inner().retained.clone()
    }

    pub fn add_topic(&self, topic: &str, qos: QoS) -> Result<(), SessionError> {
        let mut inner = self.initialized()?;
        inner.topics.insert(topic.to_string(), qos as u8);
        Ok(())
    }

    pub fn remove_topic(&self, topic: &str) -> Result<(), SessionError> {
        let mut inner = self.initialized()?;
        inner.topics.remove(topic);
        Ok(())
    }

    /// Subscribed topics with their QoS, ordered by name.
    pub fn topics(&self) -> Result<Vec<(String, u8)>, SessionError> {
        let inner = self.initialized()?;
        Ok(inner
            .topics
            .iter()
            .map(|(topic, qos)| (topic.clone(), *qos))
            .collect())
    }

    fn initialized(&self) -> Result<MutexGuard<'_, SessionSnapshot>, SessionError> {
        let inner = self.inner();
        if inner.initialized {
            Ok(inner)
        } else {
            Err(SessionError::NotInitialized(inner.id.clone()))
        }
    }
}
