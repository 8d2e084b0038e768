use std::sync::Arc;

use super::*;
use crate::protocol::QoS;

fn connect_info(client_id: &str, will: bool) -> ConnectInfo {
    ConnectInfo {
        client_id: client_id.to_string(),
        clean_session: true,
        will,
        duration: 60,
    }
}

fn stores() -> (tempfile::TempDir, Vec<Arc<dyn SessionStore>>) {
    let dir = tempfile::tempdir().unwrap();
    let memory: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());
    let sled: Arc<dyn SessionStore> =
        Arc::new(SledSessionStore::open(dir.path().join("sessions")).unwrap());
    (dir, vec![memory, sled])
}

#[test]
fn test_session_init_runs_once() {
    let session = Session::new("s1");
    session.init(connect_info("s1", false)).unwrap();
    assert!(session.is_initialized());

    let err = session.init(connect_info("s1", false)).unwrap_err();
    assert!(matches!(err, SessionError::AlreadyInitialized(id) if id == "s1"));
}

#[test]
fn test_session_topics_require_init() {
    let session = Session::new("s1");
    assert!(matches!(
        session.add_topic("room/temp", QoS::AtMostOnce),
        Err(SessionError::NotInitialized(_))
    ));
    assert!(matches!(session.topics(), Err(SessionError::NotInitialized(_))));

    session.init(connect_info("s1", false)).unwrap();
    session.add_topic("room/temp", QoS::AtLeastOnce).unwrap();
    session.add_topic("room/humidity", QoS::AtMostOnce).unwrap();
    assert_eq!(
        session.topics().unwrap(),
        vec![("room/humidity".to_string(), 0), ("room/temp".to_string(), 1)]
    );

    session.remove_topic("room/temp").unwrap();
    assert_eq!(session.topics().unwrap().len(), 1);
}

#[test]
fn test_session_will_flag_reserves_placeholder() {
    let with_will = Session::new("a");
    with_will.init(connect_info("a", true)).unwrap();
    assert_eq!(with_will.will(), Some(WillPlaceholder::default()));

    let without = Session::new("b");
    without.init(connect_info("b", false)).unwrap();
    assert!(without.will().is_none());
}

#[test]
fn test_session_update_reactivates() {
    let session = Session::new("s1");
    session.init(connect_info("s1", false)).unwrap();
    session.set_state(ConnectState::Asleep(30));

    session.update(ConnectInfo {
        duration: 120,
        ..connect_info("s1", false)
    });
    assert_eq!(session.state(), ConnectState::Active);
    assert_eq!(session.connect_info().unwrap().duration, 120);
}

#[test]
fn test_store_contract_on_every_backend() {
    let (_dir, stores) = stores();
    for store in stores {
        assert_eq!(store.count(), 0);
        let session = store.create("sensor-1").unwrap();
        assert_eq!(session.id(), "sensor-1");
        assert_eq!(store.count(), 1);

        let fetched = store.get("sensor-1").unwrap();
        assert!(Arc::ptr_eq(&session, &fetched));

        assert!(matches!(store.get("missing"), Err(SessionError::NotFound(_))));

        store.save("sensor-1").unwrap();
        store.delete("sensor-1").unwrap();
        assert_eq!(store.count(), 0);
        assert!(store.get("sensor-1").is_err());
    }
}

#[test]
fn test_store_generates_id_for_empty_name() {
    let (_dir, stores) = stores();
    for store in stores {
        let session = store.create("").unwrap();
        assert!(uuid::Uuid::parse_str(&session.id()).is_ok());
        assert!(store.get(&session.id()).is_ok());
    }
}

#[test]
fn test_memory_close_forgets_sessions() {
    let store = MemorySessionStore::new();
    store.create("a").unwrap();
    store.close().unwrap();
    assert_eq!(store.count(), 0);
}

#[test]
fn test_sled_save_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sessions");

    {
        let store = SledSessionStore::open(&path).unwrap();
        let session = store.create("sensor-1").unwrap();
        session.init(connect_info("sensor-1", false)).unwrap();
        session.add_topic("room/temp", QoS::ExactlyOnce).unwrap();
        session.set_state(ConnectState::Disconnected);
        store.save("sensor-1").unwrap();
        store.close().unwrap();
    }

    let store = SledSessionStore::open(&path).unwrap();
    assert_eq!(store.count(), 1);
    let session = store.get("sensor-1").unwrap();
    assert!(session.is_initialized());
    assert_eq!(session.state(), ConnectState::Disconnected);
    assert_eq!(session.topics().unwrap(), vec![("room/temp".to_string(), 2)]);
}

#[test]
fn test_sled_unsaved_changes_are_not_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sessions");

    {
        let store = SledSessionStore::open(&path).unwrap();
        let session = store.create("s").unwrap();
        session.init(connect_info("s", false)).unwrap();
        store.close().unwrap();
    }

    let store = SledSessionStore::open(&path).unwrap();
    assert!(!store.get("s").unwrap().is_initialized());
}

#[test]
fn test_sled_save_requires_live_session() {
    let dir = tempfile::tempdir().unwrap();
    let store = SledSessionStore::open(dir.path()).unwrap();
    assert!(matches!(store.save("nobody"), Err(SessionError::NotFound(_))));
}

#[test]
fn test_open_store_follows_settings() {
    let dir = tempfile::tempdir().unwrap();
    let memory = open_store(&crate::config::SessionSettings::default()).unwrap();
    memory.create("a").unwrap();
    assert_eq!(memory.count(), 1);

    let sled = open_store(&crate::config::SessionSettings {
        backend: crate::config::SessionBackend::Sled,
        path: dir.path().join("db").to_string_lossy().into_owned(),
    })
    .unwrap();
    assert_eq!(sled.count(), 0);
}
