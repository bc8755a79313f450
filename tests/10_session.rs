use std::sync::Arc;

use course_admin_client::session::storage::{FileStorage, KeyValueStorage, MemoryStorage, TOKEN_KEY, USER_KEY};
use course_admin_client::session::SessionStore;
use course_admin_client::types::User;

fn alice() -> User {
    User {
        id: 1,
        student_id: "s1".to_string(),
        name: "Alice".to_string(),
    }
}

#[test]
fn session_survives_a_restart() {
    let dir = tempfile::tempdir().unwrap();

    {
        let store = SessionStore::restore(Arc::new(FileStorage::new(dir.path())));
        store.set_session(alice(), "tok-1".to_string()).unwrap();
    }

    let restored = SessionStore::restore(Arc::new(FileStorage::new(dir.path())));
    assert!(restored.is_authenticated());
    assert_eq!(restored.token().as_deref(), Some("tok-1"));
    assert_eq!(restored.user(), Some(alice()));
}

#[test]
fn cleared_session_stays_cleared_after_restart() {
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::restore(Arc::new(FileStorage::new(dir.path())));
    store.set_session(alice(), "tok-1".to_string()).unwrap();
    store.clear_session().unwrap();

    let restored = SessionStore::restore(Arc::new(FileStorage::new(dir.path())));
    assert!(!restored.is_authenticated());
    assert!(restored.user().is_none());
}

#[test]
fn corrupt_session_file_restores_empty() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::new(dir.path());
    std::fs::write(storage.path(), "{not json").unwrap();

    let store = SessionStore::restore(Arc::new(storage));

    assert!(!store.is_authenticated());
    assert!(store.user().is_none());
    // The store remains writable afterwards
    store.set_session(alice(), "tok-2".to_string()).unwrap();
    let restored = SessionStore::restore(Arc::new(FileStorage::new(dir.path())));
    assert_eq!(restored.token().as_deref(), Some("tok-2"));
}

#[test]
fn corrupt_user_entry_keeps_token() {
    let storage = Arc::new(MemoryStorage::with_entries([(TOKEN_KEY, "tok-1"), (USER_KEY, "{broken")]));

    let store = SessionStore::restore(storage.clone());

    assert!(store.is_authenticated());
    assert!(store.user().is_none());
    assert_eq!(storage.get(USER_KEY).unwrap(), None);
}

#[test]
fn empty_token_counts_as_absent() {
    let storage = Arc::new(MemoryStorage::with_entries([(TOKEN_KEY, "")]));

    assert!(!SessionStore::restore(storage).is_authenticated());
}
