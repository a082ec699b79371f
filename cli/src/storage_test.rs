use super::*;
use restomenu::SessionStore;
use restomenu::policy::{is_authenticated, user_role};

fn temp_storage() -> (tempfile::TempDir, FileStorage) {
    let dir = tempfile::tempdir().expect("tempdir");
    let storage = FileStorage::new(dir.path().join("nested").join("session.json"));
    (dir, storage)
}

#[test]
fn missing_file_reads_empty() {
    let (_dir, storage) = temp_storage();
    assert_eq!(storage.get_item("token").expect("read"), None);
    assert!(!storage.path().exists());
}

#[test]
fn remove_on_missing_file_does_not_create_it() {
    let (_dir, storage) = temp_storage();
    storage.remove_item("token").expect("remove");
    assert!(!storage.path().exists());
}

#[test]
fn session_survives_a_reload() {
    let (_dir, storage) = temp_storage();
    SessionStore::new(storage.clone())
        .set("abc", "manager", "chef")
        .expect("set");

    let reloaded = SessionStore::new(FileStorage::new(storage.path())).read();
    assert!(is_authenticated(&reloaded));
    assert_eq!(user_role(&reloaded), Some(restomenu::Role::Manager));
    assert_eq!(reloaded.username.as_deref(), Some("chef"));
}

#[test]
fn clear_removes_every_key() {
    let (_dir, storage) = temp_storage();
    let store = SessionStore::new(storage.clone());
    store.set("abc", "customer", "alice").expect("set");
    store.clear().expect("clear");
    assert_eq!(store.read(), restomenu::Session::default());
    assert_eq!(fs::read_to_string(storage.path()).expect("file").trim(), "{}");
}

#[test]
fn unrelated_keys_are_preserved() {
    let (_dir, storage) = temp_storage();
    storage.set_item("theme", "dark").expect("set");
    SessionStore::new(storage.clone()).clear().expect("clear");
    assert_eq!(storage.get_item("theme").expect("read").as_deref(), Some("dark"));
}

#[test]
fn corrupt_file_is_reported() {
    let (_dir, storage) = temp_storage();
    fs::create_dir_all(storage.path().parent().expect("parent")).expect("mkdir");
    fs::write(storage.path(), "not json").expect("write");
    assert!(matches!(storage.get_item("token"), Err(StorageError::Corrupt(_))));
}

#[test]
fn default_path_ends_in_restomenu_session() {
    if let Some(path) = default_path() {
        assert!(path.ends_with("restomenu/session.json"));
    }
}
