use std::fs;
use std::path::Path;

use conversation_store::{ConversationStore, ConversationStoreError, StorePaths};
use serde_json::json;
use tempfile::TempDir;
use time::macros::datetime;

fn store() -> (TempDir, ConversationStore) {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let paths = StorePaths::new(dir.path().join("data"), dir.path().join("share"));
    (dir, ConversationStore::new(paths))
}

fn write_raw(store: &ConversationStore, name: &str, contents: &str) {
    let root = store.root();
    fs::create_dir_all(&root).expect("conversations dir should be created");
    fs::write(root.join(name), contents).expect("raw file should be written");
}

#[test]
fn save_new_writes_pretty_json_with_file_path() {
    let (_dir, store) = store();
    let at = datetime!(2025-03-01 09:30:05 +09:00);

    let saved = store
        .save_new_at(at, "What is Rust?", "A language.", "")
        .expect("save should succeed");

    assert_eq!(saved.id, "20250301093005");
    assert_eq!(saved.timestamp, "2025-03-01T09:30:05+09:00");
    let path = store.paths().conversation_file(&saved.id);
    assert_eq!(saved.file_path, path.display().to_string());

    let raw = fs::read_to_string(&path).expect("file should exist");
    assert!(raw.starts_with("{\n  \"id\": \"20250301093005\""));
    let value: serde_json::Value = serde_json::from_str(&raw).expect("valid json");
    assert!(value.get("context").is_none());
    assert_eq!(value["message"], "What is Rust?");
}

#[test]
fn same_second_saves_get_suffixed_ids() {
    let (_dir, store) = store();
    let at = datetime!(2025-03-01 09:30:05 UTC);

    let first = store.save_new_at(at, "a", "1", "").expect("first save");
    let second = store.save_new_at(at, "b", "2", "ctx").expect("second save");

    assert_eq!(first.id, "20250301093005");
    assert_eq!(second.id, "20250301093005-2");
    assert_eq!(store.get(&second.id).expect("get").context, "ctx");
}

#[test]
fn list_is_newest_first_and_skips_bad_files() {
    let (_dir, store) = store();
    store
        .save_new_at(datetime!(2025-01-01 00:00:00 UTC), "old", "r", "")
        .expect("save");
    store
        .save_new_at(datetime!(2025-02-01 00:00:00 UTC), "new", "r", "")
        .expect("save");
    write_raw(&store, "broken.json", "{not json");
    write_raw(&store, "notes.txt", "ignored");

    let listed = store.list().expect("list should succeed");
    let messages: Vec<&str> = listed.iter().map(|c| c.message.as_str()).collect();
    assert_eq!(messages, vec!["new", "old"]);
    assert_eq!(store.latest().expect("latest").message, "new");
}

#[test]
fn list_backfills_missing_file_path() {
    let (_dir, store) = store();
    let legacy = json!({
        "id": "20240101000000",
        "timestamp": "2024-01-01T00:00:00.123456789+09:00",
        "message": "legacy",
        "response": "answer",
    });
    write_raw(&store, "20240101000000.json", &legacy.to_string());

    let listed = store.list().expect("list should succeed");
    let path = store.paths().conversation_file("20240101000000");
    assert_eq!(listed[0].file_path, path.display().to_string());

    let rewritten: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).expect("read")).expect("json");
    assert_eq!(rewritten["file_path"], path.display().to_string());
}

#[test]
fn empty_store_has_no_latest() {
    let (_dir, store) = store();
    assert!(store.list().expect("missing dir lists as empty").is_empty());
    assert!(matches!(
        store.latest(),
        Err(ConversationStoreError::NoConversations { .. })
    ));
}

#[test]
fn delete_removes_file_and_rejects_unknown_ids() {
    let (_dir, store) = store();
    let saved = store
        .save_new_at(datetime!(2025-03-01 09:30:05 UTC), "m", "r", "")
        .expect("save");

    let removed = store.delete(&saved.id).expect("delete should succeed");
    assert!(!Path::new(&removed).exists());
    assert!(matches!(
        store.delete(&saved.id),
        Err(ConversationStoreError::NotFound { .. })
    ));
    assert!(matches!(
        store.get("../escape"),
        Err(ConversationStoreError::InvalidId { .. })
    ));
}

#[test]
fn context_round_trips_and_clears() {
    let (_dir, store) = store();
    assert_eq!(store.load_context().expect("unset context"), "");

    store.save_context("project notes").expect("save context");
    assert_eq!(store.load_context().expect("load"), "project notes");
    assert!(store.paths().context_file().is_file());

    store.clear_context().expect("clear");
    store.clear_context().expect("clearing twice is fine");
    assert_eq!(store.load_context().expect("load"), "");
}
