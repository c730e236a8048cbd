use super::*;
use tempfile::tempdir;

#[test]
fn memory_store_overwrites_and_counts_writes() {
    let mut store = MemoryStore::new();
    let observer = store.clone();

    store.set("k", "one").unwrap();
    store.set("k", "two").unwrap();

    assert_eq!(store.get("k").unwrap().as_deref(), Some("two"));
    assert_eq!(observer.value("k").as_deref(), Some("two"));
    assert_eq!(observer.write_count(), 2);
    assert!(store.get("missing").unwrap().is_none());
}

#[test]
fn file_store_round_trips_verbatim() {
    let dir = tempdir().unwrap();
    let mut store = FileStore::new(dir.path().join("nested"));

    let text = "line 1\r\nline 2\n\tünïcode";
    store.set("editor", text).unwrap();

    assert_eq!(store.get("editor").unwrap().as_deref(), Some(text));
    let raw = std::fs::read(store.path_for("editor")).unwrap();
    assert_eq!(raw, text.as_bytes());
}

#[test]
fn file_store_missing_key_is_none() {
    let dir = tempdir().unwrap();
    let store = FileStore::new(dir.path().to_path_buf());
    assert!(store.get("nope").unwrap().is_none());
}

#[test]
fn file_store_keeps_similar_keys_apart() {
    let dir = tempdir().unwrap();
    let mut store = FileStore::new(dir.path().to_path_buf());

    store.set("a/b", "slash").unwrap();
    store.set("a_b", "underscore").unwrap();

    assert_ne!(store.path_for("a/b"), store.path_for("a_b"));
    assert_eq!(store.get("a/b").unwrap().as_deref(), Some("slash"));
    assert_eq!(store.get("a_b").unwrap().as_deref(), Some("underscore"));
}

#[test]
fn file_store_name_is_stable_for_a_known_key() {
    let store = FileStore::new(PathBuf::from("/data"));
    assert_eq!(
        store.path_for("notes/draft 1"),
        PathBuf::from("/data").join("notes_draft_1-597e1b9d34debeb6.txt")
    );
}
