//! File-backed payload persistence.

use crdt_toolbox::friendship::{Friendship, FriendshipPayload};
use crdt_toolbox::prelude::*;
use crdt_toolbox::store::{self, FileStore, PayloadStore};

#[test]
fn file_store_round_trips_payloads() {
    let dir = tempfile::tempdir().unwrap();
    let mut db = FileStore::open(dir.path()).unwrap();

    let mut set = ORSet::new();
    set.add("eric".to_string());
    set.add("glenn".to_string());
    set.discard(&"glenn".to_string()).unwrap();
    store::save_payload(&mut db, "members", &set).unwrap();

    let payload = store::load_payload::<ORSet<String>, _>(&db, "members")
        .unwrap()
        .unwrap();
    let restored = ORSet::from_payload(payload);
    assert_eq!(restored, set);
    assert_eq!(restored.value(), set.value());

    assert_eq!(db.names().unwrap(), vec!["members".to_string()]);
    assert!(dir.path().join("members.json").exists());
}

#[test]
fn missing_documents_load_as_none() {
    let dir = tempfile::tempdir().unwrap();
    let db = FileStore::open(dir.path()).unwrap();
    assert!(store::load_payload::<GCounter, _>(&db, "nothing")
        .unwrap()
        .is_none());
}

#[test]
fn corrupt_documents_are_malformed() {
    let dir = tempfile::tempdir().unwrap();
    let db = FileStore::open(dir.path()).unwrap();
    std::fs::write(dir.path().join("broken.json"), b"{ not json").unwrap();

    let err = db.load("broken").unwrap_err();
    assert!(matches!(err, CrdtError::MalformedPayload(_)));
}

#[test]
fn failed_save_leaves_no_temp_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut db = FileStore::open(dir.path()).unwrap();
    // a non-empty directory where the document should go makes the rename fail
    let target = dir.path().join("blocked.json");
    std::fs::create_dir(&target).unwrap();
    std::fs::write(target.join("keep"), b"x").unwrap();

    let err = db.save("blocked", &serde_json::json!({ "a": 1 })).unwrap_err();
    assert!(matches!(err, CrdtError::Io(_)));
    assert!(!dir.path().join("blocked.json.tmp").exists());
}

#[test]
fn remove_deletes_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut db = FileStore::open(dir.path()).unwrap();
    let counter = GCounter::new("a");
    store::save_payload(&mut db, "c", &counter).unwrap();

    db.remove("c").unwrap();
    db.remove("c").unwrap();
    assert!(db.names().unwrap().is_empty());
}

#[test]
fn friendship_survives_a_reload() {
    let dir = tempfile::tempdir().unwrap();
    let mut db = FileStore::open(dir.path()).unwrap();

    let mut eric = Friendship::new("eric");
    let mut glenn = Friendship::new("glenn");
    eric.follow(&mut glenn).unwrap();

    for person in [&eric, &glenn] {
        let payload = person.payload().unwrap();
        let name = format!("{}.friendship", payload.user_key);
        db.save(&name, &serde_json::to_value(&payload).unwrap())
            .unwrap();
    }

    let doc = db.load("eric.friendship").unwrap().unwrap();
    let payload: FriendshipPayload = serde_json::from_value(doc).unwrap();
    let reloaded = Friendship::from_payload(payload);
    assert!(reloaded.is_following("glenn"));

    let merged = reloaded.merged(&eric).unwrap();
    assert_eq!(merged.value().unwrap(), eric.value().unwrap());
}
