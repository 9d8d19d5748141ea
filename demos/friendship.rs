//! Example: a follow graph persisted as one JSON document per user.
//!
//! Run with `cargo run --example friendship [DIR]`. Documents are written to
//! `DIR` (default: a directory under the system temp dir) and reloaded on
//! the next run, so repeated runs keep merging into the same state.

use std::path::PathBuf;

use crdt_toolbox::friendship::{Friendship, FriendshipPayload};
use crdt_toolbox::store::{FileStore, PayloadStore};
use crdt_toolbox::Result;

fn load(db: &FileStore, user_key: &str) -> Result<Friendship> {
    match db.load(&format!("{user_key}.friendship"))? {
        Some(doc) => {
            let payload: FriendshipPayload = serde_json::from_value(doc)?;
            Ok(Friendship::from_payload(payload))
        }
        None => Ok(Friendship::new(user_key)),
    }
}

fn store(db: &mut FileStore, friendship: &Friendship) -> Result<()> {
    let payload = friendship.payload()?;
    let name = format!("{}.friendship", payload.user_key);
    db.save(&name, &serde_json::to_value(&payload)?)
}

fn main() -> Result<()> {
    let dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join("crdt-toolbox-friendship"));
    let mut db = FileStore::open(&dir)?;
    println!("=== Friendship graph in {} ===\n", dir.display());

    let mut eric = load(&db, "eric")?;
    let mut glenn = load(&db, "glenn")?;
    eric.follow(&mut glenn)?;
    store(&mut db, &eric)?;
    store(&mut db, &glenn)?;

    let eric = load(&db, "eric")?;
    println!("Is eric following glenn? {}", eric.is_following("glenn"));

    // A second device edits eric's record offline, then syncs.
    let mut phone = eric.clone();
    let mut mark = load(&db, "mark")?;
    mark.follow(&mut phone)?;
    let eric = eric.merged(&phone)?;
    store(&mut db, &eric)?;
    store(&mut db, &mark)?;

    let value = eric.value()?;
    println!("eric follows:     {:?}", value.following);
    println!("eric followed by: {:?}", value.followers);

    let other = Friendship::new("glenn");
    match eric.merged(&other) {
        Ok(_) => println!("unexpected: merged two different users"),
        Err(e) => println!("\nMerging eric with glenn is rejected: {e}"),
    }
    Ok(())
}
