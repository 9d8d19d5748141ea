//! Payload persistence.
//!
//! A store keeps one JSON document per named entity and never interprets
//! it; reconstructing a CRDT is up to the caller via `from_payload`. Two
//! backends are provided: [`FileStore`] writes `<dir>/<name>.json`, and
//! [`MemoryStore`] keeps documents in a map for tests.
//!
//! ```
//! use crdt_toolbox::prelude::*;
//! use crdt_toolbox::store::{self, MemoryStore};
//!
//! let mut db = MemoryStore::new();
//! let mut counter = GCounter::new("a");
//! counter.increment();
//! store::save_payload(&mut db, "visits", &counter).unwrap();
//!
//! let payload = store::load_payload::<GCounter, _>(&db, "visits").unwrap().unwrap();
//! assert_eq!(GCounter::from_payload("a", payload).value(), 1);
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::{codec, Crdt, CrdtError, Result};

/// Named JSON documents.
pub trait PayloadStore {
    /// Store `doc` under `name`, replacing any previous document.
    fn save(&mut self, name: &str, doc: &Value) -> Result<()>;

    /// Retrieve the document stored under `name`.
    fn load(&self, name: &str) -> Result<Option<Value>>;

    /// Delete the document under `name`. Missing names are not an error.
    fn remove(&mut self, name: &str) -> Result<()>;

    /// All stored names, sorted.
    fn names(&self) -> Result<Vec<String>>;
}

/// Encode `crdt`'s payload and store it under `name`.
pub fn save_payload<C: Crdt, S: PayloadStore + ?Sized>(
    store: &mut S,
    name: &str,
    crdt: &C,
) -> Result<()> {
    store.save(name, &codec::to_json(crdt)?)
}

/// Load and decode the payload stored under `name`.
pub fn load_payload<C: Crdt, S: PayloadStore + ?Sized>(
    store: &S,
    name: &str,
) -> Result<Option<C::Payload>> {
    store
        .load(name)?
        .map(codec::from_json::<C>)
        .transpose()
}

fn validate_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if valid {
        Ok(())
    } else {
        Err(CrdtError::PreconditionViolation(format!(
            "invalid entity name {name:?}"
        )))
    }
}

/// Directory of `<name>.json` files.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    const EXTENSION: &'static str = "json";

    /// Open (creating if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        debug!(dir = %dir.display(), "opened file store");
        Ok(Self { dir })
    }

    /// Root directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.dir.join(format!("{name}.{}", Self::EXTENSION)))
    }
}

impl PayloadStore for FileStore {
    fn save(&mut self, name: &str, doc: &Value) -> Result<()> {
        let path = self.path_for(name)?;
        let tmp = path.with_extension("json.tmp");
        let bytes = serde_json::to_vec_pretty(doc)?;
        if let Err(err) = fs::write(&tmp, bytes).and_then(|()| fs::rename(&tmp, &path)) {
            let _ = fs::remove_file(&tmp);
            return Err(err.into());
        }
        debug!(name, path = %path.display(), "saved payload");
        Ok(())
    }

    fn load(&self, name: &str) -> Result<Option<Value>> {
        let path = self.path_for(name)?;
        match fs::read(&path) {
            Ok(bytes) => {
                debug!(name, path = %path.display(), "loaded payload");
                Ok(Some(serde_json::from_slice(&bytes)?))
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn remove(&mut self, name: &str) -> Result<()> {
        let path = self.path_for(name)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(name, "removed payload");
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn names(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(Self::EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}

/// In-memory store. Nothing touches disk.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    docs: BTreeMap<String, Value>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PayloadStore for MemoryStore {
    fn save(&mut self, name: &str, doc: &Value) -> Result<()> {
        validate_name(name)?;
        self.docs.insert(name.to_string(), doc.clone());
        Ok(())
    }

    fn load(&self, name: &str) -> Result<Option<Value>> {
        validate_name(name)?;
        Ok(self.docs.get(name).cloned())
    }

    fn remove(&mut self, name: &str) -> Result<()> {
        validate_name(name)?;
        self.docs.remove(name);
        Ok(())
    }

    fn names(&self) -> Result<Vec<String>> {
        Ok(self.docs.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn memory_store_round_trip() {
        let mut store = MemoryStore::new();
        store.save("a", &json!({ "x": 1 })).unwrap();
        assert_eq!(store.load("a").unwrap(), Some(json!({ "x": 1 })));
        assert_eq!(store.names().unwrap(), vec!["a".to_string()]);

        store.remove("a").unwrap();
        assert_eq!(store.load("a").unwrap(), None);
    }

    #[test]
    fn names_are_validated() {
        let mut store = MemoryStore::new();
        for bad in ["", "../etc", "a/b", ".hidden", "sp ace"] {
            assert!(matches!(
                store.save(bad, &json!(null)),
                Err(CrdtError::PreconditionViolation(_))
            ));
        }
        assert!(store.save("eric.friendship", &json!(null)).is_ok());
    }
}
