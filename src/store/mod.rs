//! Key-value storage port.
//!
//! Watch progress and other per-client bookkeeping go through
//! [`KeyValueStore`], so any backing store can be plugged in. Two backends
//! ship here: [`MemoryStore`] and the JSON-file backed [`JsonFileStore`].

use homereel_common::{Error, Result};
use parking_lot::RwLock;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::StorageConfig;

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>>;
    fn put(&self, key: &str, value: Value) -> Result<()>;
}

/// Read `key` and deserialize it.
pub fn get_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>> {
    match store.get(key)? {
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| Error::internal(format!("Corrupt value for {key}: {e}"))),
        None => Ok(None),
    }
}

/// Serialize `value` and store it under `key`.
pub fn put_json<T: Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<()> {
    let value = serde_json::to_value(value)
        .map_err(|e| Error::internal(format!("Failed to serialize {key}: {e}")))?;
    store.put(key, value)
}

/// Open the store described by `config`: file-backed when a path is set,
/// otherwise in memory.
pub fn open_store(config: &StorageConfig) -> Result<Arc<dyn KeyValueStore>> {
    match &config.path {
        Some(path) => Ok(Arc::new(JsonFileStore::open(path)?)),
        None => Ok(Arc::new(MemoryStore::default())),
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, Value>>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn put(&self, key: &str, value: Value) -> Result<()> {
        self.entries.write().insert(key.to_string(), value);
        Ok(())
    }
}

/// All entries live in memory and are rewritten to one JSON file on every put.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, Value>>,
}

impl JsonFileStore {
    /// Open `path`, loading existing entries. A missing file starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content).map_err(|e| {
                Error::invalid_input(format!("Store file {} is not valid JSON: {e}", path.display()))
            })?
        } else {
            BTreeMap::new()
        };

        tracing::debug!("Opened store {:?}", path);
        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self, entries: &BTreeMap<String, Value>) -> Result<()> {
        let json = serde_json::to_vec_pretty(entries)
            .map_err(|e| Error::internal(format!("Failed to serialize store: {e}")))?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&json)?;
        tmp.persist(&self.path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn put(&self, key: &str, value: Value) -> Result<()> {
        let mut entries = self.entries.write();
        // Memory only changes once the file holds the new entries.
        let mut next = entries.clone();
        next.insert(key.to_string(), value);
        self.save(&next)?;
        *entries = next;
        Ok(())
    }
}
