//! Durable key-value storage for client state.
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use tracing::{instrument, warn};

use crate::{assets::get_data_dir, config::ConfigError};

/// Keys the client persists.
pub mod keys {
    pub const API_BASE: &str = "rag.apiBase";
    pub const SESSION_ID: &str = "rag.sessionId";
}

/// A string key-value store that outlives a single run.
pub trait Store: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), ConfigError>;
    fn remove(&self, key: &str) -> Result<(), ConfigError>;
}

/// In-memory store. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        let values = self.values.lock().ok()?;
        values.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut values = lock(&self.values)?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), ConfigError> {
        let mut values = lock(&self.values)?;
        values.remove(key);
        Ok(())
    }
}

/// Store backed by a YAML map on disk. The whole file is rewritten on every change.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Opens `<data_dir>/state.yml`.
    pub fn open_default() -> Result<Self, ConfigError> {
        let path = get_data_dir()?.join("state.yml");
        Self::open(path)
    }

    /// Opens the store at `path`. A missing file is an empty store; a corrupt
    /// one is reported and treated as empty so the client can still start.
    #[instrument]
    pub fn open(path: PathBuf) -> Result<Self, ConfigError> {
        let values = if path.exists() {
            let content = fs::read_to_string(&path)?;
            match serde_yaml::from_str::<Option<BTreeMap<String, String>>>(&content) {
                Ok(values) => values.unwrap_or_default(),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Ignoring unreadable state file");
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, values: &BTreeMap<String, String>) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(values)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

impl Store for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        let values = self.values.lock().ok()?;
        values.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut values = lock(&self.values)?;
        values.insert(key.to_string(), value.to_string());
        self.flush(&values)
    }

    fn remove(&self, key: &str) -> Result<(), ConfigError> {
        let mut values = lock(&self.values)?;
        if values.remove(key).is_some() {
            self.flush(&values)?;
        }
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> Result<std::sync::MutexGuard<'_, T>, ConfigError> {
    mutex
        .lock()
        .map_err(|_| ConfigError::Config("State store lock poisoned".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_memory_store_set_get_remove() {
        let store = MemoryStore::default();
        assert_eq!(store.get(keys::API_BASE), None);

        store.set(keys::API_BASE, "http://a").unwrap();
        assert_eq!(store.get(keys::API_BASE).as_deref(), Some("http://a"));

        store.remove(keys::API_BASE).unwrap();
        assert_eq!(store.get(keys::API_BASE), None);
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.yml");

        let store = FileStore::open(path.clone()).unwrap();
        store.set(keys::API_BASE, "http://saved:8000").unwrap();
        store.set(keys::SESSION_ID, "session-1").unwrap();
        drop(store);

        let reopened = FileStore::open(path).unwrap();
        assert_eq!(
            reopened.get(keys::API_BASE).as_deref(),
            Some("http://saved:8000")
        );
        assert_eq!(reopened.get(keys::SESSION_ID).as_deref(), Some("session-1"));
    }

    #[test]
    fn test_file_store_remove_is_persisted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.yml");

        let store = FileStore::open(path.clone()).unwrap();
        store.set(keys::SESSION_ID, "session-1").unwrap();
        store.remove(keys::SESSION_ID).unwrap();

        let reopened = FileStore::open(path).unwrap();
        assert_eq!(reopened.get(keys::SESSION_ID), None);
    }

    #[test]
    fn test_file_store_corrupt_file_is_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.yml");
        fs::write(&path, "- [ not a map").unwrap();

        let store = FileStore::open(path).unwrap();
        assert_eq!(store.get(keys::API_BASE), None);
    }

    #[test]
    fn test_file_store_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("state.yml");

        let store = FileStore::open(path.clone()).unwrap();
        store.set(keys::API_BASE, "http://x").unwrap();
        assert!(path.exists());
    }
}
