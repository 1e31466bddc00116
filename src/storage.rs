// Durable key/value storage for session state
//
// Values are JSON documents under fixed logical keys. Every key is
// independently removable and independently corrupt-tolerant: a value that
// does not parse is dropped and treated as absent.

use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

pub const USER_KEY: &str = "msn_user";
pub const WINDOWS_KEY: &str = "msn_chat_windows";
pub const CONTACTS_KEY: &str = "msn_contacts";

/// Keys cleared together on logout.
pub const SESSION_KEYS: [&str; 3] = [USER_KEY, WINDOWS_KEY, CONTACTS_KEY];

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage I/O error for key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("could not serialize value for key '{key}': {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid storage key '{0}'")]
    InvalidKey(String),

    #[error("storage lock poisoned")]
    Poisoned,
}

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// One `<key>.json` file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|source| StorageError::Io {
                key: dir.display().to_string(),
                source,
            })?;
        }
        info!("Using session storage at {}", dir.display());
        Ok(FileStore { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }
        fs::read_to_string(&path)
            .map(Some)
            .map_err(|source| StorageError::Io { key: key.to_string(), source })
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        // Write then rename so a crash never leaves a half-written value
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)
            .and_then(|_| fs::rename(&tmp, &path))
            .map_err(|source| StorageError::Io { key: key.to_string(), source })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io { key: key.to_string(), source }),
        }
    }
}

/// In-memory store for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let values = self.values.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut values = self.values.lock().map_err(|_| StorageError::Poisoned)?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut values = self.values.lock().map_err(|_| StorageError::Poisoned)?;
        values.remove(key);
        Ok(())
    }
}

/// Loads and parses a JSON value. Missing, unreadable or malformed values
/// all come back as `None`; a malformed value is also removed.
pub fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!("Could not read stored {}: {}", key, e);
            return None;
        }
    };

    match serde_json::from_str::<T>(&raw) {
        Ok(value) => {
            debug!("Loaded stored {} ({} bytes)", key, raw.len());
            Some(value)
        }
        Err(e) => {
            warn!("Discarding corrupt stored {}: {}", key, e);
            if let Err(e) = store.remove(key) {
                warn!("Could not remove corrupt {}: {}", key, e);
            }
            None
        }
    }
}

/// Serializes and stores a value.
pub fn save_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value).map_err(|source| StorageError::Serialize {
        key: key.to_string(),
        source,
    })?;
    store.set(key, &raw)
}

/// Like `save_json`, but failures are only logged.
pub fn persist<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) {
    if let Err(e) = save_json(store, key, value) {
        warn!("Failed to persist {}: {}", key, e);
    }
}

/// Removes a key, logging rather than returning failures.
pub fn forget(store: &dyn KeyValueStore, key: &str) {
    if let Err(e) = store.remove(key) {
        warn!("Failed to remove {}: {}", key, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        count: u32,
    }

    #[test]
    fn test_memory_roundtrip_and_remove() {
        let store = MemoryStore::new();
        let sample = Sample { name: "ventana".to_string(), count: 3 };
        save_json(&store, USER_KEY, &sample).unwrap();

        assert_eq!(load_json::<Sample>(&store, USER_KEY), Some(sample));
        forget(&store, USER_KEY);
        assert_eq!(load_json::<Sample>(&store, USER_KEY), None);
    }

    #[test]
    fn test_corrupt_value_is_dropped() {
        let store = MemoryStore::new();
        store.set(WINDOWS_KEY, "{not json").unwrap();

        assert_eq!(load_json::<Sample>(&store, WINDOWS_KEY), None);
        assert_eq!(store.get(WINDOWS_KEY).unwrap(), None);
    }

    #[test]
    fn test_file_store_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested")).unwrap();

        store.set(CONTACTS_KEY, "[]").unwrap();
        assert!(store.dir().join("msn_contacts.json").exists());
        assert_eq!(store.get(CONTACTS_KEY).unwrap().as_deref(), Some("[]"));

        store.remove(CONTACTS_KEY).unwrap();
        store.remove(CONTACTS_KEY).unwrap();
        assert_eq!(store.get(CONTACTS_KEY).unwrap(), None);

        assert!(matches!(store.set("../escape", "x"), Err(StorageError::InvalidKey(_))));
    }
}
