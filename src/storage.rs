//! Local device storage.
//!
//! A tiny key/value store for state that lives on the shopper's device: the cart, the
//! current user and the admin session. Values are JSON strings written in full on
//! every change. Reads that fail to parse are treated as absent.

use crate::errors::{Error, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// Key holding the serialized cart lines.
pub const CART_KEY: &str = "cart";
/// Key holding the registered shopper.
pub const CURRENT_USER_KEY: &str = "current-user";
/// Key holding the admin session.
pub const ADMIN_SESSION_KEY: &str = "admin-session";

/// Key/value persistence on the local device.
pub trait LocalStorage: Send + Sync + fmt::Debug {
    /// Raw value for `key`, `None` when never written or unreadable.
    fn get(&self, key: &str) -> Option<String>;
    /// Replaces the value for `key`.
    fn set(&self, key: &str, value: &str) -> Result<()>;
    /// Deletes `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// Reads and parses a JSON value, falling back to `None` on any failure.
pub fn read_json<T: DeserializeOwned>(storage: &dyn LocalStorage, key: &str) -> Option<T> {
    let raw = storage.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!(key, "Ignoring unreadable local value: {e}");
            None
        }
    }
}

/// Serializes `value` and stores it under `key`.
pub fn write_json<T: Serialize + ?Sized>(
    storage: &dyn LocalStorage,
    key: &str,
    value: &T,
) -> Result<()> {
    let raw = serde_json::to_string(value)?;
    storage.set(key, &raw)
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Creates the directory if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|e| Error::Storage {
            message: format!("Cannot create {}: {e}", dir.display()),
        })?;
        Ok(Self { dir })
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl LocalStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.path(key)).ok()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        std::fs::write(self.path(key), value).map_err(Into::into)
    }

    fn remove(&self, key: &str) -> Result<()> {
        match std::fs::remove_file(self.path(key)) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// In-process storage, lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_memory_storage_roundtrip() -> Result<()> {
        let storage = MemoryStorage::new();
        assert!(storage.get(CART_KEY).is_none());
        storage.set(CART_KEY, "[]")?;
        assert_eq!(storage.get(CART_KEY).as_deref(), Some("[]"));
        storage.remove(CART_KEY)?;
        assert!(storage.get(CART_KEY).is_none());
        storage.remove(CART_KEY)?;
        Ok(())
    }

    #[test]
    fn test_file_storage_persists_across_handles() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let storage = FileStorage::open(dir.path().join("local"))?;
        write_json(&storage, CURRENT_USER_KEY, &vec![1, 2, 3])?;

        let reopened = FileStorage::open(dir.path().join("local"))?;
        let value: Option<Vec<i32>> = read_json(&reopened, CURRENT_USER_KEY);
        assert_eq!(value, Some(vec![1, 2, 3]));

        reopened.remove(CURRENT_USER_KEY)?;
        reopened.remove(CURRENT_USER_KEY)?;
        assert!(reopened.get(CURRENT_USER_KEY).is_none());
        Ok(())
    }

    #[test]
    fn test_read_json_ignores_garbage() -> Result<()> {
        let storage = MemoryStorage::new();
        storage.set(CART_KEY, "{not json")?;
        let value: Option<Vec<String>> = read_json(&storage, CART_KEY);
        assert!(value.is_none());
        Ok(())
    }
}
