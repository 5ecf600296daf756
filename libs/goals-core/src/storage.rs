//! Key-value storage backends
//!
//! The goal store persists its whole collection as a single string value.
//! This module abstracts the place that value lives so the store can run
//! against files on disk in production and an in-memory map in tests.

use crate::error::{GoalsError, Result};
use async_trait::async_trait;
use goals_common::STORE_FILE_EXTENSION;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Persistent string-valued key-value namespace
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`
    ///
    /// Returns `Ok(None)` when nothing has been stored yet.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// File-backed store: one file per key inside a data directory
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    root: PathBuf,
}

impl FileKeyValueStore {
    /// Create a store rooted at `root`; the directory is created on first write
    #[must_use]
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Directory holding the key files
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file that holds `key`
    ///
    /// # Errors
    /// Returns `GoalsError::Storage` if the key could escape the data directory
    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(GoalsError::storage(format!("Invalid storage key: '{key}'")));
        }
        Ok(self.root.join(format!("{key}.{STORE_FILE_EXTENSION}")))
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => {
                debug!("Read {} bytes from {}", contents.len(), path.display());
                Ok(Some(contents))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No value stored at {}", path.display());
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self, value))]
    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        tokio::fs::create_dir_all(&self.root).await?;

        // Write beside the target and rename so readers never see a torn value
        let tmp_path = path.with_extension(format!("{STORE_FILE_EXTENSION}.tmp"));
        tokio::fs::write(&tmp_path, value).await?;
        tokio::fs::rename(&tmp_path, &path).await?;

        debug!("Wrote {} bytes to {}", value.len(), path.display());
        Ok(())
    }
}

/// In-memory store, shared between clones
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryKeyValueStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with one value
    #[must_use]
    pub fn with_value(key: &str, value: impl Into<String>) -> Self {
        let store = Self::new();
        store.entries.write().insert(key.to_string(), value.into());
        store
    }

    /// Synchronous peek at a stored value, for inspection in tests and dry runs
    #[must_use]
    pub fn snapshot(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[async_trait]
impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_store_missing_key_is_none() {
        let dir = TempDir::new().unwrap();
        let store = FileKeyValueStore::new(dir.path());

        assert_eq!(store.get("goals").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_store_set_then_get() {
        let dir = TempDir::new().unwrap();
        let store = FileKeyValueStore::new(dir.path().join("nested"));

        store.set("goals", "[]").await.unwrap();
        assert_eq!(store.get("goals").await.unwrap().as_deref(), Some("[]"));

        store.set("goals", "[1]").await.unwrap();
        assert_eq!(store.get("goals").await.unwrap().as_deref(), Some("[1]"));
        assert!(dir.path().join("nested").join("goals.json").exists());
        assert!(!dir.path().join("nested").join("goals.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_file_store_rejects_path_like_keys() {
        let dir = TempDir::new().unwrap();
        let store = FileKeyValueStore::new(dir.path());

        assert!(store.get("../escape").await.is_err());
        assert!(store.set("a/b", "x").await.is_err());
        assert!(store.set("", "x").await.is_err());
    }

    #[tokio::test]
    async fn test_file_store_unreadable_path_errors() {
        let dir = TempDir::new().unwrap();
        // A directory where the key file should be makes reads fail with a non-NotFound error
        std::fs::create_dir_all(dir.path().join("goals.json")).unwrap();
        let store = FileKeyValueStore::new(dir.path());

        assert!(store.get("goals").await.is_err());
    }

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryKeyValueStore::new();
        assert_eq!(store.get("goals").await.unwrap(), None);

        store.set("goals", "[]").await.unwrap();
        assert_eq!(store.get("goals").await.unwrap().as_deref(), Some("[]"));
        assert_eq!(store.snapshot("goals").as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_memory_store_clones_share_state() {
        let store = MemoryKeyValueStore::with_value("goals", "[]");
        let clone = store.clone();

        clone.set("goals", "[42]").await.unwrap();
        assert_eq!(store.snapshot("goals").as_deref(), Some("[42]"));
    }

    #[tokio::test]
    async fn test_arc_store_delegates() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryKeyValueStore::new());
        store.set("goals", "[]").await.unwrap();
        assert_eq!(store.get("goals").await.unwrap().as_deref(), Some("[]"));
    }
}
