//! Key-value persistence used by the favorites store.
//!
//! The store only ever needs two operations on string keys, so the seam is a
//! small trait with a SQLite implementation for real sessions and an
//! in-memory one for tests and throwaway sessions.

use crate::db::Database;
use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::debug;

/// Errors raised while reading or writing persisted values
#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Database(#[from] anyhow::Error),

    #[error("storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Asynchronous string key-value store
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, if any
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>, StorageError>> + Send;

    /// Replace the value stored under `key`
    fn set(&self, key: &str, value: String)
        -> impl Future<Output = Result<(), StorageError>> + Send;
}

impl<T: KeyValueStore> KeyValueStore for Arc<T> {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        (**self).set(key, value).await
    }
}

/// SQLite-backed store; queries run on the blocking thread pool
#[derive(Clone)]
pub struct SqliteStore {
    db: Arc<Mutex<Database>>,
}

impl SqliteStore {
    /// Wrap an already opened database
    pub fn new(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }

    /// Open or create the database file at `path`
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        Ok(Self::new(Database::open(path)?))
    }

    async fn with_db<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let guard = db
                .lock()
                .map_err(|_| StorageError::Unavailable("database lock poisoned".to_string()))?;
            f(&*guard).map_err(StorageError::from)
        })
        .await?
    }
}

impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let key = key.to_string();
        self.with_db(move |db| db.get_value(&key)).await
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        let key = key.to_string();
        self.with_db(move |db| db.set_value(&key, &value)).await
    }
}

/// Process-local store; clones share the same map
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, StorageError> {
        self.values
            .lock()
            .map_err(|_| StorageError::Unavailable("memory store lock poisoned".to_string()))
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        debug!(key = key, bytes = value.len(), "Stored value in memory");
        self.lock()?.insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_memory_store_clones_share_values() -> Result<(), StorageError> {
        let store = MemoryStore::new();
        let other = store.clone();

        store.set("favorites", "[]".to_string()).await?;
        assert_eq!(other.get("favorites").await?, Some("[]".to_string()));
        assert_eq!(other.get("missing").await?, None);

        Ok(())
    }

    #[tokio::test]
    async fn test_sqlite_store_survives_reopen() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("favorites.db");

        {
            let store = SqliteStore::open(&path)?;
            store.set("favorites", r#"[{"animeId":"a1"}]"#.to_string()).await?;
        }

        let reopened = SqliteStore::open(&path)?;
        assert_eq!(
            reopened.get("favorites").await?,
            Some(r#"[{"animeId":"a1"}]"#.to_string())
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_arc_store_delegates() -> Result<(), StorageError> {
        let store = Arc::new(MemoryStore::new());
        store.set("k", "v".to_string()).await?;
        assert_eq!(KeyValueStore::get(&store, "k").await?, Some("v".to_string()));
        Ok(())
    }
}
