//! Favorites store.
//!
//! Holds the user's favorited anime in memory and mirrors every change to a
//! [`KeyValueStore`] under the `favorites` key. The in-memory list is the
//! source of truth for the running session: persistence failures are logged
//! and returned to the caller, but never roll back the in-memory change.

use crate::kv::{KeyValueStore, StorageError};
use crate::models::{AnimeSummary, FavoriteEntry};
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

/// Storage key holding the serialized favorites list
pub const FAVORITES_KEY: &str = "favorites";

/// What `add` does when the anime is already a favorite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Append another entry anyway
    #[default]
    Keep,
    /// Leave the list untouched
    Ignore,
}

impl DuplicatePolicy {
    pub fn from_dedupe(dedupe: bool) -> Self {
        if dedupe {
            Self::Ignore
        } else {
            Self::Keep
        }
    }
}

/// Persisted favorites list, shared by reference between consumers
pub struct FavoritesStore<S> {
    storage: S,
    entries: RwLock<Vec<FavoriteEntry>>,
    loaded: AtomicBool,
    policy: DuplicatePolicy,
}

impl<S: KeyValueStore> FavoritesStore<S> {
    /// Create an empty store. Call [`load`](Self::load) to read persisted
    /// favorites; until then the store reports no favorites.
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            entries: RwLock::new(Vec::new()),
            loaded: AtomicBool::new(false),
            policy: DuplicatePolicy::default(),
        }
    }

    /// Set the duplicate policy
    pub fn with_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Create a store and immediately load persisted favorites.
    ///
    /// A failed load is logged and leaves the store empty.
    pub async fn open(storage: S, policy: DuplicatePolicy) -> Self {
        let store = Self::new(storage).with_policy(policy);
        if let Err(e) = store.load().await {
            warn!(error = %e, "Starting with empty favorites");
        }
        store
    }

    /// Read the persisted list, replacing the in-memory one.
    ///
    /// Returns the number of entries loaded. On failure the in-memory list is
    /// left as it is; either way the store counts as loaded afterwards.
    pub async fn load(&self) -> Result<usize, StorageError> {
        let result = match self.storage.get(FAVORITES_KEY).await {
            Ok(Some(raw)) => serde_json::from_str::<Vec<FavoriteEntry>>(&raw)
                .map_err(StorageError::from),
            Ok(None) => Ok(Vec::new()),
            Err(e) => Err(e),
        };

        let outcome = match result {
            Ok(entries) => {
                let count = entries.len();
                *self.write() = entries;
                info!(count = count, "Favorites loaded");
                Ok(count)
            }
            Err(e) => {
                warn!(error = %e, "Error loading favorites");
                Err(e)
            }
        };

        self.loaded.store(true, Ordering::Release);
        outcome
    }

    /// Whether the initial load has finished
    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    /// Snapshot of the current favorites, oldest first
    pub fn list(&self) -> Vec<FavoriteEntry> {
        self.read().clone()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// In-memory membership check; never touches storage
    pub fn contains(&self, anime_id: &str) -> bool {
        self.read().iter().any(|entry| entry.anime_id == anime_id)
    }

    /// Favorite an anime, stamping it with the current time.
    ///
    /// Returns whether an entry was appended. The entry stays in memory even
    /// when persisting fails.
    pub async fn add(&self, anime: &AnimeSummary) -> Result<bool, StorageError> {
        self.add_entry(FavoriteEntry::from_summary(anime, Utc::now()))
            .await
    }

    /// Append a prepared entry and persist the whole list
    pub async fn add_entry(&self, entry: FavoriteEntry) -> Result<bool, StorageError> {
        {
            let mut entries = self.write();
            if self.policy == DuplicatePolicy::Ignore
                && entries.iter().any(|existing| existing.anime_id == entry.anime_id)
            {
                debug!(anime_id = %entry.anime_id, "Already a favorite, ignoring");
                return Ok(false);
            }

            info!(anime_id = %entry.anime_id, title = %entry.title, "Adding favorite");
            entries.push(entry);
        }

        self.persist().await.map(|()| true)
    }

    /// Remove every entry for `anime_id` and persist the whole list.
    ///
    /// Returns the number of entries removed.
    pub async fn remove(&self, anime_id: &str) -> Result<usize, StorageError> {
        let removed = {
            let mut entries = self.write();
            let before = entries.len();
            entries.retain(|entry| entry.anime_id != anime_id);
            before - entries.len()
        };

        info!(anime_id = anime_id, removed = removed, "Removing favorite");
        self.persist().await.map(|()| removed)
    }

    async fn persist(&self) -> Result<(), StorageError> {
        let serialized = serde_json::to_string(&*self.read());
        let result = match serialized {
            Ok(json) => self.storage.set(FAVORITES_KEY, json).await,
            Err(e) => Err(e.into()),
        };

        if let Err(e) = &result {
            warn!(error = %e, "Error saving favorites");
        }
        result
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<FavoriteEntry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<FavoriteEntry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}
