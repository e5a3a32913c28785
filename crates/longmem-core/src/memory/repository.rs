//! Snapshot persistence for memory collections.
//!
//! Each user's collection is one compact JSON object stored at
//! `files/{user_key}/__long-memories/data.json` in the object store, fronted by
//! a [`CollectionCache`]. Loading favors availability: any failure (missing
//! object, backend error, malformed or invariant-violating snapshot) yields a
//! fresh empty collection. Saves and deletes propagate their failures.

use std::sync::Arc;

use chrono::Utc;
use longmem_types::error::{MemoryError, StorageError};
use longmem_types::memory::MemoryCollection;

use super::cache::CollectionCache;
use crate::storage::object_store::ObjectStore;

/// Folder under the user's root that holds the snapshot.
pub const MEMORY_DIR: &str = "__long-memories";

/// Snapshot file name inside [`MEMORY_DIR`].
pub const MEMORY_FILE: &str = "data.json";

/// Storage path of the snapshot for a user's root.
pub fn memory_file_path(user_key: &str) -> String {
    format!("files/{user_key}/{MEMORY_DIR}/{MEMORY_FILE}")
}

/// Loads and saves memory collections through an object store and a cache.
pub struct CollectionRepository<S: ObjectStore> {
    store: S,
    cache: CollectionCache,
}

impl<S: ObjectStore> CollectionRepository<S> {
    pub fn new(store: S, cache: CollectionCache) -> Self {
        Self { store, cache }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn cache(&self) -> &CollectionCache {
        &self.cache
    }

    /// Return the user's collection, from cache when present.
    ///
    /// Never fails: on any storage or parse problem the failure is logged and
    /// an empty collection is returned. The result is not cached.
    pub async fn load(&self, user_key: &str) -> Arc<MemoryCollection> {
        let path = memory_file_path(user_key);
        if let Some(cached) = self.cache.get(&path) {
            tracing::debug!(%path, memories = cached.len(), "memories loaded from cache");
            return cached;
        }

        match self.fetch(user_key).await {
            Ok(collection) => {
                tracing::debug!(%path, memories = collection.len(), "memories loaded from storage");
                Arc::new(collection)
            }
            Err(err) if err.is_not_found() => {
                tracing::debug!(%path, "no stored memories, starting empty");
                Arc::new(MemoryCollection::empty())
            }
            Err(err) => {
                tracing::warn!(%path, error = %err, "failed to load memories, starting empty");
                Arc::new(MemoryCollection::empty())
            }
        }
    }

    /// Download and validate the snapshot, bypassing the cache.
    pub async fn fetch(&self, user_key: &str) -> Result<MemoryCollection, MemoryError> {
        let bytes = self.store.download(&memory_file_path(user_key)).await?;
        let collection: MemoryCollection = serde_json::from_slice(&bytes)
            .map_err(|e| MemoryError::MalformedSnapshot(e.to_string()))?;
        collection.validate()?;
        Ok(collection)
    }

    /// Stamp, serialize and upload the collection, then cache it.
    ///
    /// Returns the cached handle so callers can keep reading what was written.
    pub async fn save(
        &self,
        user_key: &str,
        mut collection: MemoryCollection,
    ) -> Result<Arc<MemoryCollection>, MemoryError> {
        let path = memory_file_path(user_key);
        collection.touch(Utc::now());

        let bytes =
            serde_json::to_vec(&collection).map_err(|e| MemoryError::Serialization(e.to_string()))?;
        self.store.upload(&path, &bytes).await?;
        tracing::debug!(%path, memories = collection.len(), bytes = bytes.len(), "memories saved");

        let collection = Arc::new(collection);
        self.cache.insert(&path, Arc::clone(&collection));
        Ok(collection)
    }

    /// Delete the snapshot and evict the cache entry.
    ///
    /// An already-absent snapshot counts as success.
    pub async fn delete_all(&self, user_key: &str) -> Result<(), MemoryError> {
        let path = memory_file_path(user_key);
        match self.store.delete(&path).await {
            Ok(()) => tracing::info!(%path, "memory snapshot deleted"),
            Err(StorageError::NotFound(_)) => {
                tracing::debug!(%path, "no memory snapshot to delete");
            }
            Err(err) => return Err(err.into()),
        }

        if self.cache.remove(&path) {
            tracing::debug!(%path, "memory cache entry cleared");
        }
        Ok(())
    }
}
