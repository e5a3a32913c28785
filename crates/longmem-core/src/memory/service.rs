//! Memory service: the public add / search / delete-all operations.
//!
//! MemoryService coordinates the Embedder, the CollectionRepository (object
//! store + cache), the FlatIndex and the DedupEngine. Writes embed the new
//! content, append, and save. Searches run a dedup pass first when one is
//! due, then rank the collection against the embedded query.
//!
//! Every load-mutate-save sequence for a user runs under that user's async
//! lock, so concurrent operations in one process cannot overwrite each
//! other's changes. Writers in other processes still race last-writer-wins.
//!
//! Vector work (index build, k-NN, dedup) runs on the blocking pool so it
//! never stalls the I/O driver.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use longmem_types::config::LongMemConfig;
use longmem_types::error::MemoryError;
use longmem_types::memory::{Memory, MemoryCollection, MemoryData, MemoryStats, validate_importance};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{info, warn};

use super::cache::{CollectionCache, EvictionPolicy};
use super::dedup::{DedupEngine, DedupReport};
use super::embedder::Embedder;
use super::index::FlatIndex;
use super::repository::CollectionRepository;
use crate::storage::object_store::ObjectStore;

/// Orchestrates long-term memory for many users.
///
/// Generic over `Embedder` and `ObjectStore` to keep longmem-core free of
/// infrastructure dependencies.
pub struct MemoryService<E: Embedder, S: ObjectStore> {
    embedder: E,
    repository: CollectionRepository<S>,
    dedup: DedupEngine,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl<E: Embedder, S: ObjectStore> MemoryService<E, S> {
    /// Create a service with cache bounds and dedup policy taken from `config`.
    pub fn new(embedder: E, store: S, config: &LongMemConfig) -> Self {
        let cache = CollectionCache::new(EvictionPolicy::from_config(&config.cache));
        Self::with_parts(
            embedder,
            CollectionRepository::new(store, cache),
            DedupEngine::new(&config.dedup),
        )
    }

    pub fn with_parts(embedder: E, repository: CollectionRepository<S>, dedup: DedupEngine) -> Self {
        Self {
            embedder,
            repository,
            dedup,
            locks: DashMap::new(),
        }
    }

    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    pub fn repository(&self) -> &CollectionRepository<S> {
        &self.repository
    }

    // --- Public operations ---

    /// Store a new memory for the user. Returns its identifier.
    ///
    /// No deduplication happens here; writes stay cheap and cleanup is
    /// deferred to the next due search.
    #[tracing::instrument(skip(self, user_key, content, category, topics), fields(user = %user_key))]
    pub async fn add(
        &self,
        user_key: &str,
        content: &str,
        importance: f32,
        category: &str,
        topics: Vec<String>,
    ) -> Result<i64, MemoryError> {
        validate_importance(importance)?;

        let _guard = self.lock_user(user_key).await;
        let current = self.repository.load(user_key).await;
        self.check_embedding_model(&current);

        let embedding = self.embed_one(content).await?;
        if let Some(expected) = current.dimension() {
            if embedding.len() != expected {
                return Err(MemoryError::DimensionMismatch {
                    expected,
                    actual: embedding.len(),
                });
            }
        }

        let mut collection = Arc::unwrap_or_clone(current);
        let id = collection.next_id(Utc::now());
        collection.memories.push(Memory {
            id,
            content: content.to_string(),
            importance,
            category: category.to_string(),
            topics,
            embedding,
        });
        collection
            .embedding_model
            .get_or_insert_with(|| self.embedder.model_name().to_string());

        let saved = self.repository.save(user_key, collection).await?;
        info!(id, memories = saved.len(), "memory stored");
        Ok(id)
    }

    /// Return up to `top_k` memories most similar to `query`, best first.
    ///
    /// Runs (and persists) a dedup pass beforehand when the collection is due.
    #[tracing::instrument(skip(self, user_key, query), fields(user = %user_key))]
    pub async fn search(
        &self,
        user_key: &str,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<MemoryData>, MemoryError> {
        let mut collection = self.repository.load(user_key).await;
        if collection.is_empty() {
            tracing::debug!("no memories to search");
            return Ok(Vec::new());
        }

        if self.dedup.is_due(&collection, Utc::now()) {
            let _guard = self.lock_user(user_key).await;
            // Another operation may have changed the collection while we waited.
            let current = self.repository.load(user_key).await;
            collection = if self.dedup.is_due(&current, Utc::now()) {
                self.deduplicate_locked(user_key, current).await?.0
            } else {
                current
            };
        }

        if top_k == 0 || collection.is_empty() {
            return Ok(Vec::new());
        }
        self.check_embedding_model(&collection);

        let query_embedding = self.embed_one(query).await?;
        let ranked = Arc::clone(&collection);
        let hits = tokio::task::spawn_blocking(move || {
            let index = FlatIndex::build(ranked.memories.iter().map(|m| m.embedding.as_slice()))?;
            index.query(&query_embedding, top_k)
        })
        .await
        .map_err(|e| MemoryError::Task(e.to_string()))??;

        Ok(hits
            .into_iter()
            .map(|hit| collection.memories[hit.index].data())
            .collect())
    }

    /// Remove everything stored for the user. Succeeds when nothing existed.
    #[tracing::instrument(skip(self, user_key), fields(user = %user_key))]
    pub async fn delete_all(&self, user_key: &str) -> Result<(), MemoryError> {
        let _guard = self.lock_user(user_key).await;
        self.repository.delete_all(user_key).await
    }

    /// Run a dedup pass now, regardless of the trigger policy.
    #[tracing::instrument(skip(self, user_key), fields(user = %user_key))]
    pub async fn deduplicate(&self, user_key: &str) -> Result<DedupReport, MemoryError> {
        let _guard = self.lock_user(user_key).await;
        let current = self.repository.load(user_key).await;
        if current.is_empty() {
            return Ok(DedupReport::default());
        }
        let (_, report) = self.deduplicate_locked(user_key, current).await?;
        Ok(report)
    }

    /// Counts and timestamps for the user's collection. Never mutates.
    pub async fn stats(&self, user_key: &str) -> MemoryStats {
        let collection = self.repository.load(user_key).await;
        MemoryStats {
            count: collection.len(),
            updated_at: collection.updated_at,
            last_deduplicated_at: collection.last_deduplicated_at,
            dedup_due: self.dedup.is_due(&collection, Utc::now()),
            embedding_model: collection.embedding_model.clone(),
        }
    }

    // --- Internals ---

    /// Collapse duplicates, stamp `last_deduplicated_at`, and persist.
    ///
    /// Caller must hold the user's lock.
    async fn deduplicate_locked(
        &self,
        user_key: &str,
        current: Arc<MemoryCollection>,
    ) -> Result<(Arc<MemoryCollection>, DedupReport), MemoryError> {
        let mut collection = Arc::unwrap_or_clone(current);
        let memories = std::mem::take(&mut collection.memories);
        let engine = self.dedup.clone();

        let (kept, report) = tokio::task::spawn_blocking(move || engine.deduplicate(memories))
            .await
            .map_err(|e| MemoryError::Task(e.to_string()))??;

        collection.memories = kept;
        collection.last_deduplicated_at = Some(Utc::now());
        let saved = self.repository.save(user_key, collection).await?;

        info!(
            examined = report.examined,
            removed = report.removed,
            remaining = saved.len(),
            "deduplication pass completed"
        );
        Ok((saved, report))
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, MemoryError> {
        let embedding = self
            .embedder
            .embed(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| MemoryError::Embedding("embedder returned no vectors".to_string()))?;
        if embedding.is_empty() {
            return Err(MemoryError::Embedding(
                "embedder returned an empty vector".to_string(),
            ));
        }
        Ok(embedding)
    }

    /// Warn when stored vectors came from a different model than the active one.
    ///
    /// Vectors from different models are not comparable, but no migration is
    /// attempted; the data is used as-is.
    fn check_embedding_model(&self, collection: &MemoryCollection) {
        if let Some(stored) = collection.embedding_model.as_deref() {
            let active = self.embedder.model_name();
            if stored != active {
                warn!(stored, active, "memories were embedded with a different model");
            }
        }
    }

    async fn lock_user(&self, user_key: &str) -> UserGuard<'_> {
        let lock = Arc::clone(self.locks.entry(user_key.to_string()).or_default().value());
        UserGuard {
            locks: &self.locks,
            user_key: user_key.to_string(),
            guard: Some(lock.lock_owned().await),
        }
    }
}

/// Holds a user's lock. On drop, the lock's map entry is removed unless
/// another task still holds or awaits it, so the map only tracks active users.
struct UserGuard<'a> {
    locks: &'a DashMap<String, Arc<Mutex<()>>>,
    user_key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for UserGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.locks
            .remove_if(&self.user_key, |_, lock| Arc::strong_count(lock) == 1);
    }
}
