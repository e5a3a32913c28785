//! Memory types for the long-term memory store.
//!
//! A user's memories live in a single [`MemoryCollection`] that is persisted
//! as one JSON snapshot. Each [`Memory`] carries its embedding vector; callers
//! only ever see the [`MemoryData`] projection.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MemoryError;

/// A single stored fact about a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memory {
    /// Time-derived identifier (seconds since the epoch, made monotonic per collection).
    pub id: i64,
    /// The fact itself.
    pub content: String,
    /// How worth keeping this fact is, from 0.0 to 1.0.
    pub importance: f32,
    /// Free-form label such as "preferences" or "personal_info".
    pub category: String,
    #[serde(default)]
    pub topics: Vec<String>,
    pub embedding: Vec<f32>,
}

impl Memory {
    /// Project this memory to its caller-facing form (no embedding).
    pub fn data(&self) -> MemoryData {
        MemoryData {
            id: self.id,
            content: self.content.clone(),
            importance: self.importance,
            category: self.category.clone(),
            topics: self.topics.clone(),
        }
    }
}

/// Read-only view of a [`Memory`] returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryData {
    pub id: i64,
    pub content: String,
    pub importance: f32,
    pub category: String,
    pub topics: Vec<String>,
}

/// All of one user's memories plus freshness metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryCollection {
    #[serde(default)]
    pub memories: Vec<Memory>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub last_deduplicated_at: Option<DateTime<Utc>>,
    /// Name of the embedding model that produced the stored vectors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,
}

/// Summary of a user's collection, without any memory contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryStats {
    pub count: usize,
    pub updated_at: DateTime<Utc>,
    pub last_deduplicated_at: Option<DateTime<Utc>>,
    /// Whether the next search would run a dedup pass first.
    pub dedup_due: bool,
    pub embedding_model: Option<String>,
}

/// Check that an importance score lies in [0, 1].
pub fn validate_importance(importance: f32) -> Result<(), MemoryError> {
    if (0.0..=1.0).contains(&importance) {
        Ok(())
    } else {
        Err(MemoryError::InvalidImportance(importance))
    }
}

impl MemoryCollection {
    /// A fresh collection with no memories and no dedup history.
    pub fn empty() -> Self {
        Self {
            memories: Vec::new(),
            updated_at: Utc::now(),
            last_deduplicated_at: None,
            embedding_model: None,
        }
    }

    pub fn len(&self) -> usize {
        self.memories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memories.is_empty()
    }

    /// Embedding dimension shared by every memory, or `None` when empty.
    pub fn dimension(&self) -> Option<usize> {
        self.memories.first().map(|m| m.embedding.len())
    }

    /// Next identifier for a memory created at `now`.
    ///
    /// Derived from wall-clock seconds but never below `max(existing) + 1`,
    /// so two adds within the same second still get distinct ids.
    pub fn next_id(&self, now: DateTime<Utc>) -> i64 {
        let max_existing = self.memories.iter().map(|m| m.id).max();
        match max_existing {
            Some(max) => now.timestamp().max(max + 1),
            None => now.timestamp(),
        }
    }

    /// Advance `updated_at` to `now`, keeping it strictly increasing.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + Duration::microseconds(1)
        };
    }

    /// Enforce the collection invariants on data read from storage.
    ///
    /// Every importance lies in [0, 1] and every embedding shares one non-zero
    /// dimension.
    pub fn validate(&self) -> Result<(), MemoryError> {
        let Some(dimension) = self.dimension() else {
            return Ok(());
        };
        if dimension == 0 {
            return Err(MemoryError::MalformedSnapshot(
                "embeddings have no dimensions".to_string(),
            ));
        }

        for memory in &self.memories {
            if !(0.0..=1.0).contains(&memory.importance) {
                return Err(MemoryError::MalformedSnapshot(format!(
                    "memory {} has importance {} outside [0, 1]",
                    memory.id, memory.importance
                )));
            }
            if memory.embedding.len() != dimension {
                return Err(MemoryError::MalformedSnapshot(format!(
                    "memory {} has embedding dimension {}, expected {dimension}",
                    memory.id,
                    memory.embedding.len()
                )));
            }
        }

        Ok(())
    }
}

impl Default for MemoryCollection {
    fn default() -> Self {
        Self::empty()
    }
}
