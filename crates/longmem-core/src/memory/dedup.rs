//! Near-duplicate collapsing for memory collections.
//!
//! A dedup pass indexes every memory, batch-queries each one's nearest
//! neighbors, and for every pair above the similarity threshold keeps the
//! more important memory. Anchors are processed in collection order, so on
//! equal importance the earlier memory survives.
//!
//! Only the top `neighbors` hits of each memory are examined (10 by default,
//! self included). A true duplicate ranked below that cut-off relative to its
//! anchor is never detected; this bound keeps a pass at O(n * k) comparisons
//! after the flat scan.
//!
//! The trigger policy runs at search time only: a collection is due when it
//! holds more than `min_memories` entries and has never been deduplicated or
//! was last deduplicated more than `interval` ago.

use chrono::{DateTime, Duration, Utc};
use longmem_types::config::DedupConfig;
use longmem_types::error::MemoryError;
use longmem_types::memory::{Memory, MemoryCollection};
use tracing::warn;

use super::index::FlatIndex;

/// Outcome of one dedup pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DedupReport {
    /// Memories in the collection before the pass.
    pub examined: usize,
    /// Memories dropped as duplicates.
    pub removed: usize,
}

/// Hours beyond what `chrono` can represent mean "never again"; negative
/// values mean "every time".
fn interval_from_hours(hours: i64) -> Duration {
    match Duration::try_hours(hours) {
        Some(interval) => interval.max(Duration::zero()),
        None => {
            warn!(hours, "dedup interval out of range, treating it as unbounded");
            Duration::MAX
        }
    }
}

/// Trigger policy plus the parameters of the collapsing algorithm.
#[derive(Debug, Clone)]
pub struct DedupEngine {
    min_memories: usize,
    interval: Duration,
    similarity_threshold: f32,
    neighbors: usize,
}

impl DedupEngine {
    pub fn new(config: &DedupConfig) -> Self {
        Self {
            min_memories: config.min_memories,
            interval: interval_from_hours(config.interval_hours),
            similarity_threshold: config.similarity_threshold,
            neighbors: config.neighbors,
        }
    }

    /// Whether `collection` should be deduplicated before a search at `now`.
    pub fn is_due(&self, collection: &MemoryCollection, now: DateTime<Utc>) -> bool {
        if collection.len() <= self.min_memories {
            return false;
        }
        match collection.last_deduplicated_at {
            None => true,
            Some(last) => now - last > self.interval,
        }
    }

    /// Collapse near-duplicates, returning survivors in their original order.
    ///
    /// CPU-bound; callers on an async runtime run this on the blocking pool.
    pub fn deduplicate(
        &self,
        memories: Vec<Memory>,
    ) -> Result<(Vec<Memory>, DedupReport), MemoryError> {
        let examined = memories.len();
        if examined < 2 {
            return Ok((
                memories,
                DedupReport {
                    examined,
                    removed: 0,
                },
            ));
        }

        let embeddings = || memories.iter().map(|m| m.embedding.as_slice());
        let index = FlatIndex::build(embeddings())?;
        let k = self.neighbors.min(examined);
        let neighborhoods = index.query_batch(embeddings(), k)?;

        let mut removed = vec![false; examined];
        for (anchor, neighbors) in neighborhoods.iter().enumerate() {
            if removed[anchor] {
                continue;
            }

            for neighbor in neighbors {
                let other = neighbor.index;
                if other == anchor || removed[other] {
                    continue;
                }
                // Neighbors are sorted; nothing further down can pass the threshold.
                if neighbor.similarity <= self.similarity_threshold {
                    break;
                }

                if memories[anchor].importance >= memories[other].importance {
                    removed[other] = true;
                } else {
                    removed[anchor] = true;
                    break;
                }
            }
        }

        let survivors: Vec<Memory> = memories
            .into_iter()
            .zip(&removed)
            .filter_map(|(memory, &gone)| (!gone).then_some(memory))
            .collect();

        let report = DedupReport {
            examined,
            removed: examined - survivors.len(),
        };
        Ok((survivors, report))
    }
}

impl Default for DedupEngine {
    fn default() -> Self {
        Self::new(&DedupConfig::default())
    }
}
