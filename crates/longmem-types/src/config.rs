//! Configuration types for the long-term memory store.
//!
//! `LongMemConfig` represents the top-level `config.toml`. Every section and
//! field has a default, so an empty file (or no file) yields the stock policy:
//! dedup when more than 10 memories and 24 hours have passed, 0.75 similarity
//! threshold, top-10 neighbor scan, unbounded cache.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LongMemConfig {
    #[serde(default)]
    pub dedup: DedupConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

/// Deduplication trigger policy and algorithm parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupConfig {
    /// Dedup runs only when a collection holds strictly more memories than this.
    #[serde(default = "default_min_memories")]
    pub min_memories: usize,
    /// Minimum time between two dedup passes.
    #[serde(default = "default_interval_hours")]
    pub interval_hours: i64,
    /// Cosine similarity above which two memories are duplicates.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,
    /// Nearest neighbors examined per memory (self included).
    #[serde(default = "default_neighbors")]
    pub neighbors: usize,
}

fn default_min_memories() -> usize {
    10
}

fn default_interval_hours() -> i64 {
    24
}

fn default_similarity_threshold() -> f32 {
    0.75
}

fn default_neighbors() -> usize {
    10
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            min_memories: default_min_memories(),
            interval_hours: default_interval_hours(),
            similarity_threshold: default_similarity_threshold(),
            neighbors: default_neighbors(),
        }
    }
}

/// Search defaults used by the agent tool boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,
    #[serde(default = "default_max_top_k")]
    pub max_top_k: usize,
}

fn default_top_k() -> usize {
    5
}

fn default_max_top_k() -> usize {
    20
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_top_k: default_top_k(),
            max_top_k: default_max_top_k(),
        }
    }
}

/// Bounds for the per-user collection cache. Both absent means unbounded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Keep at most this many users cached (least recently used evicted first).
    #[serde(default)]
    pub max_entries: Option<usize>,
    /// Drop cached collections older than this many seconds.
    #[serde(default)]
    pub max_age_secs: Option<u64>,
}

/// Which durable object store backs the snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Local directory tree under the data dir.
    #[default]
    Filesystem,
    /// DIAL file API over HTTP.
    Dial,
    /// Process-local map, lost on exit.
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// Base URL of the DIAL deployment (dial backend only).
    #[serde(default)]
    pub endpoint: Option<String>,
    /// HTTP request timeout for the dial backend.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Root directory for the filesystem backend. Defaults to `{data_dir}/objects`.
    #[serde(default)]
    pub root_dir: Option<PathBuf>,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            endpoint: None,
            timeout_secs: default_timeout_secs(),
            root_dir: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Where the embedding model files are cached.
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = LongMemConfig::default();
        assert_eq!(config.dedup.min_memories, 10);
        assert_eq!(config.dedup.interval_hours, 24);
        assert!((config.dedup.similarity_threshold - 0.75).abs() < f32::EPSILON);
        assert_eq!(config.dedup.neighbors, 10);
        assert_eq!(config.search.default_top_k, 5);
        assert_eq!(config.search.max_top_k, 20);
        assert!(config.cache.max_entries.is_none());
        assert!(config.cache.max_age_secs.is_none());
        assert_eq!(config.storage.backend, StorageBackend::Filesystem);
    }

    #[test]
    fn test_deserialize_empty_uses_defaults() {
        let config: LongMemConfig = toml::from_str("").unwrap();
        assert_eq!(config.dedup.neighbors, 10);
        assert_eq!(config.storage.timeout_secs, 30);
    }

    #[test]
    fn test_deserialize_partial_sections() {
        let toml_str = r#"
[dedup]
similarity_threshold = 0.8

[cache]
max_entries = 64

[storage]
backend = "dial"
endpoint = "https://dial.example.com"
"#;
        let config: LongMemConfig = toml::from_str(toml_str).unwrap();
        assert!((config.dedup.similarity_threshold - 0.8).abs() < f32::EPSILON);
        assert_eq!(config.dedup.min_memories, 10);
        assert_eq!(config.cache.max_entries, Some(64));
        assert_eq!(config.storage.backend, StorageBackend::Dial);
        assert_eq!(
            config.storage.endpoint.as_deref(),
            Some("https://dial.example.com")
        );
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        let result: Result<LongMemConfig, _> = toml::from_str("[storage]\nbackend = \"s3\"\n");
        assert!(result.is_err());
    }
}
