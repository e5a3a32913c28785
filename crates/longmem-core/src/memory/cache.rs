//! Per-user collection cache with a pluggable eviction policy.
//!
//! The cache maps a user's storage key to the last saved `MemoryCollection`
//! so repeated requests skip the network round-trip. It is only written on
//! save (never on load), so a failed load is retried on the next call.

use std::sync::Arc;
use std::time::Duration;

use moka::policy::EvictionPolicy as MokaPolicy;
use moka::sync::Cache;

use longmem_types::config::CacheConfig;
use longmem_types::memory::MemoryCollection;

/// moka rejects time-to-live values beyond 1000 years.
const MAX_TIME_TO_LIVE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Bounds applied to the cache. The default is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvictionPolicy {
    /// Keep at most this many entries; the least recently used goes first.
    pub max_entries: Option<usize>,
    /// Entries older than this (since insertion) are dropped.
    pub max_age: Option<Duration>,
}

impl EvictionPolicy {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn max_entries(max_entries: usize) -> Self {
        Self {
            max_entries: Some(max_entries),
            max_age: None,
        }
    }

    pub fn max_age(max_age: Duration) -> Self {
        Self {
            max_entries: None,
            max_age: Some(max_age),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self {
            max_entries: config.max_entries,
            max_age: config.max_age_secs.map(Duration::from_secs),
        }
    }
}

/// In-process cache of memory collections keyed by storage path.
pub struct CollectionCache {
    inner: Cache<String, Arc<MemoryCollection>>,
}

impl CollectionCache {
    pub fn new(policy: EvictionPolicy) -> Self {
        let mut builder = Cache::builder().eviction_policy(MokaPolicy::lru());
        if let Some(max_entries) = policy.max_entries {
            builder = builder.max_capacity(max_entries as u64);
        }
        if let Some(max_age) = policy.max_age {
            builder = builder.time_to_live(max_age.min(MAX_TIME_TO_LIVE));
        }
        Self {
            inner: builder.build(),
        }
    }

    /// Look up a cached collection. Aged-out entries are never returned.
    pub fn get(&self, key: &str) -> Option<Arc<MemoryCollection>> {
        self.inner.get(key)
    }

    pub fn insert(&self, key: &str, collection: Arc<MemoryCollection>) {
        self.inner.insert(key.to_string(), collection);
        // Apply the capacity bound now instead of on moka's next maintenance tick.
        self.inner.run_pending_tasks();
    }

    /// Drop an entry. Returns whether it was present.
    pub fn remove(&self, key: &str) -> bool {
        self.inner.remove(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.inner.run_pending_tasks();
        self.inner.entry_count() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for CollectionCache {
    fn default() -> Self {
        Self::new(EvictionPolicy::unbounded())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection() -> Arc<MemoryCollection> {
        Arc::new(MemoryCollection::empty())
    }

    #[test]
    fn test_unbounded_keeps_everything() {
        let cache = CollectionCache::default();
        for i in 0..100 {
            cache.insert(&format!("user-{i}"), collection());
        }
        assert_eq!(cache.len(), 100);
        assert!(cache.get("user-0").is_some());
    }

    #[test]
    fn test_insert_replaces_existing_entry() {
        let cache = CollectionCache::default();
        let first = collection();
        let second = collection();
        cache.insert("alice", Arc::clone(&first));
        cache.insert("alice", Arc::clone(&second));

        assert_eq!(cache.len(), 1);
        assert!(Arc::ptr_eq(&cache.get("alice").unwrap(), &second));
    }

    #[test]
    fn test_max_entries_evicts_least_recently_used() {
        let cache = CollectionCache::new(EvictionPolicy::max_entries(2));
        cache.insert("alice", collection());
        cache.insert("bob", collection());

        // Touch alice so bob becomes the least recently used.
        assert!(cache.get("alice").is_some());
        cache.insert("carol", collection());

        assert_eq!(cache.len(), 2);
        assert!(cache.get("alice").is_some());
        assert!(cache.get("bob").is_none());
        assert!(cache.get("carol").is_some());
    }

    #[test]
    fn test_max_entries_bounds_many_users() {
        let cache = CollectionCache::new(EvictionPolicy::max_entries(5));
        for i in 0..50 {
            cache.insert(&format!("user-{i}"), collection());
        }
        assert_eq!(cache.len(), 5);
        assert!(cache.get("user-49").is_some());
    }

    #[test]
    fn test_max_age_expires_entries() {
        let cache = CollectionCache::new(EvictionPolicy::max_age(Duration::from_millis(20)));
        cache.insert("alice", collection());
        std::thread::sleep(Duration::from_millis(60));
        assert!(cache.get("alice").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_huge_max_age_is_capped() {
        let cache = CollectionCache::new(EvictionPolicy::max_age(Duration::from_secs(u64::MAX)));
        cache.insert("alice", collection());
        assert!(cache.get("alice").is_some());
    }

    #[test]
    fn test_max_age_keeps_fresh_entries() {
        let cache = CollectionCache::new(EvictionPolicy::max_age(Duration::from_secs(3600)));
        cache.insert("alice", collection());
        assert!(cache.get("alice").is_some());
    }

    #[test]
    fn test_remove() {
        let cache = CollectionCache::default();
        cache.insert("alice", collection());
        assert!(cache.remove("alice"));
        assert!(!cache.remove("alice"));
        assert!(cache.get("alice").is_none());
    }

    #[test]
    fn test_policy_from_config() {
        let config = CacheConfig {
            max_entries: Some(8),
            max_age_secs: Some(60),
        };
        let policy = EvictionPolicy::from_config(&config);
        assert_eq!(policy.max_entries, Some(8));
        assert_eq!(policy.max_age, Some(Duration::from_secs(60)));
        assert_eq!(
            EvictionPolicy::from_config(&CacheConfig::default()),
            EvictionPolicy::unbounded()
        );
    }
}
