//! Query result storage.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use lru::LruCache;
use metrics::counter;
use sitewire_api_types::{Category, ContentSummary};
use tracing::debug;

use crate::application::repos::{InvalidationError, TagInvalidator};
use crate::domain::tags::CacheTag;

use super::config::CacheConfig;
use super::keys::QueryKey;
use super::lock::{rw_read, rw_write};
use super::registry::TagRegistry;

const SOURCE: &str = "cache::store";

const METRIC_QUERY_CACHE_HIT: &str = "sitewire_query_cache_hit_total";
const METRIC_QUERY_CACHE_MISS: &str = "sitewire_query_cache_miss_total";
const METRIC_INVALIDATED_TAGS: &str = "sitewire_cache_invalidated_tags_total";

/// Invalidation counter observed before a fetch.
///
/// Results fetched under an older epoch are not stored, so a query racing a
/// webhook cannot re-populate the cache with content read before the change.
pub type Epoch = u64;

/// A cached query result. Snapshots are shared, never mutated.
#[derive(Debug, Clone)]
pub enum CachedEntry {
    Posts(Arc<Vec<ContentSummary>>),
    Categories(Arc<Vec<Category>>),
}

/// In-memory, tag-indexed store for query results with LRU eviction.
pub struct QueryCache {
    config: CacheConfig,
    entries: RwLock<LruCache<QueryKey, CachedEntry>>,
    registry: TagRegistry,
    epoch: AtomicU64,
}

impl QueryCache {
    pub fn new(config: CacheConfig) -> Self {
        let entries = RwLock::new(LruCache::new(config.query_limit_non_zero()));
        Self {
            config,
            entries,
            registry: TagRegistry::new(),
            epoch: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Current invalidation epoch; capture it before fetching.
    pub fn epoch(&self) -> Epoch {
        self.epoch.load(Ordering::SeqCst)
    }

    pub fn get(&self, key: &QueryKey) -> Option<CachedEntry> {
        if !self.config.enabled {
            return None;
        }

        let hit = rw_write(&self.entries, SOURCE, "get").get(key).cloned();
        match hit {
            Some(entry) => {
                counter!(METRIC_QUERY_CACHE_HIT).increment(1);
                Some(entry)
            }
            None => {
                counter!(METRIC_QUERY_CACHE_MISS).increment(1);
                None
            }
        }
    }

    /// Store a result fetched under `observed`. Returns `false` when the
    /// cache is disabled or an invalidation happened since `observed`.
    pub fn insert(
        &self,
        key: QueryKey,
        entry: CachedEntry,
        tags: &[CacheTag],
        observed: Epoch,
    ) -> bool {
        if !self.config.enabled {
            return false;
        }

        let mut entries = rw_write(&self.entries, SOURCE, "insert");
        if self.epoch.load(Ordering::SeqCst) != observed {
            debug!(
                cache = "query",
                outcome = "stale_fill_skipped",
                ?key,
                "invalidation raced this fetch, result not cached"
            );
            return false;
        }

        if let Some((evicted, _)) = entries.push(key.clone(), entry)
            && evicted != key
        {
            self.registry.unregister(&evicted);
        }
        self.registry
            .register(key, tags.iter().cloned().collect::<HashSet<_>>());
        true
    }

    /// Drop every entry carrying `tag`. Expiry is immediate: no stale copy is
    /// kept for a grace period.
    pub fn invalidate(&self, tag: &CacheTag) -> usize {
        let mut entries = rw_write(&self.entries, SOURCE, "invalidate");
        self.epoch.fetch_add(1, Ordering::SeqCst);

        let keys = self.registry.take_tag(tag);
        for key in &keys {
            entries.pop(key);
        }

        counter!(METRIC_INVALIDATED_TAGS).increment(1);
        debug!(cache = "query", %tag, removed = keys.len(), "tag invalidated");
        keys.len()
    }

    pub fn clear(&self) {
        let mut entries = rw_write(&self.entries, SOURCE, "clear");
        self.epoch.fetch_add(1, Ordering::SeqCst);
        entries.clear();
        self.registry.clear();
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TagInvalidator for QueryCache {
    async fn invalidate_tag(&self, tag: &CacheTag) -> Result<usize, InvalidationError> {
        Ok(self.invalidate(tag))
    }
}
