//! Bidirectional tag registry.
//!
//! Tracks which cached queries carry which tags, so that a tag can be expired
//! without scanning the store.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use crate::domain::tags::CacheTag;

use super::keys::QueryKey;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::registry";

/// Tracks tag → keys and key → tags mappings.
pub struct TagRegistry {
    tag_to_keys: RwLock<HashMap<CacheTag, HashSet<QueryKey>>>,
    key_to_tags: RwLock<HashMap<QueryKey, HashSet<CacheTag>>>,
}

impl TagRegistry {
    pub fn new() -> Self {
        Self {
            tag_to_keys: RwLock::new(HashMap::new()),
            key_to_tags: RwLock::new(HashMap::new()),
        }
    }

    /// Register a cache entry under its tags, replacing any earlier tag set.
    pub fn register(&self, key: QueryKey, tags: HashSet<CacheTag>) {
        self.unregister(&key);

        let mut t2k = rw_write(&self.tag_to_keys, SOURCE, "register.tag_to_keys");
        let mut k2t = rw_write(&self.key_to_tags, SOURCE, "register.key_to_tags");

        for tag in &tags {
            t2k.entry(tag.clone()).or_default().insert(key.clone());
        }
        k2t.insert(key, tags);
    }

    pub fn keys_for_tag(&self, tag: &CacheTag) -> HashSet<QueryKey> {
        rw_read(&self.tag_to_keys, SOURCE, "keys_for_tag")
            .get(tag)
            .cloned()
            .unwrap_or_default()
    }

    pub fn tags_for_key(&self, key: &QueryKey) -> HashSet<CacheTag> {
        rw_read(&self.key_to_tags, SOURCE, "tags_for_key")
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    /// Forget a cache key (evicted or invalidated) under all of its tags.
    pub fn unregister(&self, key: &QueryKey) {
        let mut t2k = rw_write(&self.tag_to_keys, SOURCE, "unregister.tag_to_keys");
        let mut k2t = rw_write(&self.key_to_tags, SOURCE, "unregister.key_to_tags");

        if let Some(tags) = k2t.remove(key) {
            for tag in tags {
                if let Some(keys) = t2k.get_mut(&tag) {
                    keys.remove(key);
                    if keys.is_empty() {
                        t2k.remove(&tag);
                    }
                }
            }
        }
    }

    /// Remove a tag and every key registered under it, including the keys'
    /// mappings to other tags. Returns the removed keys.
    pub fn take_tag(&self, tag: &CacheTag) -> HashSet<QueryKey> {
        let mut t2k = rw_write(&self.tag_to_keys, SOURCE, "take_tag.tag_to_keys");
        let mut k2t = rw_write(&self.key_to_tags, SOURCE, "take_tag.key_to_tags");

        let keys = t2k.remove(tag).unwrap_or_default();
        for key in &keys {
            let Some(other_tags) = k2t.remove(key) else {
                continue;
            };
            for other in other_tags.iter().filter(|other| *other != tag) {
                if let Some(siblings) = t2k.get_mut(other) {
                    siblings.remove(key);
                    if siblings.is_empty() {
                        t2k.remove(other);
                    }
                }
            }
        }

        keys
    }

    pub fn clear(&self) {
        rw_write(&self.tag_to_keys, SOURCE, "clear.tag_to_keys").clear();
        rw_write(&self.key_to_tags, SOURCE, "clear.key_to_tags").clear();
    }

    /// Number of tags with at least one registered key.
    pub fn tag_count(&self) -> usize {
        rw_read(&self.tag_to_keys, SOURCE, "tag_count").len()
    }

    pub fn key_count(&self) -> usize {
        rw_read(&self.key_to_tags, SOURCE, "key_count").len()
    }
}

impl Default for TagRegistry {
    fn default() -> Self {
        Self::new()
    }
}
