//! In-process cache store backed by a map

use crate::error::{CacheError, Result};
use crate::serializer::{JsonSerializer, Serializer};
use crate::store::{entry::StoredEntry, Store};
use crate::tags::{TagSet, TaggedCache};
use crate::types::{CacheKey, CacheValue};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// A cache store using a map as its backend
///
/// Values are kept as-is (the serializer is only consulted through the
/// [`Store::serialize`] hooks, e.g. for memoization keys). Expired entries are
/// removed lazily when read.
pub struct MemoryStore {
    /// Internal storage: key -> entry
    entries: RwLock<HashMap<CacheKey, StoredEntry>>,

    serializer: Arc<dyn Serializer>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::with_serializer(Arc::new(JsonSerializer))
    }

    /// Create an empty store with a specific serializer
    pub fn with_serializer(serializer: Arc<dyn Serializer>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            serializer,
        }
    }

    /// Number of physically present entries, expired ones included
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Check if the store holds no entries at all
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Check whether a key is physically present, without expiry handling
    pub async fn contains_key(&self, key: &str) -> bool {
        self.entries.read().await.contains_key(key)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<CacheValue>> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return Ok(None),
                Some(entry) if !entry.is_expired() => return Ok(Some(entry.value.clone())),
                Some(_) => {}
            }
        }

        // Expired: re-check under the write lock, a concurrent put may have
        // replaced the entry in between
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|entry| entry.is_expired()) {
            debug!("Removing expired cache entry: {}", key);
            entries.remove(key);
            return Ok(None);
        }
        Ok(entries.get(key).map(|entry| entry.value.clone()))
    }

    async fn put(&self, key: &str, value: CacheValue, minutes: u64) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), StoredEntry::new(value, minutes));
        Ok(())
    }

    async fn increment(&self, key: &str, value: i64) -> Result<i64> {
        let mut entries = self.entries.write().await;

        let (current, expires_at) = match entries.get(key) {
            Some(entry) if !entry.is_expired() => {
                let current = entry.value.as_i64().ok_or_else(|| CacheError::InvalidValue {
                    key: key.to_string(),
                    reason: format!("cannot increment non-integer value {}", entry.value),
                })?;
                (current, entry.expires_at)
            }
            _ => (0, None),
        };

        let integer = current.checked_add(value).ok_or_else(|| CacheError::InvalidValue {
            key: key.to_string(),
            reason: "increment overflows a 64-bit integer".to_string(),
        })?;

        entries.insert(
            key.to_string(),
            StoredEntry::with_expiration(CacheValue::from(integer), expires_at),
        );

        Ok(integer)
    }

    async fn forever(&self, key: &str, value: CacheValue) -> Result<()> {
        self.put(key, value, 0).await
    }

    async fn forget(&self, key: &str) -> Result<bool> {
        let mut entries = self.entries.write().await;
        Ok(entries.remove(key).is_some())
    }

    async fn flush(&self) -> Result<()> {
        let mut entries = self.entries.write().await;
        let count = entries.len();
        entries.clear();

        debug!("Flushed {} entries from memory store", count);
        Ok(())
    }

    fn prefix(&self) -> &str {
        ""
    }

    fn serializer(&self) -> &dyn Serializer {
        self.serializer.as_ref()
    }

    fn tags(self: Arc<Self>, names: Vec<String>) -> Result<Arc<dyn Store>> {
        let store: Arc<dyn Store> = self;
        let tag_set = TagSet::new(Arc::clone(&store), names);
        Ok(Arc::new(TaggedCache::new(store, tag_set)))
    }
}
