//! Store view scoped to a tag set

use crate::error::Result;
use crate::serializer::Serializer;
use crate::store::Store;
use crate::tags::TagSet;
use crate::types::{sha1_hex, CacheValue};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Key under which an item tagged with `namespace` is stored
pub fn tagged_key(namespace: &str, key: &str) -> String {
    format!("{}:{}", sha1_hex(namespace), key)
}

/// A store view whose keys live under the namespace of a [`TagSet`]
///
/// Every key is rewritten to `sha1(namespace):key` before reaching the
/// backing store. Flushing rotates the tag versions instead of deleting
/// anything, so entries written under the old namespace stay physically
/// present until they expire on their own.
pub struct TaggedCache {
    store: Arc<dyn Store>,
    tags: TagSet,
}

impl TaggedCache {
    pub fn new(store: Arc<dyn Store>, tags: TagSet) -> Self {
        Self { store, tags }
    }

    /// Build a view over `store` for `names`, with the tag set persisted in
    /// the same store
    pub fn for_names(store: Arc<dyn Store>, names: Vec<String>) -> Self {
        let tags = TagSet::new(Arc::clone(&store), names);
        Self::new(store, tags)
    }

    /// The tag set scoping this view
    pub fn tag_set(&self) -> &TagSet {
        &self.tags
    }

    /// The backing store
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Fully qualified key for a tagged item under the current namespace
    pub async fn tagged_item_key(&self, key: &str) -> Result<String> {
        let namespace = self.tags.namespace().await?;
        Ok(tagged_key(&namespace, key))
    }
}

#[async_trait]
impl Store for TaggedCache {
    fn name(&self) -> &'static str {
        "tagged"
    }

    async fn get(&self, key: &str) -> Result<Option<CacheValue>> {
        let key = self.tagged_item_key(key).await?;
        self.store.get(&key).await
    }

    async fn put(&self, key: &str, value: CacheValue, minutes: u64) -> Result<()> {
        let key = self.tagged_item_key(key).await?;
        self.store.put(&key, value, minutes).await
    }

    async fn increment(&self, key: &str, value: i64) -> Result<i64> {
        let key = self.tagged_item_key(key).await?;
        self.store.increment(&key, value).await
    }

    async fn decrement(&self, key: &str, value: i64) -> Result<i64> {
        let key = self.tagged_item_key(key).await?;
        self.store.decrement(&key, value).await
    }

    async fn forever(&self, key: &str, value: CacheValue) -> Result<()> {
        let key = self.tagged_item_key(key).await?;
        self.store.forever(&key, value).await
    }

    async fn forget(&self, key: &str) -> Result<bool> {
        let key = self.tagged_item_key(key).await?;
        self.store.forget(&key).await
    }

    /// Invalidate this tag group only; the backing store is never flushed
    async fn flush(&self) -> Result<()> {
        self.tags.reset_all().await?;
        info!("Flushed tags: {}", self.tags.names().join(", "));
        Ok(())
    }

    fn prefix(&self) -> &str {
        self.store.prefix()
    }

    fn serializer(&self) -> &dyn Serializer {
        self.store.serializer()
    }
}
