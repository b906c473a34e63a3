//! Tagged view for backends with native list operations
//!
//! Rotating a namespace orphans the entries written under it, which is fine
//! for entries with a TTL since the backend reclaims them eventually.
//! Forever entries would leak, so this view records the full key of every
//! forever write in one list per namespace segment and deletes those keys
//! when the tag set is flushed.

use crate::error::Result;
use crate::serializer::Serializer;
use crate::store::{ListStore, Store};
use crate::tags::{tagged_key, TagSet, TaggedCache, NAMESPACE_SEPARATOR};
use crate::types::CacheValue;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// A [`TaggedCache`] that tracks forever entries per tag segment
pub struct ListTaggedCache<S: ListStore + 'static> {
    inner: TaggedCache,
    lists: Arc<S>,
}

impl<S: ListStore + 'static> ListTaggedCache<S> {
    pub fn new(store: Arc<S>, tags: TagSet) -> Self {
        let backing: Arc<dyn Store> = store.clone();
        Self {
            inner: TaggedCache::new(backing, tags),
            lists: store,
        }
    }

    /// Build a view over `store` for `names`, with the tag set persisted in
    /// the same store
    pub fn for_names(store: Arc<S>, names: Vec<String>) -> Self {
        let backing: Arc<dyn Store> = store.clone();
        let tags = TagSet::new(backing, names);
        Self::new(store, tags)
    }

    /// The tag set scoping this view
    pub fn tag_set(&self) -> &TagSet {
        self.inner.tag_set()
    }

    /// Fully qualified key for a tagged item under the current namespace
    pub async fn tagged_item_key(&self, key: &str) -> Result<String> {
        self.inner.tagged_item_key(key).await
    }

    /// Registry list holding forever keys written under `segment`
    pub fn forever_key(&self, segment: &str) -> String {
        format!("{}{}:forever", self.lists.prefix(), segment)
    }

    /// Record `full_key` in the registry of every segment of `namespace`
    async fn push_forever_keys(&self, namespace: &str, full_key: &str) -> Result<()> {
        for segment in namespace.split(NAMESPACE_SEPARATOR) {
            self.lists
                .list_push(&self.forever_key(segment), full_key)
                .await?;
        }
        Ok(())
    }

    /// Delete every forever entry registered under the current namespace,
    /// then the registries themselves
    async fn delete_forever_keys(&self) -> Result<()> {
        let namespace = self.inner.tag_set().namespace().await?;

        for segment in namespace.split(NAMESPACE_SEPARATOR) {
            let forever_key = self.forever_key(segment);

            let forever = self.lists.list_range(&forever_key, 0, -1).await?;
            if !forever.is_empty() {
                let deleted = self.lists.delete(&forever).await?;
                debug!(
                    "Deleted {} of {} forever entries for segment {}",
                    deleted,
                    forever.len(),
                    segment
                );
            }

            self.lists.delete(&[forever_key]).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl<S: ListStore + 'static> Store for ListTaggedCache<S> {
    fn name(&self) -> &'static str {
        "tagged"
    }

    async fn get(&self, key: &str) -> Result<Option<CacheValue>> {
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, value: CacheValue, minutes: u64) -> Result<()> {
        self.inner.put(key, value, minutes).await
    }

    async fn increment(&self, key: &str, value: i64) -> Result<i64> {
        self.inner.increment(key, value).await
    }

    async fn decrement(&self, key: &str, value: i64) -> Result<i64> {
        self.inner.decrement(key, value).await
    }

    async fn forever(&self, key: &str, value: CacheValue) -> Result<()> {
        let namespace = self.inner.tag_set().namespace().await?;
        let item_key = tagged_key(&namespace, key);
        let full_key = format!("{}{}", self.lists.prefix(), item_key);

        self.push_forever_keys(&namespace, &full_key).await?;

        self.inner.store().forever(&item_key, value).await
    }

    async fn forget(&self, key: &str) -> Result<bool> {
        self.inner.forget(key).await
    }

    /// Delete tracked forever entries, then rotate the tag versions.
    ///
    /// The registries are read before the reset so they still match the
    /// namespace the entries were written under. A failure part way leaves
    /// the tag versions untouched.
    async fn flush(&self) -> Result<()> {
        self.delete_forever_keys().await?;
        self.inner.flush().await
    }

    fn prefix(&self) -> &str {
        self.inner.prefix()
    }

    fn serializer(&self) -> &dyn Serializer {
        self.inner.serializer()
    }
}
