//! # Cache stores
//!
//! Every backend implements [`Store`], the single interface the tag layer and
//! [`Repository`](crate::Repository) consume. Backends that also offer native
//! list operations implement [`ListStore`], which lets them hand out the
//! forever-key tracking tagged view from [`Store::tags`].
//!
//! ## Backends
//!
//! - [`MemoryStore`]: in-process map, taggable
//! - [`FileStore`]: one file per key under a directory
//! - [`NullStore`]: stores nothing
//! - [`RedisStore`]: Redis server, taggable with forever-key tracking
//!   (requires the `redis` feature)

pub mod entry;
pub mod file;
pub mod memory;
pub mod null;
#[cfg(feature = "redis")]
pub mod redis_store;

use crate::error::{CacheError, Result};
use crate::serializer::Serializer;
use crate::types::CacheValue;
use async_trait::async_trait;
use std::sync::Arc;

pub use entry::StoredEntry;
pub use file::{FileStore, HashType};
pub use memory::MemoryStore;
pub use null::NullStore;
#[cfg(feature = "redis")]
pub use redis_store::{RedisStore, RedisStoreConfig};

/// A key/value cache backend
///
/// Keys passed to these methods are logical keys; the store applies its own
/// [`prefix`](Store::prefix) before touching the backend. A missing or
/// expired key is `Ok(None)` / `Ok(false)`, never an error.
#[async_trait]
pub trait Store: Send + Sync {
    /// A name for logging ("memory", "file", "redis", ...)
    fn name(&self) -> &'static str;

    /// Retrieve an item from the cache by key
    async fn get(&self, key: &str) -> Result<Option<CacheValue>>;

    /// Store an item in the cache for a given number of minutes
    async fn put(&self, key: &str, value: CacheValue, minutes: u64) -> Result<()>;

    /// Increment the value of an item in the cache, returning the new value
    async fn increment(&self, key: &str, value: i64) -> Result<i64>;

    /// Decrement the value of an item in the cache, returning the new value
    async fn decrement(&self, key: &str, value: i64) -> Result<i64> {
        self.increment(key, -value).await
    }

    /// Store an item in the cache indefinitely
    async fn forever(&self, key: &str, value: CacheValue) -> Result<()>;

    /// Remove an item from the cache
    async fn forget(&self, key: &str) -> Result<bool>;

    /// Remove all items from the cache
    async fn flush(&self) -> Result<()>;

    /// Get the cache key prefix
    fn prefix(&self) -> &str;

    /// The serializer used for byte-oriented storage
    fn serializer(&self) -> &dyn Serializer;

    fn serialize(&self, value: &CacheValue) -> Result<Vec<u8>> {
        self.serializer().serialize(value)
    }

    fn unserialize(&self, data: &[u8]) -> Result<CacheValue> {
        self.serializer().unserialize(data)
    }

    /// Begin a tagged operation scoped to `names`.
    ///
    /// Stores without tag support fail with [`CacheError::NotImplemented`].
    fn tags(self: Arc<Self>, names: Vec<String>) -> Result<Arc<dyn Store>> {
        let _ = names;
        Err(CacheError::NotImplemented {
            store: self.name(),
            operation: "tags",
        })
    }
}

/// Native list operations, used to track forever entries per tag segment
///
/// Unlike [`Store`] methods these address raw backend keys: callers pass keys
/// that already carry the store prefix.
#[async_trait]
pub trait ListStore: Store {
    /// Prepend `value` to the list at `list_key`
    async fn list_push(&self, list_key: &str, value: &str) -> Result<()>;

    /// Read the list at `list_key` between `start` and `stop` (inclusive,
    /// negative indexes count from the end)
    async fn list_range(&self, list_key: &str, start: isize, stop: isize) -> Result<Vec<String>>;

    /// Delete raw keys, returning how many existed
    async fn delete(&self, keys: &[String]) -> Result<u64>;
}
