//! # Ouroboros Cache (ouroboros-cache)
//!
//! Pluggable cache stores with tag-based invalidation.
//!
//! ## Features
//!
//! - One async [`Store`] contract over memory, file, null and Redis backends
//! - Tagged views: group keys under tags and invalidate a whole group with
//!   one write per tag, without tracking which keys belong to it
//! - Forever-entry cleanup on backends with native lists (Redis)
//! - [`Repository`] conveniences: defaults, typed reads, `add`, `remember`,
//!   memoization
//! - [`CacheManager`]: named stores resolved from configuration through an
//!   extensible driver registry
//!
//! ## Tagged invalidation
//!
//! ```no_run
//! use ouroboros_cache::{CacheManager, CacheManagerConfig, StoreConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = CacheManagerConfig::builder()
//!         .store("redis", StoreConfig::redis("redis://localhost:6379/0").with_prefix("app:"))
//!         .build();
//!     let manager = CacheManager::new(config)?;
//!     let cache = manager.store(None).await?;
//!
//!     cache.tags(["people", "artists"])?.forever("john", "John").await?;
//!     cache.tags(["artists"])?.flush().await?;
//!
//!     // Unreachable, and the forever entry itself has been deleted
//!     assert!(cache.tags(["people", "artists"])?.get("john").await?.is_none());
//!     Ok(())
//! }
//! ```
//!
//! ## Cargo features
//!
//! - `redis` (default): the Redis store

pub mod config;
pub mod error;
pub mod manager;
pub mod repository;
pub mod serializer;
pub mod store;
pub mod tags;
pub mod types;

pub use config::{CacheManagerConfig, CacheManagerConfigBuilder, StoreConfig};
pub use error::{CacheError, Result};
pub use manager::{CacheManager, StoreFactory};
pub use repository::{Repository, DEFAULT_CACHE_MINUTES};
pub use serializer::{JsonSerializer, MsgPackSerializer, Serializer};
pub use store::{FileStore, HashType, ListStore, MemoryStore, NullStore, Store, StoredEntry};
#[cfg(feature = "redis")]
pub use store::{RedisStore, RedisStoreConfig};
pub use tags::{tagged_key, ListTaggedCache, TagSet, TaggedCache, NAMESPACE_SEPARATOR};
pub use types::{sha1_hex, CacheKey, CacheValue, Expiry};
