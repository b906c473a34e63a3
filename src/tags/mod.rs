//! # Tag-based invalidation
//!
//! Tags group keys for bulk invalidation without keeping a per-tag index of
//! keys. Each tag owns a random version identifier persisted in the backing
//! store; the versions of a tag set form a namespace, and tagged keys are
//! stored as `sha1(namespace):key`. Resetting any tag changes the namespace,
//! which makes every key derived from the old one unreachable. Invalidation
//! therefore costs one write per tag, however many keys were tagged.
//!
//! ```rust
//! use ouroboros_cache::{MemoryStore, Repository};
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let cache = Repository::new(Arc::new(MemoryStore::new()));
//!
//! cache.tags(["people", "artists"])?.put("john", "John", 10).await?;
//! cache.tags(["people"])?.flush().await?;
//!
//! assert!(cache.tags(["people", "artists"])?.get("john").await?.is_none());
//! # Ok(())
//! # }
//! ```
//!
//! Backends implementing [`ListStore`](crate::store::ListStore) hand out a
//! [`ListTaggedCache`], which additionally deletes forever entries on flush.

pub mod list_tagged_cache;
pub mod tag_set;
pub mod tagged_cache;

pub use list_tagged_cache::ListTaggedCache;
pub use tag_set::{TagSet, NAMESPACE_SEPARATOR};
pub use tagged_cache::{tagged_key, TaggedCache};
