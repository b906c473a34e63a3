//! Versioned tag namespaces

use crate::error::Result;
use crate::store::Store;
use crate::types::CacheValue;
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Separator between tag versions in a namespace
pub const NAMESPACE_SEPARATOR: &str = "|";

/// An ordered set of tag names whose versions live in a backing store
///
/// Each tag has one current version identifier stored forever under
/// [`TagSet::tag_key`]. The namespace of the set is the `|`-joined list of
/// those identifiers and is recomputed from the store on every call, so a
/// reset made by anyone sharing the store is visible immediately.
///
/// Nothing here is locked: concurrent resets of the same tag race and the
/// last write wins, and a namespace read while another caller resets several
/// tags may mix old and new identifiers. Such a namespace hashes to a key
/// that simply misses.
#[derive(Clone)]
pub struct TagSet {
    store: Arc<dyn Store>,
    names: Vec<String>,
}

impl TagSet {
    pub fn new(store: Arc<dyn Store>, names: Vec<String>) -> Self {
        Self { store, names }
    }

    /// Tag names in caller order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// The key holding the current version identifier of `name`
    pub fn tag_key(name: &str) -> String {
        format!("tag:{}:key", name)
    }

    /// Current version identifier of `name`, creating one if none is stored
    pub async fn tag_version(&self, name: &str) -> Result<String> {
        match self.store.get(&Self::tag_key(name)).await? {
            Some(CacheValue::String(version)) if !version.is_empty() => Ok(version),
            _ => self.reset(name).await,
        }
    }

    /// Rotate the version identifier of `name` and return the new one.
    ///
    /// Every tagged key derived from the previous identifier becomes
    /// unreachable through the new namespace.
    pub async fn reset(&self, name: &str) -> Result<String> {
        let version = Uuid::new_v4().simple().to_string();

        self.store
            .forever(&Self::tag_key(name), CacheValue::String(version.clone()))
            .await?;

        debug!("Reset tag {} to version {}", name, version);
        Ok(version)
    }

    /// Reset every tag in the set, one independent write per tag
    pub async fn reset_all(&self) -> Result<()> {
        for name in &self.names {
            self.reset(name).await?;
        }
        Ok(())
    }

    /// Version identifiers of every tag, in set order
    pub async fn tag_versions(&self) -> Result<Vec<String>> {
        let mut versions = Vec::with_capacity(self.names.len());
        for name in &self.names {
            versions.push(self.tag_version(name).await?);
        }
        Ok(versions)
    }

    /// The namespace that changes whenever any tag of the set is reset
    pub async fn namespace(&self) -> Result<String> {
        Ok(self.tag_versions().await?.join(NAMESPACE_SEPARATOR))
    }
}

impl fmt::Debug for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TagSet")
            .field("store", &self.store.name())
            .field("names", &self.names)
            .finish()
    }
}
