//! Caller-facing cache API over a store
//!
//! A [`Repository`] wraps any [`Store`] (a backend or a tagged view) and adds
//! default values, typed access, absolute expiration times, `add` and the
//! `remember` family on top of the plain store contract.

use crate::error::{CacheError, Result};
use crate::store::Store;
use crate::types::{sha1_hex, CacheValue, Expiry};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tracing::debug;

/// Default lifetime in minutes for [`Repository::set`] and memoization
pub const DEFAULT_CACHE_MINUTES: u64 = 60;

#[derive(Clone)]
pub struct Repository {
    store: Arc<dyn Store>,
    default_minutes: u64,
}

impl Repository {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            default_minutes: DEFAULT_CACHE_MINUTES,
        }
    }

    /// The underlying store
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn default_cache_time(&self) -> u64 {
        self.default_minutes
    }

    pub fn set_default_cache_time(&mut self, minutes: u64) -> &mut Self {
        self.default_minutes = minutes;
        self
    }

    /// Determine if an item exists in the cache
    pub async fn has(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// Retrieve an item from the cache by key
    pub async fn get(&self, key: &str) -> Result<Option<CacheValue>> {
        self.store.get(key).await
    }

    /// Retrieve an item, or `default` when it is missing
    pub async fn get_or(&self, key: &str, default: impl Into<CacheValue>) -> Result<CacheValue> {
        Ok(self.get(key).await?.unwrap_or_else(|| default.into()))
    }

    /// Retrieve an item, or the result of `default` when it is missing.
    ///
    /// The computed value is not stored.
    pub async fn get_or_else<F>(&self, key: &str, default: F) -> Result<CacheValue>
    where
        F: FnOnce() -> CacheValue,
    {
        Ok(self.get(key).await?.unwrap_or_else(default))
    }

    /// Retrieve an item decoded as `T`
    pub async fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Retrieve an item and remove it
    pub async fn pull(&self, key: &str) -> Result<Option<CacheValue>> {
        let value = self.get(key).await?;
        self.forget(key).await?;
        Ok(value)
    }

    /// Store an item for `expiry`.
    ///
    /// An expiry that resolves to the past (a negative number of minutes or
    /// an elapsed timestamp) skips the write.
    pub async fn put<V>(&self, key: &str, value: V, expiry: impl Into<Expiry>) -> Result<()>
    where
        V: Serialize,
    {
        let expiry = expiry.into();
        match expiry.to_minutes() {
            Some(minutes) => self.store.put(key, to_value(key, value)?, minutes).await,
            None => {
                debug!("Skipping put of {}: {} is already expired", key, expiry);
                Ok(())
            }
        }
    }

    /// Store an item for the default cache time
    pub async fn set<V: Serialize>(&self, key: &str, value: V) -> Result<()> {
        self.put(key, value, self.default_minutes).await
    }

    /// Store an item only if the key is missing, returning whether it did.
    ///
    /// The check and the write are independent operations.
    pub async fn add<V>(&self, key: &str, value: V, expiry: impl Into<Expiry>) -> Result<bool>
    where
        V: Serialize,
    {
        if self.has(key).await? {
            return Ok(false);
        }

        self.put(key, value, expiry).await?;
        Ok(true)
    }

    /// Store an item indefinitely
    pub async fn forever<V: Serialize>(&self, key: &str, value: V) -> Result<()> {
        self.store.forever(key, to_value(key, value)?).await
    }

    /// Get an item, or compute and store it for `expiry`
    pub async fn remember<F, Fut, T>(
        &self,
        key: &str,
        expiry: impl Into<Expiry>,
        compute: F,
    ) -> Result<CacheValue>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
        T: Serialize,
    {
        if let Some(value) = self.get(key).await? {
            return Ok(value);
        }

        let value = to_value(key, compute().await?)?;
        self.put(key, value.clone(), expiry).await?;
        Ok(value)
    }

    /// Get an item, or compute and store it forever
    pub async fn remember_forever<F, Fut, T>(&self, key: &str, compute: F) -> Result<CacheValue>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
        T: Serialize,
    {
        if let Some(value) = self.get(key).await? {
            return Ok(value);
        }

        let value = to_value(key, compute().await?)?;
        self.store.forever(key, value.clone()).await?;
        Ok(value)
    }

    /// Remove an item from the cache
    pub async fn forget(&self, key: &str) -> Result<bool> {
        self.store.forget(key).await
    }

    pub async fn increment(&self, key: &str, value: i64) -> Result<i64> {
        self.store.increment(key, value).await
    }

    pub async fn decrement(&self, key: &str, value: i64) -> Result<i64> {
        self.store.decrement(key, value).await
    }

    /// Flush the store, or rotate the tags when this is a tagged repository
    pub async fn flush(&self) -> Result<()> {
        self.store.flush().await
    }

    /// A repository over the view of this store scoped to `names`
    pub fn tags<I, S>(&self, names: I) -> Result<Repository>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let tagged = Arc::clone(&self.store).tags(names)?;

        Ok(Repository {
            store: tagged,
            default_minutes: self.default_minutes,
        })
    }

    /// Cache key for a memoized call of `name` with `args`
    pub fn memo_key<A: Serialize>(&self, name: &str, args: &A) -> Result<String> {
        let args = serde_json::to_value(args)?;
        let serialized = self.store.serialize(&args)?;
        Ok(format!("{}:{}", name, sha1_hex(serialized)))
    }

    /// Memoize `compute` under a key derived from `name` and `args`.
    ///
    /// `expiry` of `None` uses the default cache time.
    pub async fn memoize<A, F, Fut, T>(
        &self,
        name: &str,
        expiry: Option<Expiry>,
        args: &A,
        compute: F,
    ) -> Result<CacheValue>
    where
        A: Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
        T: Serialize,
    {
        let key = self.memo_key(name, args)?;
        let expiry = expiry.unwrap_or_else(|| self.default_minutes.into());
        self.remember(&key, expiry, compute).await
    }
}

fn to_value<V: Serialize>(key: &str, value: V) -> Result<CacheValue> {
    serde_json::to_value(value).map_err(|e| CacheError::InvalidValue {
        key: key.to_string(),
        reason: e.to_string(),
    })
}
