//! Redis cache store
//!
//! Values are written with the store serializer; counters use `INCRBY` and
//! `DECRBY` on the raw key, which works on values written by [`Store::put`]
//! as long as the serializer renders integers as decimal text (JSON does).

use crate::error::Result;
use crate::serializer::{JsonSerializer, Serializer};
use crate::store::{ListStore, Store};
use crate::tags::ListTaggedCache;
use crate::types::CacheValue;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::sync::Arc;
use tracing::info;

/// Connection settings for [`RedisStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisStoreConfig {
    pub host: String,
    pub port: u16,
    pub db: i64,
    pub password: Option<String>,
    /// Prefix applied to every logical key
    pub prefix: String,
}

impl Default for RedisStoreConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6379,
            db: 0,
            password: None,
            prefix: String::new(),
        }
    }
}

impl RedisStoreConfig {
    /// Connection URL for the `redis` client
    pub fn url(&self) -> String {
        match &self.password {
            Some(password) => format!(
                "redis://:{}@{}:{}/{}",
                password, self.host, self.port, self.db
            ),
            None => format!("redis://{}:{}/{}", self.host, self.port, self.db),
        }
    }
}

/// A cache store using Redis as its backend
pub struct RedisStore {
    connection: ConnectionManager,
    prefix: String,
    serializer: Arc<dyn Serializer>,
}

impl RedisStore {
    /// Connect using discrete settings
    pub async fn connect(config: &RedisStoreConfig) -> Result<Self> {
        Self::connect_url(&config.url(), config.prefix.clone()).await
    }

    /// Connect using a `redis://` URL
    pub async fn connect_url(url: &str, prefix: impl Into<String>) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let connection = ConnectionManager::new(client).await?;
        let prefix = prefix.into();

        info!("Connected Redis cache store (prefix: {:?})", prefix);

        Ok(Self {
            connection,
            prefix,
            serializer: Arc::new(JsonSerializer),
        })
    }

    /// Replace the serializer
    pub fn with_serializer(mut self, serializer: Arc<dyn Serializer>) -> Self {
        self.serializer = serializer;
        self
    }

    /// A handle on the underlying connection
    pub fn connection(&self) -> ConnectionManager {
        self.connection.clone()
    }

    fn prefixed(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }
}

#[async_trait]
impl Store for RedisStore {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<CacheValue>> {
        let mut conn = self.connection();
        let data: Option<Vec<u8>> = conn.get(self.prefixed(key)).await?;

        match data {
            Some(bytes) => Ok(Some(self.unserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, value: CacheValue, minutes: u64) -> Result<()> {
        let bytes = self.serialize(&value)?;
        let seconds = minutes.max(1).saturating_mul(60);

        let mut conn = self.connection();
        conn.set_ex::<_, _, ()>(self.prefixed(key), bytes, seconds)
            .await?;
        Ok(())
    }

    async fn increment(&self, key: &str, value: i64) -> Result<i64> {
        let mut conn = self.connection();
        Ok(conn.incr(self.prefixed(key), value).await?)
    }

    async fn decrement(&self, key: &str, value: i64) -> Result<i64> {
        let mut conn = self.connection();
        Ok(conn.decr(self.prefixed(key), value).await?)
    }

    async fn forever(&self, key: &str, value: CacheValue) -> Result<()> {
        let bytes = self.serialize(&value)?;

        let mut conn = self.connection();
        conn.set::<_, _, ()>(self.prefixed(key), bytes).await?;
        Ok(())
    }

    async fn forget(&self, key: &str) -> Result<bool> {
        let mut conn = self.connection();
        let removed: u64 = conn.del(self.prefixed(key)).await?;
        Ok(removed > 0)
    }

    async fn flush(&self) -> Result<()> {
        let mut conn = self.connection();
        let _: () = redis::cmd("FLUSHDB").query_async(&mut conn).await?;

        info!("Flushed Redis database");
        Ok(())
    }

    fn prefix(&self) -> &str {
        &self.prefix
    }

    fn serializer(&self) -> &dyn Serializer {
        self.serializer.as_ref()
    }

    fn tags(self: Arc<Self>, names: Vec<String>) -> Result<Arc<dyn Store>> {
        Ok(Arc::new(ListTaggedCache::for_names(self, names)))
    }
}

#[async_trait]
impl ListStore for RedisStore {
    async fn list_push(&self, list_key: &str, value: &str) -> Result<()> {
        let mut conn = self.connection();
        conn.lpush::<_, _, ()>(list_key, value).await?;
        Ok(())
    }

    async fn list_range(&self, list_key: &str, start: isize, stop: isize) -> Result<Vec<String>> {
        let mut conn = self.connection();
        Ok(conn.lrange(list_key, start, stop).await?)
    }

    async fn delete(&self, keys: &[String]) -> Result<u64> {
        if keys.is_empty() {
            return Ok(0);
        }

        let mut conn = self.connection();
        Ok(conn.del(keys.to_vec()).await?)
    }
}
