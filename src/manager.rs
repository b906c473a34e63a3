//! Named cache stores resolved through a driver registry

use crate::config::{CacheManagerConfig, StoreConfig};
use crate::error::{CacheError, Result};
use crate::repository::Repository;
use crate::serializer::{JsonSerializer, MsgPackSerializer, Serializer};
use crate::store::{FileStore, MemoryStore, NullStore, Store};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Builds a store from its configuration and the serializer resolved for it
pub type StoreFactory = Arc<
    dyn Fn(StoreConfig, Arc<dyn Serializer>) -> BoxFuture<'static, Result<Arc<dyn Store>>>
        + Send
        + Sync,
>;

/// A pool of named cache stores
///
/// Stores are created on first use and reused afterwards. The manager holds
/// no global state; share it like any other value (e.g. behind an `Arc`).
pub struct CacheManager {
    config: CacheManagerConfig,
    factories: HashMap<String, StoreFactory>,
    serializers: HashMap<String, Arc<dyn Serializer>>,
    serializer: Arc<dyn Serializer>,
    stores: RwLock<HashMap<String, Repository>>,
}

impl CacheManager {
    /// Create a manager with the built-in drivers and serializers.
    ///
    /// Fails when the configuration is invalid or names an unknown
    /// serializer.
    pub fn new(config: CacheManagerConfig) -> Result<Self> {
        config.validate().map_err(CacheError::ConfigError)?;

        let mut serializers: HashMap<String, Arc<dyn Serializer>> = HashMap::new();
        serializers.insert("json".to_string(), Arc::new(JsonSerializer));
        serializers.insert("msgpack".to_string(), Arc::new(MsgPackSerializer));

        let serializer = lookup_serializer(&serializers, &config.serializer)?;

        let mut manager = Self {
            config,
            factories: HashMap::new(),
            serializers,
            serializer,
            stores: RwLock::new(HashMap::new()),
        };
        manager.register_builtin_drivers();

        Ok(manager)
    }

    fn register_builtin_drivers(&mut self) {
        self.extend("dict", create_memory_store);
        self.extend("memory", create_memory_store);
        self.extend("file", create_file_store);
        self.extend("null", create_null_store);
        #[cfg(feature = "redis")]
        self.extend("redis", create_redis_store);
    }

    /// Register a store factory for `driver`, replacing any existing one
    pub fn extend<F, Fut>(&mut self, driver: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(StoreConfig, Arc<dyn Serializer>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Arc<dyn Store>>> + Send + 'static,
    {
        let factory: StoreFactory =
            Arc::new(move |config: StoreConfig, serializer: Arc<dyn Serializer>| {
                factory(config, serializer).boxed()
            });
        self.factories.insert(driver.into(), factory);
        self
    }

    /// Register a serializer usable in store configurations
    pub fn register_serializer(
        &mut self,
        name: impl Into<String>,
        serializer: Arc<dyn Serializer>,
    ) -> &mut Self {
        self.serializers.insert(name.into(), serializer);
        self
    }

    /// The manager-wide serializer
    pub fn serializer(&self) -> &Arc<dyn Serializer> {
        &self.serializer
    }

    pub fn config(&self) -> &CacheManagerConfig {
        &self.config
    }

    /// Name of the default store
    pub fn default_driver(&self) -> Result<String> {
        if let Some(default) = &self.config.default {
            return Ok(default.clone());
        }

        let mut names = self.config.stores.keys();
        match (names.next(), names.next()) {
            (Some(only), None) => Ok(only.clone()),
            _ => Err(CacheError::ConfigError(
                "Missing \"default\" cache in configuration.".to_string(),
            )),
        }
    }

    pub fn set_default_driver(&mut self, name: impl Into<String>) {
        self.config.default = Some(name.into());
    }

    /// Get a store by name, or the default store for `None`
    pub async fn store(&self, name: Option<&str>) -> Result<Repository> {
        let name = match name {
            Some(name) => name.to_string(),
            None => self.default_driver()?,
        };

        if let Some(repository) = self.stores.read().await.get(&name) {
            return Ok(repository.clone());
        }

        let repository = self.resolve(&name).await?;

        // A concurrent caller may have resolved the same store meanwhile;
        // keep whichever landed first
        let mut stores = self.stores.write().await;
        Ok(stores.entry(name).or_insert(repository).clone())
    }

    /// Create a fresh store for `name`, bypassing the resolved-store cache
    pub async fn resolve(&self, name: &str) -> Result<Repository> {
        let config = self.config.stores.get(name).ok_or_else(|| {
            CacheError::ConfigError(format!("Cache store [{}] is not defined.", name))
        })?;

        let factory = self.factories.get(&config.driver).ok_or_else(|| {
            CacheError::ConfigError(format!(
                "Cache driver [{}] is not supported.",
                config.driver
            ))
        })?;

        let serializer = match &config.serializer {
            Some(serializer) => lookup_serializer(&self.serializers, serializer)?,
            None => Arc::clone(&self.serializer),
        };

        debug!(
            "Creating cache store [{}] (driver: {}, serializer: {})",
            name,
            config.driver,
            serializer.name()
        );

        let store = factory(config.clone(), serializer).await?;

        info!("Resolved cache store [{}] with driver {}", name, store.name());
        Ok(Repository::new(store))
    }

    /// Drop a resolved store so the next lookup creates it again
    pub async fn forget_store(&self, name: &str) -> bool {
        self.stores.write().await.remove(name).is_some()
    }
}

fn lookup_serializer(
    serializers: &HashMap<String, Arc<dyn Serializer>>,
    name: &str,
) -> Result<Arc<dyn Serializer>> {
    serializers
        .get(name)
        .cloned()
        .ok_or_else(|| CacheError::ConfigError(format!("Unsupported serializer: {}", name)))
}

async fn create_memory_store(
    _config: StoreConfig,
    serializer: Arc<dyn Serializer>,
) -> Result<Arc<dyn Store>> {
    Ok(Arc::new(MemoryStore::with_serializer(serializer)))
}

async fn create_file_store(
    config: StoreConfig,
    serializer: Arc<dyn Serializer>,
) -> Result<Arc<dyn Store>> {
    let path = config
        .path
        .ok_or_else(|| CacheError::ConfigError("file driver requires a path".to_string()))?;

    let store = FileStore::with_hash_type(path, config.hash_type.unwrap_or_default())
        .with_serializer(serializer);
    Ok(Arc::new(store))
}

async fn create_null_store(
    _config: StoreConfig,
    _serializer: Arc<dyn Serializer>,
) -> Result<Arc<dyn Store>> {
    Ok(Arc::new(NullStore::new()))
}

#[cfg(feature = "redis")]
async fn create_redis_store(
    config: StoreConfig,
    serializer: Arc<dyn Serializer>,
) -> Result<Arc<dyn Store>> {
    use crate::store::{RedisStore, RedisStoreConfig};

    let store = match &config.url {
        Some(url) => RedisStore::connect_url(url, config.prefix.clone()).await?,
        None => {
            let defaults = RedisStoreConfig::default();
            let redis_config = RedisStoreConfig {
                host: config.host.clone().unwrap_or(defaults.host),
                port: config.port.unwrap_or(defaults.port),
                db: config.db.unwrap_or(defaults.db),
                password: config.password.clone(),
                prefix: config.prefix.clone(),
            };
            RedisStore::connect(&redis_config).await?
        }
    };

    Ok(Arc::new(store.with_serializer(serializer)))
}
