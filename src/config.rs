//! Configuration for the cache manager

use crate::error::{CacheError, Result};
use crate::store::HashType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Serializer used when neither the manager nor the store names one
pub const DEFAULT_SERIALIZER: &str = "json";

/// Configuration of one named store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Driver name resolved through the manager registry
    pub driver: String,

    /// Key prefix (ignored by stores without prefix support)
    #[serde(default)]
    pub prefix: String,

    /// Serializer override for this store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serializer: Option<String>,

    /// Cache directory (file driver)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Key hashing for the directory layout (file driver)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash_type: Option<HashType>,

    /// Connection URL; takes precedence over host/port/db/password
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Driver-specific settings for custom factories
    #[serde(flatten)]
    pub options: BTreeMap<String, serde_json::Value>,
}

impl StoreConfig {
    pub fn new(driver: impl Into<String>) -> Self {
        Self {
            driver: driver.into(),
            prefix: String::new(),
            serializer: None,
            path: None,
            hash_type: None,
            url: None,
            host: None,
            port: None,
            db: None,
            password: None,
            options: BTreeMap::new(),
        }
    }

    /// In-process store
    pub fn memory() -> Self {
        Self::new("memory")
    }

    /// File store rooted at `path`
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new("file").with_path(path)
    }

    pub fn null() -> Self {
        Self::new("null")
    }

    /// Redis store reached through `url`
    pub fn redis(url: impl Into<String>) -> Self {
        Self::new("redis").with_url(url)
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_serializer(mut self, serializer: impl Into<String>) -> Self {
        self.serializer = Some(serializer.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_hash_type(mut self, hash_type: HashType) -> Self {
        self.hash_type = Some(hash_type);
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_option(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.options.insert(name.into(), value);
        self
    }

    /// Validate the settings the built-in drivers rely on
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.driver.trim().is_empty() {
            return Err("driver must not be empty".to_string());
        }

        if self.driver == "file" && self.path.is_none() {
            return Err("file driver requires a path".to_string());
        }

        if let Some(serializer) = &self.serializer {
            if serializer.trim().is_empty() {
                return Err("serializer must not be empty".to_string());
            }
        }

        Ok(())
    }
}

/// Configuration for the cache manager: a set of named stores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheManagerConfig {
    /// Name of the default store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    /// Serializer shared by stores without an override
    #[serde(default = "default_serializer")]
    pub serializer: String,

    /// Stores by name
    #[serde(default)]
    pub stores: BTreeMap<String, StoreConfig>,
}

fn default_serializer() -> String {
    DEFAULT_SERIALIZER.to_string()
}

impl Default for CacheManagerConfig {
    fn default() -> Self {
        Self {
            default: None,
            serializer: default_serializer(),
            stores: BTreeMap::new(),
        }
    }
}

impl CacheManagerConfig {
    /// Create a new builder for manager configuration
    pub fn builder() -> CacheManagerConfigBuilder {
        CacheManagerConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.serializer.trim().is_empty() {
            return Err("serializer must not be empty".to_string());
        }

        if let Some(default) = &self.default {
            if !self.stores.contains_key(default) {
                return Err(format!("default store [{}] is not defined", default));
            }
        }

        for (name, store) in &self.stores {
            store
                .validate()
                .map_err(|e| format!("store [{}]: {}", name, e))?;
        }

        Ok(())
    }

    /// Parse a YAML document
    ///
    /// ```yaml
    /// default: redis
    /// serializer: json
    /// stores:
    ///   redis:
    ///     driver: redis
    ///     url: redis://localhost:6379/0
    ///     prefix: "app:"
    ///   file:
    ///     driver: file
    ///     path: /tmp/cache
    ///     hash_type: md5
    /// ```
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| CacheError::ConfigError(e.to_string()))
    }

    /// Read and parse a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Build a single-store configuration from the environment, loading a
    /// `.env` file first when one exists.
    ///
    /// Reads `CACHE_DRIVER` (default `memory`), `CACHE_STORE` (store name,
    /// defaults to the driver), `CACHE_PREFIX`, `CACHE_PATH`,
    /// `CACHE_SERIALIZER` and `REDIS_URL`.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let driver = lookup("CACHE_DRIVER").unwrap_or_else(|| "memory".to_string());
        let name = lookup("CACHE_STORE").unwrap_or_else(|| driver.clone());

        let mut store = StoreConfig::new(driver.clone());
        if let Some(prefix) = lookup("CACHE_PREFIX") {
            store.prefix = prefix;
        }
        if let Some(path) = lookup("CACHE_PATH") {
            store.path = Some(PathBuf::from(path));
        }
        if driver == "redis" {
            store.url = lookup("REDIS_URL");
        }

        let mut builder = Self::builder().default_store(name.clone()).store(name, store);
        if let Some(serializer) = lookup("CACHE_SERIALIZER") {
            builder = builder.serializer(serializer);
        }
        builder.build()
    }
}

/// Builder for manager configuration
#[derive(Debug, Default)]
pub struct CacheManagerConfigBuilder {
    default: Option<String>,
    serializer: Option<String>,
    stores: BTreeMap<String, StoreConfig>,
}

impl CacheManagerConfigBuilder {
    /// Set the default store name
    pub fn default_store(mut self, name: impl Into<String>) -> Self {
        self.default = Some(name.into());
        self
    }

    /// Set the manager-wide serializer
    pub fn serializer(mut self, name: impl Into<String>) -> Self {
        self.serializer = Some(name.into());
        self
    }

    /// Add or replace a named store
    pub fn store(mut self, name: impl Into<String>, config: StoreConfig) -> Self {
        self.stores.insert(name.into(), config);
        self
    }

    /// Build the manager configuration
    pub fn build(self) -> CacheManagerConfig {
        CacheManagerConfig {
            default: self.default,
            serializer: self.serializer.unwrap_or_else(default_serializer),
            stores: self.stores,
        }
    }
}
