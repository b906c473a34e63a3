//! Store that never stores anything, for development and test setups

use crate::error::Result;
use crate::serializer::{JsonSerializer, Serializer};
use crate::store::Store;
use crate::types::CacheValue;
use async_trait::async_trait;

#[derive(Debug, Clone, Copy, Default)]
pub struct NullStore {
    serializer: JsonSerializer,
}

impl NullStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for NullStore {
    fn name(&self) -> &'static str {
        "null"
    }

    async fn get(&self, _key: &str) -> Result<Option<CacheValue>> {
        Ok(None)
    }

    async fn put(&self, _key: &str, _value: CacheValue, _minutes: u64) -> Result<()> {
        Ok(())
    }

    async fn increment(&self, _key: &str, _value: i64) -> Result<i64> {
        Ok(0)
    }

    async fn forever(&self, _key: &str, _value: CacheValue) -> Result<()> {
        Ok(())
    }

    async fn forget(&self, _key: &str) -> Result<bool> {
        Ok(false)
    }

    async fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn prefix(&self) -> &str {
        ""
    }

    fn serializer(&self) -> &dyn Serializer {
        &self.serializer
    }
}
