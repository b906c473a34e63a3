//! Value serializers used by stores that persist bytes
//!
//! Stores that keep values in process (the memory store) never serialize;
//! byte-oriented backends (files, Redis) call their serializer on every
//! write and read.

use crate::error::{CacheError, Result};
use crate::types::CacheValue;

/// Encode/decode a cache value to/from bytes
pub trait Serializer: Send + Sync {
    /// Registry name ("json", "msgpack", ...)
    fn name(&self) -> &'static str;

    /// Serialize a value
    fn serialize(&self, value: &CacheValue) -> Result<Vec<u8>>;

    /// Unserialize a value
    fn unserialize(&self, data: &[u8]) -> Result<CacheValue>;
}

/// Serializer that uses JSON representations
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn name(&self) -> &'static str {
        "json"
    }

    fn serialize(&self, value: &CacheValue) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(value)?)
    }

    fn unserialize(&self, data: &[u8]) -> Result<CacheValue> {
        Ok(serde_json::from_slice(data)?)
    }
}

/// Serializer that uses MessagePack representations
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgPackSerializer;

impl Serializer for MsgPackSerializer {
    fn name(&self) -> &'static str {
        "msgpack"
    }

    fn serialize(&self, value: &CacheValue) -> Result<Vec<u8>> {
        rmp_serde::to_vec_named(value).map_err(|e| CacheError::SerializationError(e.to_string()))
    }

    fn unserialize(&self, data: &[u8]) -> Result<CacheValue> {
        rmp_serde::from_slice(data).map_err(|e| CacheError::SerializationError(e.to_string()))
    }
}
