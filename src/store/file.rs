//! Filesystem cache store
//!
//! Layout: each key maps to `<directory>/<aa>/<bb>/.../<digest>` where
//! `digest` is the hex hash of the key and the intermediate directories are
//! its leading two-character chunks (`md5`: 2 levels, `sha1`: 4,
//! `sha256`: 8). A file holds ten ASCII digits of the unix expiration
//! timestamp followed by the serialized value.

use crate::error::{CacheError, Result};
use crate::serializer::{JsonSerializer, Serializer};
use crate::store::Store;
use crate::types::CacheValue;
use async_trait::async_trait;
use chrono::Utc;
use md5::Md5;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use sha2::Sha256;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use tokio::fs;
use tracing::debug;

/// Expiration timestamp written for forever entries
const FOREVER_TIMESTAMP: i64 = 9_999_999_999;

/// Width of the expiration header
const HEADER_LEN: usize = 10;

/// Hash used to derive file paths from keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashType {
    Md5,
    Sha1,
    #[default]
    Sha256,
}

impl HashType {
    /// Number of directory levels used for this hash
    pub fn parts_count(&self) -> usize {
        match self {
            HashType::Md5 => 2,
            HashType::Sha1 => 4,
            HashType::Sha256 => 8,
        }
    }

    /// Hex digest of `key`
    pub fn hex_digest(&self, key: &str) -> String {
        match self {
            HashType::Md5 => hex::encode(Md5::digest(key.as_bytes())),
            HashType::Sha1 => hex::encode(Sha1::digest(key.as_bytes())),
            HashType::Sha256 => hex::encode(Sha256::digest(key.as_bytes())),
        }
    }
}

impl FromStr for HashType {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "md5" => Ok(HashType::Md5),
            "sha1" => Ok(HashType::Sha1),
            "sha256" => Ok(HashType::Sha256),
            other => Err(CacheError::ConfigError(format!(
                "hash_type \"{}\" is not valid",
                other
            ))),
        }
    }
}

impl fmt::Display for HashType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashType::Md5 => write!(f, "md5"),
            HashType::Sha1 => write!(f, "sha1"),
            HashType::Sha256 => write!(f, "sha256"),
        }
    }
}

/// Decoded file contents
struct Payload {
    value: CacheValue,
    expires_at: i64,
}

/// A cache store using the filesystem as its backend
pub struct FileStore {
    directory: PathBuf,
    hash_type: HashType,
    serializer: Arc<dyn Serializer>,
}

impl FileStore {
    /// Create a store rooted at `directory` using sha256 paths
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self::with_hash_type(directory, HashType::default())
    }

    pub fn with_hash_type(directory: impl Into<PathBuf>, hash_type: HashType) -> Self {
        Self {
            directory: directory.into(),
            hash_type,
            serializer: Arc::new(JsonSerializer),
        }
    }

    /// Replace the serializer
    pub fn with_serializer(mut self, serializer: Arc<dyn Serializer>) -> Self {
        self.serializer = serializer;
        self
    }

    /// The cache directory
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn hash_type(&self) -> HashType {
        self.hash_type
    }

    /// Full path of the file backing `key`
    pub fn path(&self, key: &str) -> PathBuf {
        let digest = self.hash_type.hex_digest(key);

        let mut path = self.directory.clone();
        for level in 0..self.hash_type.parts_count() {
            path.push(&digest[level * 2..level * 2 + 2]);
        }
        path.push(&digest);
        path
    }

    /// Read and decode the payload, deleting the file when expired
    async fn read_payload(&self, key: &str) -> Result<Option<Payload>> {
        let path = self.path(key);

        let contents = match fs::read(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if contents.len() < HEADER_LEN {
            return Err(CacheError::SerializationError(format!(
                "cache file {} is truncated",
                path.display()
            )));
        }

        let expires_at = std::str::from_utf8(&contents[..HEADER_LEN])
            .ok()
            .and_then(|header| header.parse::<i64>().ok())
            .ok_or_else(|| {
                CacheError::SerializationError(format!(
                    "cache file {} has an invalid expiration header",
                    path.display()
                ))
            })?;

        if Utc::now().timestamp() >= expires_at {
            debug!("Removing expired cache file for key: {}", key);
            self.forget(key).await?;
            return Ok(None);
        }

        let value = self.unserialize(&contents[HEADER_LEN..])?;
        Ok(Some(Payload { value, expires_at }))
    }

    /// Write a value with an absolute expiration timestamp
    async fn write_payload(&self, key: &str, value: &CacheValue, expires_at: i64) -> Result<()> {
        let path = self.path(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut contents = format!("{:010}", expires_at).into_bytes();
        contents.extend(self.serialize(value)?);

        fs::write(&path, contents).await?;
        Ok(())
    }

    fn expiration(minutes: u64) -> i64 {
        if minutes == 0 {
            return FOREVER_TIMESTAMP;
        }

        let seconds = i64::try_from(minutes.saturating_mul(60)).unwrap_or(i64::MAX);
        Utc::now()
            .timestamp()
            .saturating_add(seconds)
            .min(FOREVER_TIMESTAMP)
    }
}

#[async_trait]
impl Store for FileStore {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn get(&self, key: &str) -> Result<Option<CacheValue>> {
        Ok(self.read_payload(key).await?.map(|payload| payload.value))
    }

    async fn put(&self, key: &str, value: CacheValue, minutes: u64) -> Result<()> {
        self.write_payload(key, &value, Self::expiration(minutes)).await
    }

    async fn increment(&self, key: &str, value: i64) -> Result<i64> {
        let (current, expires_at) = match self.read_payload(key).await? {
            Some(payload) => {
                let current = payload.value.as_i64().ok_or_else(|| CacheError::InvalidValue {
                    key: key.to_string(),
                    reason: format!("cannot increment non-integer value {}", payload.value),
                })?;
                (current, payload.expires_at)
            }
            None => (0, FOREVER_TIMESTAMP),
        };

        let integer = current.checked_add(value).ok_or_else(|| CacheError::InvalidValue {
            key: key.to_string(),
            reason: "increment overflows a 64-bit integer".to_string(),
        })?;

        self.write_payload(key, &CacheValue::from(integer), expires_at)
            .await?;
        Ok(integer)
    }

    async fn forever(&self, key: &str, value: CacheValue) -> Result<()> {
        self.put(key, value, 0).await
    }

    async fn forget(&self, key: &str) -> Result<bool> {
        match fs::remove_file(self.path(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn flush(&self) -> Result<()> {
        let mut entries = match fs::read_dir(&self.directory).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                fs::remove_dir_all(entry.path()).await?;
            } else {
                fs::remove_file(entry.path()).await?;
            }
        }

        debug!("Flushed file store at {}", self.directory.display());
        Ok(())
    }

    fn prefix(&self) -> &str {
        ""
    }

    fn serializer(&self) -> &dyn Serializer {
        self.serializer.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serializer::MsgPackSerializer;
    use serde_json::json;

    fn store_in(dir: &tempfile::TempDir) -> FileStore {
        FileStore::new(dir.path())
    }

    #[tokio::test]
    async fn test_none_is_returned_if_file_doesnt_exist() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        assert_eq!(store.get("foo").await.unwrap(), None);
    }

    #[test]
    fn test_path_uses_digest_chunks() {
        let store = FileStore::new("/tmp/cache");
        let sha = Sha256::digest(b"foo");
        let sha = hex::encode(sha);

        let mut expected = PathBuf::from("/tmp/cache");
        for i in 0..8 {
            expected.push(&sha[i * 2..i * 2 + 2]);
        }
        expected.push(&sha);

        assert_eq!(store.path("foo"), expected);
    }

    #[tokio::test]
    async fn test_put_creates_missing_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store.put("foo", json!("bar"), 10).await.unwrap();

        let path = store.path("foo");
        assert!(path.exists());
        let contents = std::fs::read(&path).unwrap();
        assert_eq!(&contents[HEADER_LEN..], br#""bar""#);
    }

    #[tokio::test]
    async fn test_forever_store_values_with_high_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store.forever("foo", json!("bar")).await.unwrap();

        let contents = std::fs::read(store.path("foo")).unwrap();
        assert_eq!(&contents[..HEADER_LEN], b"9999999999");
        assert_eq!(store.get("foo").await.unwrap(), Some(json!("bar")));
    }

    #[tokio::test]
    async fn test_expired_items_return_none_and_are_deleted() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store.write_payload("foo", &json!("bar"), 0).await.unwrap();

        assert_eq!(store.get("foo").await.unwrap(), None);
        assert!(!store.path("foo").exists());
    }

    #[tokio::test]
    async fn test_corrupt_header_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let path = store.path("foo");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"abc").unwrap();

        let err = store.get("foo").await.unwrap_err();
        assert!(matches!(err, CacheError::SerializationError(_)));
    }

    #[tokio::test]
    async fn test_forget_with_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        assert!(!store.forget("foo").await.unwrap());
    }

    #[tokio::test]
    async fn test_forget_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.put("foo", json!("bar"), 10).await.unwrap();

        assert!(store.forget("foo").await.unwrap());
        assert!(!store.path("foo").exists());
    }

    #[tokio::test]
    async fn test_increment_keeps_expiration_header() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.put("hits", json!(1), 10).await.unwrap();
        let header_before = std::fs::read(store.path("hits")).unwrap()[..HEADER_LEN].to_vec();

        assert_eq!(store.increment("hits", 4).await.unwrap(), 5);
        assert_eq!(store.decrement("hits", 2).await.unwrap(), 3);

        let contents = std::fs::read(store.path("hits")).unwrap();
        assert_eq!(&contents[..HEADER_LEN], header_before.as_slice());
        assert_eq!(store.get("hits").await.unwrap(), Some(json!(3)));
    }

    #[tokio::test]
    async fn test_flush_empties_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.put("foo", json!("bar"), 10).await.unwrap();
        store.put("baz", json!("boom"), 10).await.unwrap();

        store.flush().await.unwrap();

        assert!(dir.path().exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
        assert_eq!(store.get("foo").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_get_with_msgpack_serializer() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir).with_serializer(Arc::new(MsgPackSerializer));

        store.forever("foo", json!({"foo": "bar"})).await.unwrap();

        assert_eq!(store.get("foo").await.unwrap(), Some(json!({"foo": "bar"})));
    }

    #[tokio::test]
    async fn test_set_hash_type() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::with_hash_type(dir.path(), HashType::Md5);

        store.put("foo", json!("bar"), 10).await.unwrap();

        let md5 = hex::encode(Md5::digest(b"foo"));
        assert!(dir.path().join(&md5[0..2]).join(&md5[2..4]).is_dir());
        assert!(dir.path().join(&md5[0..2]).join(&md5[2..4]).join(&md5).is_file());
    }

    #[test]
    fn test_unknown_hash_type_is_config_error() {
        assert_eq!("sha1".parse::<HashType>().unwrap(), HashType::Sha1);

        let err = "crc32".parse::<HashType>().unwrap_err();
        assert!(matches!(err, CacheError::ConfigError(_)));
    }
}
