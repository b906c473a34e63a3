//! Core type definitions shared by stores, tagged views and repositories

use chrono::{DateTime, Utc};
use sha1::{Digest, Sha1};
use std::fmt;
use std::time::Duration;

/// Cache value type - every store holds dynamic JSON-shaped values
pub type CacheValue = serde_json::Value;

/// Cache key type
pub type CacheKey = String;

/// Lowercase hex SHA-1 digest of a string's UTF-8 bytes.
///
/// Tagged keys depend on this exact rendering; other implementations sharing
/// a backend must derive the same keys byte for byte.
pub fn sha1_hex(input: impl AsRef<[u8]>) -> String {
    hex::encode(Sha1::digest(input.as_ref()))
}

/// Lifetime requested for a cached item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// Relative lifetime in minutes
    Minutes(i64),

    /// Absolute expiration time
    At(DateTime<Utc>),
}

impl Expiry {
    /// Resolve to a number of minutes relative to now.
    ///
    /// Returns `None` when the item would already be expired, in which case
    /// callers skip the write entirely.
    pub fn to_minutes(&self) -> Option<u64> {
        self.to_minutes_from(Utc::now())
    }

    /// Resolve to a number of minutes relative to `now`
    pub fn to_minutes_from(&self, now: DateTime<Utc>) -> Option<u64> {
        match *self {
            Expiry::Minutes(minutes) if minutes < 0 => None,
            Expiry::Minutes(minutes) => Some(minutes as u64),
            Expiry::At(at) => {
                let remaining = (at - now).num_milliseconds();
                if remaining <= 0 {
                    return None;
                }
                // ceil(remaining_seconds / 60)
                Some(((remaining as u64) + 59_999) / 60_000)
            }
        }
    }
}

impl From<i32> for Expiry {
    fn from(minutes: i32) -> Self {
        Expiry::Minutes(minutes as i64)
    }
}

impl From<i64> for Expiry {
    fn from(minutes: i64) -> Self {
        Expiry::Minutes(minutes)
    }
}

impl From<u32> for Expiry {
    fn from(minutes: u32) -> Self {
        Expiry::Minutes(minutes as i64)
    }
}

impl From<u64> for Expiry {
    fn from(minutes: u64) -> Self {
        Expiry::Minutes(i64::try_from(minutes).unwrap_or(i64::MAX))
    }
}

impl From<DateTime<Utc>> for Expiry {
    fn from(at: DateTime<Utc>) -> Self {
        Expiry::At(at)
    }
}

impl From<Duration> for Expiry {
    fn from(duration: Duration) -> Self {
        let minutes = duration.as_millis().div_ceil(60_000);
        Expiry::Minutes(i64::try_from(minutes).unwrap_or(i64::MAX))
    }
}

impl fmt::Display for Expiry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expiry::Minutes(minutes) => write!(f, "{} minutes", minutes),
            Expiry::At(at) => write!(f, "until {}", at.to_rfc3339()),
        }
    }
}
