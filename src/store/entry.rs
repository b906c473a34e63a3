//! Stored entry with optional expiration, used by the in-process store

use crate::types::CacheValue;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::time::Duration;

/// A cached value together with its expiration time
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEntry {
    /// The cached value
    pub value: CacheValue,

    /// When the entry expires; `None` means never
    pub expires_at: Option<DateTime<Utc>>,
}

impl StoredEntry {
    /// Create an entry living for `minutes`; zero minutes means forever
    pub fn new(value: CacheValue, minutes: u64) -> Self {
        if minutes == 0 {
            return Self::forever(value);
        }

        let now = Utc::now();
        let lifetime = i64::try_from(minutes)
            .ok()
            .and_then(ChronoDuration::try_minutes);

        Self {
            value,
            expires_at: lifetime.and_then(|lifetime| now.checked_add_signed(lifetime)),
        }
    }

    /// Create an entry that never expires
    pub fn forever(value: CacheValue) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    /// Create an entry with a custom expiration time
    pub fn with_expiration(value: CacheValue, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            value,
            expires_at,
        }
    }

    /// Check if the entry has expired
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => now >= expires_at,
            None => false,
        }
    }

    /// Get time until expiration (`None` for forever or already expired entries)
    pub fn time_until_expiration(&self) -> Option<Duration> {
        let expires_at = self.expires_at?;
        (expires_at - Utc::now()).to_std().ok()
    }
}
