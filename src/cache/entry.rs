//! Cache entry with absolute expiry.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Which tier an entry was last read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CacheTier {
    Fast,
    Backing,
}

/// A cached value with creation and expiry timestamps (Unix milliseconds).
///
/// Expired entries are logically absent for normal reads but stay in place
/// physically so stale-fallback reads can still see them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<V> {
    pub value: V,
    pub created_at: u64,
    pub expires_at: u64,
    pub origin: CacheTier,
}

impl<V> CacheEntry<V> {
    /// Create an entry expiring `ttl` from now, originating in the fast tier.
    pub fn new(value: V, ttl: Duration) -> Self {
        let now = now_ms();
        Self {
            value,
            created_at: now,
            expires_at: now.saturating_add(ttl.as_millis() as u64),
            origin: CacheTier::Fast,
        }
    }

    pub fn is_expired(&self) -> bool {
        now_ms() >= self.expires_at
    }

    pub fn with_origin(mut self, origin: CacheTier) -> Self {
        self.origin = origin;
        self
    }
}

/// Current time in Unix milliseconds.
pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
