//! Two-level cache over the keyed store.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cache::backing::BackingTier;
use crate::cache::entry::{CacheEntry, CacheTier};
use crate::observability::metrics;
use crate::store::KeyedStore;

/// TTL cache with a fast in-process tier and an optional slower backing tier.
pub struct TieredCache<V>
where
    V: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Label for logs and metrics ("routes", "vehicles", ...).
    name: &'static str,
    fast: KeyedStore<CacheEntry<V>>,
    backing: Option<Arc<dyn BackingTier<V>>>,
}

impl<V> TieredCache<V>
where
    V: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            fast: KeyedStore::new(),
            backing: None,
        }
    }

    pub fn with_backing(name: &'static str, backing: Arc<dyn BackingTier<V>>) -> Self {
        Self {
            name,
            fast: KeyedStore::new(),
            backing: Some(backing),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Look up a live value.
    ///
    /// An expired fast-tier entry is treated as absent (but kept in place for
    /// [`get_stale`](Self::get_stale)). A live backing-tier entry is promoted
    /// back into the fast tier on the way out.
    pub async fn get(&self, key: &str) -> Option<V> {
        if let Some(entry) = self.fast.get(key) {
            if !entry.is_expired() {
                return Some(entry.value);
            }
        }

        if let Some(backing) = &self.backing {
            if let Some(entry) = backing.get(key).await {
                if !entry.is_expired() {
                    let promoted = entry.with_origin(CacheTier::Backing);
                    self.fast.set(key.to_string(), promoted.clone());
                    tracing::debug!(cache = self.name, key = %key, "Promoted entry from backing tier");
                    return Some(promoted.value);
                }
            }
        }

        None
    }

    /// Last known value for `key`, ignoring expiry.
    pub async fn get_stale(&self, key: &str) -> Option<V> {
        if let Some(entry) = self.fast.get(key) {
            return Some(entry.value);
        }
        if let Some(backing) = &self.backing {
            if let Some(entry) = backing.get(key).await {
                return Some(entry.value);
            }
        }
        None
    }

    /// Store a value in both tiers with the caller-supplied TTL.
    pub async fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let key = key.into();
        let entry = CacheEntry::new(value, ttl);
        self.fast.set(key.clone(), entry.clone());
        if let Some(backing) = &self.backing {
            backing.set(&key, entry).await;
        }
        metrics::record_cache_size(self.name, self.fast.len());
    }

    /// Drop everything from both tiers.
    pub async fn clear(&self) {
        self.fast.clear();
        if let Some(backing) = &self.backing {
            backing.clear().await;
        }
        metrics::record_cache_size(self.name, 0);
    }

    pub fn len(&self) -> usize {
        self.fast.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fast.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::backing::MemoryTier;

    #[tokio::test]
    async fn test_set_then_get_within_ttl() {
        let cache: TieredCache<u32> = TieredCache::new("test");
        cache.set("k", 5, Duration::from_secs(60)).await;
        assert_eq!(cache.get("k").await, Some(5));
    }

    #[tokio::test]
    async fn test_expired_entry_absent_but_stale_readable() {
        let cache: TieredCache<u32> = TieredCache::new("test");
        cache.set("k", 5, Duration::from_millis(10)).await;
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(cache.get("k").await, None);
        assert_eq!(cache.get_stale("k").await, Some(5));
    }

    #[tokio::test]
    async fn test_backing_tier_promotion() {
        let backing = Arc::new(MemoryTier::new());
        let cache: TieredCache<u32> = TieredCache::with_backing("test", backing.clone());

        // Seed only the backing tier, as if the fast tier were lost.
        backing
            .set("k", CacheEntry::new(9, Duration::from_secs(60)))
            .await;
        assert!(cache.fast.get("k").is_none());

        assert_eq!(cache.get("k").await, Some(9));
        // Promoted into the fast tier, marked with its origin.
        let promoted = cache.fast.get("k").unwrap();
        assert_eq!(promoted.origin, CacheTier::Backing);
    }

    #[tokio::test]
    async fn test_expired_backing_entry_not_promoted() {
        let backing = Arc::new(MemoryTier::new());
        let cache: TieredCache<u32> = TieredCache::with_backing("test", backing.clone());

        backing
            .set("k", CacheEntry::new(9, Duration::from_millis(0)))
            .await;
        assert_eq!(cache.get("k").await, None);
        // Still visible to a deliberate stale read.
        assert_eq!(cache.get_stale("k").await, Some(9));
    }

    #[tokio::test]
    async fn test_clear_drops_both_tiers() {
        let backing = Arc::new(MemoryTier::new());
        let cache: TieredCache<u32> = TieredCache::with_backing("test", backing.clone());
        cache.set("k", 5, Duration::from_secs(60)).await;

        cache.clear().await;
        assert_eq!(cache.get("k").await, None);
        assert!(backing.get("k").await.is_none());
    }

    #[tokio::test]
    async fn test_refresh_extends_entry() {
        let cache: TieredCache<u32> = TieredCache::new("test");
        cache.set("k", 5, Duration::from_millis(10)).await;
        cache.set("k", 6, Duration::from_secs(60)).await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(cache.get("k").await, Some(6));
    }
}
