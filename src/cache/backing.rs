//! Pluggable backing tier for the cache's slower second level.
//!
//! The exact technology is a deployment choice; the cache only needs
//! get/set/clear. Tier failures degrade to cache misses rather than erroring
//! the caller's request.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::cache::entry::CacheEntry;

/// A slower, larger second cache tier.
#[async_trait]
pub trait BackingTier<V>: Send + Sync
where
    V: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Option<CacheEntry<V>>;
    async fn set(&self, key: &str, entry: CacheEntry<V>);
    async fn clear(&self);
}

/// In-memory backing tier, modelling a larger-capacity store.
#[derive(Default)]
pub struct MemoryTier<V> {
    inner: DashMap<String, CacheEntry<V>>,
}

impl<V> MemoryTier<V> {
    pub fn new() -> Self {
        Self {
            inner: DashMap::new(),
        }
    }
}

#[async_trait]
impl<V> BackingTier<V> for MemoryTier<V>
where
    V: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Option<CacheEntry<V>> {
        self.inner.get(key).map(|r| r.value().clone())
    }

    async fn set(&self, key: &str, entry: CacheEntry<V>) {
        self.inner.insert(key.to_string(), entry);
    }

    async fn clear(&self) {
        self.inner.clear();
    }
}

/// JSON-file backing tier.
///
/// The whole entry map is loaded lazily on first access and rewritten on
/// every `set`. Suited to the small per-domain maps this client keeps, not to
/// high write rates.
pub struct JsonFileTier<V> {
    path: PathBuf,
    state: Mutex<Option<HashMap<String, CacheEntry<V>>>>,
}

impl<V> JsonFileTier<V>
where
    V: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: Mutex::new(None),
        }
    }

    pub fn shared(path: impl Into<PathBuf>) -> Arc<Self> {
        Arc::new(Self::new(path))
    }

    async fn load(&self) -> HashMap<String, CacheEntry<V>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(map) => map,
                Err(e) => {
                    tracing::warn!(path = %self.path.display(), error = %e, "Backing tier file unreadable, starting empty");
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        }
    }

    async fn persist(&self, map: &HashMap<String, CacheEntry<V>>) {
        match serde_json::to_vec_pretty(map) {
            Ok(bytes) => {
                if let Err(e) = tokio::fs::write(&self.path, bytes).await {
                    tracing::warn!(path = %self.path.display(), error = %e, "Failed to persist backing tier");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize backing tier");
            }
        }
    }
}

#[async_trait]
impl<V> BackingTier<V> for JsonFileTier<V>
where
    V: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Option<CacheEntry<V>> {
        let mut state = self.state.lock().await;
        if state.is_none() {
            *state = Some(self.load().await);
        }
        state.as_ref().and_then(|map| map.get(key).cloned())
    }

    async fn set(&self, key: &str, entry: CacheEntry<V>) {
        let snapshot = {
            let mut state = self.state.lock().await;
            if state.is_none() {
                *state = Some(self.load().await);
            }
            match state.as_mut() {
                Some(map) => {
                    map.insert(key.to_string(), entry);
                    map.clone()
                }
                None => return,
            }
        };
        self.persist(&snapshot).await;
    }

    async fn clear(&self) {
        let mut state = self.state.lock().await;
        *state = Some(HashMap::new());
        drop(state);
        let _ = tokio::fs::remove_file(&self.path).await;
    }
}
