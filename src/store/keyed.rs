//! Concurrent keyed store with change notification.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::broadcast;

/// What happened to a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEventKind {
    Added,
    Updated,
    Removed,
}

/// Notification emitted after a successful mutation.
#[derive(Debug, Clone)]
pub struct StoreEvent {
    pub key: String,
    pub kind: StoreEventKind,
}

/// A thread-safe map from string keys to values.
///
/// Internally a sharded-lock map: reads on different shards never contend,
/// writes take an exclusive lock on one shard only. Events are emitted after
/// the shard guard is dropped so a subscriber re-entering the store cannot
/// deadlock against the mutation that notified it.
pub struct KeyedStore<V> {
    inner: Arc<DashMap<String, V>>,
    events: broadcast::Sender<StoreEvent>,
}

impl<V> Clone for KeyedStore<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            events: self.events.clone(),
        }
    }
}

impl<V> Default for KeyedStore<V>
where
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V> KeyedStore<V>
where
    V: Clone,
{
    /// Create a new empty store.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            inner: Arc::new(DashMap::new()),
            events,
        }
    }

    /// Subscribe to mutation events.
    ///
    /// Broadcast semantics: a lagged receiver drops the oldest events rather
    /// than blocking writers.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Look up a value, cloning it out of the map.
    pub fn get(&self, key: &str) -> Option<V> {
        self.inner.get(key).map(|r| r.value().clone())
    }

    /// Insert or replace a value.
    pub fn set(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        let kind = if self.inner.insert(key.clone(), value).is_some() {
            StoreEventKind::Updated
        } else {
            StoreEventKind::Added
        };
        self.emit(key, kind);
    }

    /// Remove a key. Returns true if it was present.
    pub fn remove(&self, key: &str) -> bool {
        let removed = self.inner.remove(key).is_some();
        if removed {
            self.emit(key.to_string(), StoreEventKind::Removed);
        }
        removed
    }

    /// Get the value for `key`, inserting the factory's result if absent.
    ///
    /// The factory runs under the shard's write lock, so concurrent callers
    /// racing on the same absent key invoke it exactly once; the losers block
    /// briefly and then observe the winner's value.
    pub fn get_or_add<F>(&self, key: impl Into<String>, factory: F) -> V
    where
        F: FnOnce() -> V,
    {
        let key = key.into();
        let mut created = false;
        let value = {
            let entry = self.inner.entry(key.clone()).or_insert_with(|| {
                created = true;
                factory()
            });
            entry.value().clone()
        };
        if created {
            self.emit(key, StoreEventKind::Added);
        }
        value
    }

    /// Insert `add_value` if the key is absent, otherwise apply `update` to
    /// the existing value in place. Returns the resulting value.
    pub fn add_or_update<F>(&self, key: impl Into<String>, add_value: V, update: F) -> V
    where
        F: FnOnce(&mut V),
    {
        let key = key.into();
        let (value, kind) = {
            match self.inner.entry(key.clone()) {
                Entry::Occupied(mut occupied) => {
                    update(occupied.get_mut());
                    (occupied.get().clone(), StoreEventKind::Updated)
                }
                Entry::Vacant(vacant) => {
                    let slot = vacant.insert(add_value);
                    (slot.value().clone(), StoreEventKind::Added)
                }
            }
        };
        self.emit(key, kind);
        value
    }

    /// A point-in-time copy of the whole map.
    ///
    /// The copy is taken shard by shard; enumerating it can never observe a
    /// concurrent mutation.
    pub fn snapshot(&self) -> HashMap<String, V> {
        self.inner
            .iter()
            .map(|r| (r.key().clone(), r.value().clone()))
            .collect()
    }

    /// Remove every entry, emitting a `Removed` event per key.
    pub fn clear(&self) {
        let keys: Vec<String> = self.inner.iter().map(|r| r.key().clone()).collect();
        for key in keys {
            self.remove(&key);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    fn emit(&self, key: String, kind: StoreEventKind) {
        // No subscribers is fine.
        let _ = self.events.send(StoreEvent { key, kind });
    }
}
