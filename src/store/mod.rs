//! Thread-safe keyed store.
//!
//! # Responsibilities
//! - Concurrent map with read/write separation (sharded RW locks)
//! - Single-flight `get_or_add` (factory runs at most once per absent key)
//! - Change notification after every successful mutation
//! - Point-in-time snapshots for lock-free enumeration

pub mod keyed;

pub use keyed::{KeyedStore, StoreEvent, StoreEventKind};
