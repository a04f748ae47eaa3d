//! Tiered cache with lazy TTL expiry.
//!
//! # Data Flow
//! ```text
//! get(key):
//!     fast tier (KeyedStore) → live entry → return
//!     → expired/absent → backing tier → live entry → re-promote → return
//!     → miss
//!
//! set(key, value, ttl):
//!     fast tier (synchronous) + backing tier (async)
//! ```
//!
//! # Design Decisions
//! - Expiry is checked at read time; no background eviction thread. A bounded
//!   amount of stale memory is the price for deliberate stale reads.
//! - `get_stale` ignores expiry entirely; only the client's failure-fallback
//!   path uses it.
//! - TTL is supplied per `set` call; the cache never hard-codes one.

pub mod backing;
pub mod entry;
pub mod tiered;

pub use backing::{BackingTier, JsonFileTier, MemoryTier};
pub use entry::{CacheEntry, CacheTier};
pub use tiered::TieredCache;
