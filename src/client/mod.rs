//! Orchestrating client.
//!
//! # Data Flow
//! ```text
//! caller query
//!     → keys.rs (deterministic cache key from operation + filters)
//!     → tiered cache (hit → return, no network)
//!     → connection.rs (ensure authenticated; serialized re-auth)
//!     → provider (resilience engine + transport)
//!     → cache repopulated with the domain TTL → caller
//!
//! fetch failure + stale cached value → stale value, error absorbed
//! ```

pub mod connection;
pub mod keys;
pub mod transit;

pub use connection::{ConnectionMonitor, ConnectionState};
pub use transit::TransitClient;
