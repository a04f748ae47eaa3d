//! Transit data provider access.
//!
//! # Data Flow
//! ```text
//! client query
//!     → api.rs (TransitProvider trait; HTTP implementation)
//!     → resilience engine (classify, retry, statistics)
//!     → transport.rs (reqwest request/response, JSON)
//!     → external provider
//! ```
//!
//! # Design Decisions
//! - Transport owns no retry policy; the resilience engine drives it
//! - Raw status/headers/body cross the transport boundary so classification
//!   stays in one place
//! - Errors carry the status code and raw body for diagnostics

pub mod api;
pub mod transport;
pub mod types;

pub use api::{HttpTransitProvider, TransitProvider};
pub use transport::HttpTransport;
pub use types::{ProviderError, ProviderResponse, ProviderResult};
