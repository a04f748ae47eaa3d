//! Request lifecycle: cooperative cancellation.
//!
//! # Design Decisions
//! - Cancellation is per caller: cancelling one source aborts only the waits
//!   holding that source's tokens, never other callers on the same cache key
//!   or connection state
//! - Every retry/backoff delay and network await races against the token

pub mod cancel;

pub use cancel::{CancelSource, CancelToken};
