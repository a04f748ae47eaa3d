//! Structured logging initialization.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Log level comes from `RUST_LOG`, defaulting to debug for this crate.
/// Calling this twice panics in tracing-subscriber, so only binaries call it.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "transit_client=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
