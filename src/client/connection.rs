//! Connection state machine.
//!
//! # States
//! - Disconnected: initial; no session established
//! - Connecting: authentication in flight
//! - Connected: credential verified, provider reachable
//! - Degraded: serving stale cache after fetch failures
//! - AuthenticationFailed: credential rejected; recoverable by re-auth
//! - RateLimitExceeded: provider throttling; recovers when the window resets
//!
//! # Design Decisions
//! - Owned exclusively by the orchestrating client; everyone else observes
//! - Published through a watch channel: subscribers see the latest state,
//!   transitions are level- not edge-triggered
//! - AuthenticationFailed and RateLimitExceeded are never terminal

use tokio::sync::watch;

use crate::observability::metrics;

/// Connection status visible to collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Degraded,
    AuthenticationFailed,
    RateLimitExceeded,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Degraded => "degraded",
            Self::AuthenticationFailed => "authentication_failed",
            Self::RateLimitExceeded => "rate_limit_exceeded",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Publisher for the connection state.
pub struct ConnectionMonitor {
    tx: watch::Sender<ConnectionState>,
}

impl ConnectionMonitor {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(ConnectionState::Disconnected);
        Self { tx }
    }

    pub fn state(&self) -> ConnectionState {
        *self.tx.borrow()
    }

    /// Observe state changes. The receiver always sees the latest value.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.tx.subscribe()
    }

    /// Move to `next`, notifying subscribers. No-op when already there.
    pub fn transition(&self, next: ConnectionState) {
        let mut previous = None;
        let changed = self.tx.send_if_modified(|state| {
            if *state == next {
                return false;
            }
            previous = Some(*state);
            *state = next;
            true
        });
        if changed {
            if let Some(previous) = previous {
                tracing::info!(
                    from = previous.as_str(),
                    to = next.as_str(),
                    "Connection state changed"
                );
            }
            metrics::record_connection_state(next.as_str());
        }
    }
}

impl Default for ConnectionMonitor {
    fn default() -> Self {
        Self::new()
    }
}
