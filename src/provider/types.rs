//! Provider error taxonomy and raw response type.

use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use thiserror::Error;

/// Errors that can occur while talking to the transit data provider.
///
/// Nothing here is fatal to the process; every variant is scoped to a single
/// logical request.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Socket-level or timeout failure before a status code was seen.
    /// Retryable; classified by the resilience engine.
    #[error("transport error: {0}")]
    Transport(String),

    /// 5xx/timeout failures that survived the whole retry budget.
    #[error("transient failure after {attempts} attempts: {message}")]
    Transient { attempts: u32, message: String },

    /// Provider rate limit (429) still in force after retries.
    #[error("rate limited by provider")]
    RateLimited { retry_after_ms: Option<u64> },

    /// Credential rejected (401). Never retried.
    #[error("authentication rejected: {0}")]
    Authentication(String),

    /// Response body did not deserialize. Never retried; the payload will
    /// not change.
    #[error("malformed response (status {status}): {reason}")]
    Malformed {
        status: u16,
        reason: String,
        body: String,
    },

    /// Any other non-success status. Not retried.
    #[error("unexpected status {status}")]
    UnexpectedStatus { status: u16, body: String },

    /// The caller's cancellation token fired. Always propagated unchanged.
    #[error("request cancelled")]
    Cancelled,

    /// Invalid client configuration (bad base URL, unbuildable HTTP client).
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

/// A raw provider response, prior to classification and decoding.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl ProviderResponse {
    /// Lossy UTF-8 view of the body, for diagnostics.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}
