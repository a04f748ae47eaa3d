//! Retry driver for provider requests.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;

use crate::config::schema::RetryConfig;
use crate::lifecycle::CancelToken;
use crate::observability::metrics;
use crate::provider::transport::decode;
use crate::provider::types::{ProviderError, ProviderResponse, ProviderResult};
use crate::resilience::backoff::calculate_backoff;
use crate::resilience::outcome::{classify, AttemptOutcome};
use crate::resilience::rate_limit::RateLimitInfo;
use crate::resilience::stats::UsageTracker;

/// Retry budget for one logical request.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts allowed, including the first.
    pub max_retries: u32,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_backoff: Duration::from_millis(config.base_backoff_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
        }
    }
}

/// State for one logical request; created, consumed, discarded.
#[derive(Debug)]
pub struct RetryContext {
    pub attempt: u32,
    pub base_backoff: Duration,
    pub started: Instant,
}

impl RetryContext {
    fn new(base_backoff: Duration) -> Self {
        Self {
            attempt: 0,
            base_backoff,
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Classifies outcomes, drives retries with backoff, accumulates statistics.
pub struct ResilienceEngine {
    tracker: Arc<UsageTracker>,
}

impl ResilienceEngine {
    pub fn new(tracker: Arc<UsageTracker>) -> Self {
        Self { tracker }
    }

    pub fn tracker(&self) -> &Arc<UsageTracker> {
        &self.tracker
    }

    /// Run `request` until it succeeds, fails terminally, or the retry budget
    /// is exhausted, then decode the body into `T`.
    ///
    /// `request` produces one raw response per attempt; 404 yields
    /// `T::default()` (absence is not a failure). Cancellation is checked
    /// before each attempt and raced against both the request and every
    /// backoff sleep.
    pub async fn execute<T, F, Fut>(
        &self,
        operation: &str,
        policy: &RetryPolicy,
        cancel: &CancelToken,
        mut request: F,
    ) -> ProviderResult<T>
    where
        T: DeserializeOwned + Default,
        F: FnMut() -> Fut,
        Fut: Future<Output = ProviderResult<ProviderResponse>>,
    {
        let mut context = RetryContext::new(policy.base_backoff);

        loop {
            if cancel.is_cancelled() {
                return Err(ProviderError::Cancelled);
            }
            context.attempt += 1;
            self.tracker.record_attempt();
            let attempt_started = Instant::now();

            let result = tokio::select! {
                r = request() => r,
                _ = cancel.cancelled() => return Err(ProviderError::Cancelled),
            };

            if let Ok(response) = &result {
                if let Some(info) = RateLimitInfo::from_headers(&response.headers) {
                    self.tracker.record_rate_limit(&info);
                }
            }
            let status = result.as_ref().ok().map(|r| r.status.as_u16());
            if let Some(status) = status {
                metrics::record_provider_call(operation, status);
            }

            match classify(result) {
                AttemptOutcome::Deliver(response) => {
                    let elapsed = attempt_started.elapsed();
                    self.tracker.record_success(elapsed);
                    metrics::record_response_time(operation, elapsed);
                    return decode(&response);
                }
                AttemptOutcome::Absent => {
                    self.tracker.record_success(attempt_started.elapsed());
                    return Ok(T::default());
                }
                AttemptOutcome::Retry { error, delay_hint } => {
                    self.tracker.record_failure();
                    if context.attempt >= policy.max_retries {
                        tracing::warn!(
                            operation = %operation,
                            attempts = context.attempt,
                            elapsed = ?context.elapsed(),
                            error = %error,
                            "Retry budget exhausted"
                        );
                        return Err(exhausted(context.attempt, error));
                    }

                    let delay = match delay_hint {
                        // The provider told us when to come back; honor it.
                        Some(hint) => hint,
                        None => calculate_backoff(
                            context.attempt,
                            context.base_backoff.as_millis() as u64,
                            policy.max_backoff.as_millis() as u64,
                        ),
                    };
                    if matches!(error, ProviderError::RateLimited { .. }) {
                        metrics::record_rate_limited(operation);
                    }
                    metrics::record_retry(operation);
                    tracing::info!(
                        operation = %operation,
                        attempt = context.attempt,
                        delay = ?delay,
                        error = %error,
                        "Retrying provider request"
                    );

                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = cancel.cancelled() => return Err(ProviderError::Cancelled),
                    }
                }
                AttemptOutcome::Fail(error) => {
                    if !matches!(error, ProviderError::Cancelled) {
                        self.tracker.record_failure();
                    }
                    return Err(error);
                }
            }
        }
    }
}

/// Convert the last retryable error into the terminal form reported after
/// the budget runs out.
fn exhausted(attempts: u32, error: ProviderError) -> ProviderError {
    match error {
        e @ ProviderError::RateLimited { .. } => e,
        other => ProviderError::Transient {
            attempts,
            message: other.to_string(),
        },
    }
}
