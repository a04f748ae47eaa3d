//! Attempt outcome classification.

use std::time::Duration;

use crate::provider::types::{ProviderError, ProviderResponse};
use crate::resilience::rate_limit::RateLimitInfo;

/// What a single attempt produced, and what the retry loop should do next.
#[derive(Debug)]
pub enum AttemptOutcome {
    /// 2xx: body is ready to decode.
    Deliver(ProviderResponse),
    /// 404: the resource does not exist; absence is not a failure.
    Absent,
    /// Worth another attempt (429, 5xx, transport-level failure).
    Retry {
        error: ProviderError,
        /// Provider-directed delay, when it sent one.
        delay_hint: Option<Duration>,
    },
    /// Not worth retrying (401, other 4xx, cancellation).
    Fail(ProviderError),
}

/// Classify one attempt's raw result.
pub fn classify(result: Result<ProviderResponse, ProviderError>) -> AttemptOutcome {
    let response = match result {
        Ok(response) => response,
        Err(ProviderError::Cancelled) => return AttemptOutcome::Fail(ProviderError::Cancelled),
        Err(ProviderError::Transport(message)) => {
            return AttemptOutcome::Retry {
                error: ProviderError::Transport(message),
                delay_hint: None,
            }
        }
        Err(other) => return AttemptOutcome::Fail(other),
    };

    let status = response.status;
    if status.is_success() {
        return AttemptOutcome::Deliver(response);
    }
    if status.as_u16() == 404 {
        return AttemptOutcome::Absent;
    }
    if status.as_u16() == 429 {
        let retry_after =
            RateLimitInfo::from_headers(&response.headers).and_then(|info| info.retry_after);
        return AttemptOutcome::Retry {
            error: ProviderError::RateLimited {
                retry_after_ms: retry_after.map(|d| d.as_millis() as u64),
            },
            delay_hint: retry_after,
        };
    }
    if status.as_u16() == 401 {
        return AttemptOutcome::Fail(ProviderError::Authentication(response.body_text()));
    }
    if status.is_server_error() {
        return AttemptOutcome::Retry {
            error: ProviderError::UnexpectedStatus {
                status: status.as_u16(),
                body: response.body_text(),
            },
            delay_hint: None,
        };
    }

    AttemptOutcome::Fail(ProviderError::UnexpectedStatus {
        status: status.as_u16(),
        body: response.body_text(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderMap, HeaderValue};
    use reqwest::StatusCode;

    fn response(status: StatusCode) -> ProviderResponse {
        ProviderResponse {
            status,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }

    #[test]
    fn test_success_delivers() {
        assert!(matches!(
            classify(Ok(response(StatusCode::OK))),
            AttemptOutcome::Deliver(_)
        ));
    }

    #[test]
    fn test_404_is_absence() {
        assert!(matches!(
            classify(Ok(response(StatusCode::NOT_FOUND))),
            AttemptOutcome::Absent
        ));
    }

    #[test]
    fn test_401_fails_immediately() {
        assert!(matches!(
            classify(Ok(response(StatusCode::UNAUTHORIZED))),
            AttemptOutcome::Fail(ProviderError::Authentication(_))
        ));
    }

    #[test]
    fn test_429_retries_with_provider_delay() {
        let mut r = response(StatusCode::TOO_MANY_REQUESTS);
        r.headers
            .insert("retry-after", HeaderValue::from_static("2"));
        match classify(Ok(r)) {
            AttemptOutcome::Retry { error, delay_hint } => {
                assert!(matches!(error, ProviderError::RateLimited { .. }));
                assert_eq!(delay_hint, Some(Duration::from_secs(2)));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_429_without_header_has_no_hint() {
        match classify(Ok(response(StatusCode::TOO_MANY_REQUESTS))) {
            AttemptOutcome::Retry { delay_hint, .. } => assert!(delay_hint.is_none()),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_5xx_retries() {
        assert!(matches!(
            classify(Ok(response(StatusCode::SERVICE_UNAVAILABLE))),
            AttemptOutcome::Retry { .. }
        ));
    }

    #[test]
    fn test_other_4xx_fails() {
        assert!(matches!(
            classify(Ok(response(StatusCode::BAD_REQUEST))),
            AttemptOutcome::Fail(ProviderError::UnexpectedStatus { status: 400, .. })
        ));
    }

    #[test]
    fn test_transport_error_retries() {
        assert!(matches!(
            classify(Err(ProviderError::Transport("connection reset".into()))),
            AttemptOutcome::Retry { .. }
        ));
    }

    #[test]
    fn test_cancellation_propagates_unchanged() {
        assert!(matches!(
            classify(Err(ProviderError::Cancelled)),
            AttemptOutcome::Fail(ProviderError::Cancelled)
        ));
    }
}
