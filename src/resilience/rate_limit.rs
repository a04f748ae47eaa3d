//! Provider backpressure signal parsing.

use std::time::Duration;

use reqwest::header::HeaderMap;

/// Rate-limit state reported by the provider on a response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateLimitInfo {
    /// Requests allowed per window (`x-ratelimit-limit`).
    pub limit: Option<u64>,
    /// Requests remaining in the current window (`x-ratelimit-remaining`).
    pub remaining: Option<u64>,
    /// Unix seconds at which the window resets (`x-ratelimit-reset`).
    pub reset_epoch: Option<u64>,
    /// Explicit wait requested via `retry-after` (seconds form only).
    pub retry_after: Option<Duration>,
}

impl RateLimitInfo {
    /// Parse whatever backpressure headers are present.
    ///
    /// Returns `None` when the response carried no rate-limit signal at all.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let info = Self {
            limit: header_u64(headers, "x-ratelimit-limit"),
            remaining: header_u64(headers, "x-ratelimit-remaining"),
            reset_epoch: header_u64(headers, "x-ratelimit-reset"),
            retry_after: header_u64(headers, "retry-after").map(Duration::from_secs),
        };
        if info == Self::default() {
            None
        } else {
            Some(info)
        }
    }
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_parses_full_header_set() {
        let map = headers(&[
            ("x-ratelimit-limit", "120"),
            ("x-ratelimit-remaining", "7"),
            ("x-ratelimit-reset", "1722470400"),
            ("retry-after", "2"),
        ]);
        let info = RateLimitInfo::from_headers(&map).unwrap();
        assert_eq!(info.limit, Some(120));
        assert_eq!(info.remaining, Some(7));
        assert_eq!(info.reset_epoch, Some(1722470400));
        assert_eq!(info.retry_after, Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_absent_headers_yield_none() {
        assert!(RateLimitInfo::from_headers(&HeaderMap::new()).is_none());
    }

    #[test]
    fn test_partial_headers() {
        let map = headers(&[("retry-after", "10")]);
        let info = RateLimitInfo::from_headers(&map).unwrap();
        assert_eq!(info.retry_after, Some(Duration::from_secs(10)));
        assert_eq!(info.limit, None);
    }

    #[test]
    fn test_garbage_values_ignored() {
        let map = headers(&[("x-ratelimit-limit", "soon")]);
        assert!(RateLimitInfo::from_headers(&map).is_none());
    }
}
