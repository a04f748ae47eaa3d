//! Exponential backoff with jitter.

use std::time::Duration;

use rand::Rng;

/// Calculate the delay before the next attempt.
///
/// Doubles per attempt (`base * 2^(attempt-1)`), capped at `max_ms`, then
/// jittered down to 80-100% of the capped value so synchronized callers
/// spread out instead of retrying in lockstep.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let delay_ms = base_ms.saturating_mul(exponential_base);
    let capped = delay_ms.min(max_ms);

    let floor = capped - capped / 5;
    let jittered = if capped > floor {
        rand::thread_rng().gen_range(floor..=capped)
    } else {
        capped
    };

    Duration::from_millis(jittered)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_grows_exponentially() {
        for _ in 0..50 {
            let b1 = calculate_backoff(1, 100, 10_000).as_millis() as u64;
            let b2 = calculate_backoff(2, 100, 10_000).as_millis() as u64;
            let b3 = calculate_backoff(3, 100, 10_000).as_millis() as u64;
            assert!((80..=100).contains(&b1), "b1={}", b1);
            assert!((160..=200).contains(&b2), "b2={}", b2);
            assert!((320..=400).contains(&b3), "b3={}", b3);
        }
    }

    #[test]
    fn test_backoff_respects_cap() {
        for _ in 0..50 {
            let capped = calculate_backoff(10, 100, 1_000).as_millis() as u64;
            assert!((800..=1_000).contains(&capped), "capped={}", capped);
        }
    }

    #[test]
    fn test_attempt_zero_is_immediate() {
        assert_eq!(calculate_backoff(0, 100, 1_000), Duration::from_millis(0));
    }

    #[test]
    fn test_no_overflow_on_large_attempts() {
        let d = calculate_backoff(64, u64::MAX / 2, u64::MAX);
        assert!(d.as_millis() > 0);
    }
}
