//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, retry budget sane)
//! - Check cross-field requirements (file tier needs a path)
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: ClientConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use crate::config::schema::{BackingTierKind, ClientConfig};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check every semantic constraint, collecting all violations.
pub fn validate_config(config: &ClientConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.provider.base_url.is_empty() {
        push(&mut errors, "provider.base_url", "must not be empty");
    } else if let Err(e) = url::Url::parse(&config.provider.base_url) {
        push(
            &mut errors,
            "provider.base_url",
            &format!("not a valid URL: {}", e),
        );
    }
    if config.provider.request_timeout_secs == 0 {
        push(&mut errors, "provider.request_timeout_secs", "must be > 0");
    }
    if config.provider.auth_ttl_secs == 0 {
        push(&mut errors, "provider.auth_ttl_secs", "must be > 0");
    }

    for (field, ttl) in [
        ("cache.route_ttl_secs", config.cache.route_ttl_secs),
        ("cache.stop_ttl_secs", config.cache.stop_ttl_secs),
        ("cache.vehicle_ttl_secs", config.cache.vehicle_ttl_secs),
        ("cache.schedule_ttl_secs", config.cache.schedule_ttl_secs),
    ] {
        if ttl == 0 {
            push(&mut errors, field, "must be > 0");
        }
    }
    if config.cache.backing_tier == BackingTierKind::File && config.cache.backing_path.is_empty() {
        push(
            &mut errors,
            "cache.backing_path",
            "required when backing_tier is \"file\"",
        );
    }

    if config.retry.max_retries == 0 {
        push(&mut errors, "retry.max_retries", "must be >= 1");
    }
    if config.retry.base_backoff_ms == 0 {
        push(&mut errors, "retry.base_backoff_ms", "must be > 0");
    }
    if config.retry.max_backoff_ms < config.retry.base_backoff_ms {
        push(
            &mut errors,
            "retry.max_backoff_ms",
            "must be >= base_backoff_ms",
        );
    }

    if config.rate_limit.window_secs == 0 {
        push(&mut errors, "rate_limit.window_secs", "must be > 0");
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<std::net::SocketAddr>()
            .is_err()
    {
        push(
            &mut errors,
            "observability.metrics_address",
            "not a valid socket address",
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn push(errors: &mut Vec<ValidationError>, field: &'static str, message: &str) {
    errors.push(ValidationError {
        field,
        message: message.to_string(),
    });
}
