//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the client.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the transit client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// Provider endpoint and credential.
    pub provider: ProviderConfig,

    /// Cache TTLs and backing tier.
    pub cache: CacheConfig,

    /// Retry configuration.
    pub retry: RetryConfig,

    /// Rate-limit window tracking.
    pub rate_limit: RateLimitConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Provider endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Base URL of the transit data provider.
    pub base_url: String,

    /// Opaque API key; empty means unauthenticated access.
    pub api_key: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// How long a successful authentication stays fresh.
    pub auth_ttl_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            api_key: String::new(),
            request_timeout_secs: 10,
            auth_ttl_secs: 300,
        }
    }
}

/// Backing tier selection for the cache's second level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackingTierKind {
    #[default]
    None,
    Memory,
    File,
}

/// Cache configuration. TTLs differ per domain: static data (routes, stops)
/// lives long, vehicle positions go stale in seconds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    pub route_ttl_secs: u64,
    pub stop_ttl_secs: u64,
    pub vehicle_ttl_secs: u64,
    pub schedule_ttl_secs: u64,

    /// Which backing tier to use.
    pub backing_tier: BackingTierKind,

    /// Directory for the file backing tier's per-domain JSON files.
    pub backing_path: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            route_ttl_secs: 3_600,
            stop_ttl_secs: 3_600,
            vehicle_ttl_secs: 15,
            schedule_ttl_secs: 300,
            backing_tier: BackingTierKind::None,
            backing_path: String::new(),
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts allowed per logical request, including the first.
    pub max_retries: u32,

    /// Base delay doubled per attempt.
    pub base_backoff_ms: u64,

    /// Upper bound on any single delay.
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_backoff_ms: 500,
            max_backoff_ms: 8_000,
        }
    }
}

/// Rate-limit window tracking configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Local window length used when the provider reports no reset time.
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self { window_secs: 60 }
    }
}

/// Observability settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Expose Prometheus metrics.
    pub metrics_enabled: bool,

    /// Bind address for the metrics endpoint.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9095".to_string(),
        }
    }
}
