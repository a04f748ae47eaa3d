//! The public client facade.
//!
//! # Responsibilities
//! - Cache-first-then-fetch-then-repopulate for every domain query
//! - Authentication/connection state machine with serialized re-auth
//! - Stale-cache fallback when a fresh fetch fails
//!
//! Fallback order is deliberate: callers never wait for a network round-trip
//! when a live cached answer exists, yet a failing network degrades to the
//! last known data instead of total loss.

use std::future::Future;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::{watch, Semaphore};

use crate::cache::{BackingTier, JsonFileTier, MemoryTier, TieredCache};
use crate::client::connection::{ConnectionMonitor, ConnectionState};
use crate::client::keys;
use crate::config::schema::{BackingTierKind, CacheConfig, ClientConfig};
use crate::lifecycle::CancelToken;
use crate::models::{Route, Schedule, Stop, StopFilter, TimeWindow, Vehicle, VehicleFilter};
use crate::observability::metrics;
use crate::provider::api::{HttpTransitProvider, TransitProvider};
use crate::provider::transport::HttpTransport;
use crate::provider::types::{ProviderError, ProviderResult};
use crate::resilience::{ResilienceEngine, RetryPolicy, UsageStatistics, UsageTracker};

/// Per-domain cache TTLs.
#[derive(Debug, Clone, Copy)]
struct DomainTtls {
    routes: Duration,
    stops: Duration,
    vehicles: Duration,
    schedules: Duration,
}

impl From<&CacheConfig> for DomainTtls {
    fn from(config: &CacheConfig) -> Self {
        Self {
            routes: Duration::from_secs(config.route_ttl_secs),
            stops: Duration::from_secs(config.stop_ttl_secs),
            vehicles: Duration::from_secs(config.vehicle_ttl_secs),
            schedules: Duration::from_secs(config.schedule_ttl_secs),
        }
    }
}

/// Resilient cached access to the transit data provider.
///
/// Cheap to share behind an `Arc`; every method takes `&self` and the
/// internal state carries its own synchronization.
pub struct TransitClient {
    provider: Arc<dyn TransitProvider>,
    routes: TieredCache<Vec<Route>>,
    route_by_id: TieredCache<Option<Route>>,
    stops: TieredCache<Vec<Stop>>,
    vehicles: TieredCache<Vec<Vehicle>>,
    schedules: TieredCache<Vec<Schedule>>,
    connection: ConnectionMonitor,
    tracker: Arc<UsageTracker>,
    /// Serializes re-authentication so concurrent callers discovering a
    /// stale session do not each issue the call.
    auth_gate: Semaphore,
    auth_fresh_until: Mutex<Option<Instant>>,
    auth_ttl: Duration,
    ttls: DomainTtls,
}

impl TransitClient {
    /// Build a client talking HTTP to the configured provider.
    pub fn new(config: ClientConfig) -> ProviderResult<Self> {
        let tracker = Arc::new(UsageTracker::new(Duration::from_secs(
            config.rate_limit.window_secs,
        )));
        let api_key = if config.provider.api_key.is_empty() {
            None
        } else {
            Some(config.provider.api_key.clone())
        };
        let transport = HttpTransport::new(
            &config.provider.base_url,
            api_key,
            Duration::from_secs(config.provider.request_timeout_secs),
        )?;
        let engine = ResilienceEngine::new(tracker.clone());
        let policy = RetryPolicy::from(&config.retry);
        let provider = Arc::new(HttpTransitProvider::new(transport, engine, policy));

        Ok(Self::with_provider(provider, tracker, &config))
    }

    /// Build a client around an externally constructed provider.
    ///
    /// This is the seam for staging data sources and test spies.
    pub fn with_provider(
        provider: Arc<dyn TransitProvider>,
        tracker: Arc<UsageTracker>,
        config: &ClientConfig,
    ) -> Self {
        Self {
            provider,
            routes: build_cache("routes", &config.cache),
            route_by_id: build_cache("route", &config.cache),
            stops: build_cache("stops", &config.cache),
            vehicles: build_cache("vehicles", &config.cache),
            schedules: build_cache("schedules", &config.cache),
            connection: ConnectionMonitor::new(),
            tracker,
            auth_gate: Semaphore::new(1),
            auth_fresh_until: Mutex::new(None),
            auth_ttl: Duration::from_secs(config.provider.auth_ttl_secs),
            ttls: DomainTtls::from(&config.cache),
        }
    }

    // --- Observation ---

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Observe connection-state changes.
    pub fn watch_connection(&self) -> watch::Receiver<ConnectionState> {
        self.connection.subscribe()
    }

    /// Lock-free snapshot of provider usage.
    pub fn usage(&self) -> Arc<UsageStatistics> {
        self.tracker.snapshot()
    }

    /// Drop every cached value in every domain, both tiers.
    pub async fn clear_caches(&self) {
        self.routes.clear().await;
        self.route_by_id.clear().await;
        self.stops.clear().await;
        self.vehicles.clear().await;
        self.schedules.clear().await;
    }

    // --- Domain queries ---

    /// All routes the provider knows.
    pub async fn routes(
        &self,
        force_refresh: bool,
        cancel: &CancelToken,
    ) -> ProviderResult<Vec<Route>> {
        let key = keys::cache_key("routes", &["all"]);
        self.cached_fetch(
            &self.routes,
            key,
            self.ttls.routes,
            force_refresh,
            cancel,
            || async { self.provider.fetch_routes(cancel).await },
        )
        .await
    }

    /// A single route by id; `None` when the provider has no such route.
    pub async fn route(
        &self,
        route_id: &str,
        force_refresh: bool,
        cancel: &CancelToken,
    ) -> ProviderResult<Option<Route>> {
        let key = keys::cache_key("route", &[route_id]);
        self.cached_fetch(
            &self.route_by_id,
            key,
            self.ttls.routes,
            force_refresh,
            cancel,
            || async { self.provider.fetch_route(route_id, cancel).await },
        )
        .await
    }

    /// Stops matching the filter (by route, by radius, or everything).
    pub async fn stops(
        &self,
        filter: &StopFilter,
        force_refresh: bool,
        cancel: &CancelToken,
    ) -> ProviderResult<Vec<Stop>> {
        let key = keys::cache_key("stops", &[&filter.cache_part()]);
        self.cached_fetch(
            &self.stops,
            key,
            self.ttls.stops,
            force_refresh,
            cancel,
            || async { self.provider.fetch_stops(filter, cancel).await },
        )
        .await
    }

    /// Live vehicle positions matching the filter.
    pub async fn vehicles(
        &self,
        filter: &VehicleFilter,
        force_refresh: bool,
        cancel: &CancelToken,
    ) -> ProviderResult<Vec<Vehicle>> {
        let key = keys::cache_key("vehicles", &[&filter.cache_part()]);
        self.cached_fetch(
            &self.vehicles,
            key,
            self.ttls.vehicles,
            force_refresh,
            cancel,
            || async { self.provider.fetch_vehicles(filter, cancel).await },
        )
        .await
    }

    /// Scheduled stop events for a stop, optionally bounded to a window.
    pub async fn schedules(
        &self,
        stop_id: &str,
        window: Option<TimeWindow>,
        force_refresh: bool,
        cancel: &CancelToken,
    ) -> ProviderResult<Vec<Schedule>> {
        let window_part = window.map_or_else(|| "any".to_string(), |w| w.cache_part());
        let key = keys::cache_key("schedules", &[stop_id, &window_part]);
        self.cached_fetch(
            &self.schedules,
            key,
            self.ttls.schedules,
            force_refresh,
            cancel,
            || async {
                self.provider
                    .fetch_schedules(stop_id, window.as_ref(), cancel)
                    .await
            },
        )
        .await
    }

    // --- Internals ---

    /// Cache-first fetch with stale fallback; the shared shape of every query.
    async fn cached_fetch<V, F, Fut>(
        &self,
        cache: &TieredCache<V>,
        key: String,
        ttl: Duration,
        force_refresh: bool,
        cancel: &CancelToken,
        fetch: F,
    ) -> ProviderResult<V>
    where
        V: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = ProviderResult<V>>,
    {
        if !force_refresh {
            if let Some(value) = cache.get(&key).await {
                metrics::record_cache_hit(cache.name());
                return Ok(value);
            }
            metrics::record_cache_miss(cache.name());
        }

        let fetched = match self.ensure_connected(cancel).await {
            Ok(()) => fetch().await,
            Err(error) => Err(error),
        };

        match fetched {
            Ok(value) => {
                cache.set(key, value.clone(), ttl).await;
                if self.connection.state() == ConnectionState::Degraded {
                    self.connection.transition(ConnectionState::Connected);
                }
                Ok(value)
            }
            // Cancellation is the caller's own signal; never absorbed.
            Err(ProviderError::Cancelled) => Err(ProviderError::Cancelled),
            Err(error) => {
                let specific = match &error {
                    ProviderError::RateLimited { .. } => {
                        self.connection
                            .transition(ConnectionState::RateLimitExceeded);
                        true
                    }
                    ProviderError::Authentication(_) => {
                        self.connection
                            .transition(ConnectionState::AuthenticationFailed);
                        true
                    }
                    _ => false,
                };

                if let Some(stale) = cache.get_stale(&key).await {
                    tracing::warn!(
                        cache = cache.name(),
                        key = %key,
                        error = %error,
                        "Fetch failed, serving stale cached value"
                    );
                    metrics::record_stale_fallback(cache.name());
                    if !specific {
                        self.connection.transition(ConnectionState::Degraded);
                    }
                    Ok(stale)
                } else {
                    Err(error)
                }
            }
        }
    }

    /// Establish or refresh the provider session.
    ///
    /// Concurrent callers serialize on the auth gate; the second and later
    /// callers observe the freshly verified state instead of re-issuing the
    /// authentication call.
    async fn ensure_connected(&self, cancel: &CancelToken) -> ProviderResult<()> {
        if self.session_is_fresh() {
            return Ok(());
        }

        // Fail fast while the provider's rate-limit window is still closed.
        if self.connection.state() == ConnectionState::RateLimitExceeded {
            if let Some(reset) = self.tracker.snapshot().window_reset_epoch {
                let now = now_secs();
                if now < reset {
                    return Err(ProviderError::RateLimited {
                        retry_after_ms: Some((reset - now) * 1000),
                    });
                }
            }
        }

        let _permit = self
            .auth_gate
            .acquire()
            .await
            .expect("auth semaphore closed unexpectedly");
        if self.session_is_fresh() {
            return Ok(());
        }

        self.connection.transition(ConnectionState::Connecting);
        match self.provider.authenticate(cancel).await {
            Ok(()) => {
                let mut fresh_until = self
                    .auth_fresh_until
                    .lock()
                    .expect("auth freshness mutex poisoned");
                *fresh_until = Some(Instant::now() + self.auth_ttl);
                drop(fresh_until);
                self.connection.transition(ConnectionState::Connected);
                Ok(())
            }
            Err(error) => {
                match &error {
                    ProviderError::Authentication(_) => self
                        .connection
                        .transition(ConnectionState::AuthenticationFailed),
                    ProviderError::RateLimited { .. } => self
                        .connection
                        .transition(ConnectionState::RateLimitExceeded),
                    _ => self.connection.transition(ConnectionState::Disconnected),
                }
                Err(error)
            }
        }
    }

    fn session_is_fresh(&self) -> bool {
        // Degraded still has a verified session; it is serving stale data,
        // not missing a credential.
        match self.connection.state() {
            ConnectionState::Connected | ConnectionState::Degraded => {}
            _ => return false,
        }
        self.auth_fresh_until
            .lock()
            .expect("auth freshness mutex poisoned")
            .map_or(false, |until| Instant::now() < until)
    }
}

/// Wire up a domain cache with the configured backing tier.
fn build_cache<V>(name: &'static str, config: &CacheConfig) -> TieredCache<V>
where
    V: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    match config.backing_tier {
        BackingTierKind::None => TieredCache::new(name),
        BackingTierKind::Memory => {
            let tier: Arc<dyn BackingTier<V>> = Arc::new(MemoryTier::new());
            TieredCache::with_backing(name, tier)
        }
        BackingTierKind::File => {
            let path = Path::new(&config.backing_path).join(format!("{}.json", name));
            let tier: Arc<dyn BackingTier<V>> = Arc::new(JsonFileTier::new(path));
            TieredCache::with_backing(name, tier)
        }
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
