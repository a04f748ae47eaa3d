//! Provider query interface.
//!
//! The trait is the seam between the orchestrating client and the network:
//! production wires in [`HttpTransitProvider`], tests substitute spies.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::lifecycle::CancelToken;
use crate::models::{Route, Schedule, Stop, StopFilter, TimeWindow, Vehicle, VehicleFilter};
use crate::provider::transport::HttpTransport;
use crate::provider::types::ProviderResult;
use crate::resilience::{ResilienceEngine, RetryPolicy};

/// Data-fetching capability the orchestrating client depends on.
#[async_trait]
pub trait TransitProvider: Send + Sync {
    /// Validate the configured credential against the provider.
    async fn authenticate(&self, cancel: &CancelToken) -> ProviderResult<()>;

    async fn fetch_routes(&self, cancel: &CancelToken) -> ProviderResult<Vec<Route>>;

    async fn fetch_route(
        &self,
        route_id: &str,
        cancel: &CancelToken,
    ) -> ProviderResult<Option<Route>>;

    async fn fetch_stops(
        &self,
        filter: &StopFilter,
        cancel: &CancelToken,
    ) -> ProviderResult<Vec<Stop>>;

    async fn fetch_vehicles(
        &self,
        filter: &VehicleFilter,
        cancel: &CancelToken,
    ) -> ProviderResult<Vec<Vehicle>>;

    async fn fetch_schedules(
        &self,
        stop_id: &str,
        window: Option<&TimeWindow>,
        cancel: &CancelToken,
    ) -> ProviderResult<Vec<Schedule>>;
}

/// Session-creation request; the credential rides in the `x-api-key` header.
#[derive(Debug, Serialize)]
struct SessionRequest {}

/// Minimal body of the provider's session endpoint.
#[derive(Debug, Default, Deserialize)]
struct SessionStatus {
    #[serde(default)]
    #[allow(dead_code)]
    status: String,
}

/// HTTP implementation: transport driven through the resilience engine.
pub struct HttpTransitProvider {
    transport: HttpTransport,
    engine: ResilienceEngine,
    policy: RetryPolicy,
}

impl HttpTransitProvider {
    pub fn new(transport: HttpTransport, engine: ResilienceEngine, policy: RetryPolicy) -> Self {
        Self {
            transport,
            engine,
            policy,
        }
    }

    pub fn engine(&self) -> &ResilienceEngine {
        &self.engine
    }
}

#[async_trait]
impl TransitProvider for HttpTransitProvider {
    async fn authenticate(&self, cancel: &CancelToken) -> ProviderResult<()> {
        let request = SessionRequest {};
        let _: SessionStatus = self
            .engine
            .execute("authenticate", &self.policy, cancel, || {
                self.transport.post("sessions", &request, cancel)
            })
            .await?;
        Ok(())
    }

    async fn fetch_routes(&self, cancel: &CancelToken) -> ProviderResult<Vec<Route>> {
        self.engine
            .execute("routes", &self.policy, cancel, || {
                self.transport.get("routes", &[], cancel)
            })
            .await
    }

    async fn fetch_route(
        &self,
        route_id: &str,
        cancel: &CancelToken,
    ) -> ProviderResult<Option<Route>> {
        let path = format!("routes/{}", route_id);
        self.engine
            .execute("route", &self.policy, cancel, || {
                self.transport.get(&path, &[], cancel)
            })
            .await
    }

    async fn fetch_stops(
        &self,
        filter: &StopFilter,
        cancel: &CancelToken,
    ) -> ProviderResult<Vec<Stop>> {
        let query = filter.to_query();
        self.engine
            .execute("stops", &self.policy, cancel, || {
                self.transport.get("stops", &query, cancel)
            })
            .await
    }

    async fn fetch_vehicles(
        &self,
        filter: &VehicleFilter,
        cancel: &CancelToken,
    ) -> ProviderResult<Vec<Vehicle>> {
        let query = filter.to_query();
        self.engine
            .execute("vehicles", &self.policy, cancel, || {
                self.transport.get("vehicles", &query, cancel)
            })
            .await
    }

    async fn fetch_schedules(
        &self,
        stop_id: &str,
        window: Option<&TimeWindow>,
        cancel: &CancelToken,
    ) -> ProviderResult<Vec<Schedule>> {
        let mut query = vec![("stop_id", stop_id.to_string())];
        if let Some(window) = window {
            query.extend(window.to_query());
        }
        self.engine
            .execute("schedules", &self.policy, cancel, || {
                self.transport.get("schedules", &query, cancel)
            })
            .await
    }
}
