//! HTTP transport for the transit provider.
//!
//! # Responsibilities
//! - Build percent-encoded URLs under the configured base
//! - Serialize request bodies and decode JSON responses
//! - Surface status, headers and raw body for the resilience engine
//!
//! # Design Decisions
//! - No retry policy here; the resilience engine invokes this layer
//! - Every request carries an `x-request-id` UUID for log correlation
//! - Decode failures keep the raw body so diagnostics never lose the payload

use std::time::Duration;

use reqwest::header::ACCEPT;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;
use uuid::Uuid;

use crate::lifecycle::CancelToken;
use crate::provider::types::{ProviderError, ProviderResponse, ProviderResult};

/// Thin `reqwest` wrapper speaking the provider's JSON dialect.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
}

impl HttpTransport {
    /// Build a transport for `base_url`, attaching `api_key` to every request
    /// when present.
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> ProviderResult<Self> {
        let mut base_url = Url::parse(base_url).map_err(|e| {
            ProviderError::Config(format!("invalid base URL '{}': {}", base_url, e))
        })?;
        // Url::join treats a base without a trailing slash as a file.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    pub async fn get(
        &self,
        path: &str,
        query: &[(&str, String)],
        cancel: &CancelToken,
    ) -> ProviderResult<ProviderResponse> {
        self.execute(Method::GET, path, query, None::<&()>, cancel)
            .await
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        cancel: &CancelToken,
    ) -> ProviderResult<ProviderResponse> {
        self.execute(Method::POST, path, &[], Some(body), cancel)
            .await
    }

    pub async fn put<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        cancel: &CancelToken,
    ) -> ProviderResult<ProviderResponse> {
        self.execute(Method::PUT, path, &[], Some(body), cancel)
            .await
    }

    pub async fn delete(
        &self,
        path: &str,
        cancel: &CancelToken,
    ) -> ProviderResult<ProviderResponse> {
        self.execute(Method::DELETE, path, &[], None::<&()>, cancel)
            .await
    }

    async fn execute<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
        cancel: &CancelToken,
    ) -> ProviderResult<ProviderResponse> {
        let url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| {
                ProviderError::Config(format!("invalid request path '{}': {}", path, e))
            })?;

        let request_id = Uuid::new_v4();
        let mut builder = self
            .client
            .request(method.clone(), url)
            .header(ACCEPT, "application/json")
            .header("x-request-id", request_id.to_string());
        if let Some(key) = &self.api_key {
            builder = builder.header("x-api-key", key);
        }
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = tokio::select! {
            r = builder.send() => r.map_err(|e| ProviderError::Transport(e.to_string()))?,
            _ = cancel.cancelled() => return Err(ProviderError::Cancelled),
        };

        let status = response.status();
        let headers = response.headers().clone();
        let body = tokio::select! {
            b = response.bytes() => b.map_err(|e| ProviderError::Transport(e.to_string()))?.to_vec(),
            _ = cancel.cancelled() => return Err(ProviderError::Cancelled),
        };

        tracing::debug!(
            request_id = %request_id,
            method = %method,
            path = %path,
            status = %status,
            "Provider exchange"
        );

        Ok(ProviderResponse {
            status,
            headers,
            body,
        })
    }
}

/// Decode a response body, keeping status and raw payload on failure.
pub fn decode<T: DeserializeOwned>(response: &ProviderResponse) -> ProviderResult<T> {
    serde_json::from_slice(&response.body).map_err(|e| ProviderError::Malformed {
        status: response.status.as_u16(),
        reason: e.to_string(),
        body: response.body_text(),
    })
}
