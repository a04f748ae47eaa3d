//! Failure injection tests against a raw-TCP mock provider.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use transit_client::config::ClientConfig;
use transit_client::{CancelToken, ConnectionState, ProviderError, TransitClient};

mod common;

fn test_config(addr: SocketAddr) -> ClientConfig {
    let mut config = ClientConfig::default();
    config.provider.base_url = format!("http://{}/api", addr);
    config.provider.api_key = "test-key".to_string();
    config.provider.request_timeout_secs = 2;
    // Hardened settings for test stability
    config.retry.max_retries = 3;
    config.retry.base_backoff_ms = 50;
    config.retry.max_backoff_ms = 400;
    config
}

#[tokio::test]
async fn test_retry_on_transient_failure() {
    let addr: SocketAddr = "127.0.0.1:28271".parse().unwrap();

    let call_count = Arc::new(AtomicU32::new(0));
    let cc = call_count.clone();
    common::start_mock_provider(addr, move || {
        let cc = cc.clone();
        async move {
            let count = cc.fetch_add(1, Ordering::SeqCst);
            // First request is the auth probe; then two 503s before success.
            if count == 0 {
                (200, vec![], r#"{"status":"ok"}"#.to_string())
            } else if count < 3 {
                (503, vec![], "Service Unavailable".to_string())
            } else {
                (200, vec![], common::routes_json())
            }
        }
    })
    .await;

    let client = TransitClient::new(test_config(addr)).unwrap();
    let routes = client.routes(false, &CancelToken::noop()).await.unwrap();

    assert_eq!(routes.len(), 5);
    assert_eq!(routes[0].id, "r1");
    // 1 auth + 3 fetch attempts
    assert_eq!(call_count.load(Ordering::SeqCst), 4);
    assert_eq!(client.connection_state(), ConnectionState::Connected);
}

#[tokio::test]
async fn test_credential_rejected_without_retry() {
    let addr: SocketAddr = "127.0.0.1:28272".parse().unwrap();

    let call_count = Arc::new(AtomicU32::new(0));
    let cc = call_count.clone();
    common::start_mock_provider(addr, move || {
        let cc = cc.clone();
        async move {
            cc.fetch_add(1, Ordering::SeqCst);
            (401, vec![], r#"{"error":"invalid key"}"#.to_string())
        }
    })
    .await;

    let client = TransitClient::new(test_config(addr)).unwrap();
    let err = client
        .routes(false, &CancelToken::noop())
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Authentication(_)));
    // The auth probe fails once; the 401 is never retried.
    assert_eq!(call_count.load(Ordering::SeqCst), 1);
    assert_eq!(
        client.connection_state(),
        ConnectionState::AuthenticationFailed
    );
}

#[tokio::test]
async fn test_not_found_is_empty_result() {
    let addr: SocketAddr = "127.0.0.1:28273".parse().unwrap();

    common::start_mock_provider(addr, move || async move {
        (404, vec![], String::new())
    })
    .await;

    let client = TransitClient::new(test_config(addr)).unwrap();
    let routes = client.routes(false, &CancelToken::noop()).await.unwrap();
    assert!(routes.is_empty());
}

#[tokio::test]
async fn test_rate_limit_retry_after_honored() {
    let addr: SocketAddr = "127.0.0.1:28274".parse().unwrap();

    let call_count = Arc::new(AtomicU32::new(0));
    let cc = call_count.clone();
    common::start_mock_provider(addr, move || {
        let cc = cc.clone();
        async move {
            let count = cc.fetch_add(1, Ordering::SeqCst);
            if count == 0 {
                (200, vec![], r#"{"status":"ok"}"#.to_string())
            } else if count == 1 {
                (
                    429,
                    vec![
                        ("retry-after", "1".to_string()),
                        ("x-ratelimit-remaining", "0".to_string()),
                    ],
                    String::new(),
                )
            } else {
                (200, vec![], common::routes_json())
            }
        }
    })
    .await;

    let client = TransitClient::new(test_config(addr)).unwrap();
    let started = Instant::now();
    let routes = client.routes(false, &CancelToken::noop()).await.unwrap();

    assert_eq!(routes.len(), 5);
    // The second fetch attempt must wait out the provider-directed delay.
    assert!(started.elapsed() >= Duration::from_secs(1));
}

#[tokio::test]
async fn test_malformed_body_carries_payload() {
    let addr: SocketAddr = "127.0.0.1:28275".parse().unwrap();

    let call_count = Arc::new(AtomicU32::new(0));
    let cc = call_count.clone();
    common::start_mock_provider(addr, move || {
        let cc = cc.clone();
        async move {
            let count = cc.fetch_add(1, Ordering::SeqCst);
            if count == 0 {
                (200, vec![], r#"{"status":"ok"}"#.to_string())
            } else {
                (200, vec![], "<html>maintenance page</html>".to_string())
            }
        }
    })
    .await;

    let client = TransitClient::new(test_config(addr)).unwrap();
    let err = client
        .routes(false, &CancelToken::noop())
        .await
        .unwrap_err();

    match err {
        ProviderError::Malformed { status, body, .. } => {
            assert_eq!(status, 200);
            assert!(body.contains("maintenance"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    // Deserialization failure is not retried: 1 auth + 1 fetch.
    assert_eq!(call_count.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_transport_verbs_roundtrip() {
    use transit_client::provider::HttpTransport;

    let addr: SocketAddr = "127.0.0.1:28277".parse().unwrap();
    common::start_mock_provider(addr, move || async move {
        (200, vec![], r#"{"ok":true}"#.to_string())
    })
    .await;

    let transport = HttpTransport::new(
        &format!("http://{}/api", addr),
        Some("test-key".to_string()),
        Duration::from_secs(2),
    )
    .unwrap();
    let cancel = CancelToken::noop();

    let body = serde_json::json!({"note": "ping"});
    for response in [
        transport.get("echo", &[], &cancel).await.unwrap(),
        transport.post("echo", &body, &cancel).await.unwrap(),
        transport.put("echo", &body, &cancel).await.unwrap(),
        transport.delete("echo", &cancel).await.unwrap(),
    ] {
        assert_eq!(response.status.as_u16(), 200);
        assert!(response.body_text().contains("ok"));
    }
}

#[tokio::test]
async fn test_usage_statistics_track_failures() {
    let addr: SocketAddr = "127.0.0.1:28276".parse().unwrap();

    common::start_mock_provider(addr, move || async move {
        (500, vec![], "boom".to_string())
    })
    .await;

    let client = TransitClient::new(test_config(addr)).unwrap();
    let err = client
        .routes(false, &CancelToken::noop())
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Transient { .. }));

    let usage = client.usage();
    // The auth probe alone burns the whole retry budget on persistent 500s.
    assert_eq!(usage.total_requests, 3);
    assert_eq!(usage.failures, 3);
    assert_eq!(usage.successes, 0);
}
