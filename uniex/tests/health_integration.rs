//! Health checks composed from `fetch_time`, with breaker state reporting.

use serde_json::json;
use std::sync::Arc;
use uniex::{
    CallOptions, Method, RetryPolicy, RuntimeConfig,
    circuit::CircuitState,
    exchange::Bybit,
    health,
    transport::{TransportError, mock::MockTransport},
};

fn no_retry_config() -> RuntimeConfig {
    RuntimeConfig {
        retry_policy: RetryPolicy::Never,
        ..RuntimeConfig::default()
    }
}

#[tokio::test]
async fn test_status_reports_reachable_with_latency() {
    let transport = Arc::new(MockTransport::new());
    transport.push_json(&json!({"retCode": 0, "time": 1700000000000i64}));
    let bybit = Bybit::with_config(transport, no_retry_config());

    let status = health::status(bybit.client()).await;
    assert!(status.reachable);
    assert!(status.latency_ms.is_some());
    assert_eq!(status.circuit_state, CircuitState::Closed);
    assert!(status.error.is_none());
}

#[tokio::test]
async fn test_status_folds_failures_into_the_report() {
    let transport = Arc::new(MockTransport::new());
    transport.push_error(TransportError::Connect("refused".into()));
    let bybit = Bybit::with_config(transport, no_retry_config());

    let status = health::status(bybit.client()).await;
    assert!(!status.reachable);
    assert!(status.latency_ms.is_none());
    assert!(status.error.is_some());
}

#[tokio::test]
async fn test_signed_passthrough_request() {
    let transport = Arc::new(MockTransport::new());
    transport.push_json(&json!({"retCode": 0, "result": {}}));
    let bybit = Bybit::with_config(transport.clone(), no_retry_config());

    let credentials = uniex::Credentials::new("key", "secret");
    bybit
        .request(
            Method::Get,
            "/v5/account/info",
            CallOptions::default(),
            Some(&credentials),
        )
        .await
        .unwrap();

    let request = &transport.requests()[0];
    assert!(request.url.starts_with("https://api.bybit.com/v5/account/info"));
    assert!(
        request
            .headers
            .iter()
            .any(|(name, _)| name == "X-BAPI-SIGN")
    );
}

#[tokio::test]
async fn test_raw_request_hits_the_url_untouched() {
    let transport = Arc::new(MockTransport::new());
    transport.push_json(&json!({"retCode": 0, "pong": true}));
    let bybit = Bybit::with_config(transport.clone(), no_retry_config());

    bybit
        .raw_request(
            Method::Get,
            "https://elsewhere.example.com/ping",
            Vec::new(),
            None,
            CallOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(
        transport.requests()[0].url,
        "https://elsewhere.example.com/ping"
    );
}
