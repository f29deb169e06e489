//! Unit tests for the registry transport

use super::*;

use serde_json::Value;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_retries: 3,
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
        multiplier: 2.0,
    }
}

fn transport() -> FetchFromRegistry {
    FetchFromRegistry::new(TransportOptions {
        retry: Some(fast_retry()),
        ..TransportOptions::default()
    })
    .unwrap()
}

#[tokio::test]
async fn get_json_sends_default_user_agent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/doc"))
        .and(header("user-agent", DEFAULT_USER_AGENT))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "ok": true })))
        .mount(&server)
        .await;

    let doc: Value = transport()
        .get_json(&format!("{}/doc", server.uri()), None, None)
        .await
        .unwrap();
    assert_eq!(doc["ok"], true);
}

#[tokio::test]
async fn get_json_forwards_auth_and_accept_headers() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/doc"))
        .and(header("authorization", "Bearer abc"))
        .and(header("accept", "application/vnd.npm.install-v1+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let _: Value = transport()
        .get_json(
            &format!("{}/doc", server.uri()),
            Some("Bearer abc"),
            Some("application/vnd.npm.install-v1+json"),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn custom_user_agent_is_used() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/doc"))
        .and(header("user-agent", "acme-pm/9.9.9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;

    let transport = FetchFromRegistry::new(TransportOptions {
        user_agent: Some("acme-pm/9.9.9".to_string()),
        ..TransportOptions::default()
    })
    .unwrap();

    let result: SproutResult<Value> = transport
        .get_json(&format!("{}/doc", server.uri()), None, None)
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn not_found_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let result: SproutResult<Value> = transport()
        .get_json(&format!("{}/missing", server.uri()), None, None)
        .await;

    match result.unwrap_err() {
        SproutError::NotFound { url } => assert!(url.ends_with("/missing")),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn server_errors_are_retried_until_success() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "ok": 1 })))
        .mount(&server)
        .await;

    let doc: Value = transport()
        .get_json(&format!("{}/flaky", server.uri()), None, None)
        .await
        .unwrap();
    assert_eq!(doc["ok"], 1);
}

#[tokio::test]
async fn retries_are_bounded() {
    let server = MockServer::start().await;

    // max_retries = 3 means at most 4 attempts
    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(503))
        .expect(4)
        .mount(&server)
        .await;

    let result: SproutResult<Value> = transport()
        .get_json(&format!("{}/down", server.uri()), None, None)
        .await;

    assert!(matches!(result.unwrap_err(), SproutError::Network { .. }));
}

#[tokio::test]
async fn get_bytes_returns_raw_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/blob"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"raw bytes".to_vec()))
        .mount(&server)
        .await;

    let body = transport()
        .get_bytes(&format!("{}/blob", server.uri()), None)
        .await
        .unwrap();
    assert_eq!(body, b"raw bytes");
}
