//! Tests for the HTTP client module

use super::*;
use crate::auth::AuthConfig;
use crate::error::{ApiErrorKind, Error};
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn fast_config(server: &MockServer) -> HttpClientConfig {
    HttpClientConfig::builder()
        .base_url(server.uri())
        .backoff(Duration::from_millis(10), Duration::from_secs(1))
        .build()
}

#[test]
fn test_http_client_config_default() {
    let config = HttpClientConfig::default();
    assert_eq!(config.timeout, Duration::from_secs(300));
    assert_eq!(config.max_retries, 6);
    assert_eq!(config.initial_backoff, Duration::from_secs(3));
    assert!(config.base_url.is_none());
    assert!(config.rate_limit.is_none());
    assert!((config.throttle_threshold_percent - 5.0).abs() < f64::EPSILON);
}

#[test]
fn test_http_client_config_builder() {
    let config = HttpClientConfig::builder()
        .base_url("https://adsapi.snapchat.com/v1")
        .timeout(Duration::from_secs(60))
        .max_retries(5)
        .backoff(Duration::from_millis(200), Duration::from_secs(30))
        .rate_limit(RateLimiterConfig::new(5, 5))
        .throttle_threshold(10.0)
        .user_agent("test-agent/1.0")
        .build();

    assert_eq!(
        config.base_url,
        Some("https://adsapi.snapchat.com/v1".to_string())
    );
    assert_eq!(config.timeout, Duration::from_secs(60));
    assert_eq!(config.max_retries, 5);
    assert_eq!(config.initial_backoff, Duration::from_millis(200));
    assert_eq!(config.max_backoff, Duration::from_secs(30));
    assert!(config.rate_limit.is_some());
    assert_eq!(config.user_agent, "test-agent/1.0");
}

#[test]
fn test_exponential_backoff() {
    let client = HttpClient::with_config(HttpClientConfig::default()).unwrap();
    assert_eq!(client.calculate_backoff(0), Duration::from_secs(3));
    assert_eq!(client.calculate_backoff(1), Duration::from_secs(6));
    assert_eq!(client.calculate_backoff(2), Duration::from_secs(12));
    assert_eq!(client.calculate_backoff(10), Duration::from_secs(300));
}

#[test]
fn test_build_request_url() {
    let url = build_request_url(
        "https://adsapi.snapchat.com/v1/",
        "/adaccounts/a1/stats",
        &[
            ("granularity".to_string(), "DAY".to_string()),
            ("fields".to_string(), "spend".to_string()),
        ],
    )
    .unwrap();
    assert_eq!(
        url,
        "https://adsapi.snapchat.com/v1/adaccounts/a1/stats?granularity=DAY&fields=spend"
    );

    let bare = build_request_url("https://adsapi.snapchat.com/v1", "me/organizations", &[]).unwrap();
    assert_eq!(bare, "https://adsapi.snapchat.com/v1/me/organizations");
}

#[tokio::test]
async fn test_http_client_get() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/me/organizations"))
        .and(header("User-Agent", "tap-test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "request_status": "SUCCESS",
            "organizations": []
        })))
        .mount(&mock_server)
        .await;

    let config = HttpClientConfig::builder()
        .base_url(mock_server.uri())
        .user_agent("tap-test")
        .build();

    let client = HttpClient::with_config(config).unwrap();
    let body = client.get("me/organizations", "organizations").await.unwrap();

    assert_eq!(body["request_status"], "SUCCESS");
}

#[tokio::test]
async fn test_http_client_absolute_url_with_query() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/adaccounts/a1/campaigns"))
        .and(query_param("limit", "500"))
        .and(query_param("cursor", "abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .mount(&mock_server)
        .await;

    let client = HttpClient::with_config(fast_config(&mock_server)).unwrap();
    let url = format!(
        "{}/adaccounts/a1/campaigns?limit=500&cursor=abc",
        mock_server.uri()
    );
    let body = client.get(&url, "campaigns").await.unwrap();

    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn test_http_client_post() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/adaccounts/a1/segments"))
        .and(body_json(serde_json::json!({"name": "test"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "s1"
        })))
        .mount(&mock_server)
        .await;

    let client = HttpClient::with_config(fast_config(&mock_server)).unwrap();
    let body = client
        .post(
            "adaccounts/a1/segments",
            "audience_segments",
            serde_json::json!({"name": "test"}),
        )
        .await
        .unwrap();

    assert_eq!(body["id"], "s1");
}

#[tokio::test]
async fn test_http_client_bearer_from_refresh() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/oauth2/access_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "fresh",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/me"))
        .and(header("Authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"me": {}})))
        .expect(2)
        .mount(&mock_server)
        .await;

    let auth = AuthConfig {
        token_url: format!("{}/oauth2/access_token", mock_server.uri()),
        client_id: "id".to_string(),
        client_secret: "secret".to_string(),
        refresh_token: "refresh".to_string(),
    };
    let client = HttpClient::with_auth(fast_config(&mock_server), auth).unwrap();

    client.get("me", "me").await.unwrap();
    client.get("me", "me").await.unwrap();
}

#[tokio::test]
async fn test_http_client_404_uses_debug_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/adaccounts/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "request_status": "ERROR",
            "debug_message": "Resource can not be found",
            "error_code": "E3003"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HttpClient::with_config(fast_config(&mock_server)).unwrap();
    let err = client.get("adaccounts/missing", "ad_accounts").await.unwrap_err();

    assert_eq!(err.api_kind(), Some(ApiErrorKind::NotFound));
    assert_eq!(err.to_string(), "404: Resource can not be found");
}

#[tokio::test]
async fn test_http_client_401_default_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HttpClient::with_config(fast_config(&mock_server)).unwrap();
    let err = client.get("me", "me").await.unwrap_err();

    assert_eq!(err.to_string(), "401: Unauthorized access for the URL.");
}

#[tokio::test]
async fn test_http_client_retry_on_500() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .mount(&mock_server)
        .await;

    let client = HttpClient::with_config(fast_config(&mock_server)).unwrap();
    let body = client.get("flaky", "flaky").await.unwrap();

    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn test_http_client_retry_on_429() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/limited"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/limited"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .mount(&mock_server)
        .await;

    let client = HttpClient::with_config(fast_config(&mock_server)).unwrap();
    let body = client.get("limited", "limited").await.unwrap();

    assert_eq!(body["ok"], true);
}

#[tokio::test]
async fn test_http_client_retries_exhausted() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/always-fail"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&mock_server)
        .await;

    let config = HttpClientConfig::builder()
        .base_url(mock_server.uri())
        .max_retries(2)
        .backoff(Duration::from_millis(10), Duration::from_secs(1))
        .build();

    let client = HttpClient::with_config(config).unwrap();
    let err = client.get("always-fail", "always-fail").await.unwrap_err();

    assert_eq!(err.api_kind(), Some(ApiErrorKind::ServiceUnavailable));
    assert_eq!(err.to_string(), "503: API service is currently unavailable.");
}

#[tokio::test]
async fn test_http_client_client_error_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/bad"))
        .respond_with(ResponseTemplate::new(400))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = HttpClient::with_config(fast_config(&mock_server)).unwrap();
    let err = client.get("bad", "bad").await.unwrap_err();

    assert!(matches!(err, Error::Api { status: 400, .. }));
}

#[tokio::test]
async fn test_http_client_connection_error() {
    let config = HttpClientConfig::builder()
        .base_url("http://127.0.0.1:1")
        .max_retries(1)
        .backoff(Duration::from_millis(1), Duration::from_millis(1))
        .build();

    let client = HttpClient::with_config(config).unwrap();
    let err = client.get("me", "me").await.unwrap_err();

    assert!(matches!(err, Error::Http(_)));
}

#[tokio::test]
async fn test_http_client_invalid_json() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(&mock_server)
        .await;

    let client = HttpClient::with_config(fast_config(&mock_server)).unwrap();
    let err = client.get("html", "html").await.unwrap_err();

    assert!(matches!(err, Error::Decode { .. }));
}

#[tokio::test]
async fn test_http_client_header_throttle_with_past_reset() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/quota"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Rate-Limit-Limit", "100")
                .insert_header("X-Rate-Limit-Remaining", "1")
                .insert_header("X-Rate-Limit-Reset", "0")
                .set_body_json(serde_json::json!({"ok": true})),
        )
        .mount(&mock_server)
        .await;

    let client = HttpClient::with_config(fast_config(&mock_server)).unwrap();
    let started = std::time::Instant::now();
    client.get("quota", "quota").await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn test_http_client_with_rate_limiter() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/paced"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .expect(3)
        .mount(&mock_server)
        .await;

    let config = HttpClientConfig::builder()
        .base_url(mock_server.uri())
        .rate_limit(RateLimiterConfig::new(100, 10))
        .build();

    let client = HttpClient::with_config(config).unwrap();
    for _ in 0..3 {
        client.get("paced", "paced").await.unwrap();
    }
}
