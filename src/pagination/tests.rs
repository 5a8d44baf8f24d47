//! Tests for pagination module

use super::*;
use crate::error::Error;
use crate::http::{HttpClient, HttpClientConfig};
use crate::testing::ScriptedClient;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BASE: &str = "https://adsapi.test/v1";

fn page(records: usize, next: Option<&str>) -> serde_json::Value {
    let campaigns: Vec<_> = (0..records)
        .map(|i| json!({"sub_request_status": "SUCCESS", "campaign": {"id": format!("c{i}")}}))
        .collect();
    let mut body = json!({"request_status": "SUCCESS", "campaigns": campaigns});
    if let Some(link) = next {
        body["paging"] = json!({"next_link": link});
    }
    body
}

// ============================================================================
// NextPage / PaginationState
// ============================================================================

#[test]
fn test_next_page_with_url() {
    let next = NextPage::with_url("https://adsapi.test/v1/page2");
    assert_eq!(
        next,
        NextPage::Continue {
            url: "https://adsapi.test/v1/page2".to_string()
        }
    );
    assert_ne!(next, NextPage::Done);
}

#[test]
fn test_pagination_state_mutations() {
    let mut state = PaginationState::new();
    state.next_page();
    state.add_fetched(100);
    assert_eq!(state.page, 1);
    assert_eq!(state.total_fetched, 100);
    assert!(!state.done);

    state.mark_done();
    assert!(state.done);
}

// ============================================================================
// NextLinkPaginator
// ============================================================================

#[test]
fn test_next_link_continue() {
    let paginator = NextLinkPaginator::new();
    let mut state = PaginationState::new();
    let body = json!({"paging": {"next_link": "https://adsapi.test/v1/x?cursor=abc"}});

    let next = paginator.process_response(&body, 50, &mut state);
    assert_eq!(next, NextPage::with_url("https://adsapi.test/v1/x?cursor=abc"));
    assert_eq!(state.total_fetched, 50);
    assert_eq!(state.page, 1);
}

#[test]
fn test_next_link_absent_null_or_empty() {
    let paginator = NextLinkPaginator::new();
    for body in [
        json!({}),
        json!({"paging": {}}),
        json!({"paging": {"next_link": null}}),
        json!({"paging": {"next_link": ""}}),
    ] {
        let mut state = PaginationState::new();
        assert_eq!(
            paginator.process_response(&body, 1, &mut state),
            NextPage::Done
        );
        assert!(state.done);
    }
}

// ============================================================================
// Pager
// ============================================================================

#[tokio::test]
async fn test_pager_follows_next_link() {
    let client = Arc::new(ScriptedClient::new(BASE));
    client
        .respond("adaccounts/a1/campaigns", page(2, Some(&format!("{BASE}/adaccounts/a1/campaigns/p2"))))
        .respond("adaccounts/a1/campaigns/p2", page(1, None));

    let mut pager = Pager::new(
        client.clone(),
        format!("{BASE}/adaccounts/a1/campaigns?limit=2"),
        "campaigns",
        "campaigns",
    );

    let first = pager.next_page().await.unwrap().unwrap();
    assert_eq!(first["campaigns"].as_array().unwrap().len(), 2);
    let second = pager.next_page().await.unwrap().unwrap();
    assert_eq!(second["campaigns"].as_array().unwrap().len(), 1);
    assert!(pager.next_page().await.unwrap().is_none());

    assert_eq!(
        client.requests(),
        vec![
            format!("{BASE}/adaccounts/a1/campaigns?limit=2"),
            format!("{BASE}/adaccounts/a1/campaigns/p2"),
        ]
    );
}

#[tokio::test]
async fn test_pager_stops_on_empty_array() {
    let client = Arc::new(ScriptedClient::new(BASE));
    client.respond(
        "ads",
        json!({"request_status": "SUCCESS", "ads": [], "paging": {"next_link": format!("{BASE}/ads2")}}),
    );

    let mut pager = Pager::new(client.clone(), format!("{BASE}/ads"), "ads", "ads");
    assert!(pager.next_page().await.unwrap().is_none());
    assert!(pager.next_page().await.unwrap().is_none());
    assert_eq!(client.requests().len(), 1);
}

#[tokio::test]
async fn test_pager_stops_on_empty_body() {
    let client = Arc::new(ScriptedClient::new(BASE));
    let mut pager = Pager::new(client.clone(), format!("{BASE}/media"), "media", "media");
    assert!(pager.next_page().await.unwrap().is_none());
    assert!(pager.next_page().await.unwrap().is_none());
    assert_eq!(client.requests().len(), 1);
}

#[tokio::test]
async fn test_pager_request_status_error_is_fatal() {
    let client = Arc::new(ScriptedClient::new(BASE));
    client.respond(
        "ads",
        json!({"request_status": "ERROR", "request_id": "r1", "ads": []}),
    );

    let mut pager = Pager::new(client, format!("{BASE}/ads"), "ads", "ads");
    let err = pager.next_page().await.unwrap_err();
    match &err {
        Error::RequestFailed { stream, status, payload } => {
            assert_eq!(stream, "ads");
            assert_eq!(status, "ERROR");
            assert_eq!(payload["request_id"], "r1");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_pager_propagates_transport_error() {
    let client = Arc::new(ScriptedClient::new(BASE));
    client.fail("ads", Error::api(404, None));

    let mut pager = Pager::new(client, format!("{BASE}/ads"), "ads", "ads");
    let err = pager.next_page().await.unwrap_err();
    assert_eq!(err.to_string(), "404: The resource you have specified cannot be found.");
}

#[test]
fn test_pager_accepts_synthesized_page() {
    let client = Arc::new(ScriptedClient::new(BASE));
    let mut pager = Pager::new(client.clone(), format!("{BASE}/unused"), "organizations", "organizations");

    let body = json!({"request_status": "SUCCESS", "organizations": [{"sub_request_status": "SUCCESS", "organization": {"id": "o1"}}]});
    let accepted = pager.accept(body.clone()).unwrap();
    assert_eq!(accepted, Some(body));
    assert!(client.requests().is_empty());
}

#[tokio::test]
async fn test_pager_over_http() {
    let server = MockServer::start().await;
    let next = format!("{}/v1/adaccounts/a1/ads?cursor=2", server.uri());

    Mock::given(method("GET"))
        .and(path("/v1/adaccounts/a1/ads"))
        .and(query_param("cursor", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "request_status": "SUCCESS",
            "ads": [{"sub_request_status": "SUCCESS", "ad": {"id": "ad3"}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/adaccounts/a1/ads"))
        .and(query_param("limit", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "request_status": "SUCCESS",
            "paging": {"next_link": next},
            "ads": [
                {"sub_request_status": "SUCCESS", "ad": {"id": "ad1"}},
                {"sub_request_status": "SUCCESS", "ad": {"id": "ad2"}}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = HttpClientConfig::builder()
        .base_url(format!("{}/v1", server.uri()))
        .build();
    let client = Arc::new(HttpClient::with_config(config).unwrap());

    let mut pager = Pager::new(
        client,
        format!("{}/v1/adaccounts/a1/ads?limit=2", server.uri()),
        "ads",
        "ads",
    );

    let mut ids = Vec::new();
    while let Some(body) = pager.next_page().await.unwrap() {
        for wrapper in body["ads"].as_array().unwrap() {
            ids.push(wrapper["ad"]["id"].as_str().unwrap().to_string());
        }
    }
    assert_eq!(ids, vec!["ad1", "ad2", "ad3"]);
}
