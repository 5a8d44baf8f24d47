//! Tests for decoder module

use super::*;
use crate::error::Error;
use crate::streams::{snapchat_registry, StreamDefinition};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use test_case::test_case;

fn stream(name: &str) -> &'static StreamDefinition {
    let registry = snapchat_registry();
    registry.get(registry.find(name).unwrap())
}

fn decode(name: &str, page: Value, parent: Option<&str>, country: Option<&str>) -> Vec<Value> {
    let def = stream(name);
    let ctx = DecodeContext::new(def)
        .with_parent(parent)
        .with_country(country);
    decoder_for(def)
        .decode(&page, &ctx)
        .unwrap()
        .into_iter()
        .map(Value::Object)
        .collect()
}

// ============================================================================
// Case conversion
// ============================================================================

#[test_case("updatedAt", "updated_at")]
#[test_case("postalCode", "postal_code")]
#[test_case("adID", "ad_id")]
#[test_case("HTTPResponseCode", "http_response_code")]
#[test_case("videoViews15s", "video_views15s")]
#[test_case("already_snake", "already_snake")]
#[test_case("ISO", "ISO")]
#[test_case("123", "123")]
fn test_decamelize_key(input: &str, expected: &str) {
    assert_eq!(decamelize_key(input), expected);
}

#[test]
fn test_decamelize_recursive() {
    let value = json!({
        "targetingSpec": {"geoLocations": [{"countryCode": "us"}]},
        "creativeName": "Spring",
        "labelList": ["keepThisValue"]
    });
    assert_eq!(
        decamelize(value),
        json!({
            "targeting_spec": {"geo_locations": [{"country_code": "us"}]},
            "creative_name": "Spring",
            "label_list": ["keepThisValue"]
        })
    );
}

// ============================================================================
// Entity decoding
// ============================================================================

#[test]
fn test_entity_single_organization() {
    let page = json!({
        "request_status": "SUCCESS",
        "organizations": [{
            "sub_request_status": "SUCCESS",
            "organization": {"id": "o1", "updated_at": "2021-05-01T00:00:00Z"}
        }]
    });

    let records = decode("organizations", page, None, None);
    assert_eq!(
        records,
        vec![json!({"id": "o1", "updated_at": "2021-05-01T00:00:00Z"})]
    );
}

#[test]
fn test_entity_sub_request_error_is_fatal() {
    let page = json!({
        "request_status": "SUCCESS",
        "organizations": [{
            "sub_request_status": "ERROR",
            "sub_request_error_reason": "boom"
        }]
    });
    let def = stream("organizations");
    let err = EntityDecoder::new()
        .decode(&page, &DecodeContext::new(def))
        .unwrap_err();

    match &err {
        Error::SubRequestFailed { stream, payload } => {
            assert_eq!(stream, "organizations");
            assert_eq!(payload["sub_request_error_reason"], "boom");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!err.is_retryable());
}

#[test]
fn test_entity_stamps_parent_and_snake_cases() {
    let page = json!({
        "campaigns": [{
            "sub_request_status": "SUCCESS",
            "campaign": {"id": "c1", "updatedAt": "2021-05-01T00:00:00Z", "dailyBudgetMicro": 5}
        }]
    });

    let records = decode("campaigns", page, Some("acct-1"), None);
    assert_eq!(
        records,
        vec![json!({
            "id": "c1",
            "updated_at": "2021-05-01T00:00:00Z",
            "daily_budget_micro": 5,
            "ad_account_id": "acct-1"
        })]
    );
}

#[test]
fn test_entity_missing_key_is_fatal() {
    let page = json!({
        "campaigns": [{"sub_request_status": "SUCCESS", "campaign": {"id": "", "name": "x"}}]
    });
    let def = stream("campaigns");
    let err = EntityDecoder::new()
        .decode(&page, &DecodeContext::new(def))
        .unwrap_err();
    assert!(matches!(err, Error::MissingKeyField { ref field, .. } if field == "id"));
}

#[test]
fn test_entity_missing_record_key_is_fatal() {
    let page = json!({"ads": [{"sub_request_status": "SUCCESS"}]});
    let def = stream("ads");
    let err = EntityDecoder::new()
        .decode(&page, &DecodeContext::new(def))
        .unwrap_err();
    assert!(matches!(err, Error::MissingKeyField { .. }));
}

#[test]
fn test_entity_absent_array_is_empty() {
    assert!(decode("ads", json!({"request_status": "SUCCESS"}), None, None).is_empty());
}

// ============================================================================
// Targeting decoding
// ============================================================================

#[test]
fn test_targeting_demographics() {
    let page = json!({
        "targeting_dimensions": [{
            "sub_request_status": "SUCCESS",
            "age_group": {"id": "18-20", "name": "18-20"}
        }]
    });

    let records = decode("targeting_age_groups", page, None, None);
    assert_eq!(
        records,
        vec![json!({
            "id": "18-20",
            "name": "18-20",
            "targeting_group": "demographics",
            "targeting_type": "age_group"
        })]
    );
}

#[test]
fn test_targeting_geo_region_pulls_nested_id() {
    let page = json!({
        "targeting_dimensions": [{
            "sub_request_status": "SUCCESS",
            "region": {
                "country": {"id": "us"},
                "region": {"id": "3852", "name": "California", "code": "CA"}
            }
        }]
    });

    let records = decode("targeting_regions", page, None, Some("us"));
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record["id"], "3852");
    assert_eq!(record["name"], "California");
    assert_eq!(record["country_code"], "us");
    assert_eq!(record["targeting_group"], "geo");
    assert_eq!(record["targeting_type"], "region");
}

#[test]
fn test_targeting_postal_code() {
    let page = json!({
        "targeting_dimensions": [{
            "sub_request_status": "SUCCESS",
            "postal_code": {"postalCode": "94105"}
        }]
    });

    let records = decode("targeting_postal_codes", page, None, Some("us"));
    assert_eq!(records[0]["id"], "94105");
    assert_eq!(records[0]["name"], "94105");
    assert!(records[0].get("postal_code").is_none());
}

// ============================================================================
// Stats decoding
// ============================================================================

fn stats_page() -> Value {
    json!({
        "request_status": "SUCCESS",
        "timeseries_stats": [{
            "sub_request_status": "SUCCESS",
            "timeseries_stat": {
                "id": "c1",
                "type": "CAMPAIGN",
                "granularity": "DAY",
                "start_time": "2021-05-01T00:00:00.000-07:00",
                "end_time": "2021-05-03T00:00:00.000-07:00",
                "timeseries": [
                    {
                        "start_time": "2021-05-01T00:00:00.000-07:00",
                        "end_time": "2021-05-02T00:00:00.000-07:00",
                        "stats": {"impressions": 10, "spend": 100, "conversionPurchases": 1}
                    },
                    {
                        "start_time": "2021-05-02T00:00:00.000-07:00",
                        "end_time": "2021-05-03T00:00:00.000-07:00",
                        "stats": {"impressions": 7, "spend": 50, "conversionPurchases": 0}
                    }
                ]
            }
        }]
    })
}

#[test]
fn test_stats_explodes_timeseries() {
    let records = decode("campaign_stats_daily", stats_page(), Some("c1"), None);
    assert_eq!(
        records,
        vec![
            json!({
                "id": "c1",
                "type": "CAMPAIGN",
                "granularity": "DAY",
                "start_time": "2021-05-01T00:00:00.000-07:00",
                "end_time": "2021-05-02T00:00:00.000-07:00",
                "impressions": 10,
                "spend": 100,
                "conversion_purchases": 1
            }),
            json!({
                "id": "c1",
                "type": "CAMPAIGN",
                "granularity": "DAY",
                "start_time": "2021-05-02T00:00:00.000-07:00",
                "end_time": "2021-05-03T00:00:00.000-07:00",
                "impressions": 7,
                "spend": 50,
                "conversion_purchases": 0
            }),
        ]
    );
}

#[test]
fn test_stats_missing_start_time_is_fatal() {
    let page = json!({
        "timeseries_stats": [{
            "timeseries_stat": {
                "id": "c1",
                "timeseries": [{"end_time": "2021-05-02T00:00:00Z", "stats": {}}]
            }
        }]
    });
    let def = stream("campaign_stats_daily");
    let err = StatsDecoder::new()
        .decode(&page, &DecodeContext::new(def))
        .unwrap_err();
    assert!(matches!(err, Error::MissingStatsKey { ref field, .. } if field == "start_time"));
}

#[test_case(json!({"sub_request_status": "SUCCESS"}); "absent")]
#[test_case(json!({"timeseries_stat": null}); "null")]
#[test_case(json!({"timeseries_stat": ["c1"]}); "not an object")]
fn test_stats_wrapper_without_record_is_fatal(wrapper: Value) {
    let page = json!({"timeseries_stats": [wrapper]});
    let def = stream("ad_stats_daily");
    let err = StatsDecoder::new()
        .decode(&page, &DecodeContext::new(def))
        .unwrap_err();
    assert!(
        matches!(err, Error::MissingStatsKey { ref field, .. } if field == "timeseries_stat"),
        "{err:?}"
    );
}

#[test]
fn test_stats_empty_timeseries() {
    let page = json!({
        "timeseries_stats": [{"timeseries_stat": {"id": "c1", "timeseries": []}}]
    });
    assert!(decode("ad_stats_hourly", page, Some("a1"), None).is_empty());
}

#[test]
fn test_pixel_domain_stats_uses_entity_envelope() {
    let page = json!({
        "timeseries_stats": [{
            "sub_request_status": "SUCCESS",
            "timeseries_stat": {"id": "px1", "domains": ["example.com"]}
        }]
    });
    let records = decode("pixel_domain_stats", page, Some("px1"), None);
    assert_eq!(
        records,
        vec![json!({"id": "px1", "domains": ["example.com"], "pixel_id": "px1"})]
    );
}
