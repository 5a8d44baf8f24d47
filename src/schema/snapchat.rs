//! JSON schemas of the Snapchat streams
//!
//! Schemas list the documented fields of each resource. They stay open to
//! unlisted keys so new API fields flow through untyped.

use super::types::{JsonSchema, SchemaProperty};
use crate::streams::StreamDefinition;
use std::collections::BTreeMap;

type P = SchemaProperty;

/// Schema of one stream's emitted records
pub fn stream_schema(stream: &StreamDefinition) -> JsonSchema {
    let mut schema = if stream.is_stats() {
        stats_schema(stream)
    } else if stream.targeting.is_some() {
        targeting_schema()
    } else {
        entity_schema(stream.name)
    };

    if let Some(relation) = stream.parent {
        if !stream.is_stats() {
            schema.add_property(&relation.id_field(), P::string());
        }
    }
    if let Some(field) = stream.replication_field {
        if !schema.properties.contains_key(field) {
            schema.add_property(field, P::date_time());
        }
    }
    for key in stream.key_fields {
        if let Some(property) = schema.properties.remove(*key) {
            schema.add_property(key, property.required());
        } else {
            schema.add_property(key, P::string().required());
        }
    }

    schema
}

fn props<const N: usize>(fields: [(&str, P); N]) -> BTreeMap<String, P> {
    fields
        .into_iter()
        .map(|(name, property)| (name.to_string(), property))
        .collect()
}

fn with_fields<const N: usize>(mut schema: JsonSchema, fields: [(&str, P); N]) -> JsonSchema {
    schema.properties.extend(props(fields));
    schema
}

fn base_entity() -> JsonSchema {
    JsonSchema::new()
        .with("id", P::string())
        .with("name", P::string())
        .with("created_at", P::date_time())
        .with("updated_at", P::date_time())
}

fn address_fields(schema: JsonSchema) -> JsonSchema {
    with_fields(
        schema,
        [
            ("address_line_1", P::string()),
            ("address_line_2", P::string()),
            ("locality", P::string()),
            ("administrative_district_level_1", P::string()),
            ("country", P::string()),
            ("postal_code", P::string()),
        ],
    )
}

fn delivery_status() -> P {
    P::array(P::string())
}

fn entity_schema(name: &str) -> JsonSchema {
    let base = base_entity();
    match name {
        "organizations" => with_fields(
            address_fields(base),
            [
                ("type", P::string()),
                ("state", P::string()),
                ("configuration_settings", P::open_object()),
                ("accepted_term_version", P::string()),
                ("contact_name", P::string()),
                ("contact_email", P::string()),
                ("contact_phone", P::string()),
                ("contact_phone_optin", P::boolean()),
                ("roles", P::array(P::string())),
                ("my_display_name", P::string()),
                ("my_invited_email", P::string()),
                ("my_member_id", P::string()),
                ("created_by_caller", P::boolean()),
            ],
        ),
        "funding_sources" => with_fields(
            base,
            [
                ("organization_id", P::string()),
                ("type", P::string()),
                ("status", P::string()),
                ("currency", P::string()),
                ("budget_spent_micro", P::integer()),
                ("total_budget_micro", P::integer()),
                ("available_credit_micro", P::integer()),
                ("value_micro", P::integer()),
                ("card_type", P::string()),
                ("last_4", P::string()),
                ("expiration_year", P::string()),
                ("expiration_month", P::string()),
                ("daily_spend_limit_micro", P::integer()),
                ("daily_spend_limit_currency", P::string()),
                ("start_date", P::date_time()),
                ("end_date", P::date_time()),
                ("email", P::string()),
            ],
        ),
        "billing_centers" => with_fields(
            address_fields(base),
            [
                ("organization_id", P::string()),
                ("email_address", P::string()),
                ("alternative_email_addresses", P::array(P::string())),
            ],
        ),
        "members" => with_fields(
            base,
            [
                ("organization_id", P::string()),
                ("email", P::string()),
                ("display_name", P::string()),
                ("member_status", P::string()),
            ],
        ),
        "roles" => with_fields(
            base,
            [
                ("organization_id", P::string()),
                ("container_kind", P::string()),
                ("container_id", P::string()),
                ("member_id", P::string()),
                ("type", P::string()),
            ],
        ),
        "ad_accounts" => with_fields(
            base,
            [
                ("organization_id", P::string()),
                ("type", P::string()),
                ("status", P::string()),
                ("currency", P::string()),
                ("timezone", P::string()),
                ("advertiser", P::string()),
                ("advertiser_organization_id", P::string()),
                ("billing_center_id", P::string()),
                ("billing_type", P::string()),
                ("funding_source_ids", P::array(P::string())),
                ("agency_representing_client", P::boolean()),
                ("client_paying_invoices", P::boolean()),
                ("lifetime_spend_cap_micro", P::integer()),
                ("regulations", P::open_object()),
            ],
        ),
        "audience_segments" => with_fields(
            base,
            [
                ("ad_account_id", P::string()),
                ("organization_id", P::string()),
                ("description", P::string()),
                ("status", P::string()),
                ("source_type", P::string()),
                ("retention_in_days", P::integer()),
                ("approximate_number_users", P::integer()),
                ("upload_status", P::string()),
                ("targetable_status", P::string()),
                ("visible_to", P::array(P::string())),
            ],
        ),
        "pixels" => with_fields(
            base,
            [
                ("ad_account_id", P::string()),
                ("organization_id", P::string()),
                ("status", P::string()),
                ("effective_status", P::string()),
                ("pixel_javascript", P::string()),
            ],
        ),
        "pixel_domain_stats" => with_fields(
            JsonSchema::new(),
            [
                ("id", P::string()),
                ("type", P::string()),
                ("start_time", P::date_time()),
                ("end_time", P::date_time()),
                ("domains", P::array(P::open_object())),
            ],
        ),
        "media" => with_fields(
            base,
            [
                ("ad_account_id", P::string()),
                ("type", P::string()),
                ("media_status", P::string()),
                ("file_name", P::string()),
                ("file_size_in_bytes", P::integer()),
                ("duration_in_seconds", P::number()),
                ("hash", P::string()),
                ("download_link", P::string()),
                ("visibility", P::string()),
                ("is_demo_media", P::boolean()),
                ("image_metadata", P::open_object()),
                ("video_metadata", P::open_object()),
            ],
        ),
        "creatives" => with_fields(
            base,
            [
                ("ad_account_id", P::string()),
                ("type", P::string()),
                ("packaging_status", P::string()),
                ("review_status", P::string()),
                ("review_status_details", P::string()),
                ("shareable", P::boolean()),
                ("forced_view_eligibility", P::string()),
                ("headline", P::string()),
                ("brand_name", P::string()),
                ("call_to_action", P::string()),
                ("render_type", P::string()),
                ("top_snap_media_id", P::string()),
                ("top_snap_crop_position", P::string()),
                ("preview_creative_id", P::string()),
                ("playback_type", P::string()),
                ("ad_product", P::string()),
                ("web_view_properties", P::open_object()),
                ("app_install_properties", P::open_object()),
                ("deep_link_properties", P::open_object()),
                ("longform_video_properties", P::open_object()),
                ("collection_properties", P::open_object()),
                ("dynamic_render_properties", P::open_object()),
                ("composite_properties", P::open_object()),
                ("ad_to_lens_properties", P::open_object()),
                ("ad_to_call_properties", P::open_object()),
                ("ad_to_message_properties", P::open_object()),
            ],
        ),
        "phone_numbers" => with_fields(
            base,
            [
                ("ad_account_id", P::string()),
                ("phone_number", P::string()),
                ("numerical_country_code", P::string()),
                ("country_code", P::string()),
                ("verification_status", P::string()),
            ],
        ),
        "campaigns" => with_fields(
            base,
            [
                ("ad_account_id", P::string()),
                ("status", P::string()),
                ("objective", P::string()),
                ("buy_model", P::string()),
                ("start_time", P::date_time()),
                ("end_time", P::date_time()),
                ("daily_budget_micro", P::integer()),
                ("lifetime_spend_cap_micro", P::integer()),
                ("regulations", P::open_object()),
                ("measurement_spec", P::open_object()),
                ("delivery_status", delivery_status()),
            ],
        ),
        "ad_squads" => with_fields(
            base,
            [
                ("campaign_id", P::string()),
                ("status", P::string()),
                ("type", P::string()),
                ("targeting", P::open_object()),
                ("targeting_reach_status", P::string()),
                ("placement", P::string()),
                ("placement_v2", P::open_object()),
                ("billing_event", P::string()),
                ("auto_bid", P::boolean()),
                ("target_bid", P::boolean()),
                ("bid_micro", P::integer()),
                ("bid_strategy", P::string()),
                ("daily_budget_micro", P::integer()),
                ("lifetime_budget_micro", P::integer()),
                ("start_time", P::date_time()),
                ("end_time", P::date_time()),
                ("optimization_goal", P::string()),
                ("delivery_constraint", P::string()),
                ("pacing_type", P::string()),
                ("reach_goal", P::integer()),
                ("impression_goal", P::integer()),
                ("cap_and_exclusion_config", P::open_object()),
                ("skadnetwork_properties", P::open_object()),
                ("delivery_status", delivery_status()),
            ],
        ),
        "ads" => with_fields(
            base,
            [
                ("ad_squad_id", P::string()),
                ("creative_id", P::string()),
                ("status", P::string()),
                ("type", P::string()),
                ("render_type", P::string()),
                ("review_status", P::string()),
                ("review_status_reasons", P::array(P::string())),
                ("delivery_status", delivery_status()),
            ],
        ),
        "product_catalogs" => with_fields(
            base,
            [
                ("organization_id", P::string()),
                ("vertical", P::string()),
                ("source_type", P::string()),
                ("event_sources", P::array(P::open_object())),
            ],
        ),
        "product_sets" => with_fields(
            base,
            [
                ("catalog_id", P::string()),
                ("filter", P::open_object()),
            ],
        ),
        _ => base,
    }
}

fn targeting_schema() -> JsonSchema {
    with_fields(
        JsonSchema::new(),
        [
            ("id", P::string()),
            ("name", P::string()),
            ("targeting_group", P::string()),
            ("targeting_type", P::string()),
            ("country_code", P::string()),
            ("description", P::string()),
            ("source", P::string()),
            ("parent_id", P::string()),
            ("path", P::string()),
            ("code", P::string()),
            ("continent", P::open_object()),
            ("country", P::open_object()),
            ("region", P::open_object()),
            ("metro", P::open_object()),
            ("regions", P::array(P::string())),
        ],
    )
}

/// Identifying fields plus one number per requested metric
fn stats_schema(stream: &StreamDefinition) -> JsonSchema {
    let mut schema = with_fields(
        JsonSchema::new(),
        [
            ("id", P::string()),
            ("type", P::string()),
            ("granularity", P::string()),
            ("start_time", P::date_time()),
            ("end_time", P::date_time()),
            ("finalized_data_end_time", P::date_time()),
            ("conversion_data_processed_end_time", P::date_time()),
            ("swipe_up_attribution_window", P::string()),
            ("view_attribution_window", P::string()),
        ],
    );

    let metrics = stream.param("fields").unwrap_or_default();
    for metric in metrics.split(',').filter(|m| !m.is_empty()) {
        schema.add_property(metric, P::number());
    }
    schema
}
