//! The Snapchat Marketing API stream tree
//!
//! Root order is sync order: `organizations` first, then the targeting
//! reference streams. Children are listed in the order they are synced for
//! each parent record.

use super::definition::StreamDefinition;
use super::registry::Registry;
use std::sync::LazyLock;

/// Fields requested for daily campaign, ad squad and ad stats
pub const ALL_STATS_FIELDS: &str = "android_installs,attachment_avg_view_time_millis,\
attachment_impressions,attachment_quartile_1,attachment_quartile_2,attachment_quartile_3,\
attachment_total_view_time_millis,attachment_view_completion,avg_screen_time_millis,\
avg_view_time_millis,impressions,ios_installs,quartile_1,quartile_2,quartile_3,\
screen_time_millis,spend,swipe_up_percent,swipes,total_installs,video_views,\
video_views_time_based,video_views_15s,view_completion,view_time_millis,\
conversion_purchases,conversion_purchases_value,conversion_save,conversion_start_checkout,\
conversion_add_cart,conversion_view_content,conversion_add_billing,conversion_sign_ups,\
conversion_searches,conversion_level_completes,conversion_app_opens,conversion_page_views,\
conversion_subscribe,conversion_ad_click,conversion_ad_view,conversion_complete_tutorial,\
conversion_invite,conversion_login,conversion_share,conversion_reserve,\
conversion_achievement_unlocked,conversion_add_to_wishlist,conversion_spend_credits,\
conversion_rate,conversion_start_trial,conversion_list_view,custom_event_1,custom_event_2,\
custom_event_3,custom_event_4,custom_event_5,attachment_frequency,attachment_uniques,\
frequency,uniques";

/// Reach and frequency metrics are only reported at daily granularity
pub const HOURLY_STATS_FIELDS: &str = "android_installs,attachment_avg_view_time_millis,\
attachment_impressions,attachment_quartile_1,attachment_quartile_2,attachment_quartile_3,\
attachment_total_view_time_millis,attachment_view_completion,avg_screen_time_millis,\
avg_view_time_millis,impressions,ios_installs,quartile_1,quartile_2,quartile_3,\
screen_time_millis,spend,swipe_up_percent,swipes,total_installs,video_views,\
video_views_time_based,video_views_15s,view_completion,view_time_millis,\
conversion_purchases,conversion_purchases_value,conversion_save,conversion_start_checkout,\
conversion_add_cart,conversion_view_content,conversion_add_billing,conversion_sign_ups,\
conversion_searches,conversion_level_completes,conversion_app_opens,conversion_page_views,\
conversion_subscribe,conversion_ad_click,conversion_ad_view,conversion_complete_tutorial,\
conversion_invite,conversion_login,conversion_share,conversion_reserve,\
conversion_achievement_unlocked,conversion_add_to_wishlist,conversion_spend_credits,\
conversion_rate,conversion_start_trial,conversion_list_view,custom_event_1,custom_event_2,\
custom_event_3,custom_event_4,custom_event_5";

const DAILY_WINDOW_DAYS: i64 = 30;
const HOURLY_WINDOW_DAYS: i64 = 7;

const AD_ACCOUNT_STATS_DAILY_PARAMS: &[(&str, &str)] = &[
    ("fields", "spend"),
    ("granularity", "DAY"),
    ("omit_empty", "{omit_empty}"),
    ("conversion_source_types", "web,app,total"),
    ("swipe_up_attribution_window", "{swipe_up_attribution_window}"),
    ("view_attribution_window", "{view_attribution_window}"),
];

const AD_ACCOUNT_STATS_HOURLY_PARAMS: &[(&str, &str)] = &[
    ("fields", "spend"),
    ("granularity", "HOUR"),
    ("omit_empty", "{omit_empty}"),
    ("conversion_source_types", "web,app,total"),
    ("swipe_up_attribution_window", "{swipe_up_attribution_window}"),
    ("view_attribution_window", "{view_attribution_window}"),
];

const DELIVERY_STATS_DAILY_PARAMS: &[(&str, &str)] = &[
    ("fields", ALL_STATS_FIELDS),
    ("granularity", "DAY"),
    ("omit_empty", "{omit_empty}"),
    ("conversion_source_types", "web,app,total"),
    ("swipe_up_attribution_window", "{swipe_up_attribution_window}"),
    ("view_attribution_window", "{view_attribution_window}"),
];

const DELIVERY_STATS_HOURLY_PARAMS: &[(&str, &str)] = &[
    ("fields", HOURLY_STATS_FIELDS),
    ("granularity", "HOUR"),
    ("omit_empty", "{omit_empty}"),
    ("conversion_source_types", "web,app,total"),
    ("swipe_up_attribution_window", "{swipe_up_attribution_window}"),
    ("view_attribution_window", "{view_attribution_window}"),
];

const STATS_KEYS: &[&str] = &["id", "start_time"];

static SNAPCHAT_REGISTRY: LazyLock<Registry> =
    LazyLock::new(|| build_registry().expect("snapchat stream registry is valid"));

/// Shared registry of every Snapchat stream
pub fn snapchat_registry() -> &'static Registry {
    &SNAPCHAT_REGISTRY
}

fn stats(
    name: &'static str,
    path: &'static str,
    params: &'static [(&'static str, &'static str)],
    window_days: i64,
) -> StreamDefinition {
    StreamDefinition::new(name, path, "timeseries_stats", "timeseries_stat")
        .key_fields(STATS_KEYS)
        .incremental("end_time")
        .params(params)
        .date_window("start_time", "end_time", window_days)
}

fn entity(
    name: &'static str,
    path: &'static str,
    array_key: &'static str,
    record_key: &'static str,
) -> StreamDefinition {
    StreamDefinition::new(name, path, array_key, record_key).incremental("updated_at")
}

fn targeting(name: &'static str, group: &'static str, kind: &'static str) -> StreamDefinition {
    StreamDefinition::new(
        name,
        "targeting/{targeting_group}/{targeting_type}",
        "targeting_dimensions",
        "{targeting_type}",
    )
    .paged()
    .targeting(group, kind)
}

/// Assemble and validate the full stream tree
pub fn build_registry() -> crate::error::Result<Registry> {
    Registry::builder()
        // Organization tree
        .root(entity("organizations", "me/organizations", "organizations", "organization").profile_lookup())
        .child(
            "organizations",
            "organization",
            entity(
                "funding_sources",
                "organizations/{parent_id}/fundingsources",
                "fundingsources",
                "fundingsource",
            ),
        )
        .child(
            "organizations",
            "organization",
            entity(
                "billing_centers",
                "organizations/{parent_id}/billingcenters",
                "billingcenters",
                "billingcenter",
            )
            .paged(),
        )
        .child(
            "organizations",
            "organization",
            entity("members", "organizations/{parent_id}/members", "members", "member"),
        )
        .child(
            "organizations",
            "organization",
            StreamDefinition::new("roles", "organizations/{parent_id}/roles", "roles", "role").paged(),
        )
        .child(
            "organizations",
            "organization",
            entity(
                "ad_accounts",
                "organizations/{parent_id}/adaccounts",
                "adaccounts",
                "adaccount",
            )
            .profile_lookup()
            .sets_timezone(),
        )
        .child(
            "ad_accounts",
            "ad_account",
            stats(
                "ad_account_stats_daily",
                "adaccounts/{parent_id}/stats",
                AD_ACCOUNT_STATS_DAILY_PARAMS,
                DAILY_WINDOW_DAYS,
            ),
        )
        .child(
            "ad_accounts",
            "ad_account",
            stats(
                "ad_account_stats_hourly",
                "adaccounts/{parent_id}/stats",
                AD_ACCOUNT_STATS_HOURLY_PARAMS,
                HOURLY_WINDOW_DAYS,
            ),
        )
        .child(
            "ad_accounts",
            "ad_account",
            entity("audience_segments", "adaccounts/{parent_id}/segments", "segments", "segment")
                .paged(),
        )
        .child(
            "ad_accounts",
            "ad_account",
            entity("pixels", "adaccounts/{parent_id}/pixels", "pixels", "pixel").paged(),
        )
        .child(
            "pixels",
            "pixel",
            StreamDefinition::new(
                "pixel_domain_stats",
                "pixels/{parent_id}/domains/stats",
                "timeseries_stats",
                "timeseries_stat",
            ),
        )
        .child(
            "ad_accounts",
            "ad_account",
            entity("media", "adaccounts/{parent_id}/media", "media", "media").paged(),
        )
        .child(
            "ad_accounts",
            "ad_account",
            entity("creatives", "adaccounts/{parent_id}/creatives", "creatives", "creative").paged(),
        )
        .child(
            "ad_accounts",
            "ad_account",
            entity(
                "phone_numbers",
                "adaccounts/{parent_id}/phone_numbers",
                "phone_numbers",
                "phone_number",
            )
            .paged(),
        )
        .child(
            "ad_accounts",
            "ad_account",
            entity("campaigns", "adaccounts/{parent_id}/campaigns", "campaigns", "campaign").paged(),
        )
        .child(
            "campaigns",
            "campaign",
            stats(
                "campaign_stats_daily",
                "campaigns/{parent_id}/stats",
                DELIVERY_STATS_DAILY_PARAMS,
                DAILY_WINDOW_DAYS,
            ),
        )
        .child(
            "campaigns",
            "campaign",
            stats(
                "campaign_stats_hourly",
                "campaigns/{parent_id}/stats",
                DELIVERY_STATS_HOURLY_PARAMS,
                HOURLY_WINDOW_DAYS,
            ),
        )
        .child(
            "ad_accounts",
            "ad_account",
            entity("ad_squads", "adaccounts/{parent_id}/adsquads", "adsquads", "adsquad").paged(),
        )
        .child(
            "ad_squads",
            "ad_squad",
            stats(
                "ad_squad_stats_daily",
                "adsquads/{parent_id}/stats",
                DELIVERY_STATS_DAILY_PARAMS,
                DAILY_WINDOW_DAYS,
            ),
        )
        .child(
            "ad_squads",
            "ad_squad",
            stats(
                "ad_squad_stats_hourly",
                "adsquads/{parent_id}/stats",
                DELIVERY_STATS_HOURLY_PARAMS,
                HOURLY_WINDOW_DAYS,
            ),
        )
        .child(
            "ad_accounts",
            "ad_account",
            entity("ads", "adaccounts/{parent_id}/ads", "ads", "ad").paged(),
        )
        .child(
            "ads",
            "ad",
            stats(
                "ad_stats_daily",
                "ads/{parent_id}/stats",
                DELIVERY_STATS_DAILY_PARAMS,
                DAILY_WINDOW_DAYS,
            ),
        )
        .child(
            "ads",
            "ad",
            stats(
                "ad_stats_hourly",
                "ads/{parent_id}/stats",
                DELIVERY_STATS_HOURLY_PARAMS,
                HOURLY_WINDOW_DAYS,
            ),
        )
        .child(
            "organizations",
            "organization",
            entity(
                "product_catalogs",
                "organizations/{parent_id}/catalogs",
                "catalogs",
                "catalog",
            )
            .paged(),
        )
        .child(
            "product_catalogs",
            "product_catalog",
            StreamDefinition::new(
                "product_sets",
                "catalogs/{parent_id}/product_sets",
                "product_sets",
                "product_set",
            )
            .paged(),
        )
        // Targeting reference streams
        .root(targeting("targeting_age_groups", "demographics", "age_group"))
        .root(targeting("targeting_genders", "demographics", "gender"))
        .root(targeting("targeting_languages", "demographics", "languages"))
        .root(targeting(
            "targeting_advanced_demographics",
            "demographics",
            "advanced_demographics",
        ))
        .root(targeting("targeting_connection_types", "device", "connection_type"))
        .root(targeting("targeting_os_types", "device", "os_type"))
        .root(
            StreamDefinition::new(
                "targeting_ios_versions",
                "targeting/device/iOS/os_version",
                "targeting_dimensions",
                "{targeting_type}",
            )
            .paged()
            .targeting("device", "os_version"),
        )
        .root(
            StreamDefinition::new(
                "targeting_android_versions",
                "targeting/device/ANDROID/os_version",
                "targeting_dimensions",
                "{targeting_type}",
            )
            .paged()
            .targeting("device", "os_version"),
        )
        .root(targeting("targeting_carriers", "device", "carrier"))
        .root(targeting("targeting_device_makes", "device", "marketing_name"))
        .root(targeting("targeting_countries", "geo", "country"))
        .root(geo_by_country("targeting_regions", "targeting/geo/{country_code}/region", "region"))
        .root(geo_by_country("targeting_metros", "targeting/geo/{country_code}/metro", "metro"))
        .root(geo_by_country(
            "targeting_postal_codes",
            "targeting/geo/{country_code}/postal_code",
            "postal_code",
        ))
        .root(targeting("targeting_interests_scls", "interests", "scls"))
        .root(targeting("targeting_interests_dlxs", "interests", "dlxs"))
        .root(targeting("targeting_interests_dlxc", "interests", "dlxc"))
        .root(targeting("targeting_interests_dlxp", "interests", "dlxp"))
        .root(targeting("targeting_interests_nln", "interests", "nln"))
        .root(targeting("targeting_interests_plc", "interests", "plc"))
        .root(targeting("targeting_location_categories", "location", "categories_loi"))
        .build()
}

fn geo_by_country(name: &'static str, path: &'static str, kind: &'static str) -> StreamDefinition {
    StreamDefinition::new(name, path, "targeting_dimensions", "{targeting_type}")
        .paged()
        .targeting("geo", kind)
        .country_partitioned()
}
