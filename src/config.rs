//! Tap configuration
//!
//! This module contains the configuration structure read from the `--config`
//! JSON file, plus the derived settings the rest of the tap consumes. All
//! validation happens here so a bad config fails before any network I/O.

use crate::auth::AuthConfig;
use crate::error::{Error, Result};
use crate::http::{HttpClientConfig, RateLimiterConfig};
use crate::window::parse_timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;

/// Production API root
pub const DEFAULT_BASE_URL: &str = "https://adsapi.snapchat.com/v1";

/// OAuth2 token endpoint
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.snapchat.com/login/oauth2/access_token";

/// Request timeout applied when none (or zero) is configured
pub const DEFAULT_REQUEST_TIMEOUT_SECS: f64 = 300.0;

const REQUIRED_FIELDS: [&str; 4] = ["client_id", "client_secret", "refresh_token", "start_date"];

// ============================================================================
// Top-Level Tap Config
// ============================================================================

/// Complete tap configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TapConfig {
    /// OAuth2 client id
    pub client_id: String,

    /// OAuth2 client secret
    pub client_secret: String,

    /// Long-lived refresh token
    pub refresh_token: String,

    /// Earliest timestamp to replicate when no bookmark exists
    pub start_date: String,

    /// User agent sent with every request
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Swipe-up attribution window token (e.g. `28_DAY`)
    #[serde(default = "default_swipe_up_window")]
    pub swipe_up_attribution_window: String,

    /// View attribution window token (e.g. `7_DAY`, `1_HOUR`)
    #[serde(default = "default_view_window")]
    pub view_attribution_window: String,

    /// Comma separated country codes for geo targeting streams
    #[serde(default = "default_country_codes")]
    pub targeting_country_codes: String,

    /// Page size for paged streams
    #[serde(default = "default_page_size", deserialize_with = "lenient_u32")]
    pub page_size: u32,

    /// Request timeout in seconds (number or numeric string)
    #[serde(default)]
    pub request_timeout: Option<Value>,

    /// Forwarded as `omit_empty` on stats requests
    #[serde(default = "default_omit_empty", deserialize_with = "lenient_string")]
    pub omit_empty: String,

    /// Restricts organizations and ad accounts to the listed ids
    #[serde(default)]
    pub org_account_ids: Option<Value>,

    /// API root
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// OAuth2 token endpoint
    #[serde(default = "default_token_url")]
    pub token_url: String,

    /// Optional client-side pacing
    #[serde(default)]
    pub max_requests_per_second: Option<u32>,
}

fn default_swipe_up_window() -> String {
    "28_DAY".to_string()
}

fn default_view_window() -> String {
    "7_DAY".to_string()
}

fn default_country_codes() -> String {
    "us".to_string()
}

fn default_page_size() -> u32 {
    500
}

fn default_omit_empty() -> String {
    "true".to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_token_url() -> String {
    DEFAULT_TOKEN_URL.to_string()
}

fn lenient_u32<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u32, D::Error> {
    use serde::de::Error as _;
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| D::Error::custom(format!("expected a positive integer, got {n}"))),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| D::Error::custom(format!("expected a positive integer, got '{s}'"))),
        other => Err(D::Error::custom(format!(
            "expected a positive integer, got {other}"
        ))),
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        other => other.to_string(),
    })
}

/// One entry of `org_account_ids`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgAccountSelection {
    /// Organization id
    pub organisation_id: String,

    /// Ad account ids belonging to the organization
    #[serde(default)]
    pub ad_accounts: Vec<String>,
}

impl TapConfig {
    /// Load and validate a config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_json_str(&contents)
    }

    /// Parse and validate inline config JSON
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Build from a JSON value, checking required keys first
    pub fn from_value(mut value: Value) -> Result<Self> {
        let object = value
            .as_object_mut()
            .ok_or_else(|| Error::config("config must be a JSON object"))?;

        for field in REQUIRED_FIELDS {
            match object.get(field) {
                None | Some(Value::Null) => return Err(Error::missing_field(field)),
                _ => {}
            }
        }

        if let Some(raw) = object.get_mut("org_account_ids") {
            normalize_org_account_ids(raw)?;
        }

        let config: Self = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate derived settings
    pub fn validate(&self) -> Result<()> {
        self.start_date()?;
        self.attribution_window_days()?;
        self.request_timeout()?;
        self.profile_selection()?;
        if self.page_size == 0 {
            return Err(Error::invalid_value("page_size", "must be greater than zero"));
        }
        Ok(())
    }

    /// Parsed `start_date`
    pub fn start_date(&self) -> Result<DateTime<Utc>> {
        parse_timestamp(&self.start_date)
            .map_err(|e| Error::invalid_value("start_date", e.to_string()))
    }

    /// Effective request timeout; missing, blank and zero values fall back to 300s
    pub fn request_timeout(&self) -> Result<Duration> {
        let seconds = match &self.request_timeout {
            None | Some(Value::Null) => None,
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) if s.trim().is_empty() => None,
            Some(Value::String(s)) => Some(s.trim().parse::<f64>().map_err(|_| {
                Error::invalid_value("request_timeout", format!("'{s}' is not a number"))
            })?),
            Some(other) => {
                return Err(Error::invalid_value(
                    "request_timeout",
                    format!("unsupported value {other}"),
                ))
            }
        };

        let seconds = match seconds {
            Some(s) if s > 0.0 && s.is_finite() => s,
            Some(s) if s < 0.0 => {
                return Err(Error::invalid_value(
                    "request_timeout",
                    format!("{s} is negative"),
                ))
            }
            _ => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        Ok(Duration::from_secs_f64(seconds))
    }

    /// Attribution lookback in days: the larger of both windows, at least one
    pub fn attribution_window_days(&self) -> Result<i64> {
        let swipe_up = parse_attribution_window(
            "swipe_up_attribution_window",
            &self.swipe_up_attribution_window,
        )?;
        let view = parse_attribution_window("view_attribution_window", &self.view_attribution_window)?;
        Ok(1.max(swipe_up).max(view))
    }

    /// Normalized country codes for geo targeting streams
    pub fn country_codes(&self) -> Vec<String> {
        self.targeting_country_codes
            .replace(' ', "")
            .to_lowercase()
            .split(',')
            .filter(|code| !code.is_empty())
            .map(ToString::to_string)
            .collect()
    }

    /// Organizations/ad accounts to restrict the sync to, if any
    ///
    /// Values that are neither a list nor a JSON-encoded list are ignored.
    pub fn profile_selection(&self) -> Result<Option<Vec<OrgAccountSelection>>> {
        match &self.org_account_ids {
            Some(Value::Array(items)) if !items.is_empty() => {
                let selection: Vec<OrgAccountSelection> =
                    serde_json::from_value(Value::Array(items.clone())).map_err(|e| {
                        Error::invalid_value("org_account_ids", e.to_string())
                    })?;
                Ok(Some(selection))
            }
            _ => Ok(None),
        }
    }

    /// User agent header value
    pub fn user_agent(&self) -> String {
        self.user_agent
            .clone()
            .filter(|ua| !ua.trim().is_empty())
            .unwrap_or_else(|| format!("tap-snapchat-ads/{}", env!("CARGO_PKG_VERSION")))
    }

    /// Transport settings derived from this config
    pub fn http_config(&self) -> Result<HttpClientConfig> {
        let mut builder = HttpClientConfig::builder()
            .base_url(&self.base_url)
            .timeout(self.request_timeout()?)
            .user_agent(self.user_agent());

        if let Some(rps) = self.max_requests_per_second.filter(|rps| *rps > 0) {
            builder = builder.rate_limit(RateLimiterConfig::new(rps, rps));
        }

        Ok(builder.build())
    }

    /// OAuth2 refresh-token credentials
    pub fn auth_config(&self) -> AuthConfig {
        AuthConfig {
            token_url: self.token_url.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            refresh_token: self.refresh_token.clone(),
        }
    }
}

/// Decode a JSON-encoded `org_account_ids` string in place
fn normalize_org_account_ids(raw: &mut Value) -> Result<()> {
    if let Value::String(encoded) = raw {
        if encoded.trim().is_empty() {
            *raw = Value::Null;
            return Ok(());
        }
        let parsed: Value = serde_json::from_str(encoded).map_err(|e| {
            Error::invalid_value("org_account_ids", format!("malformed JSON string: {e}"))
        })?;
        *raw = parsed;
    }
    Ok(())
}

/// Longest attribution window the Ads API accepts
pub const MAX_ATTRIBUTION_DAYS: i64 = 28;

/// Parse `<N>_DAY` into days; the sub-day tokens count as one day
///
/// `N` must lie in `0..=MAX_ATTRIBUTION_DAYS`.
pub fn parse_attribution_window(field: &str, token: &str) -> Result<i64> {
    match token {
        "1_HOUR" | "3_HOUR" | "6_HOUR" => Ok(1),
        _ => token
            .strip_suffix("_DAY")
            .and_then(|days| days.parse::<i64>().ok())
            .filter(|days| (0..=MAX_ATTRIBUTION_DAYS).contains(days))
            .ok_or_else(|| Error::invalid_value(field, format!("unsupported window '{token}'"))),
    }
}
