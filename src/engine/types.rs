//! Engine types
//!
//! Run settings and statistics for the sync engine.

use crate::config::{OrgAccountSelection, TapConfig};
use crate::error::Result;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Settings for a sync run, derived from the tap config
#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// Bookmark used when a stream has none
    pub start_date: DateTime<Utc>,
    /// Substituted for `{swipe_up_attribution_window}`
    pub swipe_up_attribution_window: String,
    /// Substituted for `{view_attribution_window}`
    pub view_attribution_window: String,
    /// Lookback applied to stats windows
    pub attribution_days: i64,
    /// Countries requested by country-partitioned streams
    pub country_codes: Vec<String>,
    /// `limit` of paged requests
    pub page_size: u32,
    /// Substituted for `{omit_empty}`
    pub omit_empty: String,
    /// Fetch only these organizations and ad accounts
    pub profile_selection: Option<Vec<OrgAccountSelection>>,
}

impl SyncSettings {
    /// Derive settings from a validated config
    pub fn from_config(config: &TapConfig) -> Result<Self> {
        Ok(Self {
            start_date: config.start_date()?,
            swipe_up_attribution_window: config.swipe_up_attribution_window.clone(),
            view_attribution_window: config.view_attribution_window.clone(),
            attribution_days: config.attribution_window_days()?,
            country_codes: config.country_codes(),
            page_size: config.page_size,
            omit_empty: config.omit_empty.clone(),
            profile_selection: config.profile_selection()?,
        })
    }

    /// Defaults of an otherwise empty config starting at `start_date`
    pub fn new(start_date: DateTime<Utc>) -> Self {
        Self {
            start_date,
            swipe_up_attribution_window: "28_DAY".to_string(),
            view_attribution_window: "7_DAY".to_string(),
            attribution_days: 28,
            country_codes: vec!["us".to_string()],
            page_size: 500,
            omit_empty: "true".to_string(),
            profile_selection: None,
        }
    }

    /// Set country codes
    #[must_use]
    pub fn with_country_codes(mut self, codes: &[&str]) -> Self {
        self.country_codes = codes.iter().map(ToString::to_string).collect();
        self
    }

    /// Restrict organizations and ad accounts
    #[must_use]
    pub fn with_profile_selection(mut self, selection: Vec<OrgAccountSelection>) -> Self {
        self.profile_selection = Some(selection).filter(|s| !s.is_empty());
        self
    }
}

/// Statistics from a sync operation
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Records emitted per stream
    pub records: BTreeMap<String, u64>,
    /// Total pages fetched
    pub pages_fetched: usize,
    /// Stream invocations, one per parent record for child streams
    pub streams_synced: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl SyncStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Add emitted records for a stream
    pub fn add_records(&mut self, stream: &str, count: u64) {
        *self.records.entry(stream.to_string()).or_default() += count;
    }

    /// Add a page
    pub fn add_page(&mut self) {
        self.pages_fetched += 1;
    }

    /// Add a stream
    pub fn add_stream(&mut self) {
        self.streams_synced += 1;
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }

    /// Records emitted by one stream
    pub fn records_for(&self, stream: &str) -> u64 {
        self.records.get(stream).copied().unwrap_or_default()
    }

    /// Records emitted across all streams
    pub fn total_records(&self) -> u64 {
        self.records.values().sum()
    }
}
