//! Window types

use crate::types::Granularity;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

/// Half-open interval `[start, end)` in UTC
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }
}

/// Everything needed to plan the windows of one stream invocation
#[derive(Debug, Clone, Copy)]
pub struct WindowRequest {
    /// Bookmark value, or the configured start date
    pub last_bookmark: DateTime<Utc>,
    /// Fixed once per run
    pub now: DateTime<Utc>,
    /// Attribution lookback in days
    pub attribution_days: i64,
    /// Whether the stream queries by explicit start/end parameters
    pub date_windowed: bool,
    /// Width of one window for date-windowed streams
    pub window_size_days: i64,
    pub granularity: Granularity,
    pub timezone: Tz,
}

/// Result of planning
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowPlan {
    pub windows: Vec<DateWindow>,
    /// Effective width in days; for single-window streams the span rounded up
    pub window_size_days: i64,
}
