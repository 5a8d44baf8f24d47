//! Window planning and local-time truncation

use super::types::{DateWindow, WindowPlan, WindowRequest};
use crate::error::{Error, Result};
use crate::types::Granularity;
use chrono::{
    DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Timelike,
    Utc,
};
use chrono_tz::Tz;

const QUERY_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";
const SECONDS_PER_DAY: i64 = 86_400;

/// Plan the windows for one stream invocation
///
/// Date-windowed (stats) streams start at the earlier of the bookmark and
/// `now - attribution_days`, so late-attributed conversions are re-read, and
/// advance in `window_size_days` steps with the last window cut at `now`.
/// Every other stream gets the single window `[bookmark, now)`.
/// An empty plan means there is nothing to request. A lookback that falls
/// outside the representable range starts at the bookmark instead.
pub fn compute_windows(req: &WindowRequest) -> WindowPlan {
    if req.date_windowed {
        let lookback = Duration::try_days(req.attribution_days)
            .and_then(|days| req.now.checked_sub_signed(days))
            .unwrap_or(req.last_bookmark);
        let size = Duration::days(req.window_size_days.max(1));

        let mut windows = Vec::new();
        let mut start = req.last_bookmark.min(lookback);
        while start < req.now {
            let end = (start + size).min(req.now);
            windows.push(DateWindow::new(start, end));
            start = end;
        }

        return WindowPlan {
            windows,
            window_size_days: size.num_days(),
        };
    }

    if req.last_bookmark >= req.now {
        return WindowPlan {
            windows: Vec::new(),
            window_size_days: 0,
        };
    }

    let span = (req.now - req.last_bookmark).num_seconds();
    WindowPlan {
        windows: vec![DateWindow::new(req.last_bookmark, req.now)],
        window_size_days: (span + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY,
    }
}

/// Render a window as `(start, end)` query values
///
/// Bounds are truncated to local midnight (DAY) or the local hour (HOUR) in
/// `tz`, then expressed in UTC. When truncation collapses both bounds onto
/// the same instant the end moves forward by one day or one hour.
pub fn query_bounds(window: &DateWindow, granularity: Granularity, tz: Tz) -> (String, String) {
    let (truncate, unit): (fn(DateTime<Utc>, Tz) -> DateTime<Utc>, Duration) = match granularity {
        Granularity::Day => (truncate_to_local_day, Duration::days(1)),
        Granularity::Hour => (truncate_to_local_hour, Duration::hours(1)),
    };

    let start = truncate(window.start, tz);
    let mut end = truncate(window.end, tz);
    if start == end {
        end = truncate(window.end + unit, tz);
    }

    (
        start.format(QUERY_FORMAT).to_string(),
        end.format(QUERY_FORMAT).to_string(),
    )
}

fn truncate_to_local_day(dt: DateTime<Utc>, tz: Tz) -> DateTime<Utc> {
    let local = dt.with_timezone(&tz).naive_local();
    resolve_local(tz, local.date().and_hms_opt(0, 0, 0).unwrap_or(local), dt)
}

fn truncate_to_local_hour(dt: DateTime<Utc>, tz: Tz) -> DateTime<Utc> {
    let local = dt.with_timezone(&tz).naive_local();
    let truncated = local
        .date()
        .and_hms_opt(local.hour(), 0, 0)
        .unwrap_or(local);
    resolve_local(tz, truncated, dt)
}

/// Map a local wall-clock time back to UTC
///
/// Ambiguous times take the earlier instant; times skipped by a DST jump
/// move forward to the first valid hour.
fn resolve_local(tz: Tz, naive: NaiveDateTime, fallback: DateTime<Utc>) -> DateTime<Utc> {
    for shift in 0..=3 {
        match tz.from_local_datetime(&(naive + Duration::hours(shift))) {
            LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => {
                return dt.with_timezone(&Utc)
            }
            LocalResult::None => {}
        }
    }
    fallback
}

/// Parse a bookmark, start date or record timestamp into UTC
///
/// Accepts RFC 3339, naive date-times (read as UTC) and bare dates.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    let trimmed = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"] {
        if let Ok(dt) = DateTime::parse_from_str(trimmed, format) {
            return Ok(dt.with_timezone(&Utc));
        }
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }

    Err(Error::timestamp(value, "unrecognized date-time format"))
}

/// Canonical UTC representation used for bookmarks and emitted date-times
pub fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}
