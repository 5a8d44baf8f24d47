//! Date window calculation
//!
//! Turns a bookmark, the attribution lookback and a stream's chunk size into
//! the ordered, gapless list of `[start, end)` windows to request, and renders
//! window bounds as API query values in the stream's timezone.

mod calculator;
mod types;

pub use calculator::{compute_windows, format_timestamp, parse_timestamp, query_bounds};
pub use types::{DateWindow, WindowPlan, WindowRequest};
