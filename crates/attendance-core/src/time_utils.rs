use chrono::{NaiveDateTime, TimeDelta};

use crate::error::{AttendanceError, Result};

/// Canonical timestamp layout used by session definitions and reports.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Layouts accepted for join/leave cells, tried in order.
///
/// The canonical layout comes first; the rest cover fractional seconds, the
/// ISO `T` separator and the US-style layouts some meeting exports emit.
const LOG_FORMATS: &[&str] = &[
    TIMESTAMP_FORMAT,
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse a join/leave cell into a naive timestamp.
///
/// Surrounding whitespace is ignored. Returns `None` for empty strings or
/// unrecognised layouts.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }

    LOG_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
}

/// Parse a session boundary, which must use [`TIMESTAMP_FORMAT`] exactly.
pub fn parse_session_boundary(s: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s.trim(), TIMESTAMP_FORMAT)
        .map_err(|_| AttendanceError::SessionBoundary(s.to_string()))
}

// ── Formatting / arithmetic ───────────────────────────────────────────────────

/// Render a timestamp with [`TIMESTAMP_FORMAT`].
pub fn format_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Length of a [`TimeDelta`] in fractional minutes.
pub fn delta_minutes(delta: TimeDelta) -> f64 {
    delta.num_milliseconds() as f64 / 60_000.0
}
