//! Interval reconciliation primitives.
//!
//! A participant who drops and rejoins a meeting shows up as several
//! join/leave records. [`merge_intervals`] collapses them into a minimal,
//! sorted, disjoint set; [`clip_to_window`] restricts that set to a session
//! window. Both functions are pure and allocation-light.

use crate::models::Interval;

/// Collapse `intervals` into a minimal disjoint set sorted by start.
///
/// Intervals whose start is at or before the current end are absorbed into it,
/// so touching intervals merge: `[(0,10),(10,20)]` → `[(0,20)]`.
/// Idempotent and independent of input order.
pub fn merge_intervals(mut intervals: Vec<Interval>) -> Vec<Interval> {
    intervals.sort_unstable();

    let mut merged: Vec<Interval> = Vec::with_capacity(intervals.len());
    for next in intervals {
        match merged.last_mut() {
            Some(current) if next.start <= current.end => {
                current.end = current.end.max(next.end);
            }
            _ => merged.push(next),
        }
    }
    merged
}

/// Restrict merged `intervals` to `window`.
///
/// Zero-length overlaps are dropped, so presence that only touches a window
/// boundary does not count. The surviving pieces are re-merged.
pub fn clip_to_window(intervals: &[Interval], window: Interval) -> Vec<Interval> {
    let clipped: Vec<Interval> = intervals
        .iter()
        .filter_map(|iv| {
            let start = iv.start.max(window.start);
            let end = iv.end.min(window.end);
            (start < end).then(|| Interval::new(start, end))
        })
        .collect();

    merge_intervals(clipped)
}

/// Sum of interval lengths in fractional minutes.
pub fn total_minutes(intervals: &[Interval]) -> f64 {
    intervals.iter().map(Interval::minutes).sum()
}

/// Smallest interval covering every input, or `None` for an empty slice.
pub fn envelope<'a, I>(intervals: I) -> Option<Interval>
where
    I: IntoIterator<Item = &'a Interval>,
{
    intervals.into_iter().fold(None, |acc: Option<Interval>, iv| {
        Some(match acc {
            None => *iv,
            Some(span) => Interval::new(span.start.min(iv.start), span.end.max(iv.end)),
        })
    })
}
