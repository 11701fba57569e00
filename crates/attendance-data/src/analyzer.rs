//! Session processing for attendance logs.
//!
//! Turns each participant's raw join/leave events into a [`SessionFact`] for
//! one session window, and computes the unclipped global span used for
//! report context.

use std::collections::BTreeMap;

use attendance_core::intervals::{clip_to_window, merge_intervals, total_minutes};
use attendance_core::models::{AttendanceStatus, Interval, Session, SessionFact};
use tracing::debug;

use crate::reader::{AttendanceLog, ParticipantEvents};

// ── SessionProcessor ──────────────────────────────────────────────────────────

/// Computes session-scoped attendance facts for every participant of a log.
///
/// Merged presence is computed once per participant at construction and
/// reused for every session window.
pub struct SessionProcessor<'a> {
    log: &'a AttendanceLog,
    merged: BTreeMap<&'a str, Vec<Interval>>,
}

impl<'a> SessionProcessor<'a> {
    pub fn new(log: &'a AttendanceLog) -> Self {
        let merged = log
            .participants
            .iter()
            .map(|(key, p)| (key.as_str(), merge_intervals(p.intervals())))
            .collect();
        Self { log, merged }
    }

    /// Facts for every participant whose presence overlaps `session`.
    ///
    /// Participants with no positive-length overlap are omitted, not
    /// reported as absent.
    pub fn process_session(&self, session: &Session) -> BTreeMap<String, SessionFact> {
        let facts: BTreeMap<String, SessionFact> = self
            .merged
            .iter()
            .filter_map(|(key, intervals)| {
                session_fact(intervals, session).map(|fact| (key.to_string(), fact))
            })
            .collect();

        debug!(
            "{}: session {} has {} facts out of {} participants",
            self.log.source,
            session.index,
            facts.len(),
            self.merged.len()
        );
        facts
    }

    /// Unclipped earliest-join / latest-leave for every participant.
    pub fn global_spans(&self) -> BTreeMap<String, Interval> {
        global_spans(self.log.participants.values())
    }
}

// ── Free functions ────────────────────────────────────────────────────────────

/// Clip already-merged `intervals` to `session` and classify the result.
///
/// Returns `None` when nothing overlaps the window for a positive length.
pub fn session_fact(intervals: &[Interval], session: &Session) -> Option<SessionFact> {
    let clipped = clip_to_window(intervals, session.window());
    let first_join = clipped.first()?.start;
    let last_leave = clipped.last()?.end;
    let minutes = total_minutes(&clipped);

    Some(SessionFact {
        status: AttendanceStatus::from_minutes(minutes, session.required_minutes),
        minutes,
        first_join,
        last_leave,
        intervals: clipped,
    })
}

/// Global spans keyed by participant.
pub fn global_spans<'p, I>(participants: I) -> BTreeMap<String, Interval>
where
    I: IntoIterator<Item = &'p ParticipantEvents>,
{
    participants
        .into_iter()
        .filter_map(|p| p.global_span().map(|span| (p.key.clone(), span)))
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::parse_attendance_log;
    use attendance_core::time_utils::parse_session_boundary;

    fn session(index: usize, start: &str, end: &str, required: f64) -> Session {
        Session::new(
            index,
            parse_session_boundary(start).unwrap(),
            parse_session_boundary(end).unwrap(),
            required,
        )
        .unwrap()
    }

    fn log(rows: &[&str]) -> AttendanceLog {
        let mut text = String::from("preamble\npreamble\n\nName,Email,Join Time,Leave Time\n");
        for row in rows {
            text.push_str(row);
            text.push('\n');
        }
        parse_attendance_log(&text, "test.csv").unwrap()
    }

    #[test]
    fn test_reconnect_merges_into_one_present_fact() {
        let log = log(&[
            "Alice,a@x.org,2025-02-06 09:00:00,2025-02-06 09:05:00",
            "Alice,a@x.org,2025-02-06 09:05:00,2025-02-06 09:20:00",
        ]);
        let s = session(1, "2025-02-06 09:00:00", "2025-02-06 11:30:00", 10.0);
        let facts = SessionProcessor::new(&log).process_session(&s);

        let alice = &facts["alice"];
        assert_eq!(alice.intervals.len(), 1);
        assert_eq!(alice.minutes, 20.0);
        assert_eq!(alice.status, AttendanceStatus::Present);
    }

    #[test]
    fn test_short_attendance_is_absent_fact_not_omission() {
        let log = log(&["Bob,b@x.org,2025-02-06 09:00:00,2025-02-06 09:05:00"]);
        let s = session(1, "2025-02-06 09:00:00", "2025-02-06 11:30:00", 10.0);
        let facts = SessionProcessor::new(&log).process_session(&s);

        let bob = facts.get("bob").expect("fact exists for partial attendance");
        assert_eq!(bob.minutes, 5.0);
        assert_eq!(bob.status, AttendanceStatus::Absent);
    }

    #[test]
    fn test_no_overlap_produces_no_fact() {
        let log = log(&["Carol,c@x.org,2025-02-06 13:00:00,2025-02-06 14:00:00"]);
        let s = session(1, "2025-02-06 09:00:00", "2025-02-06 11:30:00", 10.0);
        assert!(SessionProcessor::new(&log).process_session(&s).is_empty());
    }

    #[test]
    fn test_boundary_touch_produces_no_fact() {
        let log = log(&["Dan,d@x.org,2025-02-06 08:00:00,2025-02-06 09:00:00"]);
        let s = session(1, "2025-02-06 09:00:00", "2025-02-06 10:00:00", 0.0);
        assert!(SessionProcessor::new(&log).process_session(&s).is_empty());
    }

    #[test]
    fn test_fact_bounds_are_clipped() {
        let log = log(&[
            "Eve,e@x.org,2025-02-06 08:30:00,2025-02-06 09:15:00",
            "Eve,e@x.org,2025-02-06 09:45:00,2025-02-06 12:00:00",
        ]);
        let s = session(1, "2025-02-06 09:00:00", "2025-02-06 10:00:00", 30.0);
        let eve = &SessionProcessor::new(&log).process_session(&s)["eve"];

        assert_eq!(eve.first_join, parse_session_boundary("2025-02-06 09:00:00").unwrap());
        assert_eq!(eve.last_leave, parse_session_boundary("2025-02-06 10:00:00").unwrap());
        assert_eq!(eve.minutes, 30.0);
        assert_eq!(eve.status, AttendanceStatus::Present);
        assert_eq!(eve.minutes, total_minutes(&eve.intervals));
    }

    #[test]
    fn test_fractional_minutes() {
        let log = log(&["Fay,f@x.org,2025-02-06 09:00:00,2025-02-06 09:12:30"]);
        let s = session(1, "2025-02-06 09:00:00", "2025-02-06 10:00:00", 12.5);
        let fay = &SessionProcessor::new(&log).process_session(&s)["fay"];
        assert_eq!(fay.minutes, 12.5);
        assert_eq!(fay.status, AttendanceStatus::Present);
    }

    #[test]
    fn test_global_spans_ignore_sessions() {
        let log = log(&[
            "Gus,g@x.org,2025-02-06 07:00:00,2025-02-06 07:30:00",
            "Gus,g@x.org,2025-02-06 09:00:00,2025-02-06 09:30:00",
        ]);
        let spans = SessionProcessor::new(&log).global_spans();
        let gus = spans["gus"];
        assert_eq!(gus.start, parse_session_boundary("2025-02-06 07:00:00").unwrap());
        assert_eq!(gus.end, parse_session_boundary("2025-02-06 09:30:00").unwrap());
    }
}
