//! Multi-session attendance aggregation within one scope.
//!
//! Sessions are folded one at a time, in index order, into a map of
//! [`ParticipantRecord`]s. Each fold consumes the previous snapshot and
//! returns the next one. [`ScopeAggregator::finalize`] then backfills an
//! explicit [`SessionMark::NoOverlap`] for every session a participant never
//! overlapped.

use std::collections::{BTreeMap, BTreeSet};

use attendance_core::models::{
    AttendanceStatus, Interval, ParticipantRecord, SessionFact, SessionMark,
};
use tracing::debug;

use crate::reader::ParticipantEvents;

// ── ParticipantContext ────────────────────────────────────────────────────────

/// Identity and unclipped span of a participant, looked up while folding.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantContext {
    pub name: String,
    pub email: String,
    pub span: Interval,
}

impl ParticipantContext {
    /// Build the lookup table from a log's participants and their global spans.
    pub fn table<'p, I>(
        participants: I,
        spans: &BTreeMap<String, Interval>,
    ) -> BTreeMap<String, ParticipantContext>
    where
        I: IntoIterator<Item = &'p ParticipantEvents>,
    {
        participants
            .into_iter()
            .filter_map(|p| {
                spans.get(&p.key).map(|span| {
                    (
                        p.key.clone(),
                        ParticipantContext {
                            name: p.name.clone(),
                            email: p.email.clone(),
                            span: *span,
                        },
                    )
                })
            })
            .collect()
    }
}

// ── ScopeAggregator ───────────────────────────────────────────────────────────

/// Running per-participant state for one scope.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScopeAggregator {
    records: BTreeMap<String, ParticipantRecord>,
    folded: BTreeSet<usize>,
}

impl ScopeAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one session's facts into the running records.
    ///
    /// A participant's first fact creates their record, seeded from their
    /// unclipped span. Later facts widen the span, add minutes and mark the
    /// session. Minutes are summed even if session windows overlap.
    pub fn fold_session(
        mut self,
        session_index: usize,
        facts: &BTreeMap<String, SessionFact>,
        context: &BTreeMap<String, ParticipantContext>,
    ) -> Self {
        for (key, fact) in facts {
            let mark = SessionMark::Measured {
                status: fact.status,
                minutes: fact.minutes,
            };
            // Facts without context fall back to their own clipped bounds.
            let span = context
                .get(key)
                .map(|c| c.span)
                .unwrap_or_else(|| Interval::new(fact.first_join, fact.last_leave));

            match self.records.get_mut(key) {
                Some(record) => {
                    record.global_join = record.global_join.min(span.start);
                    record.global_leave = record.global_leave.max(span.end);
                    record.total_minutes += fact.minutes;
                    record.sessions.insert(session_index, mark);
                }
                None => {
                    let (name, email) = context
                        .get(key)
                        .map(|c| (c.name.clone(), c.email.clone()))
                        .unwrap_or_else(|| (key.clone(), String::new()));
                    self.records.insert(
                        key.clone(),
                        ParticipantRecord {
                            key: key.clone(),
                            name,
                            email,
                            global_join: span.start,
                            global_leave: span.end,
                            total_minutes: fact.minutes,
                            sessions: BTreeMap::from([(session_index, mark)]),
                        },
                    );
                }
            }
        }

        self.folded.insert(session_index);
        debug!(
            "session {} folded: {} facts, {} participants so far",
            session_index,
            facts.len(),
            self.records.len()
        );
        self
    }

    /// Current snapshot of the records, before backfill.
    pub fn records(&self) -> &BTreeMap<String, ParticipantRecord> {
        &self.records
    }

    /// Backfill [`SessionMark::NoOverlap`] for every folded session a record
    /// lacks, and return the records in key order.
    ///
    /// Must run after the last fold: a participant first seen in a late
    /// session still needs marks for the earlier ones.
    pub fn finalize(self) -> Vec<ParticipantRecord> {
        let folded = self.folded;
        self.records
            .into_values()
            .map(|mut record| {
                for index in &folded {
                    record
                        .sessions
                        .entry(*index)
                        .or_insert(SessionMark::NoOverlap);
                }
                record
            })
            .collect()
    }
}

// ── SessionTally ──────────────────────────────────────────────────────────────

/// Present/absent counts for one session of a finalized scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTally {
    pub session_index: usize,
    pub present: usize,
    pub absent: usize,
}

/// Count present and absent participants per session index.
pub fn tally_sessions(records: &[ParticipantRecord], session_indices: &[usize]) -> Vec<SessionTally> {
    session_indices
        .iter()
        .map(|&index| {
            let present = records
                .iter()
                .filter(|r| r.status(index) == AttendanceStatus::Present)
                .count();
            SessionTally {
                session_index: index,
                present,
                absent: records.len() - present,
            }
        })
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
