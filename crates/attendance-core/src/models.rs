use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{AttendanceError, Result};
use crate::time_utils::{format_timestamp, parse_session_boundary};

/// A single join/leave record read from a meeting log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Case-normalised identity key (lower-cased, trimmed display name).
    pub key: String,
    /// Display name exactly as it appeared in the log.
    pub name: String,
    /// Email address, empty when the log left it blank.
    #[serde(default)]
    pub email: String,
    /// When the participant joined.
    pub join: NaiveDateTime,
    /// When the participant left.
    pub leave: NaiveDateTime,
}

impl Event {
    /// The raw `[join, leave]` span of this record.
    pub fn interval(&self) -> Interval {
        Interval::new(self.join, self.leave)
    }
}

/// Build the identity key for a display name.
pub fn participant_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// A closed `[start, end]` time span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Interval {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Interval {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// Length in fractional minutes.
    pub fn minutes(&self) -> f64 {
        crate::time_utils::delta_minutes(self.end - self.start)
    }
}

/// A named meeting window with a minimum attendance threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// 1-based position in definition order.
    pub index: usize,
    /// Inclusive start of the window.
    pub start: NaiveDateTime,
    /// Exclusive end of the window.
    pub end: NaiveDateTime,
    /// Minutes a participant must attend inside the window to count as present.
    pub required_minutes: f64,
}

impl Session {
    /// Validate and build a session. Fails when `start >= end` or the
    /// threshold is negative or not finite.
    pub fn new(
        index: usize,
        start: NaiveDateTime,
        end: NaiveDateTime,
        required_minutes: f64,
    ) -> Result<Self> {
        if start >= end {
            return Err(AttendanceError::SessionOrdering {
                index,
                start: format_timestamp(start),
                end: format_timestamp(end),
            });
        }
        if !required_minutes.is_finite() || required_minutes < 0.0 {
            return Err(AttendanceError::Config(format!(
                "Session {index}: required minutes must be a non-negative number, got {required_minutes}"
            )));
        }
        Ok(Self {
            index,
            start,
            end,
            required_minutes,
        })
    }

    /// The session window as an [`Interval`].
    pub fn window(&self) -> Interval {
        Interval::new(self.start, self.end)
    }

    /// Column label used in reports, e.g. `"Session 1 (2025-02-06 09:30:00)"`.
    pub fn label(&self) -> String {
        format!("Session {} ({})", self.index, format_timestamp(self.start))
    }
}

/// Unvalidated session boundaries as supplied by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDefinition {
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub required_minutes: Option<f64>,
}

impl SessionDefinition {
    /// Parse a `"START,END[,MINUTES]"` command-line value.
    pub fn parse_arg(value: &str) -> Result<Self> {
        let parts: Vec<&str> = value.split(',').map(str::trim).collect();
        let (start, end, minutes) = match parts.as_slice() {
            [start, end] => (*start, *end, None),
            [start, end, minutes] => {
                let parsed = minutes.parse::<f64>().map_err(|_| {
                    AttendanceError::Config(format!(
                        "invalid required minutes {minutes:?} in session {value:?}"
                    ))
                })?;
                (*start, *end, Some(parsed))
            }
            _ => {
                return Err(AttendanceError::Config(format!(
                    "session {value:?} must look like \"START,END[,MINUTES]\""
                )))
            }
        };
        Ok(Self {
            start: start.to_string(),
            end: end.to_string(),
            required_minutes: minutes,
        })
    }

    /// Render back into the `"START,END,MINUTES"` form accepted by [`parse_arg`].
    ///
    /// [`parse_arg`]: SessionDefinition::parse_arg
    pub fn to_arg(&self) -> String {
        match self.required_minutes {
            Some(m) => format!("{},{},{}", self.start, self.end, m),
            None => format!("{},{}", self.start, self.end),
        }
    }
}

/// Validate `definitions` into 1-based [`Session`]s.
///
/// Sessions without an explicit threshold use `default_minutes`.
pub fn build_sessions(
    definitions: &[SessionDefinition],
    default_minutes: f64,
) -> Result<Vec<Session>> {
    definitions
        .iter()
        .enumerate()
        .map(|(i, def)| {
            let start = parse_session_boundary(&def.start)?;
            let end = parse_session_boundary(&def.end)?;
            Session::new(
                i + 1,
                start,
                end,
                def.required_minutes.unwrap_or(default_minutes),
            )
        })
        .collect()
}

/// Presence verdict for one participant in one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttendanceStatus {
    Present,
    Absent,
}

impl AttendanceStatus {
    /// `Present` iff `minutes >= required` (inclusive boundary).
    pub fn from_minutes(minutes: f64, required: f64) -> Self {
        if minutes >= required {
            Self::Present
        } else {
            Self::Absent
        }
    }

    /// Single-letter code used in report cells.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Present => "P",
            Self::Absent => "A",
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Present => write!(f, "Present"),
            Self::Absent => write!(f, "Absent"),
        }
    }
}

/// Attendance of one participant within one session window.
///
/// Only produced when the participant's merged presence overlaps the window
/// for a positive length of time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionFact {
    /// Merged presence clipped to the session window.
    pub intervals: Vec<Interval>,
    /// Sum of the clipped interval lengths.
    pub minutes: f64,
    pub status: AttendanceStatus,
    /// Earliest clipped join.
    pub first_join: NaiveDateTime,
    /// Latest clipped leave.
    pub last_leave: NaiveDateTime,
}

/// One entry of a participant's per-session status map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionMark {
    /// A [`SessionFact`] existed for this session.
    Measured {
        status: AttendanceStatus,
        minutes: f64,
    },
    /// The participant never overlapped the session window; filled in after
    /// every session was folded.
    NoOverlap,
}

impl SessionMark {
    /// The status reported for this session. `NoOverlap` counts as absent.
    pub fn status(&self) -> AttendanceStatus {
        match self {
            Self::Measured { status, .. } => *status,
            Self::NoOverlap => AttendanceStatus::Absent,
        }
    }
}

/// Aggregated attendance for one participant across every session of a scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipantRecord {
    pub key: String,
    pub name: String,
    pub email: String,
    /// Earliest raw join across the scope (not clipped to any session).
    pub global_join: NaiveDateTime,
    /// Latest raw leave across the scope (not clipped to any session).
    pub global_leave: NaiveDateTime,
    /// Sum of attended minutes over all sessions, overlapping windows included.
    pub total_minutes: f64,
    /// Session index → mark.
    pub sessions: BTreeMap<usize, SessionMark>,
}

impl ParticipantRecord {
    /// Status for session `index`, `Absent` when unknown.
    pub fn status(&self, index: usize) -> AttendanceStatus {
        self.sessions
            .get(&index)
            .map(SessionMark::status)
            .unwrap_or(AttendanceStatus::Absent)
    }
}
