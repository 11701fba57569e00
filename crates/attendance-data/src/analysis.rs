//! Main analysis pipeline.
//!
//! Orchestrates loading, session processing and aggregation for one scope
//! (a single log) or many independent scopes (one per file).

use std::path::{Path, PathBuf};
use std::time::Instant;

use attendance_core::error::Result;
use attendance_core::models::{ParticipantRecord, Session};
use tracing::{debug, info, warn};

use crate::aggregator::{tally_sessions, ParticipantContext, ScopeAggregator, SessionTally};
use crate::analyzer::SessionProcessor;
use crate::reader::{load_attendance_log, load_attendance_log_as, scope_labels, AttendanceLog, RawTable};

// ── Public types ──────────────────────────────────────────────────────────────

/// The finalized attendance of one scope.
#[derive(Debug, Clone)]
pub struct ScopeReport {
    /// Label of the log this scope came from, unique within a run.
    pub source: String,
    /// Sessions in index order.
    pub sessions: Vec<Session>,
    /// One record per participant with at least one session fact, key order.
    pub records: Vec<ParticipantRecord>,
    /// Present/absent counts per session.
    pub tallies: Vec<SessionTally>,
    /// Raw events read from the log.
    pub events_processed: usize,
}

/// Single-file mode output: the report plus the untouched input table.
#[derive(Debug, Clone)]
pub struct SingleFileAnalysis {
    pub report: ScopeReport,
    pub raw: RawTable,
}

/// Result of one scope in multi-file mode.
#[derive(Debug)]
pub struct ScopeOutcome {
    pub path: PathBuf,
    pub result: Result<ScopeReport>,
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Run session processing and aggregation over an already-parsed log.
///
/// Sessions are folded in the order given, which must be index order.
pub fn analyze_log(log: &AttendanceLog, sessions: &[Session]) -> ScopeReport {
    let processor = SessionProcessor::new(log);
    let context = ParticipantContext::table(log.participants.values(), &processor.global_spans());

    let records = sessions
        .iter()
        .fold(ScopeAggregator::new(), |agg, session| {
            let facts = processor.process_session(session);
            agg.fold_session(session.index, &facts, &context)
        })
        .finalize();

    let indices: Vec<usize> = sessions.iter().map(|s| s.index).collect();
    let tallies = tally_sessions(&records, &indices);

    ScopeReport {
        source: log.source.clone(),
        sessions: sessions.to_vec(),
        records,
        tallies,
        events_processed: log.event_count(),
    }
}

/// Single-file mode: load `path` and analyse it. Any error aborts.
pub fn analyze_file(path: &Path, sessions: &[Session]) -> Result<SingleFileAnalysis> {
    let log = load_attendance_log(path)?;
    Ok(analyze_loaded(log, sessions))
}

/// Multi-file mode: every path is its own scope.
///
/// Scopes are labelled with [`scope_labels`], so logs sharing a file name
/// in different directories keep distinct reports. A failing scope is logged
/// and returned as an `Err` outcome; the remaining scopes are still processed.
pub fn analyze_files(paths: &[PathBuf], sessions: &[Session]) -> Vec<ScopeOutcome> {
    let outcomes: Vec<ScopeOutcome> = paths
        .iter()
        .zip(scope_labels(paths))
        .map(|(path, label)| {
            let result = load_attendance_log_as(path, &label)
                .map(|log| analyze_loaded(log, sessions).report);
            if let Err(e) = &result {
                warn!("skipping {}: {}", path.display(), e);
            }
            ScopeOutcome {
                path: path.clone(),
                result,
            }
        })
        .collect();

    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    info!(
        "processed {} files ({} succeeded, {} failed)",
        outcomes.len(),
        outcomes.len() - failed,
        failed
    );
    outcomes
}

fn analyze_loaded(log: AttendanceLog, sessions: &[Session]) -> SingleFileAnalysis {
    let start = Instant::now();
    let report = analyze_log(&log, sessions);

    debug!(
        "{}: {} events → {} participants in {:.3}s",
        report.source,
        report.events_processed,
        report.records.len(),
        start.elapsed().as_secs_f64()
    );

    SingleFileAnalysis {
        report,
        raw: log.raw,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
