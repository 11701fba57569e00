//! End-to-end attendance scenarios over real files on disk.

use std::path::{Path, PathBuf};

use attendance_core::error::ErrorKind;
use attendance_core::models::{build_sessions, AttendanceStatus, SessionDefinition, SessionMark};
use attendance_data::analysis::{analyze_file, analyze_files};
use attendance_data::report::ReportTable;
use tempfile::TempDir;

const PREAMBLE: &str = "Meeting ID,Topic,Start Time,End Time,User Email,Duration (Minutes),Participants\n\
                        812 3456 7890,Cohort review,02/06/2025 08:55:00 AM,02/06/2025 11:35:00 AM,host@example.com,160,4\n\
                        \n";

fn write_log(dir: &Path, name: &str, header: &str, rows: &[&str]) -> PathBuf {
    let mut text = String::from(PREAMBLE);
    text.push_str(header);
    text.push('\n');
    for row in rows {
        text.push_str(row);
        text.push('\n');
    }
    let path = dir.join(name);
    std::fs::write(&path, text).unwrap();
    path
}

fn sessions(specs: &[&str]) -> Vec<attendance_core::models::Session> {
    let defs: Vec<SessionDefinition> = specs
        .iter()
        .map(|s| SessionDefinition::parse_arg(s).unwrap())
        .collect();
    build_sessions(&defs, 10.0).unwrap()
}

const ZOOM_HEADER: &str = "Name (Original Name),User Email,Join Time,Leave Time,Duration (Minutes),Guest";

#[test]
fn alice_reconnect_is_present() {
    let dir = TempDir::new().unwrap();
    let path = write_log(
        dir.path(),
        "cohort.csv",
        ZOOM_HEADER,
        &[
            "Alice,alice@example.com,2025-02-06 09:00:00,2025-02-06 09:05:00,5,No",
            "Alice,alice@example.com,2025-02-06 09:05:00,2025-02-06 09:20:00,15,No",
        ],
    );
    let analysis = analyze_file(&path, &sessions(&["2025-02-06 09:00:00,2025-02-06 11:30:00,10"])).unwrap();

    let alice = &analysis.report.records[0];
    assert_eq!(alice.name, "Alice");
    assert_eq!(alice.total_minutes, 20.0);
    assert_eq!(alice.status(1), AttendanceStatus::Present);
    assert_eq!(analysis.raw.rows.len(), 2);
}

#[test]
fn bob_short_stay_is_measured_absent() {
    let dir = TempDir::new().unwrap();
    let path = write_log(
        dir.path(),
        "cohort.csv",
        ZOOM_HEADER,
        &["Bob,bob@example.com,2025-02-06 09:00:00,2025-02-06 09:05:00,5,No"],
    );
    let analysis = analyze_file(&path, &sessions(&["2025-02-06 09:00:00,2025-02-06 11:30:00,10"])).unwrap();

    let bob = &analysis.report.records[0];
    assert_eq!(bob.total_minutes, 5.0);
    assert_eq!(
        bob.sessions[&1],
        SessionMark::Measured {
            status: AttendanceStatus::Absent,
            minutes: 5.0
        }
    );
}

#[test]
fn carol_backfilled_without_touching_her_span() {
    let dir = TempDir::new().unwrap();
    let path = write_log(
        dir.path(),
        "cohort.csv",
        "Name,Email,Join Time,Leave Time",
        &[
            "Alice,alice@example.com,2025-02-06 09:00:00,2025-02-06 09:20:00",
            "Carol,carol@example.com,2025-02-06 10:35:00,2025-02-06 11:25:00",
        ],
    );
    let analysis = analyze_file(
        &path,
        &sessions(&[
            "2025-02-06 09:00:00,2025-02-06 10:00:00,10",
            "2025-02-06 10:30:00,2025-02-06 11:30:00,10",
        ]),
    )
    .unwrap();

    let records = &analysis.report.records;
    assert_eq!(records.len(), 2);
    for record in records {
        assert_eq!(record.sessions.len(), 2, "{} must have a mark per session", record.name);
    }

    let carol = &records[1];
    assert_eq!(carol.sessions[&1], SessionMark::NoOverlap);
    assert_eq!(carol.status(1), AttendanceStatus::Absent);
    assert_eq!(carol.status(2), AttendanceStatus::Present);
    assert_eq!(carol.global_join.to_string(), "2025-02-06 10:35:00");
    assert_eq!(carol.global_leave.to_string(), "2025-02-06 11:25:00");

    let table = ReportTable::from_scope(&analysis.report);
    assert_eq!(table.rows[1][4], "A");
    assert_eq!(table.rows[1][5], "P");
    assert_eq!(table.rows[1][6], "50.00");
}

#[test]
fn us_formatted_timestamps_and_mixed_case_names() {
    let dir = TempDir::new().unwrap();
    let path = write_log(
        dir.path(),
        "us.csv",
        ZOOM_HEADER,
        &[
            "Dana Lee,dana@example.com,02/06/2025 09:00:00 AM,02/06/2025 09:30:00 AM,30,No",
            "dana lee,,02/06/2025 09:25:00 AM,02/06/2025 10:10:00 AM,45,No",
        ],
    );
    let analysis = analyze_file(&path, &sessions(&["2025-02-06 09:00:00,2025-02-06 10:00:00,60"])).unwrap();

    let dana = &analysis.report.records[0];
    assert_eq!(dana.name, "Dana Lee");
    assert_eq!(dana.email, "dana@example.com");
    assert_eq!(dana.total_minutes, 60.0);
    assert_eq!(dana.status(1), AttendanceStatus::Present);
    assert_eq!(dana.global_leave.to_string(), "2025-02-06 10:10:00");
}

#[test]
fn single_file_mode_surfaces_errors() {
    let dir = TempDir::new().unwrap();
    let path = write_log(
        dir.path(),
        "broken.csv",
        ZOOM_HEADER,
        &["Eve,eve@example.com,whenever,2025-02-06 09:30:00,30,No"],
    );
    let err = analyze_file(&path, &sessions(&["2025-02-06 09:00:00,2025-02-06 10:00:00"])).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
    assert!(err.to_string().contains("broken.csv"));
}

#[test]
fn multi_file_scopes_do_not_share_participants() {
    let dir = TempDir::new().unwrap();
    let monday = write_log(
        dir.path(),
        "monday.csv",
        ZOOM_HEADER,
        &["Alice,alice@example.com,2025-02-06 09:00:00,2025-02-06 09:40:00,40,No"],
    );
    let broken = write_log(dir.path(), "broken.csv", "Name,Join Time,Leave Time", &[]);
    let tuesday = write_log(
        dir.path(),
        "tuesday.csv",
        ZOOM_HEADER,
        &["Alice,alice@example.com,2025-02-06 09:00:00,2025-02-06 09:05:00,5,No"],
    );

    let outcomes = analyze_files(
        &[monday, broken, tuesday],
        &sessions(&["2025-02-06 09:00:00,2025-02-06 10:00:00,10"]),
    );

    let monday = outcomes[0].result.as_ref().unwrap();
    assert_eq!(monday.records[0].total_minutes, 40.0);
    assert_eq!(monday.records[0].status(1), AttendanceStatus::Present);

    let err = outcomes[1].result.as_ref().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Schema);

    let tuesday = outcomes[2].result.as_ref().unwrap();
    assert_eq!(tuesday.records[0].total_minutes, 5.0);
    assert_eq!(tuesday.records[0].status(1), AttendanceStatus::Absent);
}
