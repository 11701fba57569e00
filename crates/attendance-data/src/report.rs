//! Report tables handed to the output layer.
//!
//! A [`ReportTable`] is plain rows of strings: one per participant, with the
//! global span, one `P`/`A` cell per session and the rounded total.

use std::io::Write;

use attendance_core::error::Result;
use attendance_core::formatting::{format_minutes, percentage};
use attendance_core::time_utils::format_timestamp;
use serde::Serialize;

use crate::analysis::ScopeReport;
use crate::reader::RawTable;

/// Rendered header + rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ReportTable {
    /// Render `report` into the output column layout.
    pub fn from_scope(report: &ScopeReport) -> Self {
        let mut headers = vec![
            "Name".to_string(),
            "Email".to_string(),
            "Join Time".to_string(),
            "Leave Time".to_string(),
        ];
        headers.extend(report.sessions.iter().map(|s| s.label()));
        headers.push("Duration (min)".to_string());

        let rows = report
            .records
            .iter()
            .map(|record| {
                let mut row = vec![
                    record.name.clone(),
                    record.email.clone(),
                    format_timestamp(record.global_join),
                    format_timestamp(record.global_leave),
                ];
                row.extend(
                    report
                        .sessions
                        .iter()
                        .map(|s| record.status(s.index).code().to_string()),
                );
                row.push(format_minutes(record.total_minutes));
                row
            })
            .collect();

        Self { headers, rows }
    }

    /// Write the table as CSV.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        write_rows(writer, &self.headers, &self.rows)
    }

    /// Write the table as a JSON array of objects keyed by header.
    pub fn write_json<W: Write>(&self, writer: W) -> Result<()> {
        let objects: Vec<serde_json::Map<String, serde_json::Value>> = self
            .rows
            .iter()
            .map(|row| {
                self.headers
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned().map(serde_json::Value::String))
                    .collect()
            })
            .collect();
        serde_json::to_writer_pretty(writer, &objects)?;
        Ok(())
    }
}

impl RawTable {
    /// Write the passthrough table as CSV, unchanged.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        write_rows(writer, &self.headers, &self.rows)
    }
}

/// One human-readable line per session, e.g.
/// `"meeting.csv: Session 1: 12 Present, 3 Absent (80.0%)"`.
pub fn summary_lines(report: &ScopeReport) -> Vec<String> {
    report
        .tallies
        .iter()
        .map(|t| {
            format!(
                "{}: Session {}: {} Present, {} Absent ({:.1}%)",
                report.source,
                t.session_index,
                t.present,
                t.absent,
                percentage(t.present, t.present + t.absent)
            )
        })
        .collect()
}

fn write_rows<W: Write>(writer: W, headers: &[String], rows: &[Vec<String>]) -> Result<()> {
    let mut out = csv::WriterBuilder::new().flexible(true).from_writer(writer);
    out.write_record(headers)?;
    for row in rows {
        out.write_record(row)?;
    }
    out.flush()?;
    Ok(())
}
