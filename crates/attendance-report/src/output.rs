//! Writes report files for finished scopes.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::Context;
use attendance_data::analysis::ScopeReport;
use attendance_data::reader::{RawTable, PROCESSED_SUFFIX, RAW_SUFFIX};
use attendance_data::report::ReportTable;

/// Output file format for report tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Csv,
    Json,
}

impl ReportFormat {
    pub fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Csv
        }
    }

    fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

/// `{stem}_{suffix}.{ext}` inside `dir`, where `stem` comes from `source`.
pub fn output_path(dir: &Path, source: &str, suffix: &str, ext: &str) -> PathBuf {
    let stem = Path::new(source)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "attendance".to_string());
    dir.join(format!("{}_{}.{}", stem, suffix, ext))
}

/// Write the processed report for `report`; returns the file written.
pub fn write_report(dir: &Path, report: &ScopeReport, format: ReportFormat) -> anyhow::Result<PathBuf> {
    let path = output_path(dir, &report.source, PROCESSED_SUFFIX, format.extension());
    let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    let table = ReportTable::from_scope(report);
    match format {
        ReportFormat::Csv => table.write_csv(BufWriter::new(file))?,
        ReportFormat::Json => table.write_json(BufWriter::new(file))?,
    }
    tracing::debug!("wrote {}", path.display());
    Ok(path)
}

/// Write the untouched input table next to the report.
pub fn write_raw(dir: &Path, source: &str, raw: &RawTable) -> anyhow::Result<PathBuf> {
    let path = output_path(dir, source, RAW_SUFFIX, "csv");
    let file = File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    raw.write_csv(BufWriter::new(file))?;
    tracing::debug!("wrote {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use attendance_core::models::Session;
    use attendance_core::time_utils::parse_session_boundary;
    use attendance_data::analysis::{analyze_files, analyze_log};
    use attendance_data::reader::parse_attendance_log;
    use tempfile::TempDir;

    fn report() -> ScopeReport {
        let log = parse_attendance_log(
            "a\nb\nc\nName,Email,Join Time,Leave Time\nAlice,a@x.org,2025-02-06 09:00:00,2025-02-06 09:20:00\n",
            "standup.csv",
        )
        .unwrap();
        let session = Session::new(
            1,
            parse_session_boundary("2025-02-06 09:00:00").unwrap(),
            parse_session_boundary("2025-02-06 10:00:00").unwrap(),
            10.0,
        )
        .unwrap();
        analyze_log(&log, &[session])
    }

    #[test]
    fn test_output_path() {
        let p = output_path(Path::new("/out"), "standup.csv", "processed", "csv");
        assert_eq!(p, PathBuf::from("/out/standup_processed.csv"));
    }

    #[test]
    fn test_report_format_from_name() {
        assert_eq!(ReportFormat::from_name("JSON"), ReportFormat::Json);
        assert_eq!(ReportFormat::from_name("csv"), ReportFormat::Csv);
    }

    #[test]
    fn test_write_report_csv_and_json() {
        let tmp = TempDir::new().unwrap();
        let report = report();

        let csv_path = write_report(tmp.path(), &report, ReportFormat::Csv).unwrap();
        let text = std::fs::read_to_string(&csv_path).unwrap();
        assert!(text.contains("Alice,a@x.org,2025-02-06 09:00:00,2025-02-06 09:20:00,P,20.00"));

        let json_path = write_report(tmp.path(), &report, ReportFormat::Json).unwrap();
        assert_eq!(json_path, tmp.path().join("standup_processed.json"));
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(value[0]["Duration (min)"], "20.00");
    }

    #[test]
    fn test_same_named_logs_write_separate_reports() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("out");
        std::fs::create_dir_all(&out).unwrap();

        let mut paths = Vec::new();
        for (week, name) in [("week1", "Alice"), ("week2", "Bob")] {
            let sub = tmp.path().join(week);
            std::fs::create_dir_all(&sub).unwrap();
            let path = sub.join("monday.csv");
            std::fs::write(
                &path,
                format!(
                    "a\nb\nc\nName,Email,Join Time,Leave Time\n{name},x@x.org,2025-02-06 09:00:00,2025-02-06 09:20:00\n"
                ),
            )
            .unwrap();
            paths.push(path);
        }

        let session = Session::new(
            1,
            parse_session_boundary("2025-02-06 09:00:00").unwrap(),
            parse_session_boundary("2025-02-06 10:00:00").unwrap(),
            10.0,
        )
        .unwrap();
        let written: Vec<PathBuf> = analyze_files(&paths, &[session])
            .iter()
            .map(|o| write_report(&out, o.result.as_ref().unwrap(), ReportFormat::Csv).unwrap())
            .collect();

        assert_eq!(
            written,
            vec![
                out.join("week1_monday_processed.csv"),
                out.join("week2_monday_processed.csv"),
            ]
        );
        assert_eq!(std::fs::read_dir(&out).unwrap().count(), 2);
        assert!(std::fs::read_to_string(&written[0]).unwrap().contains("Alice,"));
        assert!(std::fs::read_to_string(&written[1]).unwrap().contains("Bob,"));
    }

    #[test]
    fn test_write_raw() {
        let tmp = TempDir::new().unwrap();
        let raw = RawTable {
            headers: vec!["Name".into()],
            rows: vec![vec!["Alice".into()]],
        };
        let path = write_raw(tmp.path(), "standup.csv", &raw).unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "Name\nAlice\n");
    }
}
