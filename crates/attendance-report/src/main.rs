mod bootstrap;
mod output;

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use attendance_core::formatting::format_time;
use attendance_core::models::Session;
use attendance_core::settings::Settings;
use attendance_data::analysis::{analyze_file, analyze_files};
use attendance_data::reader::resolve_inputs;
use attendance_data::report::summary_lines;
use output::ReportFormat;

fn main() -> Result<()> {
    let settings = Settings::load_with_last_used();

    bootstrap::ensure_directories()?;
    bootstrap::setup_logging(&settings.log_level)?;

    tracing::info!("attendance-report v{} starting", env!("CARGO_PKG_VERSION"));

    let sessions = settings.resolve_sessions()?;
    for session in &sessions {
        tracing::info!(
            "{} → {} ({}), {} min required",
            session.label(),
            session.end,
            format_time(session.window().minutes()),
            session.required_minutes
        );
    }

    let files = resolve_inputs(&settings.inputs);
    if files.is_empty() {
        bail!("no input files; pass one or more CSV files or directories");
    }

    std::fs::create_dir_all(&settings.output_dir)?;
    let format = ReportFormat::from_name(&settings.format);

    match files.as_slice() {
        [single] => run_single(single, &sessions, &settings.output_dir, format),
        _ => run_multi(&files, &sessions, &settings.output_dir, format),
    }
}

/// One log: any failure aborts the run. The raw table is written alongside.
fn run_single(path: &Path, sessions: &[Session], out_dir: &Path, format: ReportFormat) -> Result<()> {
    let analysis = match analyze_file(path, sessions) {
        Ok(a) => a,
        Err(e) => {
            tracing::error!("{}: {}", path.display(), e);
            return Err(e.into());
        }
    };

    let report_path = output::write_report(out_dir, &analysis.report, format)?;
    let raw_path = output::write_raw(out_dir, &analysis.report.source, &analysis.raw)?;

    for line in summary_lines(&analysis.report) {
        println!("{}", line);
    }
    println!("Report: {}", report_path.display());
    println!("Raw log: {}", raw_path.display());
    Ok(())
}

/// Many logs: each is an independent scope. Failed scopes are listed and
/// skipped; the run only fails when no scope succeeded.
fn run_multi(paths: &[PathBuf], sessions: &[Session], out_dir: &Path, format: ReportFormat) -> Result<()> {
    let outcomes = analyze_files(paths, sessions);

    let mut written = 0usize;
    let mut failures = Vec::new();
    for outcome in &outcomes {
        match &outcome.result {
            Ok(report) => {
                let report_path = output::write_report(out_dir, report, format)?;
                for line in summary_lines(report) {
                    println!("{}", line);
                }
                println!("Report: {}", report_path.display());
                written += 1;
            }
            Err(e) => failures.push(format!("{}: {}", outcome.path.display(), e)),
        }
    }

    if !failures.is_empty() {
        println!("Skipped {} file(s):", failures.len());
        for failure in &failures {
            println!("  {}", failure);
        }
    }

    if written == 0 {
        bail!("none of the {} input files could be processed", outcomes.len());
    }
    Ok(())
}
