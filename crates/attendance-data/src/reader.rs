//! Meeting-log discovery and loading.
//!
//! Reads the CSV exports produced by meeting software and converts them into
//! per-participant [`Event`] groups for downstream processing. Exports carry
//! three lines of preamble before the header row, and the name and email
//! columns come under more than one header spelling.

use std::collections::{BTreeMap, HashMap};
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

use attendance_core::error::{AttendanceError, Result};
use attendance_core::intervals::envelope;
use attendance_core::models::{participant_key, Event, Interval};
use attendance_core::time_utils::parse_timestamp;
use regex::Regex;
use tracing::{debug, warn};

/// Non-data lines at the top of every export.
pub const PREAMBLE_ROWS: usize = 3;

/// Accepted header spellings per logical column, in order of preference.
pub const NAME_ALIASES: &[&str] = &["Name (Original Name)", "Name"];
pub const EMAIL_ALIASES: &[&str] = &["User Email", "Email"];
pub const JOIN_ALIASES: &[&str] = &["Join Time"];
pub const LEAVE_ALIASES: &[&str] = &["Leave Time"];

/// File-stem suffixes of the files this tool writes. Directory scans skip
/// them so a re-run does not read its own reports back as logs.
pub const PROCESSED_SUFFIX: &str = "processed";
pub const RAW_SUFFIX: &str = "raw";

// ── Types ─────────────────────────────────────────────────────────────────────

/// Column positions of the fields the engine needs, resolved once per table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSchema {
    pub name: usize,
    pub email: usize,
    pub join: usize,
    pub leave: usize,
}

impl ColumnSchema {
    /// Locate every required column in `headers`.
    ///
    /// Headers are compared after [`normalize_header`] and case-folding.
    /// Fails with [`AttendanceError::Schema`] naming the first column that
    /// has no matching alias.
    pub fn resolve(headers: &[String], source: &str) -> Result<Self> {
        let normalized: Vec<String> = headers
            .iter()
            .map(|h| normalize_header(h).to_lowercase())
            .collect();

        let find = |column: &'static str, aliases: &[&str]| -> Result<usize> {
            aliases
                .iter()
                .find_map(|alias| {
                    let wanted = alias.to_lowercase();
                    normalized.iter().position(|h| *h == wanted)
                })
                .ok_or_else(|| AttendanceError::Schema {
                    file: source.to_string(),
                    column,
                    accepted: aliases.join(", "),
                })
        };

        Ok(Self {
            name: find("name", NAME_ALIASES)?,
            email: find("email", EMAIL_ALIASES)?,
            join: find("join time", JOIN_ALIASES)?,
            leave: find("leave time", LEAVE_ALIASES)?,
        })
    }
}

/// The table exactly as it was read, for passthrough into reports.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Every event of one participant within one log.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantEvents {
    pub key: String,
    /// First-seen display name.
    pub name: String,
    /// First-seen email.
    pub email: String,
    pub events: Vec<Event>,
}

impl ParticipantEvents {
    /// Raw, unmerged `[join, leave]` spans.
    pub fn intervals(&self) -> Vec<Interval> {
        self.events.iter().map(Event::interval).collect()
    }

    /// Earliest join to latest leave over all events, ignoring any session.
    pub fn global_span(&self) -> Option<Interval> {
        envelope(&self.intervals())
    }
}

/// A parsed meeting log: one processing scope.
#[derive(Debug, Clone)]
pub struct AttendanceLog {
    /// File name (or caller-chosen label) used in errors and reports.
    pub source: String,
    pub schema: ColumnSchema,
    pub raw: RawTable,
    /// Participants keyed by case-insensitive identity, in key order.
    pub participants: BTreeMap<String, ParticipantEvents>,
}

impl AttendanceLog {
    /// Total number of events across all participants.
    pub fn event_count(&self) -> usize {
        self.participants.values().map(|p| p.events.len()).sum()
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Find all `.csv` files recursively under `dir`, sorted by path.
///
/// Reports written by a previous run (`*_processed.csv`, `*_raw.csv`) are
/// skipped.
pub fn find_csv_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.exists() {
        warn!("Input path does not exist: {}", dir.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .map(|ext| ext.eq_ignore_ascii_case("csv"))
                    .unwrap_or(false)
                && !is_generated_report(entry.path())
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Expand `inputs` into a list of log files.
///
/// Files are kept in the order given; directories are replaced by the CSV
/// files found beneath them.
pub fn resolve_inputs(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let found = find_csv_files(input);
            debug!("{}: found {} CSV files", input.display(), found.len());
            files.extend(found);
        } else {
            files.push(input.clone());
        }
    }
    files
}

/// One label per path, unique within `paths`.
///
/// A label is the file name. Where file names clash, parent directories are
/// prepended (`week1_monday.csv`) until the labels differ; exact duplicates
/// get a counter (`monday_2.csv`).
pub fn scope_labels(paths: &[PathBuf]) -> Vec<String> {
    let parts: Vec<Vec<String>> = paths
        .iter()
        .map(|p| {
            p.components()
                .rev()
                .filter_map(|c| match c {
                    Component::Normal(s) => Some(s.to_string_lossy().to_string()),
                    _ => None,
                })
                .collect()
        })
        .collect();
    let label = |i: usize, depth: usize| -> String {
        let mut taken: Vec<&str> = parts[i].iter().take(depth).map(String::as_str).collect();
        taken.reverse();
        taken.join("_")
    };

    let mut depth = vec![1usize; paths.len()];
    let labels = loop {
        let labels: Vec<String> = (0..paths.len()).map(|i| label(i, depth[i])).collect();
        let deepened = {
            let mut counts: HashMap<&str, usize> = HashMap::new();
            for l in &labels {
                *counts.entry(l.as_str()).or_default() += 1;
            }

            let mut deepened = false;
            for (i, l) in labels.iter().enumerate() {
                if counts[l.as_str()] > 1 && depth[i] < parts[i].len() {
                    depth[i] += 1;
                    deepened = true;
                }
            }
            deepened
        };
        if !deepened {
            break labels;
        }
    };

    let mut seen: HashMap<String, usize> = HashMap::new();
    labels
        .into_iter()
        .map(|l| {
            let n = seen.entry(l.clone()).or_default();
            *n += 1;
            if *n == 1 {
                return l;
            }
            let path = Path::new(&l);
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| l.clone());
            match path.extension() {
                Some(ext) => format!("{}_{}.{}", stem, n, ext.to_string_lossy()),
                None => format!("{}_{}", stem, n),
            }
        })
        .collect()
}

/// Read and parse the log at `path`, labelled with its file name.
pub fn load_attendance_log(path: &Path) -> Result<AttendanceLog> {
    let source = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());
    load_attendance_log_as(path, &source)
}

/// Read and parse the log at `path` under the scope label `source`.
pub fn load_attendance_log_as(path: &Path, source: &str) -> Result<AttendanceLog> {
    let bytes = std::fs::read(path).map_err(|source| AttendanceError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8_lossy(&bytes);
    parse_attendance_log(&text, source)
}

/// Parse the contents of a log. `source` labels errors.
pub fn parse_attendance_log(text: &str, source: &str) -> Result<AttendanceLog> {
    let body = strip_preamble(text, PREAMBLE_ROWS);

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(body.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let schema = ColumnSchema::resolve(&headers, source)?;

    let mut raw = RawTable {
        headers,
        rows: Vec::new(),
    };
    let mut participants: BTreeMap<String, ParticipantEvents> = BTreeMap::new();

    for record in reader.records() {
        let record = record?;
        let cells: Vec<String> = record.iter().map(str::to_string).collect();
        if cells.iter().all(|c| c.trim().is_empty()) {
            raw.rows.push(cells);
            continue;
        }

        let row = record
            .position()
            .map(|p| p.line() as usize + PREAMBLE_ROWS)
            .unwrap_or(0);
        let event = parse_event(&cells, &schema, source, row)?;

        participants
            .entry(event.key.clone())
            .or_insert_with(|| ParticipantEvents {
                key: event.key.clone(),
                name: event.name.clone(),
                email: event.email.clone(),
                events: Vec::new(),
            })
            .events
            .push(event);

        raw.rows.push(cells);
    }

    debug!(
        "{}: {} rows, {} events, {} participants",
        source,
        raw.rows.len(),
        participants.values().map(|p| p.events.len()).sum::<usize>(),
        participants.len()
    );

    Ok(AttendanceLog {
        source: source.to_string(),
        schema,
        raw,
        participants,
    })
}

/// Trim and collapse internal whitespace runs in a header cell.
pub fn normalize_header(header: &str) -> String {
    static WS: OnceLock<Regex> = OnceLock::new();
    let re = WS.get_or_init(|| Regex::new(r"\s+").expect("regex is valid"));
    re.replace_all(header.trim().trim_start_matches('\u{feff}'), " ")
        .into_owned()
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn is_generated_report(path: &Path) -> bool {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_lowercase())
        .map(|stem| {
            stem.ends_with(&format!("_{}", PROCESSED_SUFFIX))
                || stem.ends_with(&format!("_{}", RAW_SUFFIX))
        })
        .unwrap_or(false)
}

/// Drop the first `lines` physical lines of `text`.
fn strip_preamble(text: &str, lines: usize) -> &str {
    let mut rest = text;
    for _ in 0..lines {
        match rest.find('\n') {
            Some(pos) => rest = &rest[pos + 1..],
            None => return "",
        }
    }
    rest
}

/// Build one [`Event`] from a data row, rejecting rows the engine must never see.
fn parse_event(cells: &[String], schema: &ColumnSchema, source: &str, row: usize) -> Result<Event> {
    let cell = |idx: usize| cells.get(idx).map(String::as_str).unwrap_or("");

    let name = cell(schema.name).trim().to_string();
    if name.is_empty() {
        return Err(AttendanceError::InvalidEvent {
            file: source.to_string(),
            row,
            reason: "participant name is empty".to_string(),
        });
    }

    let timestamp = |idx: usize, column: &'static str| {
        parse_timestamp(cell(idx)).ok_or_else(|| AttendanceError::TimestampParse {
            file: source.to_string(),
            row,
            column,
            value: cell(idx).to_string(),
        })
    };
    let join = timestamp(schema.join, "Join Time")?;
    let leave = timestamp(schema.leave, "Leave Time")?;

    if join > leave {
        return Err(AttendanceError::InvalidEvent {
            file: source.to_string(),
            row,
            reason: format!("join time {} is after leave time {}", join, leave),
        });
    }

    Ok(Event {
        key: participant_key(&name),
        name,
        email: cell(schema.email).trim().to_string(),
        join,
        leave,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
