use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of an [`AttendanceError`].
///
/// Callers that only need to know *what kind* of data problem occurred
/// (for example, to summarise failed scopes) match on this instead of the
/// full error enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required column is absent from a source table.
    Schema,
    /// A timestamp cell or session boundary could not be parsed.
    Parse,
    /// A session does not start before it ends.
    Ordering,
    /// A data row is structurally valid but semantically impossible.
    InvalidEvent,
    /// Reading, decoding or configuration failures outside the engine.
    Io,
}

/// All errors produced by the attendance engine.
#[derive(Error, Debug)]
pub enum AttendanceError {
    /// A required column could not be located under any accepted alias.
    #[error("{file}: missing required column '{column}' (accepted: {accepted})")]
    Schema {
        file: String,
        column: &'static str,
        accepted: String,
    },

    /// A join/leave cell did not match any recognised timestamp format.
    #[error("{file}: row {row}: invalid timestamp {value:?} in column '{column}'")]
    TimestampParse {
        file: String,
        row: usize,
        column: &'static str,
        value: String,
    },

    /// A session boundary string is malformed.
    #[error("Invalid session boundary {0:?}: expected YYYY-MM-DD HH:MM:SS")]
    SessionBoundary(String),

    /// A session's start is not strictly before its end.
    #[error("Session {index}: start {start} must be before end {end}")]
    SessionOrdering {
        index: usize,
        start: String,
        end: String,
    },

    /// A data row that can never describe real attendance.
    #[error("{file}: row {row}: {reason}")]
    InvalidEvent {
        file: String,
        row: usize,
        reason: String,
    },

    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A CSV document could not be decoded.
    #[error("Failed to parse CSV: {0}")]
    CsvParse(#[from] csv::Error),

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AttendanceError {
    /// The coarse [`ErrorKind`] of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Schema { .. } => ErrorKind::Schema,
            Self::TimestampParse { .. } | Self::SessionBoundary(_) => ErrorKind::Parse,
            Self::SessionOrdering { .. } => ErrorKind::Ordering,
            Self::InvalidEvent { .. } => ErrorKind::InvalidEvent,
            Self::FileRead { .. }
            | Self::CsvParse(_)
            | Self::JsonParse(_)
            | Self::Config(_)
            | Self::Io(_)
            | Self::Other(_) => ErrorKind::Io,
        }
    }
}

/// Convenience alias used throughout the attendance crates.
pub type Result<T> = std::result::Result<T, AttendanceError>;
