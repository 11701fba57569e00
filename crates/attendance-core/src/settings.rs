use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AttendanceError, Result};
use crate::models::{build_sessions, Session, SessionDefinition};

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Build per-session attendance reports from meeting join/leave logs
#[derive(Parser, Debug, Clone)]
#[command(
    name = "attendance-report",
    about = "Build per-session attendance reports from meeting join/leave logs",
    version
)]
pub struct Settings {
    /// Meeting log CSV files, or directories to scan for them
    #[arg(value_name = "INPUTS")]
    pub inputs: Vec<PathBuf>,

    /// Session window as "START,END[,MINUTES]" (repeatable, in order)
    #[arg(long = "session", value_name = "START,END[,MINUTES]")]
    pub sessions: Vec<String>,

    /// JSON file with an array of {"start", "end", "required_minutes"} objects
    #[arg(long)]
    pub sessions_file: Option<PathBuf>,

    /// Minutes required for presence when a session does not specify its own
    #[arg(long, default_value = "10")]
    pub required_minutes: f64,

    /// Directory that receives the generated reports
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Report file format
    #[arg(long, default_value = "csv", value_parser = ["csv", "json"])]
    pub format: String,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.attendance-report/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sessions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_minutes: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl LastUsedParams {
    /// Return the default path to the persisted config file.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Return the config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(".attendance-report").join("last_used.json")
    }

    /// Load persisted params from an explicit path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to an explicit path.
    pub fn save_to(&self, path: &Path) -> std::result::Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        // Write to a temp file then rename for atomicity.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at an explicit path if it exists.
    pub fn clear_at(path: &Path) -> std::result::Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit CLI
    /// value was provided, and persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Full implementation – accepts args and an explicit config path so that
    /// tests can redirect to a temporary directory.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &Path,
    ) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            if let Err(e) = LastUsedParams::clear_at(config_path) {
                tracing::warn!("could not clear {}: {}", config_path.display(), e);
            }
            return Self::apply_debug(settings);
        }

        let last = LastUsedParams::load_from(config_path);

        // CLI always wins. Remembered sessions only apply when no session
        // source was given at all.
        if !is_arg_explicitly_set(&matches, "sessions") && settings.sessions_file.is_none() {
            if let Some(v) = last.sessions {
                settings.sessions = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "required_minutes") {
            if let Some(v) = last.required_minutes {
                settings.required_minutes = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "output_dir") {
            if let Some(v) = last.output_dir {
                settings.output_dir = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "format") {
            if let Some(v) = last.format {
                settings.format = v;
            }
        }

        settings = Self::apply_debug(settings);

        let params = LastUsedParams::from(&settings);
        if let Err(e) = params.save_to(config_path) {
            tracing::debug!("could not persist settings to {}: {}", config_path.display(), e);
        }

        settings
    }

    /// `--debug` overrides the log level.
    fn apply_debug(mut settings: Settings) -> Settings {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }

    /// Collect session definitions from `--session` values followed by the
    /// entries of `--sessions-file`, in that order.
    pub fn session_definitions(&self) -> Result<Vec<SessionDefinition>> {
        let mut definitions = self
            .sessions
            .iter()
            .map(|s| SessionDefinition::parse_arg(s))
            .collect::<Result<Vec<_>>>()?;

        if let Some(path) = &self.sessions_file {
            let content =
                std::fs::read_to_string(path).map_err(|source| AttendanceError::FileRead {
                    path: path.clone(),
                    source,
                })?;
            let from_file: Vec<SessionDefinition> = serde_json::from_str(&content)?;
            definitions.extend(from_file);
        }

        if definitions.is_empty() {
            return Err(AttendanceError::Config(
                "no sessions defined; pass --session or --sessions-file".to_string(),
            ));
        }
        Ok(definitions)
    }

    /// Validated sessions, 1-based in definition order.
    pub fn resolve_sessions(&self) -> Result<Vec<Session>> {
        build_sessions(&self.session_definitions()?, self.required_minutes)
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            sessions: (!s.sessions.is_empty()).then(|| s.sessions.clone()),
            required_minutes: Some(s.required_minutes),
            output_dir: Some(s.output_dir.clone()),
            format: Some(s.format.clone()),
        }
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
