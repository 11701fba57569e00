//! Data layer for the attendance report engine.
//!
//! Responsible for loading meeting logs, computing per-session attendance
//! facts, folding them into per-participant records, running the per-scope
//! pipeline and rendering report tables.

pub mod aggregator;
pub mod analysis;
pub mod analyzer;
pub mod reader;
pub mod report;

pub use attendance_core as core;
