//! Core types for the attendance report engine.
//!
//! Holds the data model, interval reconciliation primitives, timestamp
//! handling, error types and CLI settings shared by the loader, the
//! aggregation pipeline and the binary.

pub mod error;
pub mod formatting;
pub mod intervals;
pub mod models;
pub mod settings;
pub mod time_utils;
