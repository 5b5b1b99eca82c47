#![forbid(unsafe_code)]

//! Core model and import logic for copying workout routines between backups.
//!
//! This crate provides:
//! - Record types for the six backup tables a routine touches
//! - A SQLite-backed store with in-memory, id-keyed tables
//! - The reconciling importer and its operator decision contract
//! - Import journal, configuration and logging

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod schema;
pub mod store;
pub mod decision;
pub mod importer;
pub mod journal;

#[cfg(test)]
mod fixtures;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use store::Store;
pub use decision::{Decider, Question, ScriptedDecider, Selection, CREATE_NEW};
pub use importer::{ImportSummary, ReconcileCounts, RoutineImporter};
pub use journal::{JournalEntry, JournalSink, JsonlJournal};
