//! Error types for the routine_core library.

use crate::types::Id;
use std::io;
use std::path::PathBuf;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for routine_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// SQLite error from the backing store
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Backup file does not exist
    #[error("Backup file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Backing file is not a valid backup (missing table or column)
    #[error("Schema error: {0}")]
    Schema(String),

    /// A row could not be decoded into a record
    #[error("Decode error in {table}: {message}")]
    Decode {
        table: &'static str,
        message: String,
    },

    /// A record was about to be inserted with a foreign key that points nowhere
    #[error("{table}.{column} references missing id {id}")]
    MissingReference {
        table: &'static str,
        column: &'static str,
        id: Id,
    },

    /// A record id was looked up but is not present in the store
    #[error("No {table} with id {id}")]
    UnknownRecord { table: &'static str, id: Id },

    /// The decision collaborator could not produce an answer
    #[error("Selection error: {0}")]
    Selection(String),
}
