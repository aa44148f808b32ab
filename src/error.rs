//! Error types for the abundance-tables library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum TableError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Malformed input in {path:?} at line {line}: {reason}")]
    MalformedInput {
        path: PathBuf,
        line: u64,
        reason: String,
    },

    #[error("Invalid count value '{value}' at line {line}, column {column}")]
    InvalidCount {
        value: String,
        line: u64,
        column: usize,
    },

    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Empty data: {0}")]
    EmptyData(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Conflicting values for key '{key}' in column '{column}'")]
    MergeConflict { key: String, column: String },

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, TableError>;
