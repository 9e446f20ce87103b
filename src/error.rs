//! Error types for lease parsing and serving.
//!
//! All fallible operations in this crate return [`Result<T>`], which uses
//! the [`Error`] enum for error variants. Problems with a single lease line
//! are not errors at this level; they are reported as [`LineError`] and the
//! line is skipped.

use std::num::ParseIntError;
use std::path::PathBuf;

/// Errors that abort a parse, a render, or the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// I/O error on something other than the lease file (stdout, sockets).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error (config dump or JSON output).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The lease file could not be opened, or reading it failed mid-stream.
    ///
    /// The message always names the path so that both the CLI and the
    /// HTTP 500 body tell the operator which file was tried.
    #[error("Cannot read lease file {}: {source}", path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration.
    ///
    /// Returned by [`Config::validate`](crate::Config::validate).
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Listening socket creation or configuration error.
    #[error("Socket error: {0}")]
    Socket(String),
}

/// Why a single lease line was skipped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LineError {
    #[error("invalid number of fields ({found}), expected {expected}")]
    FieldCount { found: usize, expected: &'static str },

    #[error("error parsing timestamp '{value}': {source}")]
    Timestamp {
        value: String,
        #[source]
        source: ParseIntError,
    },

    #[error("timestamp {0} is out of range")]
    TimestampOutOfRange(i64),
}

/// A specialized Result type for lease operations.
pub type Result<T> = std::result::Result<T, Error>;
