//! CLI error types.

use fullsync_core::CoreError;
use fullsync_engine::SyncError;
use fullsync_store::StoreError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// A module has no collection in the dataset.
    #[error("unknown module '{0}': the dataset has no such collection")]
    UnknownModule(String),

    /// An input file could not be parsed.
    #[error("invalid input {path}: {message}")]
    InvalidInput {
        /// Offending file.
        path: PathBuf,
        /// What was wrong with it.
        message: String,
    },

    /// Bad argument combination.
    #[error("{0}")]
    Usage(String),

    /// Dataset error.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Extraction or limits error.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Driver error.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Creates an invalid-input error.
    pub fn invalid_input(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::InvalidInput {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

/// Result type for CLI commands.
pub type CliResult<T> = Result<T, CliError>;
