//! Error types for the full-sync engine.

use fullsync_core::{Checksum, CoreError};
use std::path::PathBuf;
use thiserror::Error;

/// Result type for engine operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur while driving a full sync.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The transport failed to deliver a message.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// Whether the operation can be retried.
        retryable: bool,
    },

    /// A message could not be encoded for the wire.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Extraction, limits or status failure.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Persisted state is unreadable.
    #[error("status store error: {message}")]
    Status {
        /// Error message.
        message: String,
    },

    /// I/O error in a file-backed status store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Status file could not be (de)serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Another process holds the status directory.
    #[error("status directory is locked: {}", path.display())]
    Locked {
        /// Directory path.
        path: PathBuf,
    },

    /// The module name cannot be used.
    #[error("invalid module name {module:?}: {reason}")]
    InvalidModule {
        /// Module name.
        module: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The plan's configuration changed after its start marker was sent.
    #[error("full sync started with configuration {recorded}, now {current}; reset to restart")]
    PlanChanged {
        /// Checksum recorded with the start marker.
        recorded: Checksum,
        /// Checksum of the current plan.
        current: Checksum,
    },
}

impl SyncError {
    /// Creates a retryable transport error.
    pub fn transport_retryable(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable transport error.
    pub fn transport_fatal(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: false,
        }
    }

    /// Creates a status store error.
    pub fn status(message: impl Into<String>) -> Self {
        Self::Status {
            message: message.into(),
        }
    }

    /// Creates an invalid module error.
    pub fn invalid_module(module: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidModule {
            module: module.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if re-invoking later may succeed without intervention.
    ///
    /// Status is never advanced past a failure, so retrying a retryable
    /// error re-sends at most the chunk that failed.
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Transport { retryable, .. } => *retryable,
            SyncError::Core(CoreError::StoreUnavailable(_)) => true,
            SyncError::Io(_) | SyncError::Locked { .. } => true,
            _ => false,
        }
    }
}
