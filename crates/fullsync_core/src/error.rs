//! Error types for fullsync core.

use fullsync_store::RecordId;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in extraction, partitioning and checksumming.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The backing store failed a query.
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] fullsync_store::StoreError),

    /// Canonical encoding failed.
    #[error("codec error: {0}")]
    Codec(#[from] fullsync_codec::CodecError),

    /// No transmission limits are configured for the module.
    #[error("no transmission limits configured for module {module}")]
    ConfigurationMissing {
        /// Module name.
        module: String,
    },

    /// Limits are configured but unusable.
    #[error("invalid limits for module {module}: {reason}")]
    InvalidLimits {
        /// Module name.
        module: String,
        /// Why the limits were rejected.
        reason: String,
    },

    /// A status mutation would break the cursor invariants.
    #[error("cursor would not decrease: {cursor} -> {next}")]
    CursorRegression {
        /// Current cursor.
        cursor: RecordId,
        /// Proposed cursor.
        next: RecordId,
    },

    /// Operation not permitted in current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why operation is invalid.
        message: String,
    },
}

impl CoreError {
    /// Creates a configuration missing error.
    pub fn configuration_missing(module: impl Into<String>) -> Self {
        Self::ConfigurationMissing {
            module: module.into(),
        }
    }

    /// Creates an invalid limits error.
    pub fn invalid_limits(module: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidLimits {
            module: module.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }
}
