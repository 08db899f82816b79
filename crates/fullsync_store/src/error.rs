//! Error types for store operations.

use std::io;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur while querying a backing store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not serve the query (connection lost, timeout, ...).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The named collection does not exist in this store.
    #[error("unknown collection: {name}")]
    UnknownCollection {
        /// Name of the collection.
        name: String,
    },

    /// A record in a dataset is malformed.
    #[error("invalid record in {collection}: {message}")]
    InvalidRecord {
        /// Collection holding the record.
        collection: String,
        /// What is wrong with it.
        message: String,
    },

    /// An I/O error occurred while loading a dataset.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A dataset could not be parsed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// Creates an unknown collection error.
    pub fn unknown_collection(name: impl Into<String>) -> Self {
        Self::UnknownCollection { name: name.into() }
    }

    /// Creates an invalid record error.
    pub fn invalid_record(collection: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            collection: collection.into(),
            message: message.into(),
        }
    }
}
