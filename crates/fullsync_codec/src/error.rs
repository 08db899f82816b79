//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur during encoding or decoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// NaN and infinite floats have no canonical form.
    #[error("NaN and infinite floats are forbidden")]
    NaNForbidden,

    /// Indefinite-length items are forbidden.
    #[error("indefinite-length items are forbidden")]
    IndefiniteLengthForbidden,

    /// Invalid UTF-8 string.
    #[error("invalid UTF-8 string")]
    InvalidUtf8,

    /// Unexpected end of input.
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// Input continues after a complete value.
    #[error("{remaining} trailing bytes after value")]
    TrailingBytes {
        /// Number of unread bytes.
        remaining: usize,
    },

    /// Invalid CBOR structure.
    #[error("invalid CBOR structure: {message}")]
    InvalidStructure {
        /// Description of the structural error.
        message: String,
    },

    /// Unsupported CBOR type.
    #[error("unsupported CBOR type: {type_name}")]
    UnsupportedType {
        /// Name of the unsupported type.
        type_name: String,
    },

    /// Integer outside the range CBOR can represent.
    #[error("integer {value} is outside the CBOR integer range")]
    IntegerOverflow {
        /// The offending value.
        value: i128,
    },

    /// A length prefix larger than the decoder accepts.
    #[error("declared size {claimed} exceeds limit {max_allowed}")]
    SizeLimitExceeded {
        /// Size declared by the input.
        claimed: u64,
        /// Largest accepted size.
        max_allowed: u64,
    },

    /// A value could not be converted from its serde form.
    #[error("conversion failed: {message}")]
    Conversion {
        /// Description of the failure.
        message: String,
    },
}

impl CodecError {
    /// Create an invalid structure error.
    pub fn invalid_structure(message: impl Into<String>) -> Self {
        Self::InvalidStructure {
            message: message.into(),
        }
    }

    /// Create an unsupported type error.
    pub fn unsupported_type(type_name: impl Into<String>) -> Self {
        Self::UnsupportedType {
            type_name: type_name.into(),
        }
    }

    /// Create a conversion error.
    pub fn conversion(message: impl Into<String>) -> Self {
        Self::Conversion {
            message: message.into(),
        }
    }
}
