//! Pinned checksum vectors.
//!
//! Each vector fixes the checksum of a JSON document so any change to the
//! canonical encoding or the digest truncation is caught.

use fullsync_core::{checksum_json, CoreResult};
use serde::{Deserialize, Serialize};

/// A JSON document and its expected checksum.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChecksumVector {
    /// Unique identifier for this vector.
    pub id: String,
    /// Human-readable description.
    pub description: String,
    /// Input document as JSON text.
    pub json: String,
    /// Expected canonical CBOR, versioned, hex-encoded.
    pub encoded_hex: String,
    /// Expected checksum, 16 hex digits.
    pub expected: String,
}

impl ChecksumVector {
    fn new(id: &str, description: &str, json: &str, encoded_hex: &str, expected: &str) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            json: json.into(),
            encoded_hex: encoded_hex.into(),
            expected: expected.into(),
        }
    }

    /// Computes this vector's checksum.
    ///
    /// # Errors
    ///
    /// Returns an error if the document does not parse or encode.
    pub fn compute(&self) -> CoreResult<String> {
        let value: serde_json::Value = serde_json::from_str(&self.json)
            .map_err(|e| fullsync_core::CoreError::invalid_operation(e.to_string()))?;
        Ok(checksum_json(&value)?.to_string())
    }
}

/// Checksum vectors.
pub fn checksum_vectors() -> Vec<ChecksumVector> {
    vec![
        ChecksumVector::new(
            "checksum_null",
            "JSON null",
            "null",
            "01f6",
            "8cb54aa16f22dace",
        ),
        ChecksumVector::new(
            "checksum_empty_map",
            "Empty object",
            "{}",
            "01a0",
            "a179dbdd51c56d09",
        ),
        ChecksumVector::new(
            "checksum_a_1",
            "Single integer field",
            r#"{"a": 1}"#,
            "01a1616101",
            "29a2399a1bf4b6d2",
        ),
        ChecksumVector::new(
            "checksum_a_2",
            "Same key, different value",
            r#"{"a": 2}"#,
            "01a1616102",
            "e8fca05b419f7c71",
        ),
    ]
}

/// Hex-encodes bytes.
pub fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
