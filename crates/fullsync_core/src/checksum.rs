//! Drift checksums over canonical encodings.
//!
//! A [`Checksum`] is the first eight bytes, read big-endian, of the SHA-256
//! digest of `[ENCODING_VERSION] ++ canonical_cbor(value)`. Because the
//! canonical encoding sorts map keys and fixes scalar formatting, logically
//! equal values hash equally regardless of how they were built.
//!
//! Checksums are a heuristic for skipping unchanged data, not an integrity
//! guarantee. Truncating the digest makes collisions possible, and that is
//! accepted.

use crate::error::CoreResult;
use fullsync_codec::{to_versioned_cbor, Value};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

/// A 64-bit drift checksum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Checksum(pub u64);

impl Checksum {
    /// Returns the raw value.
    #[must_use]
    pub fn as_u64(self) -> u64 {
        self.0
    }

    fn of_bytes(bytes: &[u8]) -> Self {
        let digest = Sha256::digest(bytes);
        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        Self(u64::from_be_bytes(head))
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Checksums a codec value.
///
/// # Errors
///
/// Returns a codec error if the value cannot be canonically encoded
/// (NaN or infinite floats, out-of-range integers).
pub fn checksum(value: &Value) -> CoreResult<Checksum> {
    Ok(Checksum::of_bytes(&to_versioned_cbor(value)?))
}

/// Checksums a JSON document.
///
/// # Errors
///
/// See [`checksum`].
pub fn checksum_json(json: &serde_json::Value) -> CoreResult<Checksum> {
    checksum(&Value::from_json(json)?)
}

/// Checksums any serializable value.
///
/// # Errors
///
/// Returns a codec error if the value does not serialize to something the
/// canonical encoding accepts.
pub fn checksum_of<T: Serialize + ?Sized>(value: &T) -> CoreResult<Checksum> {
    checksum(&Value::from_serialize(value)?)
}

/// True iff `known` holds a checksum under `name` equal to `new`.
pub fn still_valid(known: &BTreeMap<String, Checksum>, name: &str, new: Checksum) -> bool {
    known.get(name) == Some(&new)
}

/// Named checksums remembered between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChecksumRegistry {
    sums: BTreeMap<String, Checksum>,
}

impl ChecksumRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `sum` under `name`, returning the previous checksum.
    pub fn record(&mut self, name: impl Into<String>, sum: Checksum) -> Option<Checksum> {
        self.sums.insert(name.into(), sum)
    }

    /// See [`still_valid`].
    #[must_use]
    pub fn still_valid(&self, name: &str, sum: Checksum) -> bool {
        still_valid(&self.sums, name, sum)
    }

    /// The checksum recorded under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Checksum> {
        self.sums.get(name).copied()
    }

    /// Forgets `name`.
    pub fn forget(&mut self, name: &str) -> Option<Checksum> {
        self.sums.remove(name)
    }

    /// Number of recorded names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sums.len()
    }

    /// True if nothing is recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sums.is_empty()
    }
}
