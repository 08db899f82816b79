//! # fullsync codec
//!
//! Versioned canonical CBOR encoding for fullsync.
//!
//! Checksums are persisted and compared across runs and releases, so the
//! bytes they hash must never drift. This crate fixes those bytes:
//! - Identical logical values produce identical bytes
//! - Map key order is irrelevant to the output
//! - The layout is tagged with [`ENCODING_VERSION`]
//!
//! ## Canonical rules
//!
//! - Maps are sorted by encoded key (length-first, then bytewise)
//! - Integers and lengths use the shortest encoding
//! - Floats are always 8-byte IEEE-754; `-0.0` becomes `0.0`; NaN is rejected
//! - No indefinite-length items, no tags
//!
//! ## Usage
//!
//! ```
//! use fullsync_codec::{from_cbor, to_canonical_cbor, Value};
//!
//! let value = Value::text_map([("a", Value::from(1i64))]);
//! let bytes = to_canonical_cbor(&value).unwrap();
//! assert_eq!(from_cbor(&bytes).unwrap(), value);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod decoder;
mod encoder;
mod error;
mod value;

pub use decoder::{from_cbor, CanonicalDecoder};
pub use encoder::{to_canonical_cbor, CanonicalEncoder};
pub use error::{CodecError, CodecResult};
pub use value::Value;

/// Version of the canonical layout. Bump whenever encoded bytes for an
/// existing value could change.
pub const ENCODING_VERSION: u8 = 1;

/// Encode a value prefixed with [`ENCODING_VERSION`].
///
/// This is the exact byte string hashed by checksums.
pub fn to_versioned_cbor(value: &Value) -> CodecResult<Vec<u8>> {
    let mut encoder = CanonicalEncoder::with_capacity(64);
    encoder.write_prefix(ENCODING_VERSION);
    encoder.encode(value)?;
    Ok(encoder.into_bytes())
}
