//! Canonical CBOR encoder.

use crate::error::{CodecError, CodecResult};
use crate::value::Value;

/// Encode a value to canonical CBOR bytes.
///
/// Output follows the RFC 7049 §3.9 canonical rules:
/// - Map keys are sorted by their encoded form (length-first, then bytewise)
/// - Integers and lengths use the shortest possible encoding
/// - No indefinite-length encoding
/// - Floats are always 8 bytes, with `-0.0` written as `0.0`
///
/// # Errors
///
/// Returns an error for NaN/infinite floats, out-of-range integers and
/// maps with duplicate keys.
pub fn to_canonical_cbor(value: &Value) -> CodecResult<Vec<u8>> {
    let mut encoder = CanonicalEncoder::new();
    encoder.encode(value)?;
    Ok(encoder.into_bytes())
}

/// A canonical CBOR encoder writing into an owned buffer.
#[derive(Debug, Default)]
pub struct CanonicalEncoder {
    buffer: Vec<u8>,
}

impl CanonicalEncoder {
    /// Create a new encoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new encoder with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Append a raw prefix byte, e.g. an encoding version tag.
    pub fn write_prefix(&mut self, byte: u8) {
        self.buffer.push(byte);
    }

    /// Encode a value.
    pub fn encode(&mut self, value: &Value) -> CodecResult<()> {
        match value {
            // null is simple value 22, false/true are 20/21
            Value::Null => self.buffer.push(0xf6),
            Value::Bool(b) => self.buffer.push(if *b { 0xf5 } else { 0xf4 }),
            Value::Integer(n) => self.encode_integer(*n)?,
            Value::Float(f) => self.encode_float(*f)?,
            Value::Bytes(b) => {
                self.write_head(2, b.len() as u64);
                self.buffer.extend_from_slice(b);
            }
            Value::Text(s) => {
                self.write_head(3, s.len() as u64);
                self.buffer.extend_from_slice(s.as_bytes());
            }
            Value::Array(items) => {
                self.write_head(4, items.len() as u64);
                for item in items {
                    self.encode(item)?;
                }
            }
            Value::Map(pairs) => self.encode_map(pairs)?,
        }
        Ok(())
    }

    /// Consume this encoder and return the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Get a reference to the encoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    fn encode_integer(&mut self, n: i128) -> CodecResult<()> {
        if n >= 0 {
            let arg = u64::try_from(n).map_err(|_| CodecError::IntegerOverflow { value: n })?;
            self.write_head(0, arg);
        } else {
            // major type 1 carries -1 - n
            let arg =
                u64::try_from(-1 - n).map_err(|_| CodecError::IntegerOverflow { value: n })?;
            self.write_head(1, arg);
        }
        Ok(())
    }

    fn encode_float(&mut self, f: f64) -> CodecResult<()> {
        if !f.is_finite() {
            return Err(CodecError::NaNForbidden);
        }
        let normalized = if f == 0.0 { 0.0 } else { f };
        self.buffer.push(0xfb);
        self.buffer.extend_from_slice(&normalized.to_bits().to_be_bytes());
        Ok(())
    }

    fn encode_map(&mut self, pairs: &[(Value, Value)]) -> CodecResult<()> {
        let mut encoded: Vec<(Vec<u8>, &Value)> = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            encoded.push((to_canonical_cbor(key)?, value));
        }

        encoded.sort_by(|a, b| a.0.len().cmp(&b.0.len()).then_with(|| a.0.cmp(&b.0)));
        if encoded.windows(2).any(|w| w[0].0 == w[1].0) {
            return Err(CodecError::invalid_structure("duplicate map key"));
        }

        self.write_head(5, pairs.len() as u64);
        for (key, value) in encoded {
            self.buffer.extend_from_slice(&key);
            self.encode(value)?;
        }
        Ok(())
    }

    #[allow(clippy::cast_possible_truncation)]
    fn write_head(&mut self, major_type: u8, arg: u64) {
        let mt = major_type << 5;
        if arg < 24 {
            self.buffer.push(mt | arg as u8);
        } else if arg <= u64::from(u8::MAX) {
            self.buffer.push(mt | 24);
            self.buffer.push(arg as u8);
        } else if arg <= u64::from(u16::MAX) {
            self.buffer.push(mt | 25);
            self.buffer.extend_from_slice(&(arg as u16).to_be_bytes());
        } else if arg <= u64::from(u32::MAX) {
            self.buffer.push(mt | 26);
            self.buffer.extend_from_slice(&(arg as u32).to_be_bytes());
        } else {
            self.buffer.push(mt | 27);
            self.buffer.extend_from_slice(&arg.to_be_bytes());
        }
    }
}
