//! Canonical CBOR decoder.

use crate::error::{CodecError, CodecResult};
use crate::value::Value;

/// Maximum element count accepted for arrays and maps.
const MAX_CONTAINER_ELEMENTS: u64 = 16 * 1024 * 1024;

/// Maximum byte/text length accepted.
const MAX_BYTES_LENGTH: u64 = 256 * 1024 * 1024;

/// Maximum nesting depth.
const MAX_DEPTH: usize = 128;

/// Decode exactly one value from CBOR bytes.
///
/// # Errors
///
/// Returns an error if the bytes are not canonical CBOR, contain
/// forbidden constructs, or continue past the first value.
pub fn from_cbor(bytes: &[u8]) -> CodecResult<Value> {
    let mut decoder = CanonicalDecoder::new(bytes);
    let value = decoder.decode()?;
    if !decoder.is_empty() {
        return Err(CodecError::TrailingBytes {
            remaining: decoder.remaining().len(),
        });
    }
    Ok(value)
}

/// A decoder that accepts only the encodings [`crate::to_canonical_cbor`] produces.
pub struct CanonicalDecoder<'a> {
    data: &'a [u8],
    pos: usize,
    depth: usize,
}

impl<'a> CanonicalDecoder<'a> {
    /// Create a new decoder for the given bytes.
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            depth: 0,
        }
    }

    /// Check if all bytes have been consumed.
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    /// Get remaining bytes.
    pub fn remaining(&self) -> &[u8] {
        &self.data[self.pos.min(self.data.len())..]
    }

    /// Decode the next value.
    pub fn decode(&mut self) -> CodecResult<Value> {
        if self.depth >= MAX_DEPTH {
            return Err(CodecError::invalid_structure("nesting too deep"));
        }
        let initial = self.read_byte()?;
        let major = initial >> 5;
        let info = initial & 0x1f;

        match major {
            0 => Ok(Value::Integer(i128::from(self.read_arg(info)?))),
            1 => Ok(Value::Integer(-1 - i128::from(self.read_arg(info)?))),
            2 => {
                let len = self.read_len(info)?;
                Ok(Value::Bytes(self.read_bytes(len)?.to_vec()))
            }
            3 => {
                let len = self.read_len(info)?;
                let bytes = self.read_bytes(len)?;
                let text = std::str::from_utf8(bytes).map_err(|_| CodecError::InvalidUtf8)?;
                Ok(Value::Text(text.to_string()))
            }
            4 => self.nested(|d| d.decode_array(info)),
            5 => self.nested(|d| d.decode_map(info)),
            6 => Err(CodecError::unsupported_type("tag")),
            _ => self.decode_simple(info),
        }
    }

    fn nested<F>(&mut self, f: F) -> CodecResult<Value>
    where
        F: FnOnce(&mut Self) -> CodecResult<Value>,
    {
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn decode_array(&mut self, info: u8) -> CodecResult<Value> {
        let len = self.read_count(info)?;
        let mut items = Vec::with_capacity(len.min(1024));
        for _ in 0..len {
            items.push(self.decode()?);
        }
        Ok(Value::Array(items))
    }

    fn decode_map(&mut self, info: u8) -> CodecResult<Value> {
        let len = self.read_count(info)?;
        let mut pairs = Vec::with_capacity(len.min(1024));
        let data = self.data;
        let mut previous_key: Option<&'a [u8]> = None;
        for _ in 0..len {
            let key_start = self.pos;
            let key = self.decode()?;
            let key_bytes = &data[key_start..self.pos];
            if let Some(prev) = previous_key {
                let ordered = prev.len() < key_bytes.len()
                    || (prev.len() == key_bytes.len() && prev < key_bytes);
                if !ordered {
                    return Err(CodecError::invalid_structure(
                        "map keys not in canonical order or duplicated",
                    ));
                }
            }
            previous_key = Some(key_bytes);
            let value = self.decode()?;
            pairs.push((key, value));
        }
        Ok(Value::Map(pairs))
    }

    fn decode_simple(&mut self, info: u8) -> CodecResult<Value> {
        match info {
            20 => Ok(Value::Bool(false)),
            21 => Ok(Value::Bool(true)),
            22 => Ok(Value::Null),
            27 => {
                let bytes = self.read_bytes(8)?;
                let mut raw = [0u8; 8];
                raw.copy_from_slice(bytes);
                let f = f64::from_bits(u64::from_be_bytes(raw));
                if !f.is_finite() {
                    return Err(CodecError::NaNForbidden);
                }
                if f == 0.0 && f.is_sign_negative() {
                    return Err(CodecError::invalid_structure("non-canonical negative zero"));
                }
                Ok(Value::Float(f))
            }
            25 | 26 => Err(CodecError::invalid_structure(
                "non-canonical: floats must use 8 bytes",
            )),
            31 => Err(CodecError::IndefiniteLengthForbidden),
            other => Err(CodecError::unsupported_type(format!("simple value {other}"))),
        }
    }

    fn read_byte(&mut self) -> CodecResult<u8> {
        let byte = *self.data.get(self.pos).ok_or(CodecError::UnexpectedEof)?;
        self.pos += 1;
        Ok(byte)
    }

    fn read_bytes(&mut self, len: usize) -> CodecResult<&'a [u8]> {
        let end = self.pos.checked_add(len).ok_or(CodecError::UnexpectedEof)?;
        let bytes = self.data.get(self.pos..end).ok_or(CodecError::UnexpectedEof)?;
        self.pos = end;
        Ok(bytes)
    }

    fn read_arg(&mut self, info: u8) -> CodecResult<u64> {
        let (value, minimum) = match info {
            0..=23 => return Ok(u64::from(info)),
            24 => (u64::from(self.read_byte()?), 24),
            25 => {
                let b = self.read_bytes(2)?;
                (u64::from(u16::from_be_bytes([b[0], b[1]])), 0x100)
            }
            26 => {
                let b = self.read_bytes(4)?;
                (u64::from(u32::from_be_bytes([b[0], b[1], b[2], b[3]])), 0x1_0000)
            }
            27 => {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(self.read_bytes(8)?);
                (u64::from_be_bytes(raw), 0x1_0000_0000)
            }
            31 => return Err(CodecError::IndefiniteLengthForbidden),
            _ => return Err(CodecError::invalid_structure("reserved additional info")),
        };
        if value < minimum {
            return Err(CodecError::invalid_structure(
                "non-canonical: value could be encoded in fewer bytes",
            ));
        }
        Ok(value)
    }

    fn read_len(&mut self, info: u8) -> CodecResult<usize> {
        let len = self.read_arg(info)?;
        if len > MAX_BYTES_LENGTH {
            return Err(CodecError::SizeLimitExceeded {
                claimed: len,
                max_allowed: MAX_BYTES_LENGTH,
            });
        }
        usize::try_from(len).map_err(|_| CodecError::UnexpectedEof)
    }

    fn read_count(&mut self, info: u8) -> CodecResult<usize> {
        let count = self.read_arg(info)?;
        if count > MAX_CONTAINER_ELEMENTS {
            return Err(CodecError::SizeLimitExceeded {
                claimed: count,
                max_allowed: MAX_CONTAINER_ELEMENTS,
            });
        }
        usize::try_from(count).map_err(|_| CodecError::UnexpectedEof)
    }
}
