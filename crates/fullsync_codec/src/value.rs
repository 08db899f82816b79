//! Dynamic value type fed to the canonical encoder.

use crate::encoder::to_canonical_cbor;
use crate::error::{CodecError, CodecResult};
use std::cmp::Ordering;

/// A dynamic value with a single canonical CBOR encoding.
///
/// Integers are held as `i128` so the full CBOR range (`-2^64` to
/// `2^64 - 1`) is representable, which matters for record ids near
/// `u64::MAX`. Floats always encode as 8-byte IEEE-754.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer in the CBOR range.
    Integer(i128),
    /// Finite floating point number.
    Float(f64),
    /// Byte string.
    Bytes(Vec<u8>),
    /// Text string (UTF-8).
    Text(String),
    /// Array of values.
    Array(Vec<Value>),
    /// Map of key-value pairs.
    Map(Vec<(Value, Value)>),
}

impl Value {
    /// Create a map value with keys in canonical order.
    pub fn map(mut pairs: Vec<(Value, Value)>) -> Self {
        pairs.sort_by(|a, b| a.0.cmp_canonical(&b.0));
        Value::Map(pairs)
    }

    /// Create a map from text keys.
    pub fn text_map<K: Into<String>>(pairs: impl IntoIterator<Item = (K, Value)>) -> Self {
        Self::map(
            pairs
                .into_iter()
                .map(|(k, v)| (Value::Text(k.into()), v))
                .collect(),
        )
    }

    /// Compare two values by their canonical encodings (length-first, then bytewise).
    ///
    /// Values that cannot be encoded sort after every encodable value.
    pub fn cmp_canonical(&self, other: &Self) -> Ordering {
        match (to_canonical_cbor(self), to_canonical_cbor(other)) {
            (Ok(a), Ok(b)) => a.len().cmp(&b.len()).then_with(|| a.cmp(&b)),
            (Ok(_), Err(_)) => Ordering::Less,
            (Err(_), Ok(_)) => Ordering::Greater,
            (Err(_), Err(_)) => Ordering::Equal,
        }
    }

    /// Convert a JSON document into a value.
    ///
    /// Object keys become text keys; JSON numbers become integers when they
    /// are integral and floats otherwise.
    pub fn from_json(json: &serde_json::Value) -> CodecResult<Self> {
        Ok(match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Integer(i128::from(i))
                } else if let Some(u) = n.as_u64() {
                    Value::Integer(i128::from(u))
                } else {
                    let f = n.as_f64().ok_or_else(|| {
                        CodecError::conversion(format!("unrepresentable number {n}"))
                    })?;
                    Value::Float(f)
                }
            }
            serde_json::Value::String(s) => Value::Text(s.clone()),
            serde_json::Value::Array(items) => {
                Value::Array(items.iter().map(Self::from_json).collect::<CodecResult<_>>()?)
            }
            serde_json::Value::Object(fields) => {
                let mut pairs = Vec::with_capacity(fields.len());
                for (k, v) in fields {
                    pairs.push((Value::Text(k.clone()), Self::from_json(v)?));
                }
                Self::map(pairs)
            }
        })
    }

    /// Convert any serializable value through its JSON data model.
    pub fn from_serialize<T: serde::Serialize + ?Sized>(value: &T) -> CodecResult<Self> {
        let json = serde_json::to_value(value).map_err(|e| CodecError::conversion(e.to_string()))?;
        Self::from_json(&json)
    }

    /// Convert back to JSON.
    ///
    /// Fails on byte strings, non-text map keys and integers outside the
    /// `i64`/`u64` range, none of which JSON can carry losslessly.
    pub fn to_json(&self) -> CodecResult<serde_json::Value> {
        Ok(match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Integer(n) => {
                if let Ok(i) = i64::try_from(*n) {
                    serde_json::Value::from(i)
                } else if let Ok(u) = u64::try_from(*n) {
                    serde_json::Value::from(u)
                } else {
                    return Err(CodecError::IntegerOverflow { value: *n });
                }
            }
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .ok_or(CodecError::NaNForbidden)?,
            Value::Bytes(_) => return Err(CodecError::unsupported_type("bytes")),
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Array(items) => serde_json::Value::Array(
                items
                    .iter()
                    .map(Self::to_json)
                    .collect::<CodecResult<_>>()?,
            ),
            Value::Map(pairs) => {
                let mut object = serde_json::Map::with_capacity(pairs.len());
                for (k, v) in pairs {
                    let key = k
                        .as_text()
                        .ok_or_else(|| CodecError::unsupported_type("non-text map key"))?;
                    object.insert(key.to_string(), v.to_json()?);
                }
                serde_json::Value::Object(object)
            }
        })
    }

    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get this value as a boolean, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get this value as an integer, if it is one.
    pub fn as_integer(&self) -> Option<i128> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Get this value as a `u64`, if it is a non-negative integer that fits.
    pub fn as_u64(&self) -> Option<u64> {
        self.as_integer().and_then(|n| u64::try_from(n).ok())
    }

    /// Get this value as a string, if it is a text string.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get this value as an array, if it is one.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Look up a text key in this map value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(pairs) => pairs
                .iter()
                .find(|(k, _)| k.as_text() == Some(key))
                .map(|(_, v)| v),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(i128::from(n))
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Integer(i128::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Integer(i128::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn map_keys_are_length_first() {
        let map = Value::text_map([
            ("abc", Value::from(1i64)),
            ("a", Value::from(2i64)),
            ("ab", Value::from(3i64)),
        ]);

        let keys: Vec<_> = map
            .as_map_keys()
            .into_iter()
            .map(|k| k.as_text().unwrap().to_string())
            .collect();
        assert_eq!(keys, vec!["a", "ab", "abc"]);
    }

    #[test]
    fn json_object_order_is_irrelevant() {
        let a = Value::from_json(&json!({"b": 1, "a": [true, null]})).unwrap();
        let b = Value::from_json(&json!({"a": [true, null], "b": 1})).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn json_numbers() {
        assert_eq!(Value::from_json(&json!(-3)).unwrap(), Value::Integer(-3));
        assert_eq!(
            Value::from_json(&json!(u64::MAX)).unwrap(),
            Value::Integer(i128::from(u64::MAX))
        );
        assert_eq!(Value::from_json(&json!(1.5)).unwrap(), Value::Float(1.5));
    }

    #[test]
    fn json_round_trip_and_limits() {
        let doc = json!({"title": "Hello", "tags": ["a", "b"], "score": 2.5, "id": u64::MAX});
        assert_eq!(Value::from_json(&doc).unwrap().to_json().unwrap(), doc);

        assert!(Value::Bytes(vec![1]).to_json().is_err());
        assert!(Value::map(vec![(Value::from(1i64), Value::Null)]).to_json().is_err());
        assert!(Value::Integer(-(1i128 << 64)).to_json().is_err());
    }

    #[test]
    fn from_serialize_struct() {
        #[derive(serde::Serialize)]
        struct Limits {
            chunk_size: u32,
        }

        let value = Value::from_serialize(&Limits { chunk_size: 10 }).unwrap();
        assert_eq!(value.get("chunk_size").and_then(Value::as_u64), Some(10));
        assert_eq!(value.get("missing"), None);
    }

    impl Value {
        fn as_map_keys(&self) -> Vec<&Value> {
            match self {
                Value::Map(pairs) => pairs.iter().map(|(k, _)| k).collect(),
                _ => Vec::new(),
            }
        }
    }
}
