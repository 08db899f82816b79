//! Record identifiers, records and id ranges.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identifier of a record within a collection.
///
/// Ids are monotonically increasing and unique per collection. The value
/// `u64::MAX` is reserved as [`RecordId::SENTINEL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl RecordId {
    /// Cursor value above every assignable id.
    pub const SENTINEL: RecordId = RecordId(u64::MAX);

    /// Creates a new record id.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw id value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns true for the reserved sentinel.
    #[must_use]
    pub const fn is_sentinel(self) -> bool {
        self.0 == u64::MAX
    }
}

impl From<u64> for RecordId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_sentinel() {
            f.write_str("sentinel")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// A stored record: an id plus arbitrary named fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Record id.
    pub id: RecordId,
    /// Field values, keyed by field name.
    #[serde(flatten)]
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl Record {
    /// Creates a record with no fields.
    pub fn new(id: impl Into<RecordId>) -> Self {
        Self {
            id: id.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Adds a field.
    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Looks up a field.
    pub fn field(&self, name: &str) -> Option<&serde_json::Value> {
        self.fields.get(name)
    }
}

/// Inclusive id bounds `{min, max}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdRange {
    /// Smallest id in the range.
    pub min: RecordId,
    /// Largest id in the range.
    pub max: RecordId,
}

impl IdRange {
    /// Creates a range; `min` must not exceed `max`.
    #[must_use]
    pub fn new(min: impl Into<RecordId>, max: impl Into<RecordId>) -> Self {
        Self {
            min: min.into(),
            max: max.into(),
        }
    }

    /// Returns true if `id` lies within the bounds.
    #[must_use]
    pub fn contains(&self, id: RecordId) -> bool {
        self.min <= id && id <= self.max
    }
}

impl fmt::Display for IdRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}
