//! Serializable record filters.

use crate::types::{Record, RecordId};
use serde::{Deserialize, Serialize};

/// A filter selecting the records in scope for a query.
///
/// Predicates are plain data so they can be persisted alongside a sync
/// configuration and handed to any [`crate::RecordStore`] implementation.
///
/// ```
/// use fullsync_store::{Predicate, Record};
/// use serde_json::json;
///
/// let published = Predicate::eq("status", json!("publish"));
/// let record = Record::new(1).with_field("status", json!("publish"));
/// assert!(published.matches(&record));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Predicate {
    /// Matches every record.
    All,
    /// Matches records whose id is listed.
    IdIn {
        /// Accepted ids.
        ids: Vec<RecordId>,
    },
    /// Matches records whose field equals `value`.
    Eq {
        /// Field name.
        field: String,
        /// Expected value.
        value: serde_json::Value,
    },
    /// Matches records whose field equals one of `values`.
    In {
        /// Field name.
        field: String,
        /// Accepted values.
        values: Vec<serde_json::Value>,
    },
    /// Matches records that carry the field at all.
    Exists {
        /// Field name.
        field: String,
    },
    /// Negation.
    Not {
        /// Inner predicate.
        predicate: Box<Predicate>,
    },
    /// Conjunction; an empty list matches everything.
    And {
        /// Inner predicates.
        predicates: Vec<Predicate>,
    },
    /// Disjunction; an empty list matches nothing.
    Or {
        /// Inner predicates.
        predicates: Vec<Predicate>,
    },
}

impl Predicate {
    /// Builds an equality predicate.
    pub fn eq(field: impl Into<String>, value: serde_json::Value) -> Self {
        Self::Eq {
            field: field.into(),
            value,
        }
    }

    /// Builds an id-membership predicate.
    pub fn id_in(ids: impl IntoIterator<Item = RecordId>) -> Self {
        Self::IdIn {
            ids: ids.into_iter().collect(),
        }
    }

    /// Negates a predicate.
    #[allow(clippy::should_implement_trait)]
    pub fn not(predicate: Predicate) -> Self {
        Self::Not {
            predicate: Box::new(predicate),
        }
    }

    /// Combines two predicates, flattening `All` away.
    #[must_use]
    pub fn and(self, other: Predicate) -> Self {
        match (self, other) {
            (Predicate::All, p) | (p, Predicate::All) => p,
            (Predicate::And { mut predicates }, p) => {
                predicates.push(p);
                Predicate::And { predicates }
            }
            (a, b) => Predicate::And {
                predicates: vec![a, b],
            },
        }
    }

    /// Evaluates the predicate against a record.
    pub fn matches(&self, record: &Record) -> bool {
        match self {
            Predicate::All => true,
            Predicate::IdIn { ids } => ids.contains(&record.id),
            Predicate::Eq { field, value } => record.field(field) == Some(value),
            Predicate::In { field, values } => record
                .field(field)
                .is_some_and(|actual| values.contains(actual)),
            Predicate::Exists { field } => record.field(field).is_some(),
            Predicate::Not { predicate } => !predicate.matches(record),
            Predicate::And { predicates } => predicates.iter().all(|p| p.matches(record)),
            Predicate::Or { predicates } => predicates.iter().any(|p| p.matches(record)),
        }
    }
}

impl Default for Predicate {
    fn default() -> Self {
        Self::All
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn post(id: u64, status: &str) -> Record {
        Record::new(id).with_field("status", json!(status))
    }

    #[test]
    fn leaf_predicates() {
        let record = post(3, "draft");
        assert!(Predicate::All.matches(&record));
        assert!(Predicate::id_in([RecordId(3)]).matches(&record));
        assert!(!Predicate::id_in([RecordId(4)]).matches(&record));
        assert!(Predicate::eq("status", json!("draft")).matches(&record));
        assert!(Predicate::In {
            field: "status".into(),
            values: vec![json!("publish"), json!("draft")],
        }
        .matches(&record));
        assert!(Predicate::Exists {
            field: "status".into()
        }
        .matches(&record));
        assert!(!Predicate::eq("missing", json!(1)).matches(&record));
    }

    #[test]
    fn combinators() {
        let record = post(3, "draft");
        let draft = Predicate::eq("status", json!("draft"));
        assert!(!Predicate::not(draft.clone()).matches(&record));
        assert!(!Predicate::Or { predicates: vec![] }.matches(&record));
        assert!(Predicate::And { predicates: vec![] }.matches(&record));
        assert_eq!(Predicate::All.and(draft.clone()), draft);
        assert!(draft
            .clone()
            .and(Predicate::id_in([RecordId(3)]))
            .matches(&record));
    }

    #[test]
    fn serde_shape() {
        let predicate =
            Predicate::eq("status", json!("publish")).and(Predicate::id_in([RecordId(1)]));
        let json = serde_json::to_value(&predicate).unwrap();
        assert_eq!(
            json,
            json!({"op": "and", "predicates": [
                {"op": "eq", "field": "status", "value": "publish"},
                {"op": "id_in", "ids": [1]}
            ]})
        );
        let back: Predicate = serde_json::from_value(json).unwrap();
        assert_eq!(back, predicate);
    }
}
