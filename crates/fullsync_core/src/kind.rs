//! Full-sync configuration and the per-entity-kind capability.

use fullsync_store::{Predicate, RecordId};
use serde::{Deserialize, Serialize};

/// Selects which records of a module are in scope for a full sync.
///
/// Serialized externally tagged: `"all"`, `{"ids": [..]}` or
/// `{"filter": {..predicate..}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FullSyncConfig {
    /// Every record of the module.
    #[default]
    All,
    /// Only the listed ids.
    Ids(Vec<RecordId>),
    /// Records matching an arbitrary predicate.
    Filter(Predicate),
}

impl FullSyncConfig {
    /// The predicate this configuration contributes.
    pub fn to_predicate(&self) -> Predicate {
        match self {
            FullSyncConfig::All => Predicate::All,
            FullSyncConfig::Ids(ids) => Predicate::id_in(ids.iter().copied()),
            FullSyncConfig::Filter(predicate) => predicate.clone(),
        }
    }
}

/// What the sync machinery needs to know about one kind of entity.
///
/// The extractor, partitioner and driver depend only on this trait, never
/// on a concrete kind; implement it once per entity kind.
pub trait EntityKind: Send + Sync {
    /// Module name, used for limits lookup, status keys and action names.
    fn name(&self) -> &str;

    /// Collection holding the records, or `None` when the kind has no
    /// addressable collection.
    fn collection(&self) -> Option<&str>;

    /// Name of the identifier field as the consumer knows it.
    fn id_field(&self) -> &str {
        "id"
    }

    /// Filter every sync of this kind applies, regardless of config.
    fn base_predicate(&self) -> Predicate {
        Predicate::All
    }

    /// The full predicate for a given configuration.
    fn predicate(&self, config: &FullSyncConfig) -> Predicate {
        self.base_predicate().and(config.to_predicate())
    }
}

/// An [`EntityKind`] described entirely by data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionKind {
    /// Module name.
    pub name: String,
    /// Backing collection; `None` makes the kind unaddressable.
    #[serde(default)]
    pub collection: Option<String>,
    /// Identifier field name; `"id"` when omitted.
    #[serde(default = "default_id_field")]
    pub id_field: String,
    /// Filter applied to every sync.
    #[serde(default)]
    pub filter: Predicate,
}

fn default_id_field() -> String {
    "id".to_string()
}

impl CollectionKind {
    /// A kind whose module and collection share a name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            collection: Some(name.clone()),
            name,
            id_field: default_id_field(),
            filter: Predicate::All,
        }
    }

    /// A kind with no collection behind it.
    pub fn unaddressable(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            collection: None,
            id_field: default_id_field(),
            filter: Predicate::All,
        }
    }

    /// Reads from a differently named collection.
    #[must_use]
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = Some(collection.into());
        self
    }

    /// Renames the identifier field.
    #[must_use]
    pub fn with_id_field(mut self, id_field: impl Into<String>) -> Self {
        self.id_field = id_field.into();
        self
    }

    /// Sets the always-applied filter.
    #[must_use]
    pub fn with_filter(mut self, filter: Predicate) -> Self {
        self.filter = filter;
        self
    }
}

impl EntityKind for CollectionKind {
    fn name(&self) -> &str {
        &self.name
    }

    fn collection(&self) -> Option<&str> {
        self.collection.as_deref()
    }

    fn id_field(&self) -> &str {
        &self.id_field
    }

    fn base_predicate(&self) -> Predicate {
        self.filter.clone()
    }
}
