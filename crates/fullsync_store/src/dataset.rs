//! JSON datasets loaded into an [`InMemoryStore`].
//!
//! ```text
//! {
//!   "collections": {
//!     "posts": [ {"id": 1, "status": "publish"}, ... ],
//!     "comments": []
//!   }
//! }
//! ```

use crate::error::{StoreError, StoreResult};
use crate::memory::InMemoryStore;
use crate::types::Record;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use tracing::debug;

/// A set of named collections in their on-disk JSON form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    /// Records per collection.
    pub collections: BTreeMap<String, Vec<Record>>,
}

impl Dataset {
    /// Parses a dataset from JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error on malformed JSON, duplicate ids, or records using
    /// the reserved sentinel id.
    pub fn from_json(text: &str) -> StoreResult<Self> {
        let dataset: Dataset = serde_json::from_str(text)?;
        dataset.validate()?;
        Ok(dataset)
    }

    /// Reads and parses a dataset file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is invalid.
    pub fn from_path(path: &Path) -> StoreResult<Self> {
        let text = fs::read_to_string(path)?;
        let dataset = Self::from_json(&text)?;
        debug!(
            path = %path.display(),
            collections = dataset.collections.len(),
            "loaded dataset"
        );
        Ok(dataset)
    }

    /// Loads every collection into a fresh in-memory store.
    ///
    /// # Errors
    ///
    /// Returns an error if a record uses the reserved sentinel id.
    pub fn into_store(self) -> StoreResult<InMemoryStore> {
        let store = InMemoryStore::new();
        for (name, records) in self.collections {
            store.create_collection(name.clone());
            for record in records {
                store.insert(&name, record)?;
            }
        }
        Ok(store)
    }

    fn validate(&self) -> StoreResult<()> {
        for (name, records) in &self.collections {
            let mut seen = HashSet::with_capacity(records.len());
            for record in records {
                if record.id.is_sentinel() {
                    return Err(StoreError::invalid_record(name, "id u64::MAX is reserved"));
                }
                if !seen.insert(record.id) {
                    return Err(StoreError::invalid_record(
                        name,
                        format!("duplicate id {}", record.id),
                    ));
                }
            }
        }
        Ok(())
    }
}
