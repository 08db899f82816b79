//! In-memory record store.

use crate::backend::RecordStore;
use crate::error::{StoreError, StoreResult};
use crate::predicate::Predicate;
use crate::types::{IdRange, Record, RecordId};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;

type Collection = BTreeMap<RecordId, Record>;

/// A record store held entirely in memory.
///
/// Collections are ordered maps keyed by id, so descending and ascending
/// range scans cost `O(log n + k)` plus predicate evaluation.
///
/// # Thread Safety
///
/// The store is `Send + Sync`; queries take a shared lock, mutations an
/// exclusive one.
///
/// # Example
///
/// ```rust
/// use fullsync_store::{InMemoryStore, Predicate, RecordId, RecordStore};
///
/// let store = InMemoryStore::new();
/// store.insert_ids("posts", 1..=5).unwrap();
/// let ids = store
///     .query_ids_descending("posts", &Predicate::All, RecordId(4), 2)
///     .unwrap();
/// assert_eq!(ids, vec![RecordId(3), RecordId(2)]);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty collection if it does not exist yet.
    pub fn create_collection(&self, name: impl Into<String>) {
        self.collections.write().entry(name.into()).or_default();
    }

    /// Inserts or replaces a record, creating the collection on demand.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidRecord`] if the id is
    /// [`RecordId::SENTINEL`].
    pub fn insert(&self, collection: &str, record: Record) -> StoreResult<()> {
        check_id(collection, record.id)?;
        self.collections
            .write()
            .entry(collection.to_string())
            .or_default()
            .insert(record.id, record);
        Ok(())
    }

    /// Inserts field-less records for every id in `ids`.
    ///
    /// Nothing is inserted if any id is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidRecord`] if an id is
    /// [`RecordId::SENTINEL`].
    pub fn insert_ids(
        &self,
        collection: &str,
        ids: impl IntoIterator<Item = u64>,
    ) -> StoreResult<()> {
        let records = ids
            .into_iter()
            .map(|id| check_id(collection, RecordId(id)).map(|()| Record::new(id)))
            .collect::<StoreResult<Vec<_>>>()?;
        let mut collections = self.collections.write();
        let target = collections.entry(collection.to_string()).or_default();
        for record in records {
            target.insert(record.id, record);
        }
        Ok(())
    }

    /// Removes a record, returning it if it existed.
    pub fn remove(&self, collection: &str, id: RecordId) -> Option<Record> {
        self.collections
            .write()
            .get_mut(collection)
            .and_then(|c| c.remove(&id))
    }

    /// Returns the number of records in a collection.
    pub fn len(&self, collection: &str) -> usize {
        self.collections.read().get(collection).map_or(0, BTreeMap::len)
    }

    /// Returns true if the collection is missing or empty.
    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    /// Returns the collection names, sorted.
    pub fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.collections.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Fetches records by id, skipping ids that do not exist.
    pub fn get_many(&self, collection: &str, ids: &[RecordId]) -> StoreResult<Vec<Record>> {
        self.with_collection(collection, |records| {
            ids.iter().filter_map(|id| records.get(id).cloned()).collect()
        })
    }

    fn with_collection<R>(&self, name: &str, f: impl FnOnce(&Collection) -> R) -> StoreResult<R> {
        let collections = self.collections.read();
        let records = collections
            .get(name)
            .ok_or_else(|| StoreError::unknown_collection(name))?;
        Ok(f(records))
    }
}

fn check_id(collection: &str, id: RecordId) -> StoreResult<()> {
    if id.is_sentinel() {
        return Err(StoreError::invalid_record(collection, "id u64::MAX is reserved"));
    }
    Ok(())
}

impl RecordStore for InMemoryStore {
    fn query_ids_descending(
        &self,
        collection: &str,
        predicate: &Predicate,
        upper_bound_exclusive: RecordId,
        limit: usize,
    ) -> StoreResult<Vec<RecordId>> {
        self.with_collection(collection, |records| {
            records
                .range(..upper_bound_exclusive)
                .rev()
                .filter(|(_, record)| predicate.matches(record))
                .take(limit)
                .map(|(id, _)| *id)
                .collect()
        })
    }

    fn query_min_max(
        &self,
        collection: &str,
        predicate: &Predicate,
        lower_bound_exclusive: Option<RecordId>,
        limit: Option<usize>,
    ) -> StoreResult<Option<IdRange>> {
        self.with_collection(collection, |records| {
            let lower = lower_bound_exclusive.map_or(Bound::Unbounded, Bound::Excluded);
            let mut matching = records
                .range((lower, Bound::Unbounded))
                .filter(|(_, record)| predicate.matches(record))
                .map(|(id, _)| *id)
                .take(limit.unwrap_or(usize::MAX));

            let min = matching.next()?;
            let max = matching.last().unwrap_or(min);
            Some(IdRange { min, max })
        })
    }

    fn query_count(&self, collection: &str, predicate: &Predicate) -> StoreResult<u64> {
        self.with_collection(collection, |records| {
            records.values().filter(|r| predicate.matches(r)).count() as u64
        })
    }
}
