//! Backing-store query trait.

use crate::error::StoreResult;
use crate::predicate::Predicate;
use crate::types::{IdRange, RecordId};
use std::sync::Arc;

/// The query surface a full sync needs from its backing store.
///
/// Implementations only answer id-level questions; fetching full records
/// for transmission belongs to whoever consumes the ids.
///
/// # Invariants
///
/// - All three queries observe the same predicate semantics
/// - `query_ids_descending` returns strictly decreasing ids
/// - Queries are pure reads
/// - No query ever yields [`RecordId::SENTINEL`]; stores reject it on write
///
/// # Implementors
///
/// - [`super::InMemoryStore`] - For tests, the CLI and embedding
pub trait RecordStore: Send + Sync {
    /// Returns up to `limit` matching ids strictly below
    /// `upper_bound_exclusive`, largest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot serve the query.
    fn query_ids_descending(
        &self,
        collection: &str,
        predicate: &Predicate,
        upper_bound_exclusive: RecordId,
        limit: usize,
    ) -> StoreResult<Vec<RecordId>>;

    /// Returns the smallest and largest id among matching ids strictly
    /// above `lower_bound_exclusive`, considering only the first `limit`
    /// of them in ascending order. `None` bounds are unrestricted.
    ///
    /// Returns `Ok(None)` when no id qualifies.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot serve the query.
    fn query_min_max(
        &self,
        collection: &str,
        predicate: &Predicate,
        lower_bound_exclusive: Option<RecordId>,
        limit: Option<usize>,
    ) -> StoreResult<Option<IdRange>>;

    /// Counts matching records.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot serve the query.
    fn query_count(&self, collection: &str, predicate: &Predicate) -> StoreResult<u64>;
}

impl<S: RecordStore + ?Sized> RecordStore for Arc<S> {
    fn query_ids_descending(
        &self,
        collection: &str,
        predicate: &Predicate,
        upper_bound_exclusive: RecordId,
        limit: usize,
    ) -> StoreResult<Vec<RecordId>> {
        (**self).query_ids_descending(collection, predicate, upper_bound_exclusive, limit)
    }

    fn query_min_max(
        &self,
        collection: &str,
        predicate: &Predicate,
        lower_bound_exclusive: Option<RecordId>,
        limit: Option<usize>,
    ) -> StoreResult<Option<IdRange>> {
        (**self).query_min_max(collection, predicate, lower_bound_exclusive, limit)
    }

    fn query_count(&self, collection: &str, predicate: &Predicate) -> StoreResult<u64> {
        (**self).query_count(collection, predicate)
    }
}
