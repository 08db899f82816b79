//! A store wrapper that fails on demand.

use fullsync_store::{IdRange, Predicate, RecordId, RecordStore, StoreError, StoreResult};
use std::sync::atomic::{AtomicUsize, Ordering};

const NEVER: usize = usize::MAX;

/// Wraps a [`RecordStore`] and starts failing every query after a
/// configurable number of successes.
#[derive(Debug)]
pub struct FlakyStore<S> {
    inner: S,
    queries: AtomicUsize,
    fail_from: AtomicUsize,
}

impl<S: RecordStore> FlakyStore<S> {
    /// Wraps `inner`; nothing fails until told to.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            queries: AtomicUsize::new(0),
            fail_from: AtomicUsize::new(NEVER),
        }
    }

    /// Serves `successes` more queries, then fails every one after.
    pub fn fail_after(&self, successes: usize) {
        let from = self.queries.load(Ordering::SeqCst).saturating_add(successes);
        self.fail_from.store(from, Ordering::SeqCst);
    }

    /// Serves every query again.
    pub fn heal(&self) {
        self.fail_from.store(NEVER, Ordering::SeqCst);
    }

    /// Number of queries attempted, including failed ones.
    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    /// Returns the wrapped store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn check(&self) -> StoreResult<()> {
        let n = self.queries.fetch_add(1, Ordering::SeqCst);
        if n >= self.fail_from.load(Ordering::SeqCst) {
            return Err(StoreError::unavailable(format!("injected failure on query {n}")));
        }
        Ok(())
    }
}

impl<S: RecordStore> RecordStore for FlakyStore<S> {
    fn query_ids_descending(
        &self,
        collection: &str,
        predicate: &Predicate,
        upper_bound_exclusive: RecordId,
        limit: usize,
    ) -> StoreResult<Vec<RecordId>> {
        self.check()?;
        self.inner
            .query_ids_descending(collection, predicate, upper_bound_exclusive, limit)
    }

    fn query_min_max(
        &self,
        collection: &str,
        predicate: &Predicate,
        lower_bound_exclusive: Option<RecordId>,
        limit: Option<usize>,
    ) -> StoreResult<Option<IdRange>> {
        self.check()?;
        self.inner
            .query_min_max(collection, predicate, lower_bound_exclusive, limit)
    }

    fn query_count(&self, collection: &str, predicate: &Predicate) -> StoreResult<u64> {
        self.check()?;
        self.inner.query_count(collection, predicate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::sequential_store;

    #[test]
    fn fails_after_budget_then_heals() {
        let store = FlakyStore::new(sequential_store("posts", 5));
        store.fail_after(1);

        assert_eq!(store.query_count("posts", &Predicate::All).unwrap(), 5);
        assert!(matches!(
            store.query_count("posts", &Predicate::All),
            Err(StoreError::Unavailable(_))
        ));

        store.heal();
        assert!(store.query_count("posts", &Predicate::All).is_ok());
        assert_eq!(store.queries(), 3);
        assert_eq!(store.inner().len("posts"), 5);
    }
}
