//! Batch partitioning of the matching id space.
//!
//! The partitioner walks the id space in ascending order, independently of
//! the driver's descending traversal, and emits `{min, max}` windows of at
//! most `batch_size` matching ids each. Workers can then extract windows in
//! parallel.
//!
//! # Approximate tail
//!
//! If a window query comes back empty before the running maximum reaches
//! the global maximum (records deleted between the two queries, for
//! example), the partitioner closes the space with one synthesized window
//! `{current_min, global_max}` and stops. That window is marked
//! [`BatchRange::approximate`]: it is a bound, not an enumeration, and may
//! hold fewer than `batch_size` ids or none at all.

use crate::error::{CoreError, CoreResult};
use crate::kind::{EntityKind, FullSyncConfig};
use fullsync_store::{IdRange, RecordId, RecordStore};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// One ascending window of the matching id space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRange {
    /// Smallest id in the window.
    pub min: RecordId,
    /// Largest id in the window.
    pub max: RecordId,
    /// Set on a synthesized fallback window.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub approximate: bool,
}

impl BatchRange {
    /// Returns true if `id` lies within the window.
    #[must_use]
    pub fn contains(&self, id: RecordId) -> bool {
        self.min <= id && id <= self.max
    }
}

impl From<IdRange> for BatchRange {
    fn from(range: IdRange) -> Self {
        Self {
            min: range.min,
            max: range.max,
            approximate: false,
        }
    }
}

/// Partitions a module's matching ids into ascending windows.
///
/// Returns `Ok(None)` when the kind has no addressable collection and
/// `Ok(Some(vec![]))` when nothing matches.
///
/// # Errors
///
/// Returns [`CoreError::StoreUnavailable`] if a query fails, and
/// [`CoreError::InvalidOperation`] for a zero `batch_size` or a store
/// whose windows fail to advance.
pub fn partition<S: RecordStore + ?Sized>(
    store: &S,
    kind: &dyn EntityKind,
    config: &FullSyncConfig,
    batch_size: usize,
) -> CoreResult<Option<Vec<BatchRange>>> {
    let Some(collection) = kind.collection() else {
        return Ok(None);
    };
    if batch_size == 0 {
        return Err(CoreError::invalid_operation("batch_size must be positive"));
    }

    let predicate = kind.predicate(config);
    let Some(total) = store.query_min_max(collection, &predicate, None, None)? else {
        return Ok(Some(Vec::new()));
    };

    let mut ranges = Vec::new();
    let mut current_min = total.min;
    let mut current_max: Option<RecordId> = None;

    while current_max.map_or(true, |max| max < total.max) {
        match store.query_min_max(collection, &predicate, current_max, Some(batch_size))? {
            Some(window) => {
                if current_max.is_some_and(|max| window.min <= max) || window.max < window.min {
                    return Err(CoreError::invalid_operation(format!(
                        "store returned window {window} that does not advance past {:?}",
                        current_max.map(RecordId::as_u64)
                    )));
                }
                ranges.push(BatchRange::from(window));
                current_max = Some(window.max);
                current_min = RecordId(window.max.as_u64().saturating_add(1));
            }
            None => {
                warn!(
                    module = kind.name(),
                    min = %current_min,
                    max = %total.max,
                    "id space exhausted early; closing with approximate window"
                );
                ranges.push(BatchRange {
                    min: current_min,
                    max: total.max,
                    approximate: true,
                });
                break;
            }
        }
    }

    debug!(module = kind.name(), windows = ranges.len(), batch_size, "partitioned id space");
    Ok(Some(ranges))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::CollectionKind;
    use fullsync_store::{InMemoryStore, Predicate, StoreResult};
    use proptest::prelude::*;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    fn window(min: u64, max: u64) -> BatchRange {
        BatchRange::from(IdRange::new(min, max))
    }

    #[test]
    fn covers_dense_ids() {
        let store = InMemoryStore::new();
        store.insert_ids("posts", 1..=250).unwrap();
        let kind = CollectionKind::new("posts");

        let ranges = partition(&store, &kind, &FullSyncConfig::All, 100).unwrap().unwrap();
        assert_eq!(ranges, vec![window(1, 100), window(101, 200), window(201, 250)]);
    }

    #[test]
    fn windows_hug_sparse_ids() {
        let store = InMemoryStore::new();
        store.insert_ids("posts", [5, 6, 40, 41, 42, 900]).unwrap();
        let kind = CollectionKind::new("posts");

        let ranges = partition(&store, &kind, &FullSyncConfig::All, 2).unwrap().unwrap();
        assert_eq!(ranges, vec![window(5, 6), window(40, 41), window(42, 900)]);
    }

    #[test]
    fn predicate_applies_to_windows() {
        let store = InMemoryStore::new();
        for id in 1..=10u64 {
            let kind = if id % 2 == 0 { "page" } else { "post" };
            let record = fullsync_store::Record::new(id).with_field("type", json!(kind));
            store.insert("posts", record).unwrap();
        }
        let kind = CollectionKind::new("posts").with_filter(Predicate::eq("type", json!("page")));

        let ranges = partition(&store, &kind, &FullSyncConfig::All, 3).unwrap().unwrap();
        assert_eq!(ranges, vec![window(2, 6), window(8, 10)]);
    }

    #[test]
    fn empty_and_unaddressable() {
        let store = InMemoryStore::new();
        store.create_collection("posts");
        let kind = CollectionKind::new("posts");
        assert_eq!(partition(&store, &kind, &FullSyncConfig::All, 10).unwrap(), Some(vec![]));

        let options = CollectionKind::unaddressable("options");
        assert_eq!(partition(&store, &options, &FullSyncConfig::All, 10).unwrap(), None);
    }

    #[test]
    fn zero_batch_size_rejected() {
        let store = InMemoryStore::new();
        let kind = CollectionKind::new("posts");
        assert!(partition(&store, &kind, &FullSyncConfig::All, 0).is_err());
    }

    #[test]
    fn vanished_tail_gets_approximate_window() {
        // Global bounds report [1, 300] but windows stop after the first batch,
        // as if ids 101..=300 were deleted between queries.
        let store = Scripted::new(IdRange::new(1, 300), vec![Some(IdRange::new(1, 100)), None]);
        let kind = CollectionKind::new("posts");

        let ranges = partition(&store, &kind, &FullSyncConfig::All, 100).unwrap().unwrap();
        assert_eq!(
            ranges,
            vec![
                window(1, 100),
                BatchRange {
                    min: RecordId(101),
                    max: RecordId(300),
                    approximate: true
                }
            ]
        );
        assert_eq!(
            serde_json::to_value(ranges[1]).unwrap(),
            json!({"min": 101, "max": 300, "approximate": true})
        );
        assert_eq!(serde_json::to_value(ranges[0]).unwrap(), json!({"min": 1, "max": 100}));
    }

    #[test]
    fn stalled_store_is_an_error() {
        let store = Scripted::new(
            IdRange::new(1, 300),
            vec![Some(IdRange::new(1, 100)), Some(IdRange::new(50, 120))],
        );
        let kind = CollectionKind::new("posts");
        assert!(partition(&store, &kind, &FullSyncConfig::All, 100).is_err());
    }

    proptest! {
        #[test]
        fn windows_cover_every_id_once(
            ids in proptest::collection::btree_set(1u64..5_000, 0..300),
            batch_size in 1usize..64,
        ) {
            let store = InMemoryStore::new();
            store.create_collection("posts");
            store.insert_ids("posts", ids.iter().copied()).unwrap();
            let kind = CollectionKind::new("posts");

            let ranges = partition(&store, &kind, &FullSyncConfig::All, batch_size)
                .unwrap()
                .unwrap();
            for pair in ranges.windows(2) {
                prop_assert!(pair[0].max < pair[1].min);
            }
            for range in &ranges {
                prop_assert!(!range.approximate);
                let inside = ids.iter().filter(|&&id| range.contains(RecordId(id))).count();
                prop_assert!(inside >= 1 && inside <= batch_size);
            }
            for &id in &ids {
                prop_assert_eq!(
                    ranges.iter().filter(|r| r.contains(RecordId(id))).count(),
                    1
                );
            }
            prop_assert_eq!(ranges.len(), ids.len().div_ceil(batch_size));
        }
    }

    /// Answers the unbounded query with `total`, then replays `windows`.
    struct Scripted {
        total: IdRange,
        windows: Mutex<VecDeque<Option<IdRange>>>,
    }

    impl Scripted {
        fn new(total: IdRange, windows: Vec<Option<IdRange>>) -> Self {
            Self {
                total,
                windows: Mutex::new(windows.into()),
            }
        }
    }

    impl RecordStore for Scripted {
        fn query_ids_descending(
            &self,
            _: &str,
            _: &Predicate,
            _: RecordId,
            _: usize,
        ) -> StoreResult<Vec<RecordId>> {
            Ok(Vec::new())
        }

        fn query_min_max(
            &self,
            _: &str,
            _: &Predicate,
            _: Option<RecordId>,
            limit: Option<usize>,
        ) -> StoreResult<Option<IdRange>> {
            match limit {
                None => Ok(Some(self.total)),
                Some(_) => Ok(self.windows.lock().unwrap().pop_front().flatten()),
            }
        }

        fn query_count(&self, _: &str, _: &Predicate) -> StoreResult<u64> {
            Ok(0)
        }
    }
}
