//! Up-front size estimates for a module's full sync.

use crate::error::CoreResult;
use crate::kind::{EntityKind, FullSyncConfig};
use crate::limits::TransmissionLimits;
use fullsync_store::RecordStore;
use serde::{Deserialize, Serialize};

/// How much a full sync of one module will transmit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Estimate {
    /// Matching records.
    pub records: u64,
    /// Chunks needed at the module's chunk size.
    pub chunks: u64,
}

impl Estimate {
    /// Minimum number of driver invocations at `max_chunks` per run,
    /// assuming no deadline pauses. An empty module still takes one.
    #[must_use]
    pub fn invocations(&self, limits: &TransmissionLimits) -> u64 {
        self.chunks.div_ceil(u64::from(limits.max_chunks.get())).max(1)
    }
}

/// Counts a module's matching records.
///
/// Unaddressable kinds estimate to zero.
///
/// # Errors
///
/// Returns [`crate::CoreError::StoreUnavailable`] if the count query fails.
pub fn estimate<S: RecordStore + ?Sized>(
    store: &S,
    kind: &dyn EntityKind,
    config: &FullSyncConfig,
    limits: &TransmissionLimits,
) -> CoreResult<Estimate> {
    let Some(collection) = kind.collection() else {
        return Ok(Estimate::default());
    };
    let records = store.query_count(collection, &kind.predicate(config))?;
    Ok(Estimate {
        records,
        chunks: records.div_ceil(u64::from(limits.chunk_size.get())),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::CollectionKind;
    use fullsync_store::{InMemoryStore, RecordId};

    #[test]
    fn rounds_chunks_up() {
        let store = InMemoryStore::new();
        store.insert_ids("posts", 1..=95).unwrap();
        let limits = TransmissionLimits::new("posts", 10, 3).unwrap();
        let kind = CollectionKind::new("posts");

        let all = estimate(&store, &kind, &FullSyncConfig::All, &limits).unwrap();
        assert_eq!(all, Estimate { records: 95, chunks: 10 });
        assert_eq!(all.invocations(&limits), 4);

        let some = estimate(
            &store,
            &kind,
            &FullSyncConfig::Ids(vec![RecordId(1), RecordId(500)]),
            &limits,
        )
        .unwrap();
        assert_eq!(some, Estimate { records: 1, chunks: 1 });
    }

    #[test]
    fn exact_multiple_finishes_in_the_last_run() {
        let limits = TransmissionLimits::new("posts", 10, 3).unwrap();
        let full = Estimate { records: 30, chunks: 3 };
        assert_eq!(full.invocations(&limits), 1);
        assert_eq!(Estimate::default().invocations(&limits), 1);
    }

    #[test]
    fn unaddressable_is_zero() {
        let store = InMemoryStore::new();
        let limits = TransmissionLimits::new("options", 10, 3).unwrap();
        let kind = CollectionKind::unaddressable("options");
        assert_eq!(
            estimate(&store, &kind, &FullSyncConfig::All, &limits).unwrap(),
            Estimate::default()
        );
    }
}
