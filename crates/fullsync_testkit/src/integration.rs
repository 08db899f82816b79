//! Cross-crate helpers for driving syncs in tests.

use fullsync_core::{EntityKind, FullSyncConfig, RecordId};
use fullsync_engine::{FullSyncDriver, Invocation, SyncError, SyncResult, TransportSender};
use fullsync_store::RecordStore;

/// Runs `driver` until `kind` finishes, returning every invocation.
///
/// # Errors
///
/// Propagates the first driver error, or returns a status error if the
/// module is still unfinished after `max_invocations`.
pub fn drive_to_completion<S: RecordStore, T: TransportSender>(
    driver: &FullSyncDriver<S, T>,
    kind: &dyn EntityKind,
    config: &FullSyncConfig,
    max_invocations: usize,
) -> SyncResult<Vec<Invocation>> {
    let mut invocations = Vec::new();
    for _ in 0..max_invocations {
        let invocation = driver.run(kind, config)?;
        let finished = invocation.outcome.is_finished();
        invocations.push(invocation);
        if finished {
            return Ok(invocations);
        }
    }
    Err(SyncError::status(format!(
        "{} unfinished after {max_invocations} invocations",
        kind.name()
    )))
}

/// Checks that `sent` is exactly `expected` in descending order, each id
/// once.
///
/// # Panics
///
/// Panics with a description of the first discrepancy.
pub fn assert_descending_cover(sent: &[RecordId], expected: impl IntoIterator<Item = u64>) {
    let mut expected: Vec<RecordId> = expected.into_iter().map(RecordId).collect();
    expected.sort_unstable_by(|a, b| b.cmp(a));
    expected.dedup();

    for pair in sent.windows(2) {
        assert!(
            pair[0] > pair[1],
            "ids not strictly descending: {} then {}",
            pair[0],
            pair[1]
        );
    }
    assert_eq!(
        sent.len(),
        expected.len(),
        "sent {} ids, expected {}",
        sent.len(),
        expected.len()
    );
    assert_eq!(sent, expected.as_slice());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{memory_driver, sequential_store};
    use fullsync_core::CollectionKind;

    #[test]
    fn drives_until_finished() {
        let driver = memory_driver(sequential_store("posts", 100), "posts", 10, 3);
        let kind = CollectionKind::new("posts");

        let invocations = drive_to_completion(&driver, &kind, &FullSyncConfig::All, 10).unwrap();
        assert_eq!(invocations.len(), 4);
        assert_descending_cover(&driver.transport().sent_ids("full_sync_posts"), 1..=100);
    }

    #[test]
    fn gives_up_after_limit() {
        let driver = memory_driver(sequential_store("posts", 100), "posts", 10, 1);
        let kind = CollectionKind::new("posts");
        assert!(drive_to_completion(&driver, &kind, &FullSyncConfig::All, 3).is_err());
    }

    #[test]
    #[should_panic(expected = "not strictly descending")]
    fn detects_out_of_order_ids() {
        assert_descending_cover(&[RecordId(1), RecordId(2)], [1, 2]);
    }
}
