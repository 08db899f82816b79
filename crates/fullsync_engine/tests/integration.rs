//! Integration tests for the full-sync driver.

use fullsync_core::{
    CollectionKind, FullSyncConfig, Predicate, RecordId, StaticLimits, SyncStatus,
};
use fullsync_engine::{
    DriverConfig, EncodedTransport, FileStatusStore, FullSyncDriver, FullSyncPlan,
    LoopbackChannel, MemoryStatusStore, MockTransport, Outcome, PauseReason, SnapshotOutcome,
    StatusStore, SyncError,
};
use fullsync_store::{InMemoryStore, Record, RecordStore};
use proptest::prelude::*;
use serde_json::json;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn store_with(ids: impl IntoIterator<Item = u64>) -> InMemoryStore {
    let store = InMemoryStore::new();
    store.insert_ids("posts", ids).unwrap();
    store
}

fn memory_driver(
    store: InMemoryStore,
    transport: MockTransport,
    chunk_size: u32,
    max_chunks: u32,
) -> FullSyncDriver<InMemoryStore, MockTransport> {
    FullSyncDriver::new(
        DriverConfig::new(),
        Arc::new(store),
        Arc::new(transport),
        Arc::new(StaticLimits::new().with_module("posts", chunk_size, max_chunks)),
        Arc::new(MemoryStatusStore::new()),
    )
}

#[test]
fn failing_transport_leaves_status_untouched() {
    let statuses = Arc::new(
        MemoryStatusStore::new().with_status("posts", SyncStatus::resume_at(RecordId(61), 40)),
    );
    let driver = FullSyncDriver::new(
        DriverConfig::new(),
        Arc::new(store_with(1..=100)),
        Arc::new(MockTransport::failing()),
        Arc::new(StaticLimits::new().with_module("posts", 10, 3)),
        Arc::clone(&statuses) as Arc<dyn StatusStore>,
    );
    let kind = CollectionKind::new("posts");

    for _ in 0..3 {
        let err = driver.run(&kind, &FullSyncConfig::All).unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(
            statuses.load("posts").unwrap(),
            Some(SyncStatus::resume_at(RecordId(61), 40))
        );
    }
    assert_eq!(driver.stats().failures, 3);
}

#[test]
fn every_invocation_respects_chunk_budget() {
    let driver = memory_driver(store_with(1..=1000), MockTransport::new(), 7, 4);
    let kind = CollectionKind::new("posts");

    let mut invocations = 0;
    loop {
        let before = driver.transport().sent().len();
        let invocation = driver.run(&kind, &FullSyncConfig::All).unwrap();
        let sent = driver.transport().sent().len() - before;
        assert!(sent <= 4);
        assert_eq!(sent, invocation.chunks_sent as usize);
        invocations += 1;
        if invocation.outcome.is_finished() {
            break;
        }
        assert_eq!(invocation.outcome, Outcome::Paused(PauseReason::ChunkBudget));
    }

    // 1000 ids in chunks of 7 is 143 chunks, 4 per invocation.
    assert_eq!(invocations, 36);
    assert_eq!(driver.status("posts").unwrap().sent, 1000);
}

#[test]
fn highest_assignable_id_is_sent() {
    let store = InMemoryStore::new();
    assert!(store.insert_ids("posts", [1, 2, u64::MAX]).is_err());
    store.insert_ids("posts", [1, 2, u64::MAX - 1]).unwrap();
    let matching = store.query_count("posts", &Predicate::All).unwrap();

    let driver = memory_driver(store, MockTransport::new(), 2, 10);
    let invocation = driver
        .run(&CollectionKind::new("posts"), &FullSyncConfig::All)
        .unwrap();

    assert!(invocation.outcome.is_finished());
    assert_eq!(invocation.status.sent, matching);
    assert_eq!(
        driver.transport().sent_ids("full_sync_posts"),
        vec![RecordId(u64::MAX - 1), RecordId(2), RecordId(1)]
    );
}

#[test]
fn slow_transport_hits_deadline() {
    let transport = MockTransport::new();
    transport.set_latency(Duration::from_millis(20));
    let driver = FullSyncDriver::new(
        DriverConfig::new().with_time_budget(Duration::from_millis(50)),
        Arc::new(store_with(1..=1000)),
        Arc::new(transport),
        Arc::new(StaticLimits::new().with_module("posts", 10, 1000)),
        Arc::new(MemoryStatusStore::new()),
    );

    let invocation = driver
        .run(&CollectionKind::new("posts"), &FullSyncConfig::All)
        .unwrap();
    assert_eq!(invocation.outcome, Outcome::Paused(PauseReason::Deadline));
    assert!(invocation.chunks_sent >= 1);
    assert!(invocation.chunks_sent < 100);
    assert_eq!(
        driver.status("posts").unwrap().sent,
        u64::from(invocation.chunks_sent) * 10
    );
}

#[test]
fn filtered_sync_sends_only_matches() {
    let store = InMemoryStore::new();
    for id in 1..=30u64 {
        let status = if id % 3 == 0 { "draft" } else { "publish" };
        store
            .insert("posts", Record::new(id).with_field("status", json!(status)))
            .unwrap();
    }
    let driver = memory_driver(store, MockTransport::new(), 4, 100);
    let config = FullSyncConfig::Filter(Predicate::eq("status", json!("draft")));

    let invocation = driver.run(&CollectionKind::new("posts"), &config).unwrap();
    assert!(invocation.outcome.is_finished());
    assert_eq!(
        driver.transport().sent_ids("full_sync_posts"),
        (1..=10).rev().map(|n| RecordId(n * 3)).collect::<Vec<_>>()
    );
}

#[test]
fn file_store_and_wire_path_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let loopback = Arc::new(LoopbackChannel::new());
    let kind = CollectionKind::new("posts");

    for _ in 0..2 {
        let statuses = Arc::new(FileStatusStore::open(dir.path()).unwrap());
        let driver = FullSyncDriver::new(
            DriverConfig::new(),
            Arc::new(store_with(1..=50)),
            Arc::new(EncodedTransport::new(Arc::clone(&loopback))),
            Arc::new(StaticLimits::new().with_module("posts", 10, 3)),
            statuses,
        );
        driver.run(&kind, &FullSyncConfig::All).unwrap();
    }

    assert_eq!(
        loopback.received_ids("full_sync_posts"),
        (1..=50).rev().map(RecordId).collect::<Vec<_>>()
    );

    let statuses = FileStatusStore::open(dir.path()).unwrap();
    let status = statuses.load("posts").unwrap().unwrap();
    assert!(status.finished);
    assert_eq!(status.sent, 50);
}

#[test]
fn second_driver_cannot_share_status_directory() {
    let dir = tempfile::tempdir().unwrap();
    let _held = FileStatusStore::open(dir.path()).unwrap();
    assert!(matches!(
        FileStatusStore::open(dir.path()),
        Err(SyncError::Locked { .. })
    ));
}

#[test]
fn plan_with_snapshot_over_wire() {
    let loopback = Arc::new(LoopbackChannel::new());
    let store = InMemoryStore::new();
    store.insert_ids("posts", 1..=12).unwrap();
    store.insert_ids("comments", 1..=3).unwrap();
    let driver = FullSyncDriver::new(
        DriverConfig::new(),
        Arc::new(store),
        Arc::new(EncodedTransport::new(Arc::clone(&loopback))),
        Arc::new(
            StaticLimits::new()
                .with_module("posts", 5, 10)
                .with_module("comments", 5, 10),
        ),
        Arc::new(MemoryStatusStore::new()),
    );
    let plan = FullSyncPlan::new()
        .with_module(CollectionKind::new("posts"), FullSyncConfig::All)
        .with_module(CollectionKind::new("comments"), FullSyncConfig::All);

    let snapshots = driver.snapshot_sender();
    let options = json!({"blogname": "Example"});
    assert!(matches!(snapshots.send("options", &options).unwrap(), SnapshotOutcome::Sent(_)));

    let deadline = Instant::now() + Duration::from_secs(60);
    assert!(plan.run(&driver, deadline).unwrap().complete);
    assert!(matches!(
        snapshots.send("options", &options).unwrap(),
        SnapshotOutcome::Unchanged(_)
    ));

    let actions: Vec<String> = loopback.received().into_iter().map(|(a, _)| a).collect();
    assert_eq!(
        actions,
        vec![
            "full_sync_snapshot",
            "full_sync_start",
            "full_sync_posts",
            "full_sync_posts",
            "full_sync_posts",
            "full_sync_comments",
            "full_sync_end",
        ]
    );
}

fn sparse_ids() -> impl Strategy<Value = BTreeSet<u64>> {
    prop::collection::btree_set(1u64..5_000, 0..300)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn repeated_invocations_cover_every_id_once(
        ids in sparse_ids(),
        chunk_size in 1u32..40,
        max_chunks in 1u32..6,
    ) {
        let driver = memory_driver(
            store_with(ids.iter().copied()),
            MockTransport::new(),
            chunk_size,
            max_chunks,
        );
        let kind = CollectionKind::new("posts");

        let mut previous = driver.status("posts").unwrap();
        for _ in 0..=ids.len() + 1 {
            let invocation = driver.run(&kind, &FullSyncConfig::All).unwrap();
            let status = invocation.status.clone();
            if let (Some(before), Some(after)) = (previous.last_sent, status.last_sent) {
                prop_assert!(after <= before);
            }
            prop_assert!(status.sent >= previous.sent);
            previous = status;
            if invocation.outcome.is_finished() {
                break;
            }
        }

        prop_assert!(previous.finished);
        prop_assert_eq!(previous.sent, ids.len() as u64);
        let sent = driver.transport().sent_ids("full_sync_posts");
        let expected: Vec<RecordId> = ids.iter().rev().copied().map(RecordId).collect();
        prop_assert_eq!(sent, expected);
    }
}
