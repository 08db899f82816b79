//! Cross-crate properties of extraction, partitioning and the driver.

use fullsync_codec::Value;
use fullsync_core::{partition, CollectionKind, FullSyncConfig, Predicate, RecordId};
use fullsync_engine::{FullSyncDriver, MemoryStatusStore, MockTransport, StatusStore};
use fullsync_testkit::prelude::*;
use proptest::prelude::*;
use serde_json::json;
use std::sync::Arc;

#[test]
fn store_outage_mid_run_resumes_without_gaps() {
    let store = Arc::new(FlakyStore::new(sequential_store("posts", 60)));
    let transport = Arc::new(MockTransport::new());
    let statuses = Arc::new(MemoryStatusStore::new());
    let driver = FullSyncDriver::new(
        fullsync_engine::DriverConfig::new(),
        Arc::clone(&store),
        Arc::clone(&transport),
        Arc::new(fullsync_core::StaticLimits::new().with_module("posts", 10, 100)),
        Arc::clone(&statuses) as Arc<dyn StatusStore>,
    );
    let kind = CollectionKind::new("posts");

    store.fail_after(2);
    let err = driver.run(&kind, &FullSyncConfig::All).unwrap_err();
    assert!(err.is_retryable());
    let status = statuses.load("posts").unwrap().unwrap();
    assert_eq!(status.sent, 20);
    assert_eq!(status.last_sent, Some(RecordId(41)));

    store.heal();
    drive_to_completion(&driver, &kind, &FullSyncConfig::All, 5).unwrap();
    assert_descending_cover(&transport.sent_ids("full_sync_posts"), 1..=60);
}

#[test]
fn partition_windows_and_driver_agree_on_filtered_ids() {
    let store = blog_store(90);
    let kind = CollectionKind::new("posts");
    let config = FullSyncConfig::Filter(Predicate::eq("status", json!("publish")));

    let windows = partition(&store, &kind, &config, 7).unwrap().unwrap();
    let driver = memory_driver(blog_store(90), "posts", 4, 1000);
    drive_to_completion(&driver, &kind, &config, 2).unwrap();
    let sent = driver.transport().sent_ids("full_sync_posts");

    assert_eq!(sent.len(), 30);
    for id in &sent {
        assert_eq!(windows.iter().filter(|w| w.contains(*id)).count(), 1);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn injected_failures_never_lose_or_repeat_ids(
        ids in sparse_ids_strategy(2_000, 120),
        (chunk_size, max_chunks) in limits_strategy(),
        failures in prop::collection::vec(0usize..6, 0..4),
    ) {
        let store = sparse_store("posts", ids.iter().copied());
        let driver = memory_driver(store, "posts", chunk_size, max_chunks);
        let kind = CollectionKind::new("posts");

        for successes in failures {
            driver.transport().fail_after(successes);
            let _ = driver.run(&kind, &FullSyncConfig::All);
            driver.transport().heal();
        }
        drive_to_completion(&driver, &kind, &FullSyncConfig::All, ids.len() + 2).unwrap();

        let sent = driver.transport().sent_ids("full_sync_posts");
        let expected: Vec<RecordId> = ids.iter().rev().copied().map(RecordId).collect();
        prop_assert_eq!(sent, expected);
        prop_assert_eq!(driver.status("posts").unwrap().sent, ids.len() as u64);
    }

    #[test]
    fn every_invocation_stays_within_budget(
        ids in sparse_ids_strategy(5_000, 200),
        (chunk_size, max_chunks) in limits_strategy(),
    ) {
        let store = sparse_store("posts", ids.iter().copied());
        let driver = memory_driver(store, "posts", chunk_size, max_chunks);
        let kind = CollectionKind::new("posts");
        let invocations =
            drive_to_completion(&driver, &kind, &FullSyncConfig::All, ids.len() + 2).unwrap();
        for invocation in &invocations {
            prop_assert!(invocation.chunks_sent <= max_chunks);
            prop_assert!(invocation.ids_sent <= u64::from(chunk_size) * u64::from(max_chunks));
        }
    }

    #[test]
    fn checksum_ignores_key_order(doc in json_strategy()) {
        let value = Value::from_json(&doc).unwrap();
        let reversed = reverse_map_keys(value.clone());
        prop_assert_eq!(
            fullsync_core::checksum(&reversed).unwrap(),
            fullsync_core::checksum_json(&doc).unwrap()
        );
        prop_assert_eq!(
            fullsync_core::checksum(&reversed).unwrap(),
            fullsync_core::checksum(&value).unwrap()
        );
    }
}

/// Rebuilds every map with its pairs in reverse order.
fn reverse_map_keys(value: Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.into_iter().map(reverse_map_keys).collect()),
        Value::Map(pairs) => Value::Map(
            pairs
                .into_iter()
                .rev()
                .map(|(k, v)| (k, reverse_map_keys(v)))
                .collect(),
        ),
        other => other,
    }
}

#[test]
fn pinned_vectors() {
    for vector in checksum_vectors() {
        assert_eq!(vector.compute().unwrap(), vector.expected, "{}", vector.id);
    }
}
