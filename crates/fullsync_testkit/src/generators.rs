//! Property-based test generators using proptest.
//!
//! Provides strategies for generating random test data
//! that maintains required invariants.

use fullsync_core::{FullSyncConfig, RecordId, StaticLimits};
use proptest::prelude::*;
use std::collections::BTreeSet;

/// Strategy for sparse id sets below `max_id`, possibly empty.
///
/// Ids start at 1 and never reach the sentinel.
pub fn sparse_ids_strategy(max_id: u64, max_len: usize) -> impl Strategy<Value = BTreeSet<u64>> {
    prop::collection::btree_set(1..max_id.max(2), 0..=max_len)
}

/// Strategy for `(chunk_size, max_chunks)` pairs, both at least 1.
pub fn limits_strategy() -> impl Strategy<Value = (u32, u32)> {
    (1u32..64, 1u32..8)
}

/// Strategy for a limits table covering `module`.
pub fn static_limits_strategy(module: &'static str) -> impl Strategy<Value = StaticLimits> {
    limits_strategy().prop_map(move |(chunk_size, max_chunks)| {
        StaticLimits::new().with_module(module, chunk_size, max_chunks)
    })
}

/// Strategy for full-sync configurations over ids below `max_id`.
pub fn config_strategy(max_id: u64) -> impl Strategy<Value = FullSyncConfig> {
    prop_oneof![
        Just(FullSyncConfig::All),
        prop::collection::vec(1..max_id.max(2), 0..20)
            .prop_map(|ids| FullSyncConfig::Ids(ids.into_iter().map(RecordId).collect())),
    ]
}

/// Strategy for JSON documents the canonical encoding accepts.
pub fn json_strategy() -> impl Strategy<Value = serde_json::Value> {
    let leaf = prop_oneof![
        Just(serde_json::Value::Null),
        any::<bool>().prop_map(serde_json::Value::from),
        any::<i64>().prop_map(serde_json::Value::from),
        "[a-z]{0,12}".prop_map(serde_json::Value::from),
    ];
    leaf.prop_recursive(3, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(serde_json::Value::Array),
            prop::collection::btree_map("[a-z]{1,8}", inner, 0..6)
                .prop_map(|map| serde_json::Value::Object(map.into_iter().collect())),
        ]
    })
}
