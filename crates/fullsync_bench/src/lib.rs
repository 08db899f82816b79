//! Benchmark utilities.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use fullsync_store::{InMemoryStore, Record};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;

/// Seed for every generated dataset, so runs compare like with like.
pub const SEED: u64 = 0x5eed;

/// A `posts` collection of `count` records whose ids are spread over
/// `count / density` slots. A density of 1.0 gives ids `1..=count`.
pub fn sparse_store(count: u64, density: f64) -> InMemoryStore {
    let mut rng = StdRng::seed_from_u64(SEED);
    let store = InMemoryStore::new();
    store.create_collection("posts");

    let max_gap = (1.0 / density.clamp(0.01, 1.0)).ceil() as u64;
    let mut id = 0u64;
    for _ in 0..count {
        id += rng.gen_range(1..=max_gap.max(1));
        let status = if rng.gen_bool(0.8) { "publish" } else { "draft" };
        store
            .insert("posts", Record::new(id).with_field("status", json!(status)))
            .expect("generated ids stay below the sentinel");
    }
    store
}

/// A nested JSON document roughly the size of a site's settings.
pub fn settings_document(keys: usize) -> serde_json::Value {
    let mut rng = StdRng::seed_from_u64(SEED);
    let entries = (0..keys).map(|i| {
        let value = match i % 4 {
            0 => json!(rng.gen::<i32>()),
            1 => json!(format!("value-{}", rng.gen::<u16>())),
            2 => json!(rng.gen_bool(0.5)),
            _ => json!({"nested": [rng.gen::<u8>(), rng.gen::<u8>()], "enabled": true}),
        };
        (format!("option_{i}"), value)
    });
    serde_json::Value::Object(entries.collect())
}
