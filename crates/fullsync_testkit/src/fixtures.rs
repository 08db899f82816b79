//! Test fixtures for stores, drivers and status directories.
//!
//! Provides convenience functions for setting up common full-sync
//! scenarios.

use fullsync_core::StaticLimits;
use fullsync_engine::{
    DriverConfig, FileStatusStore, FullSyncDriver, MemoryStatusStore, MockTransport,
};
use fullsync_store::{InMemoryStore, Record, RecordStore};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

/// A store holding `collection` with ids `1..=count`.
pub fn sequential_store(collection: &str, count: u64) -> InMemoryStore {
    let store = InMemoryStore::new();
    store
        .insert_ids(collection, 1..=count)
        .expect("sequential ids stay below the sentinel");
    store
}

/// A store holding `collection` with exactly `ids`.
///
/// # Panics
///
/// Panics if `ids` contains `u64::MAX`.
pub fn sparse_store(collection: &str, ids: impl IntoIterator<Item = u64>) -> InMemoryStore {
    let store = InMemoryStore::new();
    store
        .insert_ids(collection, ids)
        .expect("fixture ids exclude the sentinel");
    store
}

/// A store of `count` posts whose `status` cycles through
/// `publish`, `draft` and `trash`.
pub fn blog_store(count: u64) -> InMemoryStore {
    const STATUSES: [&str; 3] = ["publish", "draft", "trash"];
    let store = InMemoryStore::new();
    store.create_collection("posts");
    for id in 1..=count {
        let status = STATUSES[(id % 3) as usize];
        store
            .insert("posts", Record::new(id).with_field("status", json!(status)))
            .expect("blog ids stay below the sentinel");
    }
    store
}

/// A driver over `store` with a mock transport, in-memory statuses and
/// limits for the single module `module`.
pub fn memory_driver<S: RecordStore>(
    store: S,
    module: &str,
    chunk_size: u32,
    max_chunks: u32,
) -> FullSyncDriver<S, MockTransport> {
    driver_with(
        DriverConfig::new(),
        store,
        StaticLimits::new().with_module(module, chunk_size, max_chunks),
    )
}

/// A driver over `store` with a mock transport and in-memory statuses.
pub fn driver_with<S: RecordStore>(
    config: DriverConfig,
    store: S,
    limits: StaticLimits,
) -> FullSyncDriver<S, MockTransport> {
    FullSyncDriver::new(
        config,
        Arc::new(store),
        Arc::new(MockTransport::new()),
        Arc::new(limits),
        Arc::new(MemoryStatusStore::new()),
    )
}

/// A temporary status directory that is removed on drop.
pub struct TempStateDir {
    dir: TempDir,
}

impl TempStateDir {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Returns the directory path.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Opens a status store on the directory.
    pub fn open(&self) -> FileStatusStore {
        FileStatusStore::open(self.dir.path()).expect("Failed to open status directory")
    }
}

impl Default for TempStateDir {
    fn default() -> Self {
        Self::new()
    }
}
