//! # fullsync engine
//!
//! Resumable, time-boxed full-sync driver.
//!
//! This crate provides:
//! - The full-sync driver (fetch, budget check, send, persist)
//! - Transport abstraction with a mock and a CBOR channel transport
//! - Status persistence in memory or in a locked directory
//! - Multi-module plans bracketed by start and end markers
//! - Checksum-gated snapshots
//!
//! ## Architecture
//!
//! Each invocation of [`FullSyncDriver::run`] picks up a module where the
//! last one stopped:
//! 1. Resolve transmission limits for the module
//! 2. Load the persisted status
//! 3. Fetch, check budget, send, persist; repeat until paused or finished
//!
//! ## Key Invariants
//!
//! - Status is persisted only after the transport accepted the chunk
//! - No id is credited twice, and no id above the cursor is skipped
//! - An invocation never sends more than `max_chunks` chunks
//! - Missing limits abort before anything is read or recorded

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod channel;
mod config;
mod driver;
mod error;
mod plan;
mod snapshot;
mod status_store;
mod transport;

pub use channel::{Channel, EncodedTransport, LoopbackChannel};
pub use config::DriverConfig;
pub use driver::{
    DriverStats, FullSyncDriver, Invocation, Outcome, PauseReason, SyncListener,
};
pub use error::{SyncError, SyncResult};
pub use plan::{FullSyncPlan, PlanReport};
pub use snapshot::{SnapshotOutcome, SnapshotSender};
pub use status_store::{
    validate_module_name, FileStatusStore, MemoryStatusStore, PlanState, StatusStore,
};
pub use transport::{MockTransport, SentMessage, TransportSender};
