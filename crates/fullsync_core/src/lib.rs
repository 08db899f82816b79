//! # fullsync core
//!
//! Traversal primitives for resumable full synchronization.
//!
//! This crate provides:
//! - Full-sync status with a strictly decreasing cursor
//! - The [`EntityKind`] capability every module implements once
//! - Chunk extraction (descending, bounded, below a cursor)
//! - Batch partitioning (ascending windows for parallel work)
//! - Drift checksums over the versioned canonical encoding
//! - Transmission limits resolution and size estimates
//!
//! ## Key Invariants
//!
//! - The cursor only moves down, and only over ids actually transmitted
//! - `sent` equals the sum of transmitted chunk lengths
//! - A finished status never changes
//! - Partition windows are ascending and never overlap
//!
//! Nothing here transmits or persists; see `fullsync_engine` for the driver.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod checksum;
mod error;
mod estimate;
mod extractor;
mod kind;
mod limits;
mod partition;
mod status;

pub use checksum::{checksum, checksum_json, checksum_of, still_valid, Checksum, ChecksumRegistry};
pub use error::{CoreError, CoreResult};
pub use estimate::{estimate, Estimate};
pub use extractor::{next_chunk, ChunkExtractor};
pub use kind::{CollectionKind, EntityKind, FullSyncConfig};
pub use limits::{LimitsSource, RawLimits, StaticLimits, TransmissionLimits};
pub use partition::{partition, BatchRange};
pub use status::{Chunk, SyncPhase, SyncStatus};

pub use fullsync_store::{Predicate, RecordId};
