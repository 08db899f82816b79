//! # fullsync protocol
//!
//! Messages a full sync transmits and their wire encoding.
//!
//! This crate provides:
//! - `ChunkPayload`, the `(ids, previous_cursor)` pair sent per chunk
//! - Start and end markers bracketing a multi-module sync
//! - Snapshots for whole named values
//! - Action naming (`full_sync_<module>`)
//! - Canonical CBOR encoding/decoding
//!
//! This is a pure protocol crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod action;
mod messages;

pub use action::{action_name, is_reserved_module, DEFAULT_ACTION_PREFIX, END, SNAPSHOT, START};
pub use messages::{
    ChunkPayload, FullSyncEnd, FullSyncStart, ModuleEstimate, ModuleTotal, Snapshot, SyncMessage,
};
