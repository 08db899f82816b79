//! # fullsync testkit
//!
//! Test utilities for fullsync.
//!
//! This crate provides:
//! - Store, driver and status-directory fixtures
//! - A store wrapper that fails on demand
//! - Property-based test generators using proptest
//! - Helpers that drive a module to completion and check coverage
//! - Pinned checksum vectors
//!
//! ## Usage
//!
//! ```rust,ignore
//! use fullsync_testkit::prelude::*;
//!
//! #[test]
//! fn syncs_everything() {
//!     let driver = memory_driver(sequential_store("posts", 100), "posts", 10, 3);
//!     let kind = CollectionKind::new("posts");
//!     let invocations = drive_to_completion(&driver, &kind, &FullSyncConfig::All, 20).unwrap();
//!     assert_eq!(invocations.len(), 4);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod flaky;
pub mod generators;
pub mod integration;
pub mod vectors;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::flaky::*;
    pub use crate::generators::*;
    pub use crate::integration::*;
    pub use crate::vectors::*;
}

pub use fixtures::*;
pub use flaky::*;
pub use generators::*;
pub use integration::*;
pub use vectors::*;
