//! # fullsync store
//!
//! The backing-store side of a full sync.
//!
//! A full sync never reads record bodies; it only asks a store three
//! id-level questions (descending ids below a cursor, min/max of an
//! ascending window, and a count), always under a [`Predicate`]. This
//! crate defines that query surface as [`RecordStore`] and ships an
//! in-memory implementation.
//!
//! ## Available stores
//!
//! - [`InMemoryStore`] - ordered in-memory collections
//! - [`Dataset`] - JSON loader producing an [`InMemoryStore`]
//!
//! ## Example
//!
//! ```rust
//! use fullsync_store::{InMemoryStore, Predicate, RecordStore};
//!
//! let store = InMemoryStore::new();
//! store.insert_ids("posts", 1..=250)?;
//! assert_eq!(store.query_count("posts", &Predicate::All)?, 250);
//! # Ok::<(), fullsync_store::StoreError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod dataset;
mod error;
mod memory;
mod predicate;
mod types;

pub use backend::RecordStore;
pub use dataset::Dataset;
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryStore;
pub use predicate::Predicate;
pub use types::{IdRange, Record, RecordId};
