//! Chunk extraction: the next descending slice of ids below a cursor.

use crate::error::{CoreError, CoreResult};
use crate::kind::{EntityKind, FullSyncConfig};
use crate::status::{Chunk, SyncStatus};
use fullsync_store::{Predicate, RecordId, RecordStore};
use tracing::trace;

/// Fetches the next chunk for `status`.
///
/// Returns up to `chunk_size` matching ids strictly below
/// `status.cursor()`, largest first. An empty chunk means traversal is
/// complete. Pure read.
///
/// # Errors
///
/// Returns [`CoreError::StoreUnavailable`] when the store query fails and
/// [`CoreError::InvalidLimits`] for a zero `chunk_size`.
pub fn next_chunk<S: RecordStore + ?Sized>(
    store: &S,
    kind: &dyn EntityKind,
    config: &FullSyncConfig,
    status: &SyncStatus,
    chunk_size: usize,
) -> CoreResult<Chunk> {
    ChunkExtractor::new(store, kind, config).fetch_below(status.cursor(), chunk_size)
}

/// Extractor bound to one module and configuration.
///
/// Resolves the predicate once so repeated extraction during a driver
/// invocation does not rebuild it.
pub struct ChunkExtractor<'a, S: RecordStore + ?Sized> {
    store: &'a S,
    module: &'a str,
    collection: Option<&'a str>,
    predicate: Predicate,
}

impl<'a, S: RecordStore + ?Sized> ChunkExtractor<'a, S> {
    /// Binds an extractor to a module.
    pub fn new(store: &'a S, kind: &'a dyn EntityKind, config: &FullSyncConfig) -> Self {
        Self {
            store,
            module: kind.name(),
            collection: kind.collection(),
            predicate: kind.predicate(config),
        }
    }

    /// The predicate in force.
    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    /// Fetches up to `chunk_size` ids strictly below `cursor`.
    ///
    /// # Errors
    ///
    /// See [`next_chunk`].
    pub fn fetch_below(&self, cursor: RecordId, chunk_size: usize) -> CoreResult<Chunk> {
        if chunk_size == 0 {
            return Err(CoreError::invalid_limits(self.module, "chunk_size must be positive"));
        }
        let Some(collection) = self.collection else {
            return Ok(Chunk::empty());
        };

        let ids = self
            .store
            .query_ids_descending(collection, &self.predicate, cursor, chunk_size)?;

        if ids.len() > chunk_size || ids.first().is_some_and(|&max| max >= cursor) {
            return Err(CoreError::invalid_operation(format!(
                "store returned {} ids outside the requested window below {cursor}",
                ids.len()
            )));
        }
        let chunk = Chunk::new(ids)?;
        trace!(
            module = self.module,
            %cursor,
            len = chunk.len(),
            "extracted chunk"
        );
        Ok(chunk)
    }
}
