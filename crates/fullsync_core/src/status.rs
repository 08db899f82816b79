//! Full-sync progress and chunks.

use crate::error::{CoreError, CoreResult};
use fullsync_store::RecordId;
use serde::{Deserialize, Serialize};

/// Where a module's full sync stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    /// Nothing has been transmitted yet.
    NotStarted,
    /// At least one chunk was transmitted; more may remain.
    InProgress,
    /// Extraction came back empty; nothing left to send.
    Finished,
}

/// Persisted progress of one module's full sync.
///
/// # Invariants
///
/// - `last_sent` only ever decreases
/// - `sent` equals the sum of transmitted chunk lengths
/// - Once `finished` is set, the status is immutable
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatus {
    /// Smallest id transmitted so far; `None` until the first chunk.
    pub last_sent: Option<RecordId>,
    /// Number of ids transmitted.
    pub sent: u64,
    /// Whether traversal is complete.
    pub finished: bool,
}

impl SyncStatus {
    /// Creates a not-started status.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a status resuming below `cursor`.
    #[must_use]
    pub fn resume_at(cursor: RecordId, sent: u64) -> Self {
        Self {
            last_sent: Some(cursor),
            sent,
            finished: false,
        }
    }

    /// The exclusive upper bound for the next extraction.
    #[must_use]
    pub fn cursor(&self) -> RecordId {
        self.last_sent.unwrap_or(RecordId::SENTINEL)
    }

    /// Returns the current phase.
    #[must_use]
    pub fn phase(&self) -> SyncPhase {
        if self.finished {
            SyncPhase::Finished
        } else if self.last_sent.is_none() {
            SyncPhase::NotStarted
        } else {
            SyncPhase::InProgress
        }
    }

    /// Credits a successfully transmitted chunk.
    ///
    /// # Errors
    ///
    /// Fails without mutating if the status is finished, the chunk is
    /// empty, or the chunk does not lie strictly below the cursor.
    pub fn record_chunk(&mut self, chunk: &Chunk) -> CoreResult<()> {
        if self.finished {
            return Err(CoreError::invalid_operation("status is already finished"));
        }
        let next = chunk
            .min()
            .ok_or_else(|| CoreError::invalid_operation("cannot record an empty chunk"))?;
        let cursor = self.cursor();
        if next >= cursor || chunk.max().is_some_and(|max| max >= cursor) {
            return Err(CoreError::CursorRegression { cursor, next });
        }
        self.last_sent = Some(next);
        self.sent += chunk.len() as u64;
        Ok(())
    }

    /// Marks traversal complete. Idempotent.
    pub fn mark_finished(&mut self) {
        self.finished = true;
    }
}

/// A bounded run of ids, strictly descending.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<RecordId>", into = "Vec<RecordId>")]
pub struct Chunk {
    ids: Vec<RecordId>,
}

impl Chunk {
    /// Wraps ids, checking they are strictly descending.
    ///
    /// # Errors
    ///
    /// Returns an error if any id is not smaller than its predecessor.
    pub fn new(ids: Vec<RecordId>) -> CoreResult<Self> {
        if ids.windows(2).any(|w| w[0] <= w[1]) {
            return Err(CoreError::invalid_operation(
                "chunk ids must be strictly descending",
            ));
        }
        Ok(Self { ids })
    }

    /// The empty chunk, signalling end of traversal.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The ids, largest first.
    #[must_use]
    pub fn ids(&self) -> &[RecordId] {
        &self.ids
    }

    /// Number of ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// True when extraction found nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Smallest id (the last element).
    #[must_use]
    pub fn min(&self) -> Option<RecordId> {
        self.ids.last().copied()
    }

    /// Largest id (the first element).
    #[must_use]
    pub fn max(&self) -> Option<RecordId> {
        self.ids.first().copied()
    }

    /// Consumes the chunk, returning its ids.
    #[must_use]
    pub fn into_ids(self) -> Vec<RecordId> {
        self.ids
    }
}

impl TryFrom<Vec<RecordId>> for Chunk {
    type Error = CoreError;

    fn try_from(ids: Vec<RecordId>) -> CoreResult<Self> {
        Self::new(ids)
    }
}

impl From<Chunk> for Vec<RecordId> {
    fn from(chunk: Chunk) -> Self {
        chunk.ids
    }
}
