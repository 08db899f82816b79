//! The resumable, time-boxed full-sync driver.
//!
//! One invocation walks a module's matching ids downward from its persisted
//! cursor, sending one chunk per iteration:
//!
//! ```text
//! not-started ──► in-progress ──► finished
//!                   │    ▲
//!                   ▼    │
//!                  paused (budget, deadline or failure)
//! ```
//!
//! Each iteration fetches the next chunk, then checks the chunk budget and
//! the deadline, and only then transmits. A chunk fetched but not sent is
//! discarded; the status is updated strictly after a successful send, so a
//! failed or interrupted invocation can always be retried.

use crate::config::DriverConfig;
use crate::error::{SyncError, SyncResult};
use crate::snapshot::SnapshotSender;
use crate::status_store::{validate_module_name, StatusStore};
use crate::transport::TransportSender;
use fullsync_core::{
    Chunk, ChunkExtractor, EntityKind, FullSyncConfig, LimitsSource, SyncStatus,
};
use fullsync_protocol::{action_name, is_reserved_module, ChunkPayload, SyncMessage};
use fullsync_store::RecordStore;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

/// Why an invocation stopped before the module finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseReason {
    /// `max_chunks` chunks were sent.
    ChunkBudget,
    /// The deadline passed.
    Deadline,
}

/// How an invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Extraction came back empty; the module is done.
    Finished,
    /// Budget exhausted; call again to continue.
    Paused(PauseReason),
}

impl Outcome {
    /// Returns true if the module is done.
    pub fn is_finished(&self) -> bool {
        matches!(self, Outcome::Finished)
    }
}

/// Result of one driver invocation.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Identifier carried on this invocation's tracing span.
    pub invocation_id: Uuid,
    /// Module driven.
    pub module: String,
    /// Status after the invocation, as persisted.
    pub status: SyncStatus,
    /// How it ended.
    pub outcome: Outcome,
    /// Chunks sent by this invocation.
    pub chunks_sent: u32,
    /// Ids sent by this invocation.
    pub ids_sent: u64,
    /// Wall-clock time spent.
    pub elapsed: Duration,
}

/// Statistics accumulated across invocations.
#[derive(Debug, Clone, Default)]
pub struct DriverStats {
    /// Invocations started.
    pub invocations: u64,
    /// Chunks sent.
    pub chunks_sent: u64,
    /// Ids sent.
    pub ids_sent: u64,
    /// Invocations that paused.
    pub pauses: u64,
    /// Invocations that observed the end of traversal.
    pub finishes: u64,
    /// Invocations that failed.
    pub failures: u64,
    /// Last error message.
    pub last_error: Option<String>,
}

/// Observer of driver progress.
///
/// Registered with [`FullSyncDriver::add_listener`]. Callbacks run on the
/// driver's thread after the status they report has been persisted.
pub trait SyncListener: Send + Sync {
    /// A chunk was sent and credited.
    fn on_chunk_sent(&self, _module: &str, _chunk: &Chunk, _status: &SyncStatus) {}

    /// An invocation paused.
    fn on_paused(&self, _module: &str, _reason: PauseReason, _status: &SyncStatus) {}

    /// A module finished.
    fn on_finished(&self, _module: &str, _status: &SyncStatus) {}
}

/// Drives full syncs of individual modules.
pub struct FullSyncDriver<S: RecordStore, T: TransportSender> {
    config: DriverConfig,
    store: Arc<S>,
    transport: Arc<T>,
    limits: Arc<dyn LimitsSource>,
    statuses: Arc<dyn StatusStore>,
    listeners: RwLock<Vec<Arc<dyn SyncListener>>>,
    stats: RwLock<DriverStats>,
}

impl<S: RecordStore, T: TransportSender> FullSyncDriver<S, T> {
    /// Creates a driver.
    pub fn new(
        config: DriverConfig,
        store: Arc<S>,
        transport: Arc<T>,
        limits: Arc<dyn LimitsSource>,
        statuses: Arc<dyn StatusStore>,
    ) -> Self {
        Self {
            config,
            store,
            transport,
            limits,
            statuses,
            listeners: RwLock::new(Vec::new()),
            stats: RwLock::new(DriverStats::default()),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Returns the backing store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Returns the transport.
    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Returns the limits source.
    pub fn limits(&self) -> &Arc<dyn LimitsSource> {
        &self.limits
    }

    /// Returns the status store.
    pub fn statuses(&self) -> &Arc<dyn StatusStore> {
        &self.statuses
    }

    /// Gets the current stats.
    pub fn stats(&self) -> DriverStats {
        self.stats.read().clone()
    }

    /// Registers a listener.
    pub fn add_listener(&self, listener: Arc<dyn SyncListener>) {
        self.listeners.write().push(listener);
    }

    /// Persisted status of `module`, not-started if none.
    pub fn status(&self, module: &str) -> SyncResult<SyncStatus> {
        Ok(self.statuses.load(module)?.unwrap_or_default())
    }

    /// Forgets `module`'s progress so the next run starts from the top.
    pub fn reset(&self, module: &str) -> SyncResult<()> {
        info!(module, "resetting full sync status");
        self.statuses.clear(module)
    }

    /// Snapshot sender sharing this driver's transport and status store.
    pub fn snapshot_sender(&self) -> SnapshotSender<T> {
        SnapshotSender::new(
            Arc::clone(&self.transport),
            Arc::clone(&self.statuses),
            &self.config.action_prefix,
        )
    }

    /// Runs one invocation bounded by the configured time budget.
    pub fn run(&self, kind: &dyn EntityKind, config: &FullSyncConfig) -> SyncResult<Invocation> {
        let start = Instant::now();
        let deadline = start
            .checked_add(self.config.time_budget)
            .unwrap_or_else(|| start + Duration::from_secs(u64::from(u32::MAX)));
        self.run_until(kind, config, deadline)
    }

    /// Runs one invocation that sends nothing once `deadline` has passed.
    ///
    /// # Errors
    ///
    /// - [`SyncError::Core`] wrapping `ConfigurationMissing` or
    ///   `InvalidLimits` before anything is read or recorded
    /// - `StoreUnavailable` or [`SyncError::Transport`] mid-run, after every
    ///   chunk that did succeed has been persisted
    pub fn run_until(
        &self,
        kind: &dyn EntityKind,
        config: &FullSyncConfig,
        deadline: Instant,
    ) -> SyncResult<Invocation> {
        let invocation_id = Uuid::new_v4();
        let module = kind.name();
        let span = info_span!("full_sync", module, invocation = %invocation_id);
        let _enter = span.enter();

        self.stats.write().invocations += 1;
        let result = self.drive(kind, config, deadline, invocation_id);
        match &result {
            Ok(invocation) => {
                let mut stats = self.stats.write();
                stats.chunks_sent += u64::from(invocation.chunks_sent);
                stats.ids_sent += invocation.ids_sent;
                match invocation.outcome {
                    Outcome::Finished => stats.finishes += 1,
                    Outcome::Paused(_) => stats.pauses += 1,
                }
            }
            Err(e) => {
                warn!(error = %e, retryable = e.is_retryable(), "full sync invocation failed");
                let mut stats = self.stats.write();
                stats.failures += 1;
                stats.last_error = Some(e.to_string());
            }
        }
        result
    }

    fn drive(
        &self,
        kind: &dyn EntityKind,
        config: &FullSyncConfig,
        deadline: Instant,
        invocation_id: Uuid,
    ) -> SyncResult<Invocation> {
        let started = Instant::now();
        let module = kind.name();
        validate_module_name(module)?;
        if is_reserved_module(module) {
            return Err(SyncError::invalid_module(module, "name is reserved for markers"));
        }

        let limits = self.limits.limits_for(module)?;
        let mut status = self.status(module)?;
        let mut run = Run {
            chunks_sent: 0,
            ids_sent: 0,
            dirty: false,
        };

        if status.finished {
            debug!("module already finished");
            return Ok(run.finish(invocation_id, module, status, Outcome::Finished, started));
        }

        let extractor = ChunkExtractor::new(&*self.store, kind, config);
        let action = action_name(&self.config.action_prefix, module);

        let outcome = loop {
            let chunk = match extractor.fetch_below(status.cursor(), limits.chunk_len()) {
                Ok(chunk) => chunk,
                Err(e) => return Err(self.abort(module, &status, &run, e.into())),
            };

            if chunk.is_empty() {
                status.mark_finished();
                self.statuses.save(module, &status)?;
                run.dirty = false;
                info!(sent = status.sent, "full sync finished");
                self.notify(|l| l.on_finished(module, &status));
                break Outcome::Finished;
            }

            let reason = if run.chunks_sent >= limits.max_chunks.get() {
                Some(PauseReason::ChunkBudget)
            } else if Instant::now() >= deadline {
                Some(PauseReason::Deadline)
            } else {
                None
            };
            if let Some(reason) = reason {
                if run.dirty {
                    self.statuses.save(module, &status)?;
                    run.dirty = false;
                }
                info!(
                    cursor = %status.cursor(),
                    sent = status.sent,
                    ?reason,
                    "full sync paused"
                );
                self.notify(|l| l.on_paused(module, reason, &status));
                break Outcome::Paused(reason);
            }

            let previous_cursor = status.cursor();
            let payload = ChunkPayload::new(chunk.ids().to_vec(), previous_cursor);
            let message = SyncMessage::Chunk(payload);
            if let Err(e) = self.transport.send(&action, &message) {
                return Err(self.abort(module, &status, &run, e));
            }

            if let Err(e) = status.record_chunk(&chunk) {
                return Err(self.abort(module, &status, &run, e.into()));
            }
            run.chunks_sent += 1;
            run.ids_sent += chunk.len() as u64;
            if self.config.persist_each_chunk {
                self.statuses.save(module, &status)?;
            } else {
                run.dirty = true;
            }

            debug!(
                cursor = %status.cursor(),
                chunk_len = chunk.len(),
                sent = status.sent,
                "chunk sent"
            );
            self.notify(|l| l.on_chunk_sent(module, &chunk, &status));
        };

        Ok(run.finish(invocation_id, module, status, outcome, started))
    }

    /// Flushes unpersisted progress before surfacing `error`.
    fn abort(&self, module: &str, status: &SyncStatus, run: &Run, error: SyncError) -> SyncError {
        if run.dirty {
            if let Err(e) = self.statuses.save(module, status) {
                warn!(error = %e, "could not persist progress while aborting");
            }
        }
        error
    }

    fn notify(&self, f: impl Fn(&dyn SyncListener)) {
        // Listeners may register further listeners; call out unlocked.
        let listeners = self.listeners.read().clone();
        for listener in &listeners {
            f(listener.as_ref());
        }
    }
}

struct Run {
    chunks_sent: u32,
    ids_sent: u64,
    dirty: bool,
}

impl Run {
    fn finish(
        &self,
        invocation_id: Uuid,
        module: &str,
        status: SyncStatus,
        outcome: Outcome,
        started: Instant,
    ) -> Invocation {
        Invocation {
            invocation_id,
            module: module.to_string(),
            status,
            outcome,
            chunks_sent: self.chunks_sent,
            ids_sent: self.ids_sent,
            elapsed: started.elapsed(),
        }
    }
}
