//! Checksum-gated snapshots of small, whole-value state.
//!
//! Some state is sent as one value rather than walked by id (site settings,
//! theme configuration). [`SnapshotSender`] skips the send when the value's
//! checksum matches the one recorded after the last successful send.

use crate::error::SyncResult;
use crate::status_store::StatusStore;
use crate::transport::TransportSender;
use fullsync_core::{checksum_json, Checksum};
use fullsync_protocol::{action_name, Snapshot, SyncMessage, SNAPSHOT};
use std::sync::Arc;
use tracing::{debug, info};

/// What [`SnapshotSender::send`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotOutcome {
    /// The value changed and was transmitted.
    Sent(Checksum),
    /// The consumer already has this value.
    Unchanged(Checksum),
}

impl SnapshotOutcome {
    /// The value's checksum.
    pub fn checksum(&self) -> Checksum {
        match self {
            SnapshotOutcome::Sent(sum) | SnapshotOutcome::Unchanged(sum) => *sum,
        }
    }
}

/// Sends named snapshots, skipping unchanged ones.
pub struct SnapshotSender<T: TransportSender> {
    transport: Arc<T>,
    statuses: Arc<dyn StatusStore>,
    action: String,
}

impl<T: TransportSender> SnapshotSender<T> {
    /// Creates a sender posting under `prefix` + `snapshot`.
    pub fn new(transport: Arc<T>, statuses: Arc<dyn StatusStore>, prefix: &str) -> Self {
        Self {
            transport,
            statuses,
            action: action_name(prefix, SNAPSHOT),
        }
    }

    /// Action snapshots are posted under.
    pub fn action(&self) -> &str {
        &self.action
    }

    /// Sends `value` as snapshot `name` unless it is unchanged.
    ///
    /// The checksum is recorded only after the transport accepts the
    /// snapshot, so a failed send is retried in full next time.
    pub fn send(&self, name: &str, value: &serde_json::Value) -> SyncResult<SnapshotOutcome> {
        let sum = checksum_json(value)?;
        let mut registry = self.statuses.load_checksums()?;
        if registry.still_valid(name, sum) {
            debug!(snapshot = name, checksum = %sum, "snapshot unchanged");
            return Ok(SnapshotOutcome::Unchanged(sum));
        }

        let message = SyncMessage::Snapshot(Snapshot {
            name: name.to_string(),
            checksum: sum,
            value: value.clone(),
        });
        self.transport.send(&self.action, &message)?;

        registry.record(name, sum);
        self.statuses.save_checksums(&registry)?;
        info!(snapshot = name, checksum = %sum, "snapshot sent");
        Ok(SnapshotOutcome::Sent(sum))
    }

    /// Forgets `name` so its next send goes out unconditionally.
    pub fn forget(&self, name: &str) -> SyncResult<()> {
        let mut registry = self.statuses.load_checksums()?;
        if registry.forget(name).is_some() {
            self.statuses.save_checksums(&registry)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status_store::MemoryStatusStore;
    use crate::transport::MockTransport;
    use serde_json::json;

    fn sender() -> SnapshotSender<MockTransport> {
        SnapshotSender::new(
            Arc::new(MockTransport::new()),
            Arc::new(MemoryStatusStore::new()),
            "full_sync_",
        )
    }

    #[test]
    fn unchanged_value_is_skipped() {
        let sender = sender();
        let options = json!({"blogname": "Example", "posts_per_page": 10});

        assert!(matches!(sender.send("options", &options).unwrap(), SnapshotOutcome::Sent(_)));
        let reordered = json!({"posts_per_page": 10, "blogname": "Example"});
        assert!(matches!(
            sender.send("options", &reordered).unwrap(),
            SnapshotOutcome::Unchanged(_)
        ));
        assert_eq!(sender.transport.actions(), vec!["full_sync_snapshot"]);

        let changed = json!({"blogname": "Example", "posts_per_page": 20});
        assert!(matches!(sender.send("options", &changed).unwrap(), SnapshotOutcome::Sent(_)));
        assert_eq!(sender.transport.sent().len(), 2);
    }

    #[test]
    fn names_are_tracked_separately() {
        let sender = sender();
        let value = json!({"a": 1});
        sender.send("options", &value).unwrap();
        assert!(matches!(sender.send("theme", &value).unwrap(), SnapshotOutcome::Sent(_)));
    }

    #[test]
    fn failed_send_records_nothing() {
        let sender = sender();
        sender.transport.fail_after(0);
        let value = json!({"a": 1});
        assert!(sender.send("options", &value).is_err());
        assert!(sender.statuses.load_checksums().unwrap().is_empty());

        sender.transport.heal();
        let outcome = sender.send("options", &value).unwrap();
        assert_eq!(outcome, SnapshotOutcome::Sent(Checksum(0x29a2_399a_1bf4_b6d2)));
    }

    #[test]
    fn forget_forces_resend() {
        let sender = sender();
        let value = json!(null);
        sender.send("options", &value).unwrap();
        sender.forget("options").unwrap();
        assert!(matches!(sender.send("options", &value).unwrap(), SnapshotOutcome::Sent(_)));
    }

    #[test]
    fn message_carries_value() {
        let sender = sender();
        sender.send("options", &json!({"a": 2})).unwrap();
        match &sender.transport.sent()[0].message {
            SyncMessage::Snapshot(snapshot) => {
                assert_eq!(snapshot.name, "options");
                assert_eq!(snapshot.value, json!({"a": 2}));
                assert_eq!(snapshot.checksum.to_string(), "e8fca05b419f7c71");
            }
            other => panic!("unexpected message {other:?}"),
        }
    }
}
