//! Snapshot command implementation.

use super::checksum::read_json;
use crate::error::CliResult;
use crate::outbox::JsonLinesOutbox;
use fullsync_engine::{FileStatusStore, SnapshotOutcome, SnapshotSender};
use fullsync_protocol::DEFAULT_ACTION_PREFIX;
use std::path::Path;
use std::sync::Arc;

/// Sends the JSON document at `file` as snapshot `name` unless unchanged.
pub fn execute(
    state_dir: &Path,
    outbox: &Path,
    name: &str,
    file: &Path,
) -> CliResult<SnapshotOutcome> {
    let value = read_json(file)?;
    let sender = SnapshotSender::new(
        Arc::new(JsonLinesOutbox::open(outbox)?),
        Arc::new(FileStatusStore::open(state_dir)?),
        DEFAULT_ACTION_PREFIX,
    );
    Ok(sender.send(name, &value)?)
}

/// Runs the snapshot command.
pub fn run(
    state_dir: &Path,
    outbox: &Path,
    name: &str,
    file: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    match execute(state_dir, outbox, name, file)? {
        SnapshotOutcome::Sent(sum) => println!("Sent snapshot '{name}' ({sum})"),
        SnapshotOutcome::Unchanged(sum) => println!("Snapshot '{name}' unchanged ({sum})"),
    }
    Ok(())
}
