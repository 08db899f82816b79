//! JSON-lines outbox transport.
//!
//! Each transmitted message becomes one line:
//!
//! ```text
//! {"action":"full_sync_posts",
//!  "message":{"type":"chunk","body":{"ids":[80,79],"previous_cursor":81}}}
//! ```

use crate::error::{CliError, CliResult};
use fullsync_engine::{SyncResult, TransportSender};
use fullsync_protocol::SyncMessage;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

/// One line of an outbox file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OutboxLine {
    /// Action the message was sent under.
    pub action: String,
    /// The message.
    pub message: SyncMessage,
}

#[derive(Serialize)]
struct OutboxEntry<'a> {
    action: &'a str,
    message: &'a SyncMessage,
}

/// Appends every message to a file, synced before the send returns.
pub struct JsonLinesOutbox {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonLinesOutbox {
    /// Opens `path` for appending, creating it if needed.
    pub fn open(path: &Path) -> CliResult<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    /// Returns the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every line of an outbox file. A missing file reads as empty.
    pub fn read_all(path: &Path) -> CliResult<Vec<OutboxLine>> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        text.lines()
            .filter(|line| !line.trim().is_empty())
            .enumerate()
            .map(|(n, line)| {
                serde_json::from_str(line)
                    .map_err(|e| CliError::invalid_input(path, format!("line {}: {e}", n + 1)))
            })
            .collect()
    }
}

impl TransportSender for JsonLinesOutbox {
    fn send(&self, action: &str, message: &SyncMessage) -> SyncResult<()> {
        let mut line = serde_json::to_vec(&OutboxEntry { action, message })?;
        line.push(b'\n');

        let mut file = self.file.lock();
        append_line(&mut *file, &line)?;
        file.sync_data()?;
        Ok(())
    }
}

/// A byte sink that can be cut back to an earlier length.
trait AppendTarget: Write {
    fn end(&mut self) -> io::Result<u64>;
    fn truncate(&mut self, len: u64) -> io::Result<()>;
}

impl AppendTarget for File {
    fn end(&mut self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn truncate(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }
}

/// Writes `line` whole or not at all.
fn append_line<W: AppendTarget + ?Sized>(out: &mut W, line: &[u8]) -> io::Result<()> {
    let end = out.end()?;
    if let Err(e) = out.write_all(line).and_then(|()| out.flush()) {
        if let Err(undo) = out.truncate(end) {
            warn!(error = %undo, "could not drop partially written outbox line");
        }
        return Err(e);
    }
    Ok(())
}
