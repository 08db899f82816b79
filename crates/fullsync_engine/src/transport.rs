//! Transport layer abstraction for full-sync messages.

use crate::error::{SyncError, SyncResult};
use fullsync_core::RecordId;
use fullsync_protocol::SyncMessage;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Delivers messages to the remote consumer.
///
/// A send either succeeds, meaning the consumer has the message, or fails
/// without side effects the driver needs to know about. Calls may block
/// on I/O; the driver never interrupts one in flight.
pub trait TransportSender: Send + Sync {
    /// Sends `message` under `action`.
    fn send(&self, action: &str, message: &SyncMessage) -> SyncResult<()>;
}

impl<T: TransportSender + ?Sized> TransportSender for Arc<T> {
    fn send(&self, action: &str, message: &SyncMessage) -> SyncResult<()> {
        (**self).send(action, message)
    }
}

/// A message accepted by [`MockTransport`].
#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    /// Action it was sent under.
    pub action: String,
    /// The message.
    pub message: SyncMessage,
}

/// A mock transport for testing.
///
/// Records every accepted message and can be told to start failing after
/// a number of successful sends.
#[derive(Debug, Default)]
pub struct MockTransport {
    sent: RwLock<Vec<SentMessage>>,
    fail_after: RwLock<Option<usize>>,
    latency: RwLock<Duration>,
    attempts: AtomicUsize,
}

impl MockTransport {
    /// Creates a mock that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock that rejects every send.
    pub fn failing() -> Self {
        let transport = Self::new();
        transport.fail_after(0);
        transport
    }

    /// Accepts `successes` more sends, then fails every one after.
    pub fn fail_after(&self, successes: usize) {
        *self.fail_after.write() = Some(self.sent.read().len() + successes);
    }

    /// Accepts every send again.
    pub fn heal(&self) {
        *self.fail_after.write() = None;
    }

    /// Sleeps this long inside every send.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.write() = latency;
    }

    /// Accepted messages, in order.
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.read().clone()
    }

    /// Ids of every accepted chunk under `action`, in send order.
    pub fn sent_ids(&self, action: &str) -> Vec<RecordId> {
        self.sent
            .read()
            .iter()
            .filter(|m| m.action == action)
            .filter_map(|m| match &m.message {
                SyncMessage::Chunk(payload) => Some(payload.ids.clone()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    /// Actions of accepted messages, in order.
    pub fn actions(&self) -> Vec<String> {
        self.sent.read().iter().map(|m| m.action.clone()).collect()
    }

    /// Number of sends attempted, including failed ones.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl TransportSender for MockTransport {
    fn send(&self, action: &str, message: &SyncMessage) -> SyncResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let latency = *self.latency.read();
        if !latency.is_zero() {
            std::thread::sleep(latency);
        }

        let mut sent = self.sent.write();
        if self.fail_after.read().is_some_and(|limit| sent.len() >= limit) {
            return Err(SyncError::transport_retryable("mock transport refused send"));
        }
        sent.push(SentMessage {
            action: action.to_string(),
            message: message.clone(),
        });
        Ok(())
    }
}
