//! Byte-level channel transport.
//!
//! [`EncodedTransport`] encodes each message to canonical CBOR and posts it
//! through a [`Channel`]. The channel is abstracted so any carrier (HTTP
//! client, queue producer, in-process consumer) can sit underneath.

use crate::error::{SyncError, SyncResult};
use crate::transport::TransportSender;
use fullsync_core::RecordId;
use fullsync_protocol::SyncMessage;
use parking_lot::RwLock;
use std::sync::Arc;

/// Carries encoded messages to the consumer.
pub trait Channel: Send + Sync {
    /// Posts one encoded message under `action`.
    fn post(&self, action: &str, body: Vec<u8>) -> Result<(), String>;

    /// Checks if the channel can currently deliver.
    fn is_healthy(&self) -> bool {
        true
    }
}

impl<C: Channel + ?Sized> Channel for Arc<C> {
    fn post(&self, action: &str, body: Vec<u8>) -> Result<(), String> {
        (**self).post(action, body)
    }

    fn is_healthy(&self) -> bool {
        (**self).is_healthy()
    }
}

/// Channel-backed transport using the CBOR wire encoding.
pub struct EncodedTransport<C: Channel> {
    channel: C,
    last_error: RwLock<Option<String>>,
}

impl<C: Channel> EncodedTransport<C> {
    /// Creates a transport over `channel`.
    pub fn new(channel: C) -> Self {
        Self {
            channel,
            last_error: RwLock::new(None),
        }
    }

    /// Returns the underlying channel.
    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// Returns the last delivery error message.
    pub fn last_error(&self) -> Option<String> {
        self.last_error.read().clone()
    }
}

impl<C: Channel> TransportSender for EncodedTransport<C> {
    fn send(&self, action: &str, message: &SyncMessage) -> SyncResult<()> {
        if !self.channel.is_healthy() {
            return Err(SyncError::transport_retryable("channel is not healthy"));
        }

        let body = message
            .encode()
            .map_err(|e| SyncError::Protocol(format!("failed to encode message: {e}")))?;

        self.channel.post(action, body).map_err(|e| {
            *self.last_error.write() = Some(e.clone());
            SyncError::transport_retryable(e)
        })?;

        *self.last_error.write() = None;
        Ok(())
    }
}

/// An in-process consumer that decodes everything posted to it.
///
/// Useful for testing the wire path without a network.
#[derive(Debug)]
pub struct LoopbackChannel {
    received: RwLock<Vec<(String, SyncMessage)>>,
    healthy: RwLock<bool>,
}

impl LoopbackChannel {
    /// Creates a healthy loopback.
    pub fn new() -> Self {
        Self {
            received: RwLock::new(Vec::new()),
            healthy: RwLock::new(true),
        }
    }

    /// Marks the loopback healthy or not.
    pub fn set_healthy(&self, healthy: bool) {
        *self.healthy.write() = healthy;
    }

    /// Decoded messages with their actions, in arrival order.
    pub fn received(&self) -> Vec<(String, SyncMessage)> {
        self.received.read().clone()
    }

    /// Ids of every chunk received under `action`.
    pub fn received_ids(&self, action: &str) -> Vec<RecordId> {
        self.received
            .read()
            .iter()
            .filter(|(a, _)| a == action)
            .filter_map(|(_, m)| match m {
                SyncMessage::Chunk(payload) => Some(payload.ids.clone()),
                _ => None,
            })
            .flatten()
            .collect()
    }
}

impl Default for LoopbackChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl Channel for LoopbackChannel {
    fn post(&self, action: &str, body: Vec<u8>) -> Result<(), String> {
        let message = SyncMessage::decode(&body).map_err(|e| e.to_string())?;
        self.received.write().push((action.to_string(), message));
        Ok(())
    }

    fn is_healthy(&self) -> bool {
        *self.healthy.read()
    }
}
