//! Message bus: channel-addressed mailboxes with single-owner delivery.
//!
//! Every agent owns exactly one channel (`agent:<role>`). Publishers are
//! decoupled from consumers: anything can publish an [`InboundMessage`] onto
//! a channel, and the channel's owner drains its mailbox one message at a
//! time. Replies travel the other way as [`OutboundMessage`]s through a
//! single process-wide drain.
//!
//! Ordering: each mailbox is an mpsc queue, so messages published by the same
//! sender onto the same channel arrive in publish order. Nothing is promised
//! across senders.

mod events;

pub use events::{InboundMessage, OutboundMessage};

use std::collections::HashMap;

use tokio::sync::{mpsc, Mutex, RwLock};

/// Mailbox depth per channel; publishers back-pressure when a consumer lags.
const MAILBOX_CAPACITY: usize = 256;

#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("channel '{0}' already has an owner")]
    ChannelOwned(String),
}

/// Routes inbound messages to per-channel mailboxes and collects outbound
/// replies for the surface side.
pub struct MessageBus {
    inboxes: RwLock<HashMap<String, mpsc::Sender<InboundMessage>>>,
    outbound_tx: mpsc::Sender<OutboundMessage>,
    outbound_rx: Mutex<Option<mpsc::Receiver<OutboundMessage>>>,
}

impl MessageBus {
    pub fn new() -> Self {
        let (outbound_tx, outbound_rx) = mpsc::channel(MAILBOX_CAPACITY);
        Self {
            inboxes: RwLock::new(HashMap::new()),
            outbound_tx,
            outbound_rx: Mutex::new(Some(outbound_rx)),
        }
    }

    /// Claim exclusive ownership of a channel and get its mailbox.
    ///
    /// The routing table is meant to be populated once at startup; claiming a
    /// channel that already has an owner is an error, not a replacement.
    pub async fn register_channel(
        &self,
        channel: &str,
    ) -> Result<mpsc::Receiver<InboundMessage>, BusError> {
        let mut inboxes = self.inboxes.write().await;
        if inboxes.contains_key(channel) {
            return Err(BusError::ChannelOwned(channel.to_string()));
        }
        let (tx, rx) = mpsc::channel(MAILBOX_CAPACITY);
        inboxes.insert(channel.to_string(), tx);
        tracing::debug!(channel, "channel registered");
        Ok(rx)
    }

    /// Deliver a message to the mailbox of its channel's owner.
    ///
    /// A message addressed to a channel nobody owns is dropped with a
    /// diagnostic; other channels are unaffected.
    pub async fn publish_inbound(&self, msg: InboundMessage) {
        let tx = { self.inboxes.read().await.get(&msg.channel).cloned() };
        match tx {
            Some(tx) => {
                let channel = msg.channel.clone();
                if tx.send(msg).await.is_err() {
                    tracing::warn!(channel = %channel, "mailbox closed, message dropped");
                }
            }
            None => {
                tracing::warn!(
                    channel = %msg.channel,
                    sender = %msg.sender_id,
                    "no owner for channel, message dropped"
                );
            }
        }
    }

    /// Hand a reply back to the surface side.
    pub async fn publish_outbound(&self, msg: OutboundMessage) {
        if self.outbound_tx.send(msg).await.is_err() {
            tracing::warn!("outbound drain closed, reply dropped");
        }
    }

    /// Take the single outbound drain. Returns `None` once taken.
    pub async fn take_outbound(&self) -> Option<mpsc::Receiver<OutboundMessage>> {
        self.outbound_rx.lock().await.take()
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}
