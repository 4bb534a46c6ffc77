//! Message types carried by the bus.

use serde::{Deserialize, Serialize};

/// One unit of work delivered to the owner of a channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Logical address of the recipient, e.g. `agent:manager`.
    pub channel: String,
    /// Who published the message: `agent:<role>`, `subagent:<id>`,
    /// `work_loop`, `heartbeat`, or an external surface id.
    pub sender_id: String,
    /// Conversation/session key a reply correlates back to.
    pub chat_id: String,
    pub content: String,
}

impl InboundMessage {
    pub fn new(
        channel: impl Into<String>,
        sender_id: impl Into<String>,
        chat_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            channel: channel.into(),
            sender_id: sender_id.into(),
            chat_id: chat_id.into(),
            content: content.into(),
        }
    }
}

/// A reply correlated to the inbound message that triggered it.
///
/// The sender is implied by whoever publishes it; the bus does not tag
/// outbound traffic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub channel: String,
    pub chat_id: String,
    pub content: String,
}

impl OutboundMessage {
    pub fn new(
        channel: impl Into<String>,
        chat_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            channel: channel.into(),
            chat_id: chat_id.into(),
            content: content.into(),
        }
    }
}
