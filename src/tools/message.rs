//! Agent-to-agent messaging tool.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::agent::AgentRole;
use crate::bus::{InboundMessage, MessageBus};

use super::Tool;

/// Send a message to another agent's channel.
///
/// The message re-enters the bus as ordinary inbound traffic, so the
/// recipient processes it exactly like an externally originated message.
pub struct SendMessage {
    bus: Arc<MessageBus>,
    sender: AgentRole,
}

impl SendMessage {
    pub fn new(bus: Arc<MessageBus>, sender: AgentRole) -> Self {
        Self { bus, sender }
    }
}

#[async_trait]
impl Tool for SendMessage {
    fn name(&self) -> &str {
        "send_message"
    }

    fn description(&self) -> &str {
        "Send a message to another agent on the team (e.g. 'researcher', 'coder', 'manager', 'critic'). Use this to delegate work or report results."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "recipient_role": {
                    "type": "string",
                    "description": "Role of the recipient agent: 'manager', 'researcher', 'coder', or 'critic'"
                },
                "content": {
                    "type": "string",
                    "description": "The message content"
                }
            },
            "required": ["recipient_role", "content"]
        })
    }

    async fn execute(&self, args: Value, _workspace: &Path) -> anyhow::Result<String> {
        let recipient = args["recipient_role"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'recipient_role' argument"))?;
        let content = args["content"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'content' argument"))?;

        let recipient = AgentRole::from_str(recipient)?;
        if recipient == self.sender {
            return Err(anyhow::anyhow!("Refusing to send a message to yourself"));
        }

        self.bus
            .publish_inbound(InboundMessage::new(
                recipient.channel(),
                self.sender.channel(),
                "direct",
                content,
            ))
            .await;

        Ok(format!("Message sent to {}", recipient.channel()))
    }
}
