//! Subagent delegation tool.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::subagent::SubagentManager;

use super::Tool;

/// Delegate a sub-task to a transient subagent.
///
/// The spawn returns immediately; the subagent's result arrives later on the
/// owning agent's channel as a new inbound message.
pub struct SpawnSubagent {
    manager: Arc<SubagentManager>,
    parent_channel: String,
    chat_id: String,
}

impl SpawnSubagent {
    pub fn new(
        manager: Arc<SubagentManager>,
        parent_channel: impl Into<String>,
        chat_id: impl Into<String>,
    ) -> Self {
        Self {
            manager,
            parent_channel: parent_channel.into(),
            chat_id: chat_id.into(),
        }
    }
}

#[async_trait]
impl Tool for SpawnSubagent {
    fn name(&self) -> &str {
        "spawn"
    }

    fn description(&self) -> &str {
        "Spawn a subagent to work on a sub-task in the background. Returns immediately; the subagent's report will arrive on your channel when it finishes."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "task": {
                    "type": "string",
                    "description": "What the subagent should do"
                },
                "context": {
                    "type": "string",
                    "description": "Optional: extra context the subagent needs"
                }
            },
            "required": ["task"]
        })
    }

    async fn execute(&self, args: Value, _workspace: &Path) -> anyhow::Result<String> {
        let task = args["task"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'task' argument"))?;
        let context = args["context"].as_str().map(str::to_string);

        let id = self
            .manager
            .spawn(
                task.to_string(),
                context,
                self.parent_channel.clone(),
                self.chat_id.clone(),
            )
            .await;

        Ok(format!(
            "Spawned subagent {id}; its report will be posted back to this channel."
        ))
    }
}
