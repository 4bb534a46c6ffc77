//! Autonomous agents and their bounded execution loop.
//!
//! An agent owns one role's identity, tool set and bus channel. It consumes
//! one inbound message at a time and turns it into at most one reply by
//! looping model call → tool dispatch until the model answers in plain text
//! or the iteration ceiling is hit.

mod roles;

pub use roles::{AgentRole, UnknownRole};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use crate::board::TaskBoard;
use crate::bus::{InboundMessage, MessageBus, OutboundMessage};
use crate::llm::{ChatMessage, LlmClient};
use crate::subagent::SubagentManager;
use crate::tools::{
    FetchUrl, ListDir, ReadFile, RunCommand, SendMessage, SpawnSubagent, TaskTool, ToolRegistry,
    WebSearch, WriteFile,
};

/// Ceiling on model-call/tool-dispatch rounds per inbound message. Caps
/// runaway tool-call chains; hitting it yields a null result, not an error.
pub const MAX_ITERATIONS: usize = 15;

/// Reply content used when the loop ends without a final text answer.
pub const NO_RESPONSE: &str = "No response.";

/// A role-bound autonomous agent.
pub struct Agent {
    role: AgentRole,
    id: String,
    workspace: PathBuf,
    model: String,
    llm: Arc<dyn LlmClient>,
    tools: ToolRegistry,
    subagents: Arc<SubagentManager>,
}

impl Agent {
    pub fn new(
        role: AgentRole,
        workspace: PathBuf,
        bus: Arc<MessageBus>,
        llm: Arc<dyn LlmClient>,
        board: Arc<TaskBoard>,
        model: String,
    ) -> Self {
        let subagents = Arc::new(SubagentManager::new(
            llm.clone(),
            workspace.clone(),
            bus.clone(),
            model.clone(),
        ));

        let mut tools = ToolRegistry::new();
        // Communication
        tools.register(Arc::new(SendMessage::new(bus, role)));
        // Shared task board
        tools.register(Arc::new(TaskTool::new(board)));
        // Files, shell, web
        tools.register(Arc::new(ReadFile));
        tools.register(Arc::new(WriteFile));
        tools.register(Arc::new(ListDir));
        tools.register(Arc::new(RunCommand));
        tools.register(Arc::new(WebSearch));
        tools.register(Arc::new(FetchUrl));
        // Delegation; subagent results come back to this agent's channel.
        tools.register(Arc::new(SpawnSubagent::new(
            subagents.clone(),
            role.channel(),
            "direct",
        )));

        Self {
            role,
            id: short_id(),
            workspace,
            model,
            llm,
            tools,
            subagents,
        }
    }

    pub fn role(&self) -> AgentRole {
        self.role
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn subagents(&self) -> &Arc<SubagentManager> {
        &self.subagents
    }

    /// Load the role's system prompt from `<workspace>/<role>/AGENT.md`,
    /// falling back to the built-in role prompt when the file is missing.
    fn load_system_prompt(&self) -> String {
        let prompt_file = self
            .workspace
            .join(self.role.as_str())
            .join("AGENT.md");

        let base = match std::fs::read_to_string(&prompt_file) {
            Ok(text) => text,
            Err(_) => {
                tracing::warn!(
                    role = %self.role,
                    "agent prompt not found at {}, using default",
                    prompt_file.display()
                );
                self.role.default_prompt().to_string()
            }
        };

        format!(
            "# Agent: {role}\n\n{base}\n\n## Context\nYou are part of a multi-agent \
             system. The shared workspace is at: {workspace}",
            role = self.role,
            workspace = self.workspace.display(),
        )
    }

    /// Process one inbound message into a reply addressed back to the
    /// triggering channel/chat.
    ///
    /// Tool failures are handled inside the loop; an LLM backend failure
    /// aborts the whole invocation and no reply is produced.
    pub async fn process_message(&self, msg: &InboundMessage) -> anyhow::Result<OutboundMessage> {
        tracing::info!(
            role = %self.role,
            agent = %self.id,
            sender = %msg.sender_id,
            "processing message"
        );

        let mut messages = vec![
            ChatMessage::system(self.load_system_prompt()),
            ChatMessage::user(msg.content.clone()),
        ];

        let final_content = run_tool_loop(
            self.llm.as_ref(),
            &self.model,
            &self.tools,
            &self.workspace,
            &mut messages,
        )
        .await?;

        Ok(OutboundMessage::new(
            msg.channel.clone(),
            msg.chat_id.clone(),
            final_content.unwrap_or_else(|| NO_RESPONSE.to_string()),
        ))
    }
}

/// Drive a conversation through up to [`MAX_ITERATIONS`] rounds of model
/// call → tool dispatch.
///
/// Returns the model's final text, or `None` if the ceiling was reached with
/// the model still asking for tools. Tool calls run sequentially in the
/// order the model returned them, and each result is appended to the
/// conversation before the next model call.
pub(crate) async fn run_tool_loop(
    llm: &dyn LlmClient,
    model: &str,
    tools: &ToolRegistry,
    workspace: &Path,
    messages: &mut Vec<ChatMessage>,
) -> anyhow::Result<Option<String>> {
    let definitions = tools.definitions();

    for _ in 0..MAX_ITERATIONS {
        let response = llm
            .chat_completion(model, messages, Some(&definitions))
            .await?;

        let calls = match response.tool_calls {
            Some(calls) if !calls.is_empty() => calls,
            _ => return Ok(response.content),
        };

        messages.push(ChatMessage::assistant_tool_calls(
            response.content,
            calls.clone(),
        ));

        for call in calls {
            let result = match parse_arguments(&call.function.arguments) {
                Ok(args) => tools.execute(&call.function.name, args, workspace).await,
                Err(e) => format!("Error: invalid arguments for {}: {e}", call.function.name),
            };
            messages.push(ChatMessage::tool(&call.id, &call.function.name, result));
        }
    }

    tracing::warn!(model, "iteration ceiling reached without a final answer");
    Ok(None)
}

/// Parse a tool call's argument string; an empty string means no arguments.
fn parse_arguments(raw: &str) -> Result<Value, serde_json::Error> {
    if raw.trim().is_empty() {
        return Ok(Value::Object(serde_json::Map::new()));
    }
    serde_json::from_str(raw)
}

fn short_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}
