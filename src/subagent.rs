//! Transient subagents for delegated sub-tasks.
//!
//! A subagent is a one-shot worker: it gets the task text, runs the same
//! bounded tool loop as a full agent with a reduced tool set, announces its
//! result back onto the parent agent's channel, and disappears. Parents can
//! also block on a specific subagent with [`SubagentManager::wait`].

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::agent::run_tool_loop;
use crate::bus::{InboundMessage, MessageBus};
use crate::llm::{ChatMessage, LlmClient};
use crate::tools::{FetchUrl, ListDir, ReadFile, RunCommand, ToolRegistry, WebSearch, WriteFile};

const SUBAGENT_PROMPT: &str = "You are a subagent spawned to complete one specific task. \
Work on the task with the tools available, then reply with a concise report of \
what you did and the outcome. Do not ask follow-up questions.";

/// Spawns and tracks transient subagents for one parent agent.
pub struct SubagentManager {
    llm: Arc<dyn LlmClient>,
    workspace: PathBuf,
    bus: Arc<MessageBus>,
    model: String,
    running: Mutex<HashMap<String, JoinHandle<Option<String>>>>,
}

impl SubagentManager {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        workspace: PathBuf,
        bus: Arc<MessageBus>,
        model: String,
    ) -> Self {
        Self {
            llm,
            workspace,
            bus,
            model,
            running: Mutex::new(HashMap::new()),
        }
    }

    /// Start a subagent on a background task and return its id immediately.
    ///
    /// When the subagent finishes, its result (or failure note) is published
    /// onto `parent_channel` as a normal inbound message from
    /// `subagent:<id>`.
    pub async fn spawn(
        &self,
        task: String,
        context: Option<String>,
        parent_channel: String,
        chat_id: String,
    ) -> String {
        let id = short_id();
        tracing::info!(subagent = %id, channel = %parent_channel, "spawning subagent");

        let handle = tokio::spawn(run_subagent(
            self.llm.clone(),
            self.workspace.clone(),
            self.bus.clone(),
            self.model.clone(),
            id.clone(),
            task,
            context,
            parent_channel,
            chat_id,
        ));

        self.running.lock().await.insert(id.clone(), handle);
        id
    }

    /// Block until the given subagent finishes and return its final text.
    ///
    /// Returns `None` for an unknown id, a panicked worker, or a worker that
    /// produced no final answer. The handle is consumed.
    pub async fn wait(&self, id: &str) -> Option<String> {
        let handle = self.running.lock().await.remove(id)?;
        handle.await.ok().flatten()
    }

    /// Number of subagents spawned and not yet waited on.
    pub async fn running_count(&self) -> usize {
        self.running.lock().await.len()
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_subagent(
    llm: Arc<dyn LlmClient>,
    workspace: PathBuf,
    bus: Arc<MessageBus>,
    model: String,
    id: String,
    task: String,
    context: Option<String>,
    parent_channel: String,
    chat_id: String,
) -> Option<String> {
    // Reduced tool set: no delegation, no board access, no messaging.
    let mut tools = ToolRegistry::new();
    tools.register(Arc::new(ReadFile));
    tools.register(Arc::new(WriteFile));
    tools.register(Arc::new(ListDir));
    tools.register(Arc::new(RunCommand));
    tools.register(Arc::new(WebSearch));
    tools.register(Arc::new(FetchUrl));

    let mut user = format!("Task: {task}");
    if let Some(context) = context {
        user.push_str(&format!("\n\nContext: {context}"));
    }
    let mut messages = vec![ChatMessage::system(SUBAGENT_PROMPT), ChatMessage::user(user)];

    let outcome = run_tool_loop(llm.as_ref(), &model, &tools, &workspace, &mut messages).await;

    let (result, announcement) = match &outcome {
        Ok(Some(text)) => (
            Some(text.clone()),
            format!("Subagent {id} finished.\n\nTask: {task}\n\nResult:\n{text}"),
        ),
        Ok(None) => (
            None,
            format!("Subagent {id} stopped without a final answer.\n\nTask: {task}"),
        ),
        Err(e) => {
            tracing::error!(subagent = %id, "subagent failed: {e:#}");
            (None, format!("Subagent {id} failed: {e:#}\n\nTask: {task}"))
        }
    };

    bus.publish_inbound(InboundMessage::new(
        parent_channel,
        format!("subagent:{id}"),
        chat_id,
        announcement,
    ))
    .await;

    result
}

fn short_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}
