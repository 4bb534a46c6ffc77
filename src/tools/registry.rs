//! Tool registry: name → capability lookup plus schema export.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;

use crate::llm::ToolDefinition;
use crate::tools::Tool;

/// Closed mapping from tool name to capability.
///
/// Populated once when the owning agent is built; there is no runtime
/// re-registration.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        tracing::debug!(tool = %name, "registered tool");
        self.tools.insert(name, tool);
    }

    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// Schemas for every registered tool, in the shape the LLM expects.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .values()
            .map(|tool| {
                ToolDefinition::function(
                    tool.name(),
                    tool.description(),
                    tool.parameters_schema(),
                )
            })
            .collect()
    }

    /// Invoke a tool by name. Unknown names and execution failures come back
    /// as error strings, never as `Err`, so the model can read them and
    /// recover.
    pub async fn execute(&self, name: &str, args: Value, workspace: &Path) -> String {
        let Some(tool) = self.tools.get(name) else {
            tracing::warn!(tool = name, "unknown tool requested");
            return format!("Error: unknown tool '{name}'");
        };

        match tool.execute(args, workspace).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!(tool = name, "tool failed: {e:#}");
                format!("Error executing {name}: {e:#}")
            }
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
