//! The agents' tool surface.
//!
//! Every capability an agent can invoke implements [`Tool`]; a
//! [`ToolRegistry`] exposes the schemas to the LLM and dispatches calls by
//! name. A tool failure never escapes the registry as an error: it is turned
//! into an error string the model can read and recover from.

mod file_ops;
mod message;
mod registry;
mod spawn;
mod task;
mod terminal;
mod web;

pub use file_ops::{ListDir, ReadFile, WriteFile};
pub use message::SendMessage;
pub use registry::ToolRegistry;
pub use spawn::SpawnSubagent;
pub use task::TaskTool;
pub use terminal::RunCommand;
pub use web::{FetchUrl, WebSearch};

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;

/// Resolve a path against the workspace unless it is already absolute.
pub(crate) fn resolve_path(path_str: &str, workspace: &Path) -> PathBuf {
    let path = Path::new(path_str);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        workspace.join(path)
    }
}

/// A capability an agent can invoke by name with structured arguments.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON Schema of the arguments object.
    fn parameters_schema(&self) -> Value;

    /// Run the tool. The workspace root is the default base for relative
    /// paths and working directories.
    async fn execute(&self, args: Value, workspace: &Path) -> anyhow::Result<String>;
}
