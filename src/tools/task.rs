//! Task board tool for agent cooperation.

use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::board::{Task, TaskBoard, TaskStatus, TaskUpdate};

use super::Tool;

/// Create, update, list and inspect tasks on the shared board.
pub struct TaskTool {
    board: Arc<TaskBoard>,
}

impl TaskTool {
    pub fn new(board: Arc<TaskBoard>) -> Self {
        Self { board }
    }

    fn render(task: &Task) -> String {
        format!(
            "Task: {}\nTitle: {}\nDescription: {}\nStatus: {}\nAssignee: {}\nCreated: {}\nUpdated: {}",
            task.id,
            task.title,
            task.description,
            task.status,
            task.assignee.as_deref().unwrap_or("unassigned"),
            task.created_at,
            task.updated_at,
        )
    }
}

#[async_trait]
impl Tool for TaskTool {
    fn name(&self) -> &str {
        "task"
    }

    fn description(&self) -> &str {
        "Manage tasks on the shared board the whole team works from. Create new tasks, update status/assignee/description, list tasks, or get one task's details."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "action": {
                    "type": "string",
                    "enum": ["create", "update", "list", "get"],
                    "description": "What to do"
                },
                "task_id": {
                    "type": "string",
                    "description": "Task id (required for update and get)"
                },
                "title": {
                    "type": "string",
                    "description": "Task title (required for create)"
                },
                "description": {
                    "type": "string",
                    "description": "Task description (required for create, optional for update)"
                },
                "assignee": {
                    "type": "string",
                    "description": "Agent role to assign the task to (e.g. 'coder')"
                },
                "status": {
                    "type": "string",
                    "enum": ["todo", "in_progress", "review", "done"],
                    "description": "New status (for update)"
                },
                "filter_status": {
                    "type": "string",
                    "enum": ["todo", "in_progress", "review", "done"],
                    "description": "Only list tasks with this status"
                },
                "filter_assignee": {
                    "type": "string",
                    "description": "Only list tasks assigned to this role"
                }
            },
            "required": ["action"]
        })
    }

    async fn execute(&self, args: Value, _workspace: &Path) -> anyhow::Result<String> {
        let action = args["action"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'action' argument"))?;

        match action {
            "create" => {
                let title = args["title"]
                    .as_str()
                    .ok_or_else(|| anyhow::anyhow!("'title' is required for create"))?;
                let description = args["description"]
                    .as_str()
                    .ok_or_else(|| anyhow::anyhow!("'description' is required for create"))?;
                let assignee = args["assignee"].as_str().map(str::to_string);

                let task = self.board.create(title, description, assignee).await?;
                Ok(format!(
                    "Task created: {} - {} (assignee: {})",
                    task.id,
                    task.title,
                    task.assignee.as_deref().unwrap_or("unassigned")
                ))
            }
            "update" => {
                let task_id = args["task_id"]
                    .as_str()
                    .ok_or_else(|| anyhow::anyhow!("'task_id' is required for update"))?;
                let status = args["status"]
                    .as_str()
                    .map(TaskStatus::from_str)
                    .transpose()?;
                let update = TaskUpdate {
                    status,
                    assignee: args["assignee"].as_str().map(str::to_string),
                    description: args["description"].as_str().map(str::to_string),
                };

                match self.board.update(task_id, update).await? {
                    Some(task) => Ok(format!(
                        "Task updated: {} - {} (status: {}, assignee: {})",
                        task.id,
                        task.title,
                        task.status,
                        task.assignee.as_deref().unwrap_or("unassigned")
                    )),
                    None => Ok(format!("Task {task_id} not found.")),
                }
            }
            "list" => {
                let status = args["filter_status"]
                    .as_str()
                    .map(TaskStatus::from_str)
                    .transpose()?;
                let assignee = args["filter_assignee"].as_str();

                let tasks = self.board.list(status, assignee).await;
                if tasks.is_empty() {
                    return Ok("No tasks found.".to_string());
                }

                let lines: Vec<String> = tasks
                    .iter()
                    .map(|t| {
                        format!(
                            "- [{}] {}: {} (assignee: {})",
                            t.status,
                            t.id,
                            t.title,
                            t.assignee.as_deref().unwrap_or("unassigned")
                        )
                    })
                    .collect();
                Ok(lines.join("\n"))
            }
            "get" => {
                let task_id = args["task_id"]
                    .as_str()
                    .ok_or_else(|| anyhow::anyhow!("'task_id' is required for get"))?;
                match self.board.get(task_id).await {
                    Some(task) => Ok(Self::render(&task)),
                    None => Ok(format!("Task {task_id} not found.")),
                }
            }
            other => Err(anyhow::anyhow!("Unknown action '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn tool() -> (TaskTool, Arc<TaskBoard>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let board = Arc::new(TaskBoard::load(dir.path()));
        (TaskTool::new(board.clone()), board, dir)
    }

    #[tokio::test]
    async fn test_create_then_update_via_tool() {
        let (tool, board, dir) = tool().await;

        let created = tool
            .execute(
                json!({"action": "create", "title": "ship it", "description": "finish the release", "assignee": "coder"}),
                dir.path(),
            )
            .await
            .unwrap();
        assert!(created.starts_with("Task created:"));

        let task = board.list(None, None).await.pop().unwrap();
        let updated = tool
            .execute(
                json!({"action": "update", "task_id": task.id, "status": "done"}),
                dir.path(),
            )
            .await
            .unwrap();
        assert!(updated.contains("status: done"));
    }

    #[tokio::test]
    async fn test_unknown_id_reports_in_band() {
        let (tool, _board, dir) = tool().await;
        let result = tool
            .execute(
                json!({"action": "update", "task_id": "nope", "status": "done"}),
                dir.path(),
            )
            .await
            .unwrap();
        assert_eq!(result, "Task nope not found.");
    }

    #[tokio::test]
    async fn test_list_with_filters() {
        let (tool, board, dir) = tool().await;
        board
            .create("alpha task", "", Some("coder".into()))
            .await
            .unwrap();
        board
            .create("beta task", "", Some("critic".into()))
            .await
            .unwrap();

        let listed = tool
            .execute(
                json!({"action": "list", "filter_assignee": "coder"}),
                dir.path(),
            )
            .await
            .unwrap();
        assert!(listed.contains("alpha task"));
        assert!(!listed.contains("beta task"));
    }

    #[tokio::test]
    async fn test_bad_status_is_an_error() {
        let (tool, _board, dir) = tool().await;
        let err = tool
            .execute(
                json!({"action": "update", "task_id": "x", "status": "doing"}),
                dir.path(),
            )
            .await;
        assert!(err.is_err());
    }
}
