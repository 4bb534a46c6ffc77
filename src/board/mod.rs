//! Shared task board with full-snapshot JSON durability.
//!
//! The board is the substrate agents coordinate through: every agent (and the
//! work loop) reads and mutates the same set of task records. Each mutation
//! rewrites the whole `tasks.json` snapshot via a temp file and rename, so a
//! concurrent reader never observes a half-written board. All read-modify-
//! write paths are serialized behind one async mutex.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

const BOARD_FILE: &str = "tasks.json";

/// Lifecycle state of a task. Any state is reachable from any other; the
/// board itself does not police transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Review,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Review => "review",
            TaskStatus::Done => "done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown task status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for TaskStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "todo" => Ok(TaskStatus::Todo),
            "in_progress" => Ok(TaskStatus::InProgress),
            "review" => Ok(TaskStatus::Review),
            "done" => Ok(TaskStatus::Done),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// A shared work item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Immutable, unique for the lifetime of the board.
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    /// Role identifier of the agent the task is assigned to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update; only supplied fields change.
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub status: Option<TaskStatus>,
    pub assignee: Option<String>,
    pub description: Option<String>,
}

/// Durable, concurrency-safe task store.
pub struct TaskBoard {
    path: PathBuf,
    tasks: Mutex<Vec<Task>>,
}

impl TaskBoard {
    /// Open the board at `<workspace>/tasks.json`.
    ///
    /// A malformed snapshot is logged and the board starts empty; it must not
    /// take the process down.
    pub fn load(workspace: &Path) -> Self {
        let path = workspace.join(BOARD_FILE);
        let tasks = if path.exists() {
            match std::fs::read_to_string(&path).and_then(|raw| {
                serde_json::from_str::<Vec<Task>>(&raw)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
            }) {
                Ok(tasks) => tasks,
                Err(e) => {
                    tracing::error!("Failed to load task board from {}: {e}", path.display());
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };
        Self {
            path,
            tasks: Mutex::new(tasks),
        }
    }

    /// Create a task with a fresh id, status `todo`, persisted before return.
    pub async fn create(
        &self,
        title: impl Into<String>,
        description: impl Into<String>,
        assignee: Option<String>,
    ) -> io::Result<Task> {
        let now = Utc::now();
        let task = Task {
            id: short_id(),
            title: title.into(),
            description: description.into(),
            status: TaskStatus::Todo,
            assignee,
            created_at: now,
            updated_at: now,
        };

        let mut tasks = self.tasks.lock().await;
        tasks.push(task.clone());
        save_snapshot(&self.path, &tasks)?;
        Ok(task)
    }

    /// Apply a partial update. Returns `None` for an unknown id. Every
    /// successful update refreshes `updated_at` and persists before return.
    pub async fn update(&self, id: &str, update: TaskUpdate) -> io::Result<Option<Task>> {
        let mut tasks = self.tasks.lock().await;
        let Some(task) = tasks.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };

        if let Some(status) = update.status {
            task.status = status;
        }
        if let Some(assignee) = update.assignee {
            task.assignee = Some(assignee);
        }
        if let Some(description) = update.description {
            task.description = description;
        }
        task.updated_at = Utc::now();

        let updated = task.clone();
        save_snapshot(&self.path, &tasks)?;
        Ok(Some(updated))
    }

    pub async fn get(&self, id: &str) -> Option<Task> {
        let tasks = self.tasks.lock().await;
        tasks.iter().find(|t| t.id == id).cloned()
    }

    /// List tasks, optionally filtered by status and/or assignee (ANDed).
    /// Order is insertion order and stable across calls absent mutation.
    pub async fn list(&self, status: Option<TaskStatus>, assignee: Option<&str>) -> Vec<Task> {
        let tasks = self.tasks.lock().await;
        tasks
            .iter()
            .filter(|t| status.map_or(true, |s| t.status == s))
            .filter(|t| assignee.map_or(true, |a| t.assignee.as_deref() == Some(a)))
            .cloned()
            .collect()
    }
}

/// Rewrite the whole snapshot atomically: write a temp file, then rename it
/// over the live one.
fn save_snapshot(path: &Path, tasks: &[Task]) -> io::Result<()> {
    let contents = serde_json::to_string_pretty(tasks)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, path)
}

fn short_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[tokio::test]
    async fn test_create_assigns_unique_ids() {
        let dir = tempfile::tempdir().unwrap();
        let board = TaskBoard::load(dir.path());

        let mut ids = HashSet::new();
        for i in 0..50 {
            let task = board
                .create(format!("task {i}"), "do the thing", None)
                .await
                .unwrap();
            assert_eq!(task.status, TaskStatus::Todo);
            ids.insert(task.id);
        }
        assert_eq!(ids.len(), 50);
    }

    #[tokio::test]
    async fn test_update_is_partial_and_preserves_identity() {
        let dir = tempfile::tempdir().unwrap();
        let board = TaskBoard::load(dir.path());

        let task = board.create("title", "before", None).await.unwrap();

        let updated = board
            .update(
                &task.id,
                TaskUpdate {
                    status: Some(TaskStatus::Review),
                    assignee: Some("coder".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.id, task.id);
        assert_eq!(updated.created_at, task.created_at);
        assert_eq!(updated.status, TaskStatus::Review);
        assert_eq!(updated.assignee.as_deref(), Some("coder"));
        // Untouched field survives.
        assert_eq!(updated.description, "before");
        assert!(updated.updated_at >= task.updated_at);
    }

    #[tokio::test]
    async fn test_update_unknown_id_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let board = TaskBoard::load(dir.path());

        let result = board
            .update("missing", TaskUpdate::default())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_list_filters_by_status_and_assignee() {
        let dir = tempfile::tempdir().unwrap();
        let board = TaskBoard::load(dir.path());

        let a = board.create("a", "", Some("coder".into())).await.unwrap();
        let b = board.create("b", "", Some("coder".into())).await.unwrap();
        board.create("c", "", Some("critic".into())).await.unwrap();

        board
            .update(
                &b.id,
                TaskUpdate {
                    status: Some(TaskStatus::Done),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let done = board.list(Some(TaskStatus::Done), None).await;
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].id, b.id);

        let coder_todo = board.list(Some(TaskStatus::Todo), Some("coder")).await;
        assert_eq!(coder_todo.len(), 1);
        assert_eq!(coder_todo[0].id, a.id);

        assert_eq!(board.list(None, None).await.len(), 3);
    }

    #[tokio::test]
    async fn test_snapshot_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let created = {
            let board = TaskBoard::load(dir.path());
            let t1 = board
                .create("one", "first", Some("coder".into()))
                .await
                .unwrap();
            let t2 = board.create("two", "second", None).await.unwrap();
            board
                .update(
                    &t2.id,
                    TaskUpdate {
                        status: Some(TaskStatus::InProgress),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
            vec![t1.id, t2.id]
        };

        let reloaded = TaskBoard::load(dir.path());
        let tasks = reloaded.list(None, None).await;
        assert_eq!(tasks.len(), 2);
        let ids: Vec<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, created.iter().map(String::as_str).collect::<Vec<_>>());
        assert_eq!(tasks[1].status, TaskStatus::InProgress);
        assert_eq!(tasks[0].assignee.as_deref(), Some("coder"));
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(BOARD_FILE), "{ not json").unwrap();

        let board = TaskBoard::load(dir.path());
        assert!(board.list(None, None).await.is_empty());

        // Board stays usable and overwrites the bad snapshot on next save.
        board.create("fresh", "start", None).await.unwrap();
        assert_eq!(TaskBoard::load(dir.path()).list(None, None).await.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_updates_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let board = std::sync::Arc::new(TaskBoard::load(dir.path()));
        let task = board.create("contended", "", None).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..10 {
            let board = board.clone();
            let id = task.id.clone();
            handles.push(tokio::spawn(async move {
                board
                    .update(
                        &id,
                        TaskUpdate {
                            description: Some(format!("writer {i}")),
                            ..Default::default()
                        },
                    )
                    .await
                    .unwrap()
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().is_some());
        }

        // One of the writers won and the snapshot matches memory.
        let final_task = board.get(&task.id).await.unwrap();
        assert!(final_task.description.starts_with("writer "));
        let reloaded = TaskBoard::load(dir.path());
        assert_eq!(
            reloaded.get(&task.id).await.unwrap().description,
            final_task.description
        );
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("todo".parse::<TaskStatus>().unwrap(), TaskStatus::Todo);
        assert_eq!(
            "in_progress".parse::<TaskStatus>().unwrap(),
            TaskStatus::InProgress
        );
        assert!("doing".parse::<TaskStatus>().is_err());
    }
}
