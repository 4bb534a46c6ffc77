//! Autonomous work-cycle scheduler.
//!
//! Drives the system absent external messages: each cycle picks up `todo`
//! tasks from the board and hands them to the coordinating agent one at a
//! time, then checks `HEARTBEAT.md` for periodic directives, then sleeps.
//! A failed cycle is logged and the loop degrades to retry-after-sleep; it
//! never takes the process down.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

use crate::agent::Agent;
use crate::board::{Task, TaskBoard, TaskStatus, TaskUpdate};
use crate::bus::InboundMessage;

const HEARTBEAT_FILE: &str = "HEARTBEAT.md";
const ACTIVE_TASKS_HEADING: &str = "## Active Tasks";

/// The endless scheduler loop: `cycle → sleep → cycle → …`.
pub struct WorkLoop {
    workspace: PathBuf,
    board: Arc<TaskBoard>,
    coordinator: Arc<Agent>,
    sleep_interval: Duration,
    heartbeat_interval: Duration,
}

impl WorkLoop {
    pub fn new(
        workspace: PathBuf,
        board: Arc<TaskBoard>,
        coordinator: Arc<Agent>,
        sleep_interval: Duration,
        heartbeat_interval: Duration,
    ) -> Self {
        Self {
            workspace,
            board,
            coordinator,
            sleep_interval,
            heartbeat_interval,
        }
    }

    /// Run until the stop signal flips. The signal only prevents starting a
    /// new cycle; an in-flight cycle always completes.
    pub async fn run(&self, mut stop: watch::Receiver<bool>) {
        tracing::info!(
            coordinator = %self.coordinator.role(),
            "work loop started (cycle every {:?}, heartbeat every {:?})",
            self.sleep_interval,
            self.heartbeat_interval,
        );

        let mut last_heartbeat = Instant::now();
        loop {
            if *stop.borrow() {
                break;
            }

            if let Err(e) = self.run_cycle(&mut last_heartbeat).await {
                tracing::error!("work cycle failed: {e:#}");
            }

            tracing::debug!("cycle complete, sleeping {:?}", self.sleep_interval);
            tokio::select! {
                _ = tokio::time::sleep(self.sleep_interval) => {}
                _ = stop.changed() => {}
            }
        }

        tracing::info!("work loop stopped");
    }

    async fn run_cycle(&self, last_heartbeat: &mut Instant) -> anyhow::Result<()> {
        let todo = self.board.list(Some(TaskStatus::Todo), None).await;
        if !todo.is_empty() {
            tracing::info!("found {} todo tasks", todo.len());
        }

        for task in todo {
            // An earlier task's processing may already have moved this one.
            let Some(current) = self.board.get(&task.id).await else {
                continue;
            };
            if current.status != TaskStatus::Todo {
                tracing::debug!(task = %task.id, status = %current.status, "skipping claimed task");
                continue;
            }
            self.process_task(&current).await?;
        }

        if last_heartbeat.elapsed() >= self.heartbeat_interval {
            self.check_heartbeat().await?;
            *last_heartbeat = Instant::now();
        }

        Ok(())
    }

    /// Claim one task and hand it to the coordinator, blocking until its
    /// loop finishes. The coordinator is responsible for moving the task to
    /// `review`/`done` through its own board access.
    async fn process_task(&self, task: &Task) -> anyhow::Result<()> {
        tracing::info!(task = %task.id, title = %task.title, "processing task");

        self.board
            .update(
                &task.id,
                TaskUpdate {
                    status: Some(TaskStatus::InProgress),
                    ..Default::default()
                },
            )
            .await?;

        let content = format!(
            "Task: {}\nDescription: {}\nAssignee: {}\n\nPlease process this task.",
            task.title,
            task.description,
            task.assignee.as_deref().unwrap_or("unassigned"),
        );
        let msg = InboundMessage::new(
            self.coordinator.role().channel(),
            "work_loop",
            "work_loop",
            content,
        );

        let reply = self.coordinator.process_message(&msg).await?;
        tracing::info!(task = %task.id, "coordinator replied: {}", preview(&reply.content));
        Ok(())
    }

    /// Read the heartbeat document and forward its active directives.
    async fn check_heartbeat(&self) -> anyhow::Result<()> {
        let path = self.workspace.join(HEARTBEAT_FILE);
        if !path.exists() {
            tracing::debug!("{HEARTBEAT_FILE} not found, skipping heartbeat");
            return Ok(());
        }

        let content = tokio::fs::read_to_string(&path).await?;
        let directives = extract_active_tasks(&content);
        if directives.is_empty() {
            tracing::debug!("no active heartbeat directives");
            return Ok(());
        }

        tracing::info!("found {} heartbeat directives", directives.len());
        let content = format!(
            "HEARTBEAT CHECK\n\nThe following periodic tasks need attention:\n\n{}\n\n\
             Please review and process these tasks.",
            directives.join("\n"),
        );
        let msg = InboundMessage::new(
            self.coordinator.role().channel(),
            "heartbeat",
            "heartbeat",
            content,
        );

        let reply = self.coordinator.process_message(&msg).await?;
        tracing::info!("heartbeat reply: {}", preview(&reply.content));
        Ok(())
    }
}

/// Extract the line items under the `## Active Tasks` heading: everything up
/// to the next heading, minus blank lines and `<!--` comment lines.
pub fn extract_active_tasks(content: &str) -> Vec<String> {
    let mut in_section = false;
    let mut items = Vec::new();

    for line in content.lines() {
        if line.contains(ACTIVE_TASKS_HEADING) {
            in_section = true;
            continue;
        }
        let trimmed = line.trim();
        if in_section {
            if trimmed.starts_with("##") {
                break;
            }
            if !trimmed.is_empty() && !trimmed.starts_with("<!--") {
                items.push(trimmed.to_string());
            }
        }
    }

    items
}

fn preview(s: &str) -> String {
    let mut out: String = s.chars().take(100).collect();
    if out.len() < s.len() {
        out.push_str("...");
    }
    out
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::agent::AgentRole;
    use crate::bus::MessageBus;
    use crate::llm::{ChatMessage, ChatResponse, LlmClient, ToolDefinition};

    use super::*;

    #[test]
    fn test_extract_active_tasks() {
        let doc = "## Active Tasks\n- A\n- B\n<!-- skip -->\n## Other";
        assert_eq!(extract_active_tasks(doc), vec!["- A", "- B"]);
    }

    #[test]
    fn test_extract_handles_missing_section() {
        assert!(extract_active_tasks("# Title\n\njust prose\n").is_empty());
        assert!(extract_active_tasks("## Active Tasks\n\n## Next").is_empty());
    }

    #[test]
    fn test_extract_stops_at_next_heading() {
        let doc = "intro\n## Active Tasks\n- keep\n### Sub\n- dropped";
        assert_eq!(extract_active_tasks(doc), vec!["- keep"]);
    }

    /// Counts calls; completes immediately with plain text.
    struct CountingLlm {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LlmClient for CountingLlm {
        async fn chat_completion(
            &self,
            _model: &str,
            _messages: &[ChatMessage],
            _tools: Option<&[ToolDefinition]>,
        ) -> anyhow::Result<ChatResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ChatResponse {
                content: Some("acknowledged".to_string()),
                ..Default::default()
            })
        }
    }

    /// Marks a sibling task `done` on its first call, so the cycle sees a
    /// task leave `todo` mid-flight.
    struct ClaimingLlm {
        board: Arc<TaskBoard>,
        victim: std::sync::Mutex<Option<String>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LlmClient for ClaimingLlm {
        async fn chat_completion(
            &self,
            _model: &str,
            _messages: &[ChatMessage],
            _tools: Option<&[ToolDefinition]>,
        ) -> anyhow::Result<ChatResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let victim = self.victim.lock().unwrap().take();
            if let Some(id) = victim {
                self.board
                    .update(
                        &id,
                        TaskUpdate {
                            status: Some(TaskStatus::Done),
                            ..Default::default()
                        },
                    )
                    .await
                    .unwrap();
            }
            Ok(ChatResponse {
                content: Some("handled".to_string()),
                ..Default::default()
            })
        }
    }

    fn work_loop_with(
        dir: &tempfile::TempDir,
        board: Arc<TaskBoard>,
        llm: Arc<dyn LlmClient>,
    ) -> WorkLoop {
        let bus = Arc::new(MessageBus::new());
        let coordinator = Arc::new(Agent::new(
            AgentRole::Manager,
            dir.path().to_path_buf(),
            bus,
            llm,
            board.clone(),
            "stub".to_string(),
        ));
        WorkLoop::new(
            dir.path().to_path_buf(),
            board,
            coordinator,
            Duration::from_secs(300),
            Duration::from_secs(1800),
        )
    }

    #[tokio::test]
    async fn test_cycle_processes_every_todo_task() {
        let dir = tempfile::tempdir().unwrap();
        let board = Arc::new(TaskBoard::load(dir.path()));
        let t1 = board.create("one", "", None).await.unwrap();
        let t2 = board.create("two", "", None).await.unwrap();

        let llm = Arc::new(CountingLlm {
            calls: AtomicUsize::new(0),
        });
        let work_loop = work_loop_with(&dir, board.clone(), llm.clone());

        let mut last_heartbeat = Instant::now();
        work_loop.run_cycle(&mut last_heartbeat).await.unwrap();

        // Both tasks were forced out of todo and the coordinator ran twice.
        assert_eq!(llm.calls.load(Ordering::SeqCst), 2);
        for id in [&t1.id, &t2.id] {
            assert_eq!(
                board.get(id).await.unwrap().status,
                TaskStatus::InProgress
            );
        }
    }

    #[tokio::test]
    async fn test_cycle_skips_tasks_claimed_mid_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let board = Arc::new(TaskBoard::load(dir.path()));
        let t1 = board.create("one", "", None).await.unwrap();
        let t2 = board.create("two", "", None).await.unwrap();

        // While processing t1, the coordinator marks t2 done.
        let llm = Arc::new(ClaimingLlm {
            board: board.clone(),
            victim: std::sync::Mutex::new(Some(t2.id.clone())),
            calls: AtomicUsize::new(0),
        });
        let work_loop = work_loop_with(&dir, board.clone(), llm.clone());

        let mut last_heartbeat = Instant::now();
        work_loop.run_cycle(&mut last_heartbeat).await.unwrap();

        // t2 was never re-processed: one coordinator run, status untouched.
        assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
        assert_eq!(board.get(&t1.id).await.unwrap().status, TaskStatus::InProgress);
        assert_eq!(board.get(&t2.id).await.unwrap().status, TaskStatus::Done);
    }

    #[tokio::test]
    async fn test_heartbeat_delivers_directives_and_refreshes_stamp() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(HEARTBEAT_FILE),
            "## Active Tasks\n- rotate logs\n## Done\n",
        )
        .unwrap();
        let board = Arc::new(TaskBoard::load(dir.path()));

        let llm = Arc::new(CountingLlm {
            calls: AtomicUsize::new(0),
        });
        let work_loop = WorkLoop {
            heartbeat_interval: Duration::ZERO,
            ..work_loop_with(&dir, board, llm.clone())
        };

        let before = Instant::now();
        let mut last_heartbeat = before;
        work_loop.run_cycle(&mut last_heartbeat).await.unwrap();

        assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
        assert!(last_heartbeat >= before);
    }

    #[tokio::test]
    async fn test_missing_heartbeat_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let board = Arc::new(TaskBoard::load(dir.path()));
        let llm = Arc::new(CountingLlm {
            calls: AtomicUsize::new(0),
        });
        let work_loop = WorkLoop {
            heartbeat_interval: Duration::ZERO,
            ..work_loop_with(&dir, board, llm.clone())
        };

        let mut last_heartbeat = Instant::now();
        work_loop.run_cycle(&mut last_heartbeat).await.unwrap();
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_stop_signal_prevents_next_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let board = Arc::new(TaskBoard::load(dir.path()));
        let llm = Arc::new(CountingLlm {
            calls: AtomicUsize::new(0),
        });
        let work_loop = work_loop_with(&dir, board, llm);

        let (tx, rx) = watch::channel(true);
        // Already stopped: run() must return without sleeping.
        work_loop.run(rx).await;
        drop(tx);
    }
}
