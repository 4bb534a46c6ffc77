//! Shell command execution tool.
//!
//! Commands run through `/bin/sh -c` with the workspace as the working
//! directory, a wall-clock timeout, and output sanitized for LLM consumption.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::process::Command;

use super::Tool;

const DEFAULT_TIMEOUT_SECS: u64 = 60;
const MAX_OUTPUT_CHARS: usize = 10_000;

/// Run a shell command in the workspace.
pub struct RunCommand;

#[async_trait]
impl Tool for RunCommand {
    fn name(&self) -> &str {
        "run_command"
    }

    fn description(&self) -> &str {
        "Run a shell command in the workspace and return its output. Use for builds, tests, git, and anything else the shell can do."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The shell command to run"
                },
                "timeout_secs": {
                    "type": "integer",
                    "description": "Optional: kill the command after this many seconds (default: 60)"
                }
            },
            "required": ["command"]
        })
    }

    async fn execute(&self, args: Value, workspace: &Path) -> anyhow::Result<String> {
        let command = args["command"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'command' argument"))?;
        let timeout = Duration::from_secs(
            args["timeout_secs"]
                .as_u64()
                .unwrap_or(DEFAULT_TIMEOUT_SECS)
                .max(1),
        );

        let child = Command::new("/bin/sh")
            .arg("-c")
            .arg(command)
            .current_dir(workspace)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| anyhow::anyhow!("Failed to spawn command: {e}"))?;

        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|e| anyhow::anyhow!("Command failed: {e}"))?,
            Err(_) => {
                return Err(anyhow::anyhow!(
                    "Command timed out after {} seconds",
                    timeout.as_secs()
                ))
            }
        };

        let stdout = sanitize_output(&output.stdout);
        let stderr = sanitize_output(&output.stderr);

        let mut result = String::new();
        if !output.status.success() {
            result.push_str(&format!(
                "Exit code: {}\n",
                output.status.code().unwrap_or(-1)
            ));
        }
        if !stdout.is_empty() {
            result.push_str(&stdout);
        }
        if !stderr.is_empty() {
            if !result.is_empty() {
                result.push_str("\n--- stderr ---\n");
            }
            result.push_str(&stderr);
        }
        if result.is_empty() {
            result.push_str("(no output)");
        }

        Ok(truncate_chars(&result, MAX_OUTPUT_CHARS))
    }
}

/// Strip binary garbage while preserving readable text.
fn sanitize_output(bytes: &[u8]) -> String {
    let non_printable = bytes
        .iter()
        .filter(|&&b| b < 0x20 && b != b'\n' && b != b'\r' && b != b'\t')
        .count();

    if bytes.len() > 100 && non_printable > bytes.len() / 10 {
        return format!(
            "[Binary output - {} bytes, not shown. Redirect to a file to inspect it.]",
            bytes.len()
        );
    }

    String::from_utf8_lossy(bytes)
        .chars()
        .filter(|&c| c == '\n' || c == '\r' || c == '\t' || (c >= ' ' && c != '\u{FFFD}'))
        .collect()
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let truncated: String = s.chars().take(max).collect();
    format!("{truncated}\n... (output truncated)")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_runs_in_workspace() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker"), "x").unwrap();

        let out = RunCommand
            .execute(json!({"command": "ls"}), dir.path())
            .await
            .unwrap();
        assert!(out.contains("marker"));
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_reported_in_band() {
        let dir = tempfile::tempdir().unwrap();
        let out = RunCommand
            .execute(json!({"command": "exit 3"}), dir.path())
            .await
            .unwrap();
        assert!(out.contains("Exit code: 3"));
    }

    #[tokio::test]
    async fn test_timeout_is_enforced() {
        let dir = tempfile::tempdir().unwrap();
        let err = RunCommand
            .execute(
                json!({"command": "sleep 5", "timeout_secs": 1}),
                dir.path(),
            )
            .await;
        assert!(err.is_err());
    }

    #[test]
    fn test_sanitize_keeps_text_drops_binary() {
        assert_eq!(sanitize_output(b"hello\nworld"), "hello\nworld");
        let binary: Vec<u8> = (0u8..=255).cycle().take(1000).collect();
        assert!(sanitize_output(&binary).starts_with("[Binary output"));
    }
}
