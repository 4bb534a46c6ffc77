//! File operation tools: read, write, list.
//!
//! Paths can be absolute or relative to the agent's workspace.

use std::path::Path;

use async_trait::async_trait;
use serde_json::{json, Value};
use walkdir::WalkDir;

use super::{resolve_path, Tool};

/// Read the contents of a file, line-numbered for easy reference.
pub struct ReadFile;

#[async_trait]
impl Tool for ReadFile {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read the contents of a file. Returns the text with line numbers. Use this to inspect files before editing them."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Path to the file, absolute or relative to the workspace"
                },
                "start_line": {
                    "type": "integer",
                    "description": "Optional: first line to return (1-indexed)"
                },
                "end_line": {
                    "type": "integer",
                    "description": "Optional: last line to return (inclusive)"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, args: Value, workspace: &Path) -> anyhow::Result<String> {
        let path = args["path"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'path' argument"))?;

        let full_path = resolve_path(path, workspace);
        if !full_path.exists() {
            return Err(anyhow::anyhow!("File not found: {path}"));
        }

        let content = tokio::fs::read_to_string(&full_path).await?;
        let lines: Vec<&str> = content.lines().collect();
        let total = lines.len();

        let start = args["start_line"]
            .as_u64()
            .map(|n| (n as usize).saturating_sub(1))
            .unwrap_or(0)
            .min(total);
        let end = args["end_line"]
            .as_u64()
            .map(|n| n as usize)
            .unwrap_or(total)
            .min(total);
        let (start, end) = if start > end { (end, start) } else { (start, end) };

        let numbered: Vec<String> = lines[start..end]
            .iter()
            .enumerate()
            .map(|(i, line)| format!("{:4}| {}", start + i + 1, line))
            .collect();

        Ok(numbered.join("\n"))
    }
}

/// Write content to a file (create or overwrite).
pub struct WriteFile;

#[async_trait]
impl Tool for WriteFile {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Write content to a file. Creates the file if it doesn't exist, overwrites if it does, and creates parent directories as needed."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Path to the file, absolute or relative to the workspace"
                },
                "content": {
                    "type": "string",
                    "description": "The content to write"
                }
            },
            "required": ["path", "content"]
        })
    }

    async fn execute(&self, args: Value, workspace: &Path) -> anyhow::Result<String> {
        let path = args["path"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'path' argument"))?;
        let content = args["content"]
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("Missing 'content' argument"))?;

        let full_path = resolve_path(path, workspace);
        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full_path, content).await?;

        Ok(format!("Wrote {} bytes to {path}", content.len()))
    }
}

/// List the contents of a directory.
pub struct ListDir;

#[async_trait]
impl Tool for ListDir {
    fn name(&self) -> &str {
        "list_dir"
    }

    fn description(&self) -> &str {
        "List files and directories under a path, up to two levels deep. Directories end with '/'."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Directory to list, absolute or relative to the workspace (default: the workspace root)"
                }
            }
        })
    }

    async fn execute(&self, args: Value, workspace: &Path) -> anyhow::Result<String> {
        let path = args["path"].as_str().unwrap_or(".");
        let full_path = resolve_path(path, workspace);

        if !full_path.is_dir() {
            return Err(anyhow::anyhow!("Not a directory: {path}"));
        }

        let mut entries = Vec::new();
        for entry in WalkDir::new(&full_path)
            .min_depth(1)
            .max_depth(2)
            .sort_by_file_name()
        {
            let entry = entry?;
            let rel = entry
                .path()
                .strip_prefix(&full_path)
                .unwrap_or(entry.path());
            let suffix = if entry.file_type().is_dir() { "/" } else { "" };
            entries.push(format!("{}{suffix}", rel.display()));
        }

        if entries.is_empty() {
            Ok("(empty)".to_string())
        } else {
            Ok(entries.join("\n"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();

        WriteFile
            .execute(
                json!({"path": "notes/todo.txt", "content": "first\nsecond"}),
                dir.path(),
            )
            .await
            .unwrap();

        let read = ReadFile
            .execute(json!({"path": "notes/todo.txt"}), dir.path())
            .await
            .unwrap();
        assert!(read.contains("1| first"));
        assert!(read.contains("2| second"));
    }

    #[tokio::test]
    async fn test_read_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = ReadFile
            .execute(json!({"path": "ghost.txt"}), dir.path())
            .await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn test_list_dir_marks_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("file.txt"), "x").unwrap();

        let listed = ListDir.execute(json!({}), dir.path()).await.unwrap();
        assert!(listed.contains("sub/"));
        assert!(listed.contains("file.txt"));
    }
}
