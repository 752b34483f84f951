//! Gated filesystem access: every path is authorized for the active backend
//! variant before anything touches the disk.

use crate::parse_args;
use async_trait::async_trait;
use hypr_scribe_config::SourceKind;
use hypr_scribe_core::{Tool, ToolDefinition, ToolError};
use hypr_scribe_safety::SecurityGate;
use serde::Deserialize;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;

pub struct ReadFileTool {
    gate: Arc<SecurityGate>,
    kind: SourceKind,
}

impl ReadFileTool {
    pub fn new(gate: Arc<SecurityGate>, kind: SourceKind) -> Self {
        Self { gate, kind }
    }
}

#[derive(Deserialize)]
struct ReadFileArgs {
    path: String,
}

#[async_trait]
impl Tool for ReadFileTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "read_file".to_string(),
            description:
                "Reads the content of a file within the allowed Hyprland configuration directories"
                    .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "The path to the file to read (relative to the config root or absolute)"
                    }
                },
                "required": ["path"],
                "additionalProperties": false
            }),
        }
    }

    async fn execute(&self, args: serde_json::Value) -> Result<String, ToolError> {
        let args: ReadFileArgs = parse_args(args)?;

        let target = self
            .gate
            .is_path_allowed(self.kind, Path::new(&args.path))
            .map_err(|e| ToolError::AccessDenied(e.to_string()))?;

        tokio::fs::read_to_string(&target)
            .await
            .map_err(|e| ToolError::Execution(format!("failed to read file: {e}")))
    }
}

pub struct ListDirTool {
    gate: Arc<SecurityGate>,
    kind: SourceKind,
}

impl ListDirTool {
    pub fn new(gate: Arc<SecurityGate>, kind: SourceKind) -> Self {
        Self { gate, kind }
    }
}

#[derive(Deserialize)]
struct ListDirArgs {
    path: String,
}

#[async_trait]
impl Tool for ListDirTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "list_dir".to_string(),
            description:
                "Lists the contents of a directory within allowed Hyprland configuration directories"
                    .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "The path to the directory to list"
                    }
                },
                "required": ["path"],
                "additionalProperties": false
            }),
        }
    }

    async fn execute(&self, args: serde_json::Value) -> Result<String, ToolError> {
        let args: ListDirArgs = parse_args(args)?;

        let target = self
            .gate
            .is_path_allowed(self.kind, Path::new(&args.path))
            .map_err(|e| ToolError::AccessDenied(e.to_string()))?;

        let mut dir = tokio::fs::read_dir(&target)
            .await
            .map_err(|e| ToolError::Execution(format!("failed to read directory: {e}")))?;

        let mut names: Vec<String> = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| ToolError::Execution(e.to_string()))?
        {
            let mut name = entry.file_name().to_string_lossy().to_string();
            if entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false) {
                name.push('/');
            }
            names.push(name);
        }
        names.sort();

        serde_json::to_string(&names).map_err(|e| ToolError::Execution(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hypr_scribe_safety::BackendPolicy;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    fn gate_for(root: &Path) -> Arc<SecurityGate> {
        let mut policies = HashMap::new();
        policies.insert(
            SourceKind::Native,
            BackendPolicy {
                allowed_dirs: vec![".".into()],
                allowed_files: vec!["hyprland.conf".into()],
            },
        );
        Arc::new(SecurityGate::new(root, policies))
    }

    #[tokio::test]
    async fn test_read_file_inside_root() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("hyprland.conf"), "a = 1\n").unwrap();

        let tool = ReadFileTool::new(gate_for(dir.path()), SourceKind::Native);
        let output = tool
            .execute(json!({"path": "hyprland.conf"}))
            .await
            .unwrap();
        assert_eq!(output, "a = 1\n");
    }

    #[tokio::test]
    async fn test_read_file_outside_root_is_denied() {
        let dir = TempDir::new().unwrap();
        let tool = ReadFileTool::new(gate_for(dir.path()), SourceKind::Native);

        let err = tool
            .execute(json!({"path": "/etc/passwd"}))
            .await
            .unwrap_err();
        match err {
            ToolError::AccessDenied(msg) => {
                assert!(msg.contains("/etc/passwd"));
            }
            other => panic!("expected access denied, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_list_dir_marks_directories() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("hyprland.conf"), "").unwrap();
        fs::create_dir(dir.path().join("scripts")).unwrap();

        let tool = ListDirTool::new(gate_for(dir.path()), SourceKind::Native);
        let output = tool.execute(json!({"path": "."})).await.unwrap();
        let names: Vec<String> = serde_json::from_str(&output).unwrap();
        assert_eq!(names, vec!["hyprland.conf", "scripts/"]);
    }

    #[tokio::test]
    async fn test_missing_argument_is_invalid() {
        let dir = TempDir::new().unwrap();
        let tool = ReadFileTool::new(gate_for(dir.path()), SourceKind::Native);
        let err = tool.execute(json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgs(_)));
    }
}
