//! Structured parse of the active configuration for model consumption.

use async_trait::async_trait;
use hypr_scribe_config::ConfigBackend;
use hypr_scribe_core::{Tool, ToolDefinition, ToolError};
use serde_json::json;
use std::sync::Arc;

pub struct ParseConfigTool {
    backend: Arc<dyn ConfigBackend>,
}

impl ParseConfigTool {
    pub fn new(backend: Arc<dyn ConfigBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for ParseConfigTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "parse_config".to_string(),
            description: "Parses the configuration into a structured format".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {},
                "additionalProperties": false
            }),
        }
    }

    async fn execute(&self, _args: serde_json::Value) -> Result<String, ToolError> {
        let ir = self
            .backend
            .parse()
            .map_err(|e| ToolError::Execution(e.to_string()))?;
        serde_json::to_string(&ir).map_err(|e| ToolError::Execution(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hypr_scribe_config::NativeBackend;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_parse_emits_classified_lines() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("hyprland.conf"),
            "$mod = SUPER\ngeneral {\n    gaps_in = 5\n}\n",
        )
        .unwrap();

        let tool = ParseConfigTool::new(Arc::new(NativeBackend::new(dir.path())));
        let output = tool.execute(json!({})).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();

        let lines = parsed["lines"].as_array().unwrap();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0]["kind"], "variable");
        assert_eq!(lines[1]["kind"], "section_start");
        assert_eq!(lines[1]["key"], "general");
    }

    #[tokio::test]
    async fn test_parse_without_config_reports_error() {
        let dir = TempDir::new().unwrap();
        let tool = ParseConfigTool::new(Arc::new(NativeBackend::new(dir.path())));
        let err = tool.execute(json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::Execution(_)));
    }
}
