//! Installation-layout discovery.

use async_trait::async_trait;
use hypr_scribe_config::ConfigBackend;
use hypr_scribe_core::{Tool, ToolDefinition, ToolError};
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

/// Probes the backend variants in priority order (most-specific first) and
/// reports the first layout that detects, with its source files.
pub struct DetectRootTool {
    backends: Vec<Arc<dyn ConfigBackend>>,
}

impl DetectRootTool {
    pub fn new(backends: Vec<Arc<dyn ConfigBackend>>) -> Self {
        Self { backends }
    }
}

#[async_trait]
impl Tool for DetectRootTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "detect_installation_root".to_string(),
            description: "Detects the Hyprland installation type and root path".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {},
                "additionalProperties": false
            }),
        }
    }

    async fn execute(&self, _args: serde_json::Value) -> Result<String, ToolError> {
        for backend in &self.backends {
            if !backend.detect() {
                continue;
            }
            debug!(kind = %backend.kind(), "installation detected");
            let sources: Vec<String> = backend
                .list_sources()
                .unwrap_or_default()
                .iter()
                .map(|p| p.display().to_string())
                .collect();
            let result = json!({
                "type": backend.kind().to_string(),
                "sources": sources,
            });
            return Ok(result.to_string());
        }
        Ok(json!({"type": "unknown"}).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hypr_scribe_config::{HydeBackend, NativeBackend, OmarchyBackend};
    use std::fs;
    use tempfile::TempDir;

    fn backends(root: &std::path::Path) -> Vec<Arc<dyn ConfigBackend>> {
        vec![
            Arc::new(HydeBackend::new(root)),
            Arc::new(OmarchyBackend::new(root)),
            Arc::new(NativeBackend::new(root)),
        ]
    }

    #[tokio::test]
    async fn test_plain_root_detects_native_with_single_source() {
        if std::env::var_os("HYDE_CONFIG_HOME").is_some() {
            return;
        }
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("hyprland.conf"), "a = 1\n").unwrap();

        let tool = DetectRootTool::new(backends(dir.path()));
        let output = tool.execute(json!({})).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(parsed["type"], "native");
        let sources = parsed["sources"].as_array().unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(
            sources[0],
            dir.path().join("hyprland.conf").display().to_string()
        );
    }

    #[tokio::test]
    async fn test_specialized_layout_wins_over_native() {
        if std::env::var_os("HYDE_CONFIG_HOME").is_some() {
            return;
        }
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("hyprland.conf"), "a = 1\n").unwrap();
        fs::create_dir(dir.path().join("omarchy")).unwrap();

        let tool = DetectRootTool::new(backends(dir.path()));
        let output = tool.execute(json!({})).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["type"], "omarchy");
    }

    #[tokio::test]
    async fn test_empty_root_reports_unknown() {
        if std::env::var_os("HYDE_CONFIG_HOME").is_some() {
            return;
        }
        let dir = TempDir::new().unwrap();
        let tool = DetectRootTool::new(backends(dir.path()));
        let output = tool.execute(json!({})).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["type"], "unknown");
    }
}
