//! Patch generation, guarded application and snapshot rollback.

use crate::parse_args;
use async_trait::async_trait;
use hypr_scribe_config::{patch, BackendError, ConfigBackend, PatchError};
use hypr_scribe_core::{Tool, ToolDefinition, ToolError};
use hypr_scribe_safety::{SecurityGate, SnapshotService};
use serde::Deserialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

fn patch_error(err: PatchError) -> ToolError {
    match err {
        PatchError::Empty => ToolError::Execution(err.to_string()),
        PatchError::Malformed(msg) => ToolError::PatchMalformed(msg),
        PatchError::Conflict { .. } => ToolError::PatchConflict(err.to_string()),
    }
}

fn backend_error(err: BackendError) -> ToolError {
    match err {
        BackendError::Patch(patch_err) => patch_error(patch_err),
        other => ToolError::Execution(other.to_string()),
    }
}

/// Computes a unified diff between two provided texts. Fails when there is
/// nothing to change.
pub struct MakePatchTool;

#[derive(Deserialize)]
struct MakePatchArgs {
    original: String,
    modified: String,
}

#[async_trait]
impl Tool for MakePatchTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "make_patch".to_string(),
            description:
                "Creates a unified diff patch between original and modified content. Returns a standard unified diff format."
                    .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "original": {"type": "string", "description": "The original file content"},
                    "modified": {"type": "string", "description": "The modified file content"}
                },
                "required": ["original", "modified"]
            }),
        }
    }

    async fn execute(&self, args: serde_json::Value) -> Result<String, ToolError> {
        let args: MakePatchArgs = parse_args(args)?;
        patch::create_patch(&args.original, &args.modified).map_err(patch_error)
    }
}

/// Applies a model-produced patch to a configuration file.
///
/// Sanitize → validate → authorize → snapshot → apply → write, in that
/// order. A snapshot failure aborts before any mutation; a hunk conflict
/// leaves the file byte-identical to what it was.
pub struct ApplyPatchTool {
    backend: Arc<dyn ConfigBackend>,
    gate: Arc<SecurityGate>,
    snapshots: Arc<SnapshotService>,
}

impl ApplyPatchTool {
    pub fn new(
        backend: Arc<dyn ConfigBackend>,
        gate: Arc<SecurityGate>,
        snapshots: Arc<SnapshotService>,
    ) -> Self {
        Self {
            backend,
            gate,
            snapshots,
        }
    }
}

#[derive(Deserialize)]
struct ApplyPatchArgs {
    #[serde(default)]
    path: Option<String>,
    patch: String,
}

#[async_trait]
impl Tool for ApplyPatchTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "apply_patch".to_string(),
            description: "Applies a patch to the configuration. The files are snapshotted first."
                .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "path": {"type": "string", "description": "Optional path to the file to patch"},
                    "patch": {"type": "string"}
                },
                "required": ["patch"]
            }),
        }
    }

    async fn execute(&self, args: serde_json::Value) -> Result<String, ToolError> {
        let args: ApplyPatchArgs = parse_args(args)?;

        let cleaned = patch::sanitize(&args.patch);
        if !cleaned.contains("@@") {
            return Err(ToolError::PatchMalformed(
                "missing @@ markers; the patch must be the unified diff produced by make_patch"
                    .to_string(),
            ));
        }

        let target: PathBuf = match &args.path {
            Some(path) => PathBuf::from(path),
            None => self
                .backend
                .list_sources()
                .map_err(|_| ToolError::Execution("could not determine target file".to_string()))?
                .first()
                .cloned()
                .ok_or_else(|| {
                    ToolError::Execution("could not determine target file".to_string())
                })?,
        };

        let target = self
            .gate
            .is_path_allowed(self.backend.kind(), &target)
            .map_err(|e| ToolError::AccessDenied(e.to_string()))?;

        // Snapshot every source before touching anything; no snapshot, no
        // mutation.
        let sources = self.backend.list_sources().map_err(backend_error)?;
        let snapshot_id = self
            .snapshots
            .create_snapshot(&sources)
            .map_err(|e| ToolError::Snapshot(e.to_string()))?;

        if let Err(err) = self.backend.apply_patch(Some(&target), &cleaned) {
            warn!(target = %target.display(), %err, "patch application failed");
            return Err(backend_error(err));
        }

        info!(target = %target.display(), %snapshot_id, "patch applied");
        Ok(format!(
            "Patch applied successfully to {} (snapshot {snapshot_id})",
            target.display()
        ))
    }
}

/// Restores the configuration from a snapshot; without an id, the most
/// recent snapshot is used.
pub struct RollbackTool {
    snapshots: Arc<SnapshotService>,
}

impl RollbackTool {
    pub fn new(snapshots: Arc<SnapshotService>) -> Self {
        Self { snapshots }
    }
}

#[derive(Deserialize)]
struct RollbackArgs {
    #[serde(default)]
    snapshot_id: Option<String>,
}

#[async_trait]
impl Tool for RollbackTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "rollback".to_string(),
            description: "Restores the configuration from a previous snapshot".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "snapshot_id": {
                        "type": "string",
                        "description": "The ID of the snapshot to restore. If empty, restores the latest."
                    }
                },
                "additionalProperties": false
            }),
        }
    }

    async fn execute(&self, args: serde_json::Value) -> Result<String, ToolError> {
        let args: RollbackArgs = parse_args(args)?;

        let id = match args.snapshot_id.filter(|id| !id.is_empty()) {
            Some(id) => id,
            None => self
                .snapshots
                .latest()
                .map_err(|e| ToolError::Execution(e.to_string()))?
                .ok_or_else(|| {
                    ToolError::Execution("no snapshots available to restore".to_string())
                })?,
        };

        let restored = self
            .snapshots
            .restore_all(&id)
            .map_err(|e| ToolError::Execution(e.to_string()))?;

        info!(%id, files = restored.len(), "rollback complete");
        Ok(format!(
            "Restored {} file(s) from snapshot {id}",
            restored.len()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hypr_scribe_config::{NativeBackend, SourceKind};
    use hypr_scribe_safety::BackendPolicy;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        config: PathBuf,
        backend: Arc<dyn ConfigBackend>,
        gate: Arc<SecurityGate>,
        snapshots: Arc<SnapshotService>,
    }

    fn fixture(content: &str) -> Fixture {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("hypr");
        fs::create_dir_all(&root).unwrap();
        let config = root.join("hyprland.conf");
        fs::write(&config, content).unwrap();

        let mut policies = HashMap::new();
        policies.insert(
            SourceKind::Native,
            BackendPolicy {
                allowed_dirs: vec![".".into()],
                allowed_files: vec!["hyprland.conf".into()],
            },
        );

        Fixture {
            backend: Arc::new(NativeBackend::new(&root)),
            gate: Arc::new(SecurityGate::new(&root, policies)),
            snapshots: Arc::new(SnapshotService::new(dir.path().join("backups")).unwrap()),
            config,
            _dir: dir,
        }
    }

    fn apply_tool(fx: &Fixture) -> ApplyPatchTool {
        ApplyPatchTool::new(
            Arc::clone(&fx.backend),
            Arc::clone(&fx.gate),
            Arc::clone(&fx.snapshots),
        )
    }

    #[tokio::test]
    async fn test_make_patch_then_apply_patch() {
        let fx = fixture("a=1\n");

        let patch_text = MakePatchTool
            .execute(json!({"original": "a=1\n", "modified": "a=2\n"}))
            .await
            .unwrap();
        assert!(patch_text.contains("@@"));

        let output = apply_tool(&fx)
            .execute(json!({"patch": patch_text}))
            .await
            .unwrap();
        assert!(output.contains("applied successfully"));
        assert_eq!(fs::read_to_string(&fx.config).unwrap(), "a=2\n");
    }

    #[tokio::test]
    async fn test_stale_patch_conflicts_and_leaves_file_untouched() {
        let fx = fixture("a=1\n");
        let patch_text = MakePatchTool
            .execute(json!({"original": "a=1\n", "modified": "a=2\n"}))
            .await
            .unwrap();

        let tool = apply_tool(&fx);
        tool.execute(json!({"patch": patch_text.clone()}))
            .await
            .unwrap();

        // The file now holds a=2; the same patch no longer matches.
        let err = tool
            .execute(json!({"patch": patch_text}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::PatchConflict(_)));
        assert_eq!(fs::read_to_string(&fx.config).unwrap(), "a=2\n");
    }

    #[tokio::test]
    async fn test_make_patch_rejects_identical_content() {
        let err = MakePatchTool
            .execute(json!({"original": "same\n", "modified": "same\n"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Execution(_)));
    }

    #[tokio::test]
    async fn test_apply_patch_strips_model_wrapping() {
        let fx = fixture("a=1\n");
        let patch_text = MakePatchTool
            .execute(json!({"original": "a=1\n", "modified": "a=2\n"}))
            .await
            .unwrap();
        let wrapped = format!("Here is the patch:\n```diff\n{patch_text}```\nShall I apply it?");

        apply_tool(&fx)
            .execute(json!({"patch": wrapped}))
            .await
            .unwrap();
        assert_eq!(fs::read_to_string(&fx.config).unwrap(), "a=2\n");
    }

    #[tokio::test]
    async fn test_apply_patch_without_hunks_is_malformed() {
        let fx = fixture("a=1\n");
        let err = apply_tool(&fx)
            .execute(json!({"patch": "this is not a diff"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::PatchMalformed(_)));
    }

    #[tokio::test]
    async fn test_apply_patch_outside_root_is_denied() {
        let fx = fixture("a=1\n");
        let patch_text = MakePatchTool
            .execute(json!({"original": "a=1\n", "modified": "a=2\n"}))
            .await
            .unwrap();

        let err = apply_tool(&fx)
            .execute(json!({"patch": patch_text, "path": "/etc/passwd"}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::AccessDenied(_)));
    }

    #[tokio::test]
    async fn test_apply_patch_snapshots_before_writing() {
        let fx = fixture("a=1\n");
        let patch_text = MakePatchTool
            .execute(json!({"original": "a=1\n", "modified": "a=2\n"}))
            .await
            .unwrap();

        apply_tool(&fx)
            .execute(json!({"patch": patch_text}))
            .await
            .unwrap();

        let id = fx.snapshots.latest().unwrap().unwrap();
        fx.snapshots.restore(&id, &[fx.config.clone()]).unwrap();
        assert_eq!(fs::read_to_string(&fx.config).unwrap(), "a=1\n");
    }

    #[tokio::test]
    async fn test_rollback_without_id_uses_latest_snapshot() {
        let fx = fixture("a=1\n");
        let patch_text = MakePatchTool
            .execute(json!({"original": "a=1\n", "modified": "a=2\n"}))
            .await
            .unwrap();
        apply_tool(&fx)
            .execute(json!({"patch": patch_text}))
            .await
            .unwrap();
        assert_eq!(fs::read_to_string(&fx.config).unwrap(), "a=2\n");

        let output = RollbackTool::new(Arc::clone(&fx.snapshots))
            .execute(json!({}))
            .await
            .unwrap();
        assert!(output.contains("Restored 1 file(s)"));
        assert_eq!(fs::read_to_string(&fx.config).unwrap(), "a=1\n");
    }

    #[tokio::test]
    async fn test_rollback_with_no_snapshots() {
        let fx = fixture("a=1\n");
        let err = RollbackTool::new(Arc::clone(&fx.snapshots))
            .execute(json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Execution(_)));
    }
}
