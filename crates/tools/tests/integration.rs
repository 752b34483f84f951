//! End-to-end capability flow against a real temporary config tree:
//! detect -> read -> make_patch -> apply_patch -> rollback.

use hypr_scribe_config::{ConfigBackend, HydeBackend, NativeBackend, OmarchyBackend, SourceKind};
use hypr_scribe_core::Tool;
use hypr_scribe_safety::{BackendPolicy, SecurityGate, SnapshotService};
use hypr_scribe_tools::{
    ApplyPatchTool, DetectRootTool, MakePatchTool, ReadFileTool, RollbackTool,
};
use serde_json::json;
use std::collections::HashMap;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

const INITIAL: &str = "# managed config\n$mod = SUPER\ngeneral {\n    gaps_in = 5\n}\n";

fn native_policy() -> BackendPolicy {
    BackendPolicy {
        allowed_dirs: vec![".".into(), "./scripts".into()],
        allowed_files: vec!["hyprland.conf".into()],
    }
}

#[tokio::test]
async fn test_full_edit_and_rollback_flow() {
    if std::env::var_os("HYDE_CONFIG_HOME").is_some() {
        return;
    }

    let dir = TempDir::new().unwrap();
    let root = dir.path().join("hypr");
    fs::create_dir_all(&root).unwrap();
    let config = root.join("hyprland.conf");
    fs::write(&config, INITIAL).unwrap();

    let backend: Arc<dyn ConfigBackend> = Arc::new(NativeBackend::new(&root));
    let probes: Vec<Arc<dyn ConfigBackend>> = vec![
        Arc::new(HydeBackend::new(&root)),
        Arc::new(OmarchyBackend::new(&root)),
        Arc::clone(&backend),
    ];

    let mut policies = HashMap::new();
    policies.insert(SourceKind::Native, native_policy());
    let gate = Arc::new(SecurityGate::new(&root, policies));
    let snapshots = Arc::new(SnapshotService::new(dir.path().join("backups")).unwrap());

    // Detect reports the native layout with its single source.
    let detected = DetectRootTool::new(probes).execute(json!({})).await.unwrap();
    let detected: serde_json::Value = serde_json::from_str(&detected).unwrap();
    assert_eq!(detected["type"], "native");
    assert_eq!(detected["sources"].as_array().unwrap().len(), 1);

    // Read the current content through the gate.
    let read = ReadFileTool::new(Arc::clone(&gate), SourceKind::Native)
        .execute(json!({"path": "hyprland.conf"}))
        .await
        .unwrap();
    assert_eq!(read, INITIAL);

    // Produce and apply an edit.
    let modified = read.replace("gaps_in = 5", "gaps_in = 10");
    let patch = MakePatchTool
        .execute(json!({"original": read, "modified": modified}))
        .await
        .unwrap();

    ApplyPatchTool::new(Arc::clone(&backend), Arc::clone(&gate), Arc::clone(&snapshots))
        .execute(json!({"patch": patch}))
        .await
        .unwrap();
    assert_eq!(
        fs::read_to_string(&config).unwrap(),
        INITIAL.replace("gaps_in = 5", "gaps_in = 10")
    );

    // Rollback restores the pre-patch bytes.
    RollbackTool::new(Arc::clone(&snapshots))
        .execute(json!({}))
        .await
        .unwrap();
    assert_eq!(fs::read_to_string(&config).unwrap(), INITIAL);
}

#[tokio::test]
async fn test_gate_blocks_reads_outside_every_variant_root() {
    let dir = TempDir::new().unwrap();
    let mut policies = HashMap::new();
    for kind in [SourceKind::Native, SourceKind::Hyde, SourceKind::Omarchy] {
        policies.insert(kind, native_policy());
    }
    let gate = Arc::new(SecurityGate::new(dir.path(), policies));

    for kind in [SourceKind::Native, SourceKind::Hyde, SourceKind::Omarchy] {
        let tool = ReadFileTool::new(Arc::clone(&gate), kind);
        let err = tool
            .execute(json!({"path": "/etc/passwd"}))
            .await
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("access denied"), "unexpected error: {msg}");
    }
}
