//! Wires settings, backends, gate, snapshots, tools and the provider into a
//! ready-to-run agent.

use crate::prompt::build_system_prompt;
use crate::settings::Settings;
use anyhow::{Context, Result};
use hypr_scribe_config::{ConfigBackend, HydeBackend, NativeBackend, OmarchyBackend, SourceKind};
use hypr_scribe_core::{Agent, StatusUpdate, ToolRegistry};
use hypr_scribe_providers::OpenAiCompatibleProvider;
use hypr_scribe_safety::{SecurityGate, SnapshotService};
use hypr_scribe_tools::{
    ApplyPatchTool, DetectRootTool, ListDirTool, MakePatchTool, ParseConfigTool, ReadFileTool,
    RollbackTool,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

pub struct Runtime {
    pub agent: Agent,
    pub updates: mpsc::Receiver<StatusUpdate>,
    pub kind: SourceKind,
}

pub fn build(settings: &Settings) -> Result<Runtime> {
    let home = dirs::home_dir().context("could not determine home directory")?;
    let config_root = home.join(".config").join("hypr");
    let backup_dir = home
        .join(".local")
        .join("share")
        .join("hypr-scribe")
        .join("backups");

    build_with_paths(settings, config_root, backup_dir)
}

/// Same wiring with explicit roots; the entry point for tests.
pub fn build_with_paths(
    settings: &Settings,
    config_root: PathBuf,
    backup_dir: PathBuf,
) -> Result<Runtime> {
    // Probe order is most-specific first: the native detector would
    // false-positive on HyDE and Omarchy trees.
    let probes: Vec<Arc<dyn ConfigBackend>> = vec![
        Arc::new(HydeBackend::new(&config_root)),
        Arc::new(OmarchyBackend::new(&config_root)),
        Arc::new(NativeBackend::new(&config_root)),
    ];
    let active: Arc<dyn ConfigBackend> = probes
        .iter()
        .find(|backend| backend.detect())
        .cloned()
        .unwrap_or_else(|| Arc::new(NativeBackend::new(&config_root)));
    let kind = active.kind();
    info!(%kind, root = %config_root.display(), "configuration backend selected");

    let mut policies = HashMap::new();
    policies.insert(SourceKind::Native, settings.security.native.clone());
    policies.insert(SourceKind::Hyde, settings.security.hyde.clone());
    policies.insert(SourceKind::Omarchy, settings.security.omarchy.clone());
    let gate = Arc::new(SecurityGate::new(&config_root, policies));

    let snapshots =
        Arc::new(SnapshotService::new(backup_dir).context("failed to prepare backup directory")?);

    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(DetectRootTool::new(probes)));
    registry.register(Arc::new(ListDirTool::new(Arc::clone(&gate), kind)));
    registry.register(Arc::new(ReadFileTool::new(Arc::clone(&gate), kind)));
    registry.register(Arc::new(ParseConfigTool::new(Arc::clone(&active))));
    registry.register(Arc::new(MakePatchTool));
    registry.register(Arc::new(ApplyPatchTool::new(
        Arc::clone(&active),
        Arc::clone(&gate),
        Arc::clone(&snapshots),
    )));
    registry.register(Arc::new(RollbackTool::new(Arc::clone(&snapshots))));

    let provider = Arc::new(OpenAiCompatibleProvider::new(
        settings.llm.base_url.clone(),
        (!settings.llm.api_key.is_empty()).then(|| settings.llm.api_key.clone()),
        settings.llm.model.clone(),
    ));

    let system_prompt = build_system_prompt(kind, settings.policy_for(kind));
    let (agent, updates) = Agent::new(
        provider,
        Arc::new(registry),
        system_prompt,
        settings.agent.max_turns,
    );

    Ok(Runtime {
        agent,
        updates,
        kind,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_build_registers_all_capabilities() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("hypr");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("hyprland.conf"), "a = 1\n").unwrap();

        let runtime = build_with_paths(
            &Settings::default(),
            root,
            dir.path().join("backups"),
        )
        .unwrap();

        if std::env::var_os("HYDE_CONFIG_HOME").is_none() {
            assert_eq!(runtime.kind, SourceKind::Native);
        }
        assert!(runtime.agent.history().is_empty());
    }
}
