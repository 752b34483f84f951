//! Plain Hyprland layout: a single `hyprland.conf` under the config root.
//! The HyDE and Omarchy variants reuse this backend's file mechanics.

use crate::backend::{BackendError, ConfigBackend, SourceKind};
use crate::ir::Ir;
use crate::patch::{self, Patch};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const MAIN_CONFIG: &str = "hyprland.conf";

pub struct NativeBackend {
    root: PathBuf,
}

impl NativeBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub(crate) fn config_path(&self) -> PathBuf {
        self.root.join(MAIN_CONFIG)
    }
}

impl ConfigBackend for NativeBackend {
    fn kind(&self) -> SourceKind {
        SourceKind::Native
    }

    fn detect(&self) -> bool {
        self.config_path().is_file()
    }

    fn list_sources(&self) -> Result<Vec<PathBuf>, BackendError> {
        let path = self.config_path();
        if !path.is_file() {
            return Err(BackendError::SourceMissing(path.display().to_string()));
        }
        Ok(vec![path])
    }

    fn parse(&self) -> Result<Ir, BackendError> {
        let path = self.config_path();
        if !path.is_file() {
            return Err(BackendError::SourceMissing(path.display().to_string()));
        }
        let text = fs::read_to_string(&path)?;
        Ok(Ir::parse(&text))
    }

    fn generate_patch(&self, old: &Ir, new: &Ir) -> Result<String, BackendError> {
        Ok(patch::create_patch(&old.to_text(), &new.to_text())?)
    }

    fn apply_patch(&self, path: Option<&Path>, patch_text: &str) -> Result<(), BackendError> {
        let target = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let path = self.config_path();
                if !path.is_file() {
                    return Err(BackendError::SourceMissing(path.display().to_string()));
                }
                path
            }
        };

        let current = fs::read_to_string(&target)?;
        let parsed = Patch::parse(patch_text)?;
        let patched = parsed.apply(&current)?;

        debug!(target = %target.display(), hunks = parsed.hunk_count(), "writing patched config");
        fs::write(&target, patched)?;
        Ok(())
    }
}
