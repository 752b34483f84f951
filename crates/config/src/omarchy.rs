//! Omarchy layout detection. File mechanics are the native backend's.

use crate::backend::{BackendError, ConfigBackend, SourceKind};
use crate::ir::Ir;
use crate::native::NativeBackend;
use std::path::{Path, PathBuf};

pub struct OmarchyBackend {
    native: NativeBackend,
}

impl OmarchyBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            native: NativeBackend::new(root),
        }
    }
}

impl ConfigBackend for OmarchyBackend {
    fn kind(&self) -> SourceKind {
        SourceKind::Omarchy
    }

    fn detect(&self) -> bool {
        let root = self.native.root();
        root.join("omarchy").is_dir() && root.join("hyprland.conf").is_file()
    }

    fn list_sources(&self) -> Result<Vec<PathBuf>, BackendError> {
        self.native.list_sources()
    }

    fn parse(&self) -> Result<Ir, BackendError> {
        self.native.parse()
    }

    fn generate_patch(&self, old: &Ir, new: &Ir) -> Result<String, BackendError> {
        self.native.generate_patch(old, new)
    }

    fn apply_patch(&self, path: Option<&Path>, patch: &str) -> Result<(), BackendError> {
        self.native.apply_patch(path, patch)
    }
}
