//! HyDE layout detection. File mechanics are the native backend's.

use crate::backend::{BackendError, ConfigBackend, SourceKind};
use crate::ir::Ir;
use crate::native::NativeBackend;
use std::env;
use std::path::{Path, PathBuf};

const HYDE_ENV_MARKER: &str = "HYDE_CONFIG_HOME";

pub struct HydeBackend {
    native: NativeBackend,
}

impl HydeBackend {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            native: NativeBackend::new(root),
        }
    }
}

impl ConfigBackend for HydeBackend {
    fn kind(&self) -> SourceKind {
        SourceKind::Hyde
    }

    fn detect(&self) -> bool {
        // Most reliable marker first: the HyDE environment variable.
        if env::var_os(HYDE_ENV_MARKER).is_some() {
            return true;
        }

        let root = self.native.root();
        if root.join("hyde.conf").is_file() {
            return true;
        }

        // HyDE installs carry a Configs/ and scripts/ directory structure.
        root.join("Configs").is_dir() || root.join("scripts").is_dir()
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
