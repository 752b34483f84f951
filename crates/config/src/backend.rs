//! Backend variant contract for the supported configuration layouts.

use crate::ir::Ir;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Supported configuration layout conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Native,
    Hyde,
    Omarchy,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceKind::Native => "native",
            SourceKind::Hyde => "hyde",
            SourceKind::Omarchy => "omarchy",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("configuration source missing: {0}")]
    SourceMissing(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Patch(#[from] crate::patch::PatchError),
}

/// A detected configuration layout: knows its source files and how to parse
/// and patch them. Probed most-specific first, since the native detector
/// false-positives on the specialized layouts.
pub trait ConfigBackend: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Whether this layout is present under the backend's configured root.
    fn detect(&self) -> bool;

    /// File paths contributing to the configuration. The first entry is the
    /// primary config file.
    fn list_sources(&self) -> Result<Vec<PathBuf>, BackendError>;

    /// Parse the primary config file into the line IR.
    fn parse(&self) -> Result<Ir, BackendError>;

    /// Unified diff between two IR states.
    fn generate_patch(&self, old: &Ir, new: &Ir) -> Result<String, BackendError>;

    /// Apply a unified diff to `path` (or the primary source when `None`),
    /// all-or-nothing. The file is only written once every hunk applied.
    fn apply_patch(&self, path: Option<&Path>, patch: &str) -> Result<(), BackendError>;
}
