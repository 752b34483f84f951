//! Path authorization against per-backend allow-lists.
//!
//! Every file operation a capability performs goes through
//! [`SecurityGate::is_path_allowed`] first. Normalization is lexical, so the
//! gate also authorizes paths that do not exist yet.

use hypr_scribe_config::SourceKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Allow-list for one backend variant: relative directories and file names
/// (basename or root-relative path), both order-preserving.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendPolicy {
    pub allowed_dirs: Vec<String>,
    pub allowed_files: Vec<String>,
}

#[derive(Debug, Error)]
pub enum GateError {
    #[error("path {path} is outside the Hyprland config directory")]
    OutsideRoot { path: String },
    #[error("path {path} is not in the allowed list for the {backend} backend")]
    NotAllowed { path: String, backend: SourceKind },
    #[error("no security policy registered for the {0} backend")]
    UnknownBackend(SourceKind),
}

pub struct SecurityGate {
    config_root: PathBuf,
    policies: HashMap<SourceKind, BackendPolicy>,
}

impl SecurityGate {
    pub fn new(config_root: impl Into<PathBuf>, policies: HashMap<SourceKind, BackendPolicy>) -> Self {
        Self {
            config_root: normalize(&config_root.into()),
            policies,
        }
    }

    pub fn config_root(&self) -> &Path {
        &self.config_root
    }

    /// Authorize `target` for `backend`. Relative paths are rooted at the
    /// configuration root. Returns the normalized absolute path to use for
    /// the actual file operation.
    pub fn is_path_allowed(
        &self,
        backend: SourceKind,
        target: &Path,
    ) -> Result<PathBuf, GateError> {
        let policy = self
            .policies
            .get(&backend)
            .ok_or(GateError::UnknownBackend(backend))?;

        let absolute = if target.is_absolute() {
            normalize(target)
        } else {
            normalize(&self.config_root.join(target))
        };

        let relative = absolute
            .strip_prefix(&self.config_root)
            .map_err(|_| GateError::OutsideRoot {
                path: target.display().to_string(),
            })?
            .to_path_buf();

        let basename = absolute.file_name().map(|n| n.to_string_lossy());
        for allowed in &policy.allowed_files {
            let allowed_path = Path::new(allowed);
            if relative == allowed_path || basename.as_deref() == Some(allowed.as_str()) {
                debug!(path = %absolute.display(), %backend, "path allowed by file list");
                return Ok(absolute);
            }
        }

        for allowed in &policy.allowed_dirs {
            let allowed_abs = normalize(&self.config_root.join(allowed));
            if absolute == allowed_abs || absolute.starts_with(&allowed_abs) {
                debug!(path = %absolute.display(), %backend, "path allowed by directory list");
                return Ok(absolute);
            }
        }

        Err(GateError::NotAllowed {
            path: relative.display().to_string(),
            backend,
        })
    }
}

/// Lexical clean: resolves `.` and `..` without touching the filesystem.
/// `..` at an absolute root stays at the root, like `path/filepath.Clean`.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component),
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(Component::ParentDir);
                }
            }
            Component::Normal(part) => out.push(part),
        }
    }
    out
}
