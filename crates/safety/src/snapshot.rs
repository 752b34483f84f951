//! Timestamped file backups taken before any configuration mutation.
//!
//! Each snapshot is a directory named by a lexically sortable timestamp,
//! holding basename-keyed copies of the snapshotted files plus a manifest
//! mapping each copy back to its original absolute path.

use chrono::Local;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot {0} not found")]
    NotFound(String),
    #[error("failed to copy {path}: {source}")]
    Copy {
        path: String,
        source: std::io::Error,
    },
    #[error("snapshot manifest error: {0}")]
    Manifest(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct SnapshotService {
    backup_dir: PathBuf,
}

impl SnapshotService {
    pub fn new(backup_dir: impl Into<PathBuf>) -> Result<Self, SnapshotError> {
        let backup_dir = backup_dir.into();
        fs::create_dir_all(&backup_dir)?;
        Ok(Self { backup_dir })
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Copy `files` into a new timestamp-named snapshot directory and persist
    /// the basename → origin manifest next to them. Returns the snapshot id.
    pub fn create_snapshot(&self, files: &[PathBuf]) -> Result<String, SnapshotError> {
        let id = Local::now().format("%Y%m%d-%H%M%S").to_string();
        let snapshot_dir = self.backup_dir.join(&id);
        fs::create_dir_all(&snapshot_dir)?;

        let mut manifest: BTreeMap<String, String> = BTreeMap::new();
        for src in files {
            let Some(base) = src.file_name() else {
                continue;
            };
            let dst = snapshot_dir.join(base);
            fs::copy(src, &dst).map_err(|source| SnapshotError::Copy {
                path: src.display().to_string(),
                source,
            })?;
            manifest.insert(
                base.to_string_lossy().to_string(),
                src.display().to_string(),
            );
        }

        let manifest_json = serde_json::to_string_pretty(&manifest)
            .map_err(|e| SnapshotError::Manifest(e.to_string()))?;
        fs::write(snapshot_dir.join(MANIFEST_FILE), manifest_json)?;

        info!(%id, files = files.len(), "snapshot created");
        Ok(id)
    }

    /// Restore `targets` from the snapshot. Targets with no same-named copy
    /// in the snapshot are silently skipped.
    pub fn restore(&self, id: &str, targets: &[PathBuf]) -> Result<(), SnapshotError> {
        let snapshot_dir = self.snapshot_dir(id)?;

        for target in targets {
            let Some(base) = target.file_name() else {
                continue;
            };
            let src = snapshot_dir.join(base);
            if !src.is_file() {
                debug!(target = %target.display(), "no snapshot copy, skipping");
                continue;
            }
            fs::copy(&src, target).map_err(|source| SnapshotError::Copy {
                path: target.display().to_string(),
                source,
            })?;
        }
        Ok(())
    }

    /// Restore every file recorded in the snapshot manifest to its original
    /// path. Returns the restored paths.
    pub fn restore_all(&self, id: &str) -> Result<Vec<PathBuf>, SnapshotError> {
        let snapshot_dir = self.snapshot_dir(id)?;

        let manifest_raw = fs::read_to_string(snapshot_dir.join(MANIFEST_FILE))
            .map_err(|_| SnapshotError::Manifest(format!("snapshot {id} has no manifest")))?;
        let manifest: BTreeMap<String, String> = serde_json::from_str(&manifest_raw)
            .map_err(|e| SnapshotError::Manifest(e.to_string()))?;

        let mut restored = Vec::with_capacity(manifest.len());
        for (base, origin) in manifest {
            let src = snapshot_dir.join(&base);
            let dst = PathBuf::from(origin);
            fs::copy(&src, &dst).map_err(|source| SnapshotError::Copy {
                path: dst.display().to_string(),
                source,
            })?;
            restored.push(dst);
        }

        info!(%id, files = restored.len(), "snapshot restored");
        Ok(restored)
    }

    /// Latest snapshot id: ids are timestamps, so lexical max is newest.
    pub fn latest(&self) -> Result<Option<String>, SnapshotError> {
        let mut newest: Option<String> = None;
        for entry in fs::read_dir(&self.backup_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if newest.as_deref().map_or(true, |current| name.as_str() > current) {
                newest = Some(name);
            }
        }
        Ok(newest)
    }

    fn snapshot_dir(&self, id: &str) -> Result<PathBuf, SnapshotError> {
        let dir = self.backup_dir.join(id);
        if !dir.is_dir() {
            return Err(SnapshotError::NotFound(id.to_string()));
        }
        Ok(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn service(dir: &TempDir) -> SnapshotService {
        SnapshotService::new(dir.path().join("backups")).unwrap()
    }

    #[test]
    fn test_create_and_restore() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("hyprland.conf");
        fs::write(&config, "a = 1\n").unwrap();

        let snapshots = service(&dir);
        let id = snapshots.create_snapshot(&[config.clone()]).unwrap();

        fs::write(&config, "a = broken\n").unwrap();
        snapshots.restore(&id, &[config.clone()]).unwrap();
        assert_eq!(fs::read_to_string(&config).unwrap(), "a = 1\n");
    }

    #[test]
    fn test_restore_skips_files_absent_from_snapshot() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("hyprland.conf");
        fs::write(&config, "a = 1\n").unwrap();

        let snapshots = service(&dir);
        let id = snapshots.create_snapshot(&[config]).unwrap();

        let never_snapshotted = dir.path().join("other.conf");
        fs::write(&never_snapshotted, "untouched\n").unwrap();
        snapshots
            .restore(&id, &[never_snapshotted.clone()])
            .unwrap();
        assert_eq!(
            fs::read_to_string(&never_snapshotted).unwrap(),
            "untouched\n"
        );
    }

    #[test]
    fn test_restore_all_uses_manifest_origins() {
        let dir = TempDir::new().unwrap();
        let config = dir.path().join("hyprland.conf");
        let binds = dir.path().join("keybindings.conf");
        fs::write(&config, "a = 1\n").unwrap();
        fs::write(&binds, "bind = X\n").unwrap();

        let snapshots = service(&dir);
        let id = snapshots
            .create_snapshot(&[config.clone(), binds.clone()])
            .unwrap();

        fs::write(&config, "a = broken\n").unwrap();
        fs::write(&binds, "bind = broken\n").unwrap();

        let restored = snapshots.restore_all(&id).unwrap();
        assert_eq!(restored.len(), 2);
        assert_eq!(fs::read_to_string(&config).unwrap(), "a = 1\n");
        assert_eq!(fs::read_to_string(&binds).unwrap(), "bind = X\n");
    }

    #[test]
    fn test_create_snapshot_fails_on_missing_source() {
        let dir = TempDir::new().unwrap();
        let snapshots = service(&dir);
        let err = snapshots
            .create_snapshot(&[dir.path().join("does-not-exist.conf")])
            .unwrap_err();
        assert!(matches!(err, SnapshotError::Copy { .. }));
    }

    #[test]
    fn test_latest_is_lexical_max() {
        let dir = TempDir::new().unwrap();
        let snapshots = service(&dir);
        assert!(snapshots.latest().unwrap().is_none());

        for id in ["20250101-000000", "20260101-000000", "20251231-235959"] {
            fs::create_dir_all(snapshots.backup_dir().join(id)).unwrap();
        }
        assert_eq!(
            snapshots.latest().unwrap().as_deref(),
            Some("20260101-000000")
        );
    }

    #[test]
    fn test_unknown_snapshot_id() {
        let dir = TempDir::new().unwrap();
        let snapshots = service(&dir);
        let err = snapshots.restore("19990101-000000", &[]).unwrap_err();
        assert!(matches!(err, SnapshotError::NotFound(_)));
    }
}
