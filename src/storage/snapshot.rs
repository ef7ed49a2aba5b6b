//! Workbook snapshots
//!
//! Next to the workbook live two full-file snapshots:
//! - `<stem>_backup.<ext>`: taken once when a run starts
//! - `<stem>_copy.<ext>`: refreshed after every save

use crate::storage::{StorageError, StorageResult};
use std::path::{Path, PathBuf};

/// Paths of the workbook and its snapshots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshots {
    primary: PathBuf,
    copy: PathBuf,
    backup: PathBuf,
}

impl Snapshots {
    pub fn for_workbook(primary: &Path) -> Self {
        Self {
            primary: primary.to_path_buf(),
            copy: sibling(primary, "copy"),
            backup: sibling(primary, "backup"),
        }
    }

    pub fn primary(&self) -> &Path {
        &self.primary
    }

    pub fn copy(&self) -> &Path {
        &self.copy
    }

    pub fn backup(&self) -> &Path {
        &self.backup
    }

    /// Copies the workbook to the backup path
    ///
    /// Returns false when there is no workbook on disk yet.
    pub fn take_backup(&self) -> StorageResult<bool> {
        if !self.primary.exists() {
            tracing::debug!("No workbook at {} to back up", self.primary.display());
            return Ok(false);
        }

        tracing::info!("Backing up workbook to {}", self.backup.display());
        duplicate(&self.primary, &self.backup)?;
        Ok(true)
    }

    /// Overwrites the copy snapshot with the saved workbook
    pub fn refresh_copy(&self) -> StorageResult<()> {
        tracing::debug!("Copying workbook to {}", self.copy.display());
        duplicate(&self.primary, &self.copy)
    }
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();

    let name = match path.extension() {
        Some(ext) => format!("{}_{}.{}", stem, suffix, ext.to_string_lossy()),
        None => format!("{}_{}", stem, suffix),
    };

    path.with_file_name(name)
}

fn duplicate(from: &Path, to: &Path) -> StorageResult<()> {
    std::fs::copy(from, to)
        .map(|_| ())
        .map_err(|source| StorageError::Snapshot {
            path: to.display().to_string(),
            source,
        })
}
