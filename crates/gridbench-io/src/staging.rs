//! Staged dataset directory with a rollback-safe commit.
//!
//! Generation writes every split into `<dataset_dir>.tmp` and only replaces the
//! live directory once all splits are on disk. The commit moves the live
//! directory aside to `<dataset_dir>.old`, renames the staged one into place and
//! restores the backup if that rename fails. A staging directory that is dropped
//! without being committed is removed.

use gridbench_core::BenchResult;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Staging area for a dataset directory.
#[derive(Debug)]
pub struct StagedDirectory {
    /// Temporary directory for intermediate writes
    temp_dir: PathBuf,
    /// Final output directory path
    final_dir: PathBuf,
    /// Set once the staged data has been moved into place or discarded
    finished: bool,
}

impl StagedDirectory {
    /// Create a fresh staging directory next to `output_path`.
    pub fn new(output_path: impl AsRef<Path>) -> BenchResult<Self> {
        let final_dir = output_path.as_ref().to_path_buf();
        let temp_dir = sibling_path(&final_dir, "tmp");

        // Leftovers from a crashed previous generation
        if temp_dir.exists() {
            warn!(path = %temp_dir.display(), "removing stale staging directory");
            fs::remove_dir_all(&temp_dir)?;
        }
        fs::create_dir_all(&temp_dir)?;

        Ok(Self {
            temp_dir,
            final_dir,
            finished: false,
        })
    }

    /// Replace the final directory with the staged one.
    ///
    /// On error the previous final directory is back in place and the staged
    /// data is removed when `self` drops.
    pub fn commit(mut self) -> BenchResult<PathBuf> {
        if let Some(parent) = self.final_dir.parent() {
            fs::create_dir_all(parent)?;
        }

        let backup = sibling_path(&self.final_dir, "old");
        if backup.exists() {
            warn!(path = %backup.display(), "removing stale backup directory");
            fs::remove_dir_all(&backup)?;
        }
        let had_previous = self.final_dir.exists();
        if had_previous {
            fs::rename(&self.final_dir, &backup)?;
        }

        // POSIX rename is atomic on the same filesystem
        if let Err(err) = fs::rename(&self.temp_dir, &self.final_dir) {
            if had_previous {
                if let Err(restore_err) = fs::rename(&backup, &self.final_dir) {
                    error!(
                        backup = %backup.display(),
                        error = %restore_err,
                        "failed to restore previous dataset directory"
                    );
                }
            }
            return Err(err.into());
        }
        self.finished = true;

        if had_previous {
            info!(
                path = %self.final_dir.display(),
                "deleting path that might contain previous runs"
            );
            if let Err(err) = fs::remove_dir_all(&backup) {
                warn!(path = %backup.display(), error = %err, "failed to remove backup directory");
            }
        }
        info!(path = %self.final_dir.display(), "committed dataset directory");
        Ok(self.final_dir.clone())
    }

    /// Drop the staged data, leaving the final directory untouched.
    pub fn cleanup(mut self) -> BenchResult<()> {
        self.finished = true;
        if self.temp_dir.exists() {
            fs::remove_dir_all(&self.temp_dir)?;
        }
        Ok(())
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    pub fn final_dir(&self) -> &Path {
        &self.final_dir
    }
}

impl Drop for StagedDirectory {
    fn drop(&mut self) {
        if self.finished || !self.temp_dir.exists() {
            return;
        }
        warn!(path = %self.temp_dir.display(), "discarding uncommitted staging directory");
        if let Err(err) = fs::remove_dir_all(&self.temp_dir) {
            warn!(path = %self.temp_dir.display(), error = %err, "failed to remove staging directory");
        }
    }
}

/// `<final_dir>.<suffix>`, keeping any dots already in the directory name.
fn sibling_path(final_dir: &Path, suffix: &str) -> PathBuf {
    let mut name = final_dir
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".");
    name.push(suffix);
    final_dir.with_file_name(name)
}
