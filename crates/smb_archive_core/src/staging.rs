//! Local staging of remote files between download and upload.
//!
//! A [`StagedFile`] lives under the staging directory, named after the remote
//! entry. It is removed when dropped unless [`StagedFile::remove`] already did
//! so, which keeps abandoned transfers from filling ephemeral storage across
//! warm invocations.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::contract::ArchiveError;

pub const DEFAULT_STAGING_DIR: &str = "/tmp";

/// Rejects names that would escape the staging directory or alias another file.
pub fn validate_staging_name(file_name: &str) -> Result<(), ArchiveError> {
    if file_name.is_empty() || file_name == "." || file_name == ".." {
        return Err(ArchiveError::Staging(format!(
            "Refusing to stage entry with reserved name '{file_name}'"
        )));
    }
    if file_name.contains(['/', '\\', '\0']) {
        return Err(ArchiveError::Staging(format!(
            "Refusing to stage entry '{file_name}': name contains a path separator"
        )));
    }
    Ok(())
}

#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    file: Option<File>,
    removed: bool,
}

impl StagedFile {
    pub fn create(staging_dir: &Path, file_name: &str) -> Result<Self, ArchiveError> {
        validate_staging_name(file_name)?;
        let path = staging_dir.join(file_name);
        let file = File::create(&path).map_err(|error| {
            ArchiveError::Staging(format!(
                "Failed to create staging file '{}': {error}",
                path.display()
            ))
        })?;
        Ok(Self {
            path,
            file: Some(file),
            removed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sink for the remote transfer. Fails once the file has been sealed.
    pub fn writer(&mut self) -> Result<&mut File, ArchiveError> {
        let path = &self.path;
        self.file.as_mut().ok_or_else(|| {
            ArchiveError::Staging(format!(
                "Staging file '{}' is already sealed",
                path.display()
            ))
        })
    }

    /// Flushes and closes the write handle so the file can be read back by path.
    pub fn seal(&mut self) -> Result<(), ArchiveError> {
        let Some(mut file) = self.file.take() else {
            return Ok(());
        };
        file.flush()
            .and_then(|()| file.sync_all())
            .map_err(|error| {
                ArchiveError::Staging(format!(
                    "Failed to flush staging file '{}': {error}",
                    self.path.display()
                ))
            })
    }

    pub fn remove(mut self) -> Result<(), ArchiveError> {
        self.file.take();
        self.removed = true;
        fs::remove_file(&self.path).map_err(|error| {
            ArchiveError::Cleanup(format!(
                "Failed to remove staging file '{}': {error}",
                self.path.display()
            ))
        })
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        self.file.take();
        let _ = fs::remove_file(&self.path);
    }
}
