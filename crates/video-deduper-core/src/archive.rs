//! Moves duplicates out of the input root and records where they came from.

use chrono::Local;
use log::{debug, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::logging::{log_file_error, log_fs_modification};
use crate::types::{DuplicateRecord, SIDECAR_EXTENSION};

/// Subdirectory of the archive root that mirrors the input tree
pub const DUPLICATES_DIR: &str = "duplicates";

/// Sidecar location for an archived video: same directory, same stem
pub fn sidecar_path(video: &Path) -> PathBuf {
    video.with_extension(SIDECAR_EXTENSION)
}

pub struct ArchiveWriter {
    input_root: PathBuf,
    duplicates_root: PathBuf,
}

impl ArchiveWriter {
    pub fn new(input_root: impl Into<PathBuf>, archive_root: impl AsRef<Path>) -> Self {
        Self {
            input_root: input_root.into(),
            duplicates_root: archive_root.as_ref().join(DUPLICATES_DIR),
        }
    }

    pub fn duplicates_root(&self) -> &Path {
        &self.duplicates_root
    }

    /// Path of `path` below the input root, or just its file name when it lies elsewhere
    fn relative<'p>(&self, path: &'p Path) -> &'p Path {
        path.strip_prefix(&self.input_root)
            .unwrap_or_else(|_| Path::new(path.file_name().unwrap_or_default()))
    }

    /// Where `duplicate` ends up once archived
    pub fn destination(&self, duplicate: &Path) -> PathBuf {
        self.duplicates_root.join(self.relative(duplicate))
    }

    fn original_label(&self, original: &Path) -> PathBuf {
        original
            .strip_prefix(&self.input_root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| original.to_path_buf())
    }

    /// Record the decision without touching the filesystem
    pub fn plan(&self, duplicate: &Path, original: &Path) -> DuplicateRecord {
        DuplicateRecord {
            duplicate: duplicate.to_path_buf(),
            original: self.original_label(original),
            archived_to: None,
            archived_on: Local::now().naive_local(),
        }
    }

    /// Move `duplicate` under the duplicates tree and write its sidecar.
    ///
    /// The move and the sidecar write are separate steps; a failure in either
    /// surfaces as `ArchiveIo` and leaves whatever the first step did in place.
    pub fn archive(&self, duplicate: &Path, original: &Path) -> Result<DuplicateRecord> {
        let target = self.destination(duplicate);

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                log_file_error(parent, "create_dir_all", &e);
                Error::archive_io(parent, e)
            })?;
        }

        if target.exists() {
            warn!(
                "Archive target {} already exists and will be replaced by {}",
                target.display(),
                duplicate.display()
            );
        }

        move_file(duplicate, &target).map_err(|e| {
            log_file_error(duplicate, "move", &e);
            Error::archive_io(duplicate, e)
        })?;
        log_fs_modification(
            "move",
            duplicate,
            Some(&format!("archived to {}", target.display())),
        );

        let mut record = self.plan(duplicate, original);
        record.archived_to = Some(target.clone());

        let sidecar = sidecar_path(&target);
        fs::write(&sidecar, record.sidecar_text()).map_err(|e| {
            log_file_error(&sidecar, "write_sidecar", &e);
            Error::archive_io(&sidecar, e)
        })?;
        log_fs_modification("create", &sidecar, None);

        Ok(record)
    }
}

/// Rename, falling back to copy + remove when the rename is refused (e.g. across devices)
fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) => {
            debug!(
                "Rename {} -> {} failed ({}), copying instead",
                from.display(),
                to.display(),
                e
            );
            fs::copy(from, to)?;
            fs::remove_file(from)
        }
    }
}
