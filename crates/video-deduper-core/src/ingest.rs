use log::info;
use std::fs;
use std::path::{Path, PathBuf};

use crate::archive::DUPLICATES_DIR;
use crate::discovery::is_video_path;
use crate::error::{Error, Result};
use crate::logging::{log_file_error, log_fs_modification};

/// Reduce a user-supplied file name to a safe flat name.
///
/// Keeps ASCII letters, digits, `.`, `-` and `_`; whitespace becomes `_`; leading
/// dots and underscores are dropped so the result is never hidden or relative.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(*c, '.' | '-' | '_'))
        .collect();
    cleaned.trim_start_matches(|c: char| c == '.' || c == '_').to_string()
}

/// Copy an uploaded video into the input root. Returns the stored path.
pub fn ingest_video(source: &Path, input_root: &Path, max_bytes: u64) -> Result<PathBuf> {
    let metadata = fs::metadata(source).map_err(|_| Error::FileNotFound(source.to_path_buf()))?;
    if !metadata.is_file() {
        return Err(Error::FileNotFound(source.to_path_buf()));
    }

    let raw_name = source
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let filename = sanitize_filename(raw_name);
    if filename.is_empty() || !is_video_path(Path::new(&filename)) {
        return Err(Error::UnsupportedFormat(raw_name.to_string()));
    }

    if metadata.len() > max_bytes {
        return Err(Error::FileTooLarge {
            path: source.to_path_buf(),
            size: metadata.len(),
            limit: max_bytes,
        });
    }

    fs::create_dir_all(input_root)?;
    let target = input_root.join(&filename);
    fs::copy(source, &target).map_err(|e| {
        log_file_error(&target, "copy", &e);
        Error::Io(e)
    })?;

    log_fs_modification("create", &target, Some(&format!("uploaded from {}", source.display())));
    info!(
        "Successfully uploaded file: {} (Size: {} bytes)",
        filename,
        metadata.len()
    );
    Ok(target)
}

/// Wipe and recreate the input root, archive root and duplicates tree.
///
/// Destroys everything under both roots.
pub fn reset_directories(input_root: &Path, archive_root: &Path) -> Result<()> {
    for dir in [input_root, archive_root] {
        if dir.exists() {
            fs::remove_dir_all(dir).map_err(|e| {
                log_file_error(dir, "remove_dir_all", &e);
                Error::Io(e)
            })?;
            log_fs_modification("delete", dir, Some("directory reset"));
        }
    }

    fs::create_dir_all(input_root)?;
    fs::create_dir_all(archive_root.join(DUPLICATES_DIR))?;

    info!(
        "Directories setup complete. Upload folder: {}",
        input_root.display()
    );
    Ok(())
}
