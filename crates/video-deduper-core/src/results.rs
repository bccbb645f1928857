//! Reads archive decisions back from their sidecar records.

use log::{error, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

use crate::archive::DUPLICATES_DIR;
use crate::discovery::is_video_path;
use crate::error::{Error, Result};
use crate::types::{SidecarFields, SIDECAR_EXTENSION};

/// One archived duplicate as reported to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchivedDuplicate {
    /// Location of the archived video relative to the duplicates tree
    pub duplicate: PathBuf,
    pub original: String,
    pub archived_date: String,
}

/// List every archived duplicate that has a readable sidecar.
///
/// A missing duplicates tree is an empty listing. Malformed sidecars and sidecars
/// whose video has gone are logged and skipped.
pub fn list_archived(archive_root: &Path) -> Result<Vec<ArchivedDuplicate>> {
    let duplicates_root = archive_root.join(DUPLICATES_DIR);
    if !duplicates_root.is_dir() {
        info!("No results directory found at {}", duplicates_root.display());
        return Ok(Vec::new());
    }

    let mut results = Vec::new();

    for entry in WalkDir::new(&duplicates_root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let sidecar = entry.path();
        let is_sidecar = sidecar
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or(false, |ext| ext.eq_ignore_ascii_case(SIDECAR_EXTENSION));
        if !is_sidecar {
            continue;
        }

        let fields = match fs::read_to_string(sidecar) {
            Ok(text) => match SidecarFields::parse(&text) {
                Some(fields) => fields,
                None => {
                    error!("Error processing result file {}: malformed record", sidecar.display());
                    continue;
                }
            },
            Err(e) => {
                error!("Error processing result file {}: {}", sidecar.display(), e);
                continue;
            }
        };

        let video = match find_archived_video(sidecar) {
            Some(video) => video,
            None => continue,
        };

        let duplicate = video
            .strip_prefix(&duplicates_root)
            .map(Path::to_path_buf)
            .unwrap_or(video);

        results.push(ArchivedDuplicate {
            duplicate,
            original: fields.original,
            archived_date: fields.archived_date,
        });
    }

    info!("Returning {} results", results.len());
    Ok(results)
}

/// Video next to `sidecar` that shares its stem
fn find_archived_video(sidecar: &Path) -> Option<PathBuf> {
    let dir = sidecar.parent()?;
    let stem = sidecar.file_stem()?;

    let mut candidates: Vec<PathBuf> = fs::read_dir(dir)
        .ok()?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.file_stem() == Some(stem) && p.is_file() && is_video_path(p))
        .collect();
    candidates.sort();
    candidates.into_iter().next()
}

/// Resolve `name` inside the duplicates tree, refusing anything that would leave it
pub fn locate_archived(archive_root: &Path, name: &str) -> Result<PathBuf> {
    let relative = Path::new(name);
    let confined = !name.is_empty()
        && relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
    if !confined {
        return Err(Error::FileNotFound(relative.to_path_buf()));
    }

    let path = archive_root.join(DUPLICATES_DIR).join(relative);
    if path.is_file() {
        Ok(path)
    } else {
        Err(Error::FileNotFound(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_archived(root: &Path, rel: &str, sidecar: Option<&str>) {
        let video = root.join(DUPLICATES_DIR).join(rel);
        fs::create_dir_all(video.parent().unwrap()).unwrap();
        fs::write(&video, b"video").unwrap();
        if let Some(text) = sidecar {
            fs::write(video.with_extension("txt"), text).unwrap();
        }
    }

    #[test]
    fn test_list_reads_sidecars() {
        let archive = tempdir().unwrap();
        write_archived(
            archive.path(),
            "b.mkv",
            Some("Original file: a.mkv\nArchived on: 2024-05-01 10:00:00\n"),
        );
        write_archived(
            archive.path(),
            "nested/d.avi",
            Some("Original file: nested/c.avi\nArchived on: 2024-05-02 11:30:00\n"),
        );

        let listing = list_archived(archive.path()).unwrap();
        assert_eq!(
            listing,
            vec![
                ArchivedDuplicate {
                    duplicate: PathBuf::from("b.mkv"),
                    original: "a.mkv".to_string(),
                    archived_date: "2024-05-01 10:00:00".to_string(),
                },
                ArchivedDuplicate {
                    duplicate: PathBuf::from("nested/d.avi"),
                    original: "nested/c.avi".to_string(),
                    archived_date: "2024-05-02 11:30:00".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_list_skips_malformed_and_orphaned() {
        let archive = tempdir().unwrap();
        write_archived(archive.path(), "bad.mp4", Some("garbage"));
        write_archived(archive.path(), "nosidecar.mp4", None);

        let orphan = archive.path().join(DUPLICATES_DIR).join("orphan.txt");
        fs::write(&orphan, "Original file: x.mp4\nArchived on: 2024-01-01 00:00:00\n").unwrap();

        assert!(list_archived(archive.path()).unwrap().is_empty());
    }

    #[test]
    fn test_list_without_archive_is_empty() {
        let archive = tempdir().unwrap();
        assert!(list_archived(&archive.path().join("missing")).unwrap().is_empty());
    }

    #[test]
    fn test_locate_rejects_traversal() {
        let archive = tempdir().unwrap();
        write_archived(archive.path(), "sub/clip.mp4", None);
        fs::write(archive.path().join("secret.mp4"), b"s").unwrap();

        let found = locate_archived(archive.path(), "sub/clip.mp4").unwrap();
        assert_eq!(found, archive.path().join("duplicates/sub/clip.mp4"));

        for name in ["../secret.mp4", "/etc/passwd", "sub/../../secret.mp4", "", "sub/none.mp4"] {
            assert!(
                matches!(locate_archived(archive.path(), name), Err(Error::FileNotFound(_))),
                "{}",
                name
            );
        }
    }
}
