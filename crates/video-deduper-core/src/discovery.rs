use log::{debug, warn};
use std::fs;
use std::io;
use std::path::Path;
use std::time::SystemTime;
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::types::{VideoFile, VideoFormat};

/// Discover videos under `input_root`, recursively, in sorted file-name order
pub fn discover_videos(input_root: &Path) -> Result<Vec<VideoFile>> {
    discover_videos_excluding(input_root, None)
}

/// Like [`discover_videos`], but never descends into `excluded`.
///
/// Used when the archive root lives inside the input root.
pub fn discover_videos_excluding(input_root: &Path, excluded: Option<&Path>) -> Result<Vec<VideoFile>> {
    if !input_root.is_dir() {
        return Err(Error::FileNotFound(input_root.to_path_buf()));
    }

    let mut videos = Vec::new();

    for entry in WalkDir::new(input_root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| excluded.map_or(true, |skip| e.path() != skip))
        .filter_map(|e| match e {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!("Skipping unreadable directory entry: {}", err);
                None
            }
        })
        .filter(|e| e.file_type().is_file())
    {
        let path = entry.path();

        let format = match VideoFormat::from_path(path) {
            Some(format) if format.is_supported() => format,
            _ => continue,
        };

        match get_file_metadata(path) {
            Ok((size, last_modified)) => videos.push(VideoFile {
                path: path.to_path_buf(),
                size,
                last_modified,
                format,
            }),
            Err(e) => warn!("Error reading metadata for {}: {}", path.display(), e),
        }
    }

    debug!("Discovered {} videos under {}", videos.len(), input_root.display());
    Ok(videos)
}

fn get_file_metadata(path: &Path) -> io::Result<(u64, SystemTime)> {
    let metadata = fs::metadata(path)?;
    Ok((metadata.len(), metadata.modified()?))
}

/// Returns if the given path has an allowed video extension
pub fn is_video_path(path: &Path) -> bool {
    VideoFormat::from_path(path).map_or(false, |format| format.is_supported())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn create_test_video(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, b"DUMMY VIDEO DATA").unwrap();
        path
    }

    #[test]
    fn test_is_video_path() {
        for name in ["a.mp4", "a.avi", "a.mov", "a.mkv", "a.flv", "a.wmv", "A.MP4", "b.Mkv"] {
            assert!(is_video_path(Path::new(name)), "{}", name);
        }
        assert!(!is_video_path(Path::new("a.txt")));
        assert!(!is_video_path(Path::new("a.webm")));
        assert!(!is_video_path(Path::new("mp4")));
    }

    #[test]
    fn test_discover_recursive_and_sorted() {
        let dir = tempdir().unwrap();
        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();

        create_test_video(dir.path(), "c.mp4");
        create_test_video(dir.path(), "a.MOV");
        create_test_video(&sub, "b.mkv");
        create_test_video(dir.path(), "notes.txt");

        let found: Vec<PathBuf> = discover_videos(dir.path())
            .unwrap()
            .into_iter()
            .map(|v| v.path)
            .collect();

        assert_eq!(
            found,
            vec![
                dir.path().join("a.MOV"),
                dir.path().join("c.mp4"),
                sub.join("b.mkv"),
            ]
        );
    }

    #[test]
    fn test_metadata_snapshot() {
        let dir = tempdir().unwrap();
        create_test_video(dir.path(), "clip.avi");

        let videos = discover_videos(dir.path()).unwrap();
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].size, 16);
        assert_eq!(videos[0].format, VideoFormat::Avi);
    }

    #[test]
    fn test_excluded_subtree_is_skipped() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("archive");
        fs::create_dir(&archive).unwrap();
        create_test_video(dir.path(), "keep.mp4");
        create_test_video(&archive, "old.mp4");

        let videos = discover_videos_excluding(dir.path(), Some(&archive)).unwrap();
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].path, dir.path().join("keep.mp4"));
    }

    #[test]
    fn test_empty_and_missing_roots() {
        let dir = tempdir().unwrap();
        assert!(discover_videos(dir.path()).unwrap().is_empty());

        let result = discover_videos(Path::new("/path/that/does/not/exist"));
        assert!(matches!(result, Err(Error::FileNotFound(_))));
    }
}
