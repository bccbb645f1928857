use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Extension given to sidecar provenance records
pub const SIDECAR_EXTENSION: &str = "txt";

/// Timestamp layout used in sidecar records
pub const ARCHIVE_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const ORIGINAL_PREFIX: &str = "Original file: ";
const ARCHIVED_PREFIX: &str = "Archived on: ";

/// Supported video container formats
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VideoFormat {
    Mp4,
    Avi,
    Mov,
    Mkv,
    Flv,
    Wmv,
    Other(String),
}

impl VideoFormat {
    /// Determine format from file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "mp4" => Self::Mp4,
            "avi" => Self::Avi,
            "mov" => Self::Mov,
            "mkv" => Self::Mkv,
            "flv" => Self::Flv,
            "wmv" => Self::Wmv,
            other => Self::Other(other.to_string()),
        }
    }

    /// Format of a path, if it has an extension at all
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
    }

    /// Check if format is on the allow-list
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

/// Representation of a discovered video file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoFile {
    /// Full path to the video file
    pub path: PathBuf,

    /// File size in bytes
    pub size: u64,

    /// Last modified timestamp, used for the keep-the-older tie-break
    pub last_modified: SystemTime,

    /// Container format
    pub format: VideoFormat,
}

/// Lifecycle of a file during one detection run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileState {
    Unseen,
    SignatureBuilt,
    Kept,
    Archived,
}

/// Provenance of one archived duplicate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateRecord {
    /// Where the duplicate lived in the input root
    pub duplicate: PathBuf,

    /// The file kept as original, as written to the sidecar
    pub original: PathBuf,

    /// Where the duplicate was moved to (None on dry runs)
    pub archived_to: Option<PathBuf>,

    pub archived_on: NaiveDateTime,
}

impl DuplicateRecord {
    /// Two-line sidecar body
    pub fn sidecar_text(&self) -> String {
        format!(
            "{}{}\n{}{}\n",
            ORIGINAL_PREFIX,
            self.original.display(),
            ARCHIVED_PREFIX,
            self.archived_on.format(ARCHIVE_DATE_FORMAT)
        )
    }
}

/// Fields read back from a sidecar record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidecarFields {
    pub original: String,
    pub archived_date: String,
}

impl SidecarFields {
    /// Parse the two-line sidecar layout. Returns None when either line is missing.
    pub fn parse(text: &str) -> Option<Self> {
        let mut lines = text.lines();
        let original = lines.next()?.strip_prefix(ORIGINAL_PREFIX)?.to_string();
        let archived_date = lines.next()?.strip_prefix(ARCHIVED_PREFIX)?.to_string();
        Some(Self {
            original,
            archived_date,
        })
    }
}

/// Result of a detection run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectionSummary {
    /// Number of video files considered
    pub files_processed: usize,

    /// Files whose signature could not be built
    pub signature_failures: usize,

    /// Archive decisions, in the order they were made
    pub duplicates: Vec<DuplicateRecord>,

    /// Whether files were left in place
    pub dry_run: bool,
}

impl DetectionSummary {
    pub fn duplicates_found(&self) -> usize {
        self.duplicates.len()
    }

    /// True when the input root held no matching videos
    pub fn is_empty_input(&self) -> bool {
        self.files_processed == 0
    }
}
