use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

/// Custom error types for the video-deduper library
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Video could not be opened or reports unusable metadata
    #[error("Unreadable video {}: {reason}", path.display())]
    UnreadableVideo { path: PathBuf, reason: String },

    /// A single sampled frame failed to decode
    #[error("Frame decode error: {0}")]
    FrameDecode(String),

    /// Detection parameters rejected before any file I/O
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    /// Moving a duplicate or writing its sidecar failed
    #[error("Archive operation failed for {}: {source}", path.display())]
    ArchiveIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File not found error
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Invalid configuration error
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Extension is not on the video allow-list
    #[error("Unsupported video format: {0}")]
    UnsupportedFormat(String),

    /// Upload exceeds the configured size cap
    #[error("File {} is {size} bytes, limit is {limit}", path.display())]
    FileTooLarge { path: PathBuf, size: u64, limit: u64 },

    /// Run logger could not be set up
    #[error("Logging setup failed: {0}")]
    Logging(String),
}

impl Error {
    /// Stable machine-readable kind, reported alongside the message
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Io(_) => "io",
            Error::UnreadableVideo { .. } => "unreadable_video",
            Error::FrameDecode(_) => "frame_decode",
            Error::InvalidParameters(_) => "invalid_parameters",
            Error::ArchiveIo { .. } => "archive_io",
            Error::FileNotFound(_) => "file_not_found",
            Error::Configuration(_) => "configuration",
            Error::UnsupportedFormat(_) => "unsupported_format",
            Error::FileTooLarge { .. } => "file_too_large",
            Error::Logging(_) => "logging",
        }
    }

    /// Whether the failure ends the run rather than being recovered locally
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::UnreadableVideo { .. } | Error::FrameDecode(_))
    }

    pub(crate) fn unreadable(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::UnreadableVideo {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn archive_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::ArchiveIo {
            path: path.into(),
            source,
        }
    }
}
