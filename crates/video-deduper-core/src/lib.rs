//! Core functionality for finding and archiving near-duplicate videos.
//!
//! This library provides the components of a detection run:
//! - File discovery and metadata snapshots
//! - Frame sampling and perceptual hashing into per-video signatures
//! - Pairwise signature comparison and duplicate resolution
//! - Archiving with sidecar provenance records, and reading them back

// -- External Dependencies --
use log::{info, warn};
use std::fs;
use std::path::Path;

// -- Internal Modules --
mod error;

// -- Public Re-exports --
pub use config::{Config, LogLevel};
pub use error::{Error, Result};
pub use types::*;

// -- Public Modules --
pub mod archive;
pub mod config;
pub mod deduplication;
pub mod discovery;
pub mod ingest;
pub mod logging;
pub mod processing;
pub mod results;
pub mod types;

use archive::ArchiveWriter;
use deduplication::DuplicateResolver;
use processing::{FfmpegDecoder, VideoDecoder};

/// Main entry point for the deduplication process
pub struct VideoDeduper {
    config: Config,
    decoder: Box<dyn VideoDecoder>,
}

impl VideoDeduper {
    /// Create a deduper that decodes through the configured ffmpeg tools
    pub fn new(config: Config) -> Self {
        let decoder = FfmpegDecoder::new(&config.ffmpeg_path, &config.ffprobe_path);
        Self::with_decoder(config, Box::new(decoder))
    }

    /// Create a deduper over any decoder
    pub fn with_decoder(config: Config, decoder: Box<dyn VideoDecoder>) -> Self {
        Self { config, decoder }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Enumerate the videos a run would consider, skipping an archive nested in the input root
    pub fn discover_videos(&self) -> Result<Vec<VideoFile>> {
        let archive = &self.config.archive_dir;
        let excluded = if archive.starts_with(&self.config.input_dir) {
            Some(archive.as_path())
        } else {
            None
        };
        discovery::discover_videos_excluding(&self.config.input_dir, excluded)
    }

    /// Run one detection pass: discover, fingerprint, compare, archive.
    ///
    /// Parameters are validated before any file is touched. An input root with no
    /// videos yields an empty summary rather than an error.
    pub fn run(&self) -> Result<DetectionSummary> {
        self.config.validate()?;

        info!(
            "Starting detection with threshold={}, sample_interval={}s, hash_match={:?}",
            self.config.threshold, self.config.sample_interval_secs, self.config.hash_match
        );

        let files = self.discover_videos()?;
        if files.is_empty() {
            warn!("No video files found in the input directory!");
            return Ok(DetectionSummary {
                dry_run: self.config.dry_run,
                ..DetectionSummary::default()
            });
        }
        info!("Found {} videos to analyze", files.len());

        if !self.config.dry_run {
            let duplicates_dir = self.config.duplicates_dir();
            fs::create_dir_all(&duplicates_dir)
                .map_err(|e| Error::ArchiveIo {
                    path: duplicates_dir,
                    source: e,
                })?;
        }

        let writer = ArchiveWriter::new(&self.config.input_dir, &self.config.archive_dir);
        DuplicateResolver::new(&self.config, self.decoder.as_ref(), &writer).resolve(&files)
    }
}

/// Detect and archive duplicates with default settings apart from the given parameters
pub fn detect_duplicates(
    input_root: &Path,
    archive_root: &Path,
    threshold: f64,
    sample_interval_secs: u32,
) -> Result<DetectionSummary> {
    let mut config = Config::new(input_root, archive_root);
    config.threshold = threshold;
    config.sample_interval_secs = sample_interval_secs;
    VideoDeduper::new(config).run()
}
