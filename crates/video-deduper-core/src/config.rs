use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::deduplication::HashMatch;
use crate::error::{Error, Result};

/// Environment variables honoured by [`Config::apply_env`]
pub const ENV_INPUT_DIR: &str = "VIDEO_DEDUP_INPUT_DIR";
pub const ENV_ARCHIVE_DIR: &str = "VIDEO_DEDUP_ARCHIVE_DIR";
pub const ENV_MAX_UPLOAD_BYTES: &str = "VIDEO_DEDUP_MAX_UPLOAD_BYTES";
pub const ENV_FFMPEG: &str = "VIDEO_DEDUP_FFMPEG";
pub const ENV_FFPROBE: &str = "VIDEO_DEDUP_FFPROBE";
pub const ENV_LOG: &str = "VIDEO_DEDUP_LOG";

/// Log level for the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Parse a level name, case-insensitively
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "error" => Some(Self::Error),
            "warn" | "warning" => Some(Self::Warn),
            "info" => Some(Self::Info),
            "debug" => Some(Self::Debug),
            "trace" => Some(Self::Trace),
            _ => None,
        }
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Configuration for the video deduplication process
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory scanned for videos
    pub input_dir: PathBuf,

    /// Archive root; duplicates land under `<archive_dir>/duplicates`
    pub archive_dir: PathBuf,

    /// Minimum similarity score (0.0 - 1.0) for a pair to count as duplicates
    pub threshold: f64,

    /// Seconds of video between sampled frames
    pub sample_interval_secs: u32,

    /// How two frame hashes are matched
    pub hash_match: HashMatch,

    /// Number of threads to use for signature building (0 = auto)
    pub threads: usize,

    /// Whether to run without moving files
    pub dry_run: bool,

    /// Whether to draw progress bars
    pub show_progress: bool,

    /// Upload size cap in bytes
    pub max_upload_bytes: u64,

    /// ffmpeg executable
    pub ffmpeg_path: PathBuf,

    /// ffprobe executable
    pub ffprobe_path: PathBuf,

    /// Log level
    pub log_level: LogLevel,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("uploads"),
            archive_dir: PathBuf::from("archive"),
            threshold: 0.95,
            sample_interval_secs: 1,
            hash_match: HashMatch::Exact,
            threads: 0, // Auto
            dry_run: false,
            show_progress: true,
            max_upload_bytes: 1024 * 1024 * 1024,
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
            log_level: LogLevel::Info,
        }
    }
}

impl Config {
    /// Default configuration pointed at the given directories
    pub fn new(input_dir: impl Into<PathBuf>, archive_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            archive_dir: archive_dir.into(),
            ..Default::default()
        }
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .map_err(|e| Error::Configuration(format!("Failed to open config file: {}", e)))?;

        let config: Config = serde_json::from_reader(file)
            .map_err(|e| Error::Configuration(format!("Failed to parse config file: {}", e)))?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .map_err(|e| Error::Configuration(format!("Failed to create config file: {}", e)))?;

        serde_json::to_writer_pretty(file, self)
            .map_err(|e| Error::Configuration(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Load `.env` if present, then apply `VIDEO_DEDUP_*` overrides
    pub fn apply_env(&mut self) -> Result<()> {
        dotenv::dotenv().ok();
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key/value source
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(ENV_INPUT_DIR) {
            self.input_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup(ENV_ARCHIVE_DIR) {
            self.archive_dir = PathBuf::from(dir);
        }
        if let Some(bytes) = lookup(ENV_MAX_UPLOAD_BYTES) {
            self.max_upload_bytes = bytes.trim().parse().map_err(|_| {
                Error::Configuration(format!("{} is not a byte count: {}", ENV_MAX_UPLOAD_BYTES, bytes))
            })?;
        }
        if let Some(path) = lookup(ENV_FFMPEG) {
            self.ffmpeg_path = PathBuf::from(path);
        }
        if let Some(path) = lookup(ENV_FFPROBE) {
            self.ffprobe_path = PathBuf::from(path);
        }
        if let Some(level) = lookup(ENV_LOG) {
            self.log_level = LogLevel::parse(&level)
                .ok_or_else(|| Error::Configuration(format!("Unknown log level: {}", level)))?;
        }
        Ok(())
    }

    /// Validate detection parameters. Runs before any file I/O.
    pub fn validate(&self) -> Result<()> {
        if !self.threshold.is_finite() || !(0.0..=1.0).contains(&self.threshold) {
            return Err(Error::InvalidParameters(format!(
                "threshold must be between 0.0 and 1.0, got {}",
                self.threshold
            )));
        }

        if self.sample_interval_secs < 1 {
            return Err(Error::InvalidParameters(
                "sample interval must be at least 1 second".to_string(),
            ));
        }

        if let HashMatch::Hamming { max_distance } = self.hash_match {
            if max_distance > 64 {
                return Err(Error::InvalidParameters(format!(
                    "hamming distance must be at most 64, got {}",
                    max_distance
                )));
            }
        }

        if self.max_upload_bytes == 0 {
            return Err(Error::Configuration(
                "Upload size cap must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Worker count after resolving `0 = auto`
    pub fn effective_threads(&self) -> usize {
        if self.threads == 0 {
            num_cpus::get()
        } else {
            self.threads
        }
    }

    /// Directory holding archived duplicates and their sidecars
    pub fn duplicates_dir(&self) -> PathBuf {
        self.archive_dir.join(crate::archive::DUPLICATES_DIR)
    }
}
