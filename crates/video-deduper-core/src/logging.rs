use chrono::Local;
use log::{error, info, LevelFilter};
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};

use log4rs::append::console::ConsoleAppender;
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::Handle;

use crate::error::{Error, Result};

const LOG_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} - {l} - {m}{n}";

/// Handle of the installed logger; later runs swap its config
static LOGGER: OnceCell<Handle> = OnceCell::new();

/// Path of the run log for a run started now
pub fn run_log_path(archive_root: &Path) -> PathBuf {
    archive_root.join(format!(
        "duplicate_detection_{}.log",
        Local::now().format("%Y%m%d_%H%M%S")
    ))
}

/// Route logging to the console and to a fresh run log under `archive_root`.
///
/// Returns the path of the run log.
pub fn init_run_logger(archive_root: &Path, level: LevelFilter) -> Result<PathBuf> {
    std::fs::create_dir_all(archive_root)?;

    let log_file_path = run_log_path(archive_root);

    let file = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .build(&log_file_path)
        .map_err(|e| Error::Logging(format!("Failed to create log appender: {}", e)))?;

    let console = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .build();

    let config = Config::builder()
        .appender(Appender::builder().build("file", Box::new(file)))
        .appender(Appender::builder().build("console", Box::new(console)))
        .build(
            Root::builder()
                .appender("file")
                .appender("console")
                .build(level),
        )
        .map_err(|e| Error::Logging(format!("Failed to build log config: {}", e)))?;

    match LOGGER.get() {
        Some(handle) => handle.set_config(config),
        None => {
            let handle = log4rs::init_config(config)
                .map_err(|e| Error::Logging(format!("Failed to initialize log4rs: {}", e)))?;
            // A concurrent first call may have won; its handle drives the same logger
            let _ = LOGGER.set(handle);
        }
    }

    info!("Logging to file: {}", log_file_path.display());
    Ok(log_file_path)
}

/// Log file operation that failed
pub fn log_file_error(path: &Path, operation: &str, error: &dyn std::error::Error) {
    error!(
        "File operation failed - Operation: {}, Path: {}, Error: {}",
        operation,
        path.display(),
        error
    );
}

/// Log file system modification
pub fn log_fs_modification(operation: &str, path: &Path, details: Option<&str>) {
    let details_str = details.unwrap_or("");
    info!(
        "FS CHANGE - Operation: {}, Path: {}{}",
        operation,
        path.display(),
        if details_str.is_empty() {
            "".to_string()
        } else {
            format!(", Details: {}", details_str)
        }
    );
}
