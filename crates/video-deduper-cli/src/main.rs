use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use log::{info, LevelFilter};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use video_deduper_core::deduplication::HashMatch;
use video_deduper_core::{ingest, logging, results, Config, DetectionSummary, LogLevel, VideoDeduper};

#[derive(Parser)]
#[command(name = "video-deduper")]
#[command(about = "Find near-duplicate videos and archive them")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fingerprint every video in the input directory and archive duplicates
    Detect {
        /// Directory holding the videos to check
        input_dir: Option<PathBuf>,

        /// Where duplicates, sidecars and run logs are written
        archive_dir: Option<PathBuf>,

        /// Minimum similarity (0.0 to 1.0) for two videos to count as duplicates
        #[arg(short, long)]
        threshold: Option<f64>,

        /// Seconds between sampled frames
        #[arg(short = 's', long)]
        sample_interval: Option<u32>,

        /// Treat frame hashes within this many differing bits as equal
        #[arg(long)]
        hamming: Option<u32>,

        /// Worker threads for fingerprinting (0 = one per CPU)
        #[arg(long)]
        threads: Option<usize>,

        /// Report decisions without moving anything
        #[arg(long)]
        dry_run: bool,

        /// Hide progress bars
        #[arg(long)]
        no_progress: bool,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,

        /// Verbosity level
        #[arg(short, long, action = clap::ArgAction::Count)]
        verbose: u8,

        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List archived duplicates as JSON
    Results {
        /// Archive directory to read
        archive_dir: Option<PathBuf>,

        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Copy videos into the input directory
    Ingest {
        /// Video files to add
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Input directory to copy into
        #[arg(long)]
        input_dir: Option<PathBuf>,

        /// Maximum accepted file size in bytes
        #[arg(long)]
        max_bytes: Option<u64>,

        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Copy an archived duplicate out of the archive
    Fetch {
        /// Path of the file inside the duplicates directory, as listed by `results`
        name: String,

        /// Directory to copy the file into
        #[arg(short, long, default_value = ".")]
        dest: PathBuf,

        /// Archive directory to read
        #[arg(long)]
        archive_dir: Option<PathBuf>,

        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Delete and recreate the input and archive directories
    Reset {
        /// Confirm that everything in both directories may be deleted
        #[arg(long)]
        yes: bool,

        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Generate default configuration file
    GenerateConfig {
        /// Path to save configuration file
        #[arg(default_value = "video-deduper.json")]
        path: PathBuf,
    },
}

/// File settings (or defaults), then `.env` and `VIDEO_DEDUP_*` overrides
fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::default(),
    };
    config.apply_env().context("applying environment overrides")?;
    Ok(config)
}

fn init_console_logger(level: LogLevel) {
    env_logger::Builder::new()
        .filter_level(LevelFilter::from(level))
        .init();
}

fn print_summary(summary: &DetectionSummary) {
    if summary.is_empty_input() {
        println!("No video files found in the input directory");
        return;
    }

    println!("Files processed:    {}", summary.files_processed);
    println!("Signature failures: {}", summary.signature_failures);
    println!(
        "Duplicates {}: {}",
        if summary.dry_run { "found (dry run)" } else { "archived" },
        summary.duplicates_found()
    );
    for record in &summary.duplicates {
        println!(
            "  {} (original: {})",
            record.duplicate.display(),
            record.original.display()
        );
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Detect {
            input_dir,
            archive_dir,
            threshold,
            sample_interval,
            hamming,
            threads,
            dry_run,
            no_progress,
            json,
            verbose,
            config,
        } => {
            let mut config = load_config(config.as_deref())?;

            // Override config with command line arguments
            if let Some(dir) = input_dir {
                config.input_dir = dir;
            }
            if let Some(dir) = archive_dir {
                config.archive_dir = dir;
            }
            if let Some(threshold) = threshold {
                config.threshold = threshold;
            }
            if let Some(interval) = sample_interval {
                config.sample_interval_secs = interval;
            }
            if let Some(max_distance) = hamming {
                config.hash_match = HashMatch::Hamming { max_distance };
            }
            if let Some(threads) = threads {
                config.threads = threads;
            }
            config.dry_run |= dry_run;
            config.show_progress &= !no_progress;

            config.log_level = match verbose {
                0 => config.log_level,
                1 => LogLevel::Debug,
                _ => LogLevel::Trace,
            };

            // Reject bad parameters before the run log touches the archive
            config.validate()?;

            let log_path = logging::init_run_logger(&config.archive_dir, config.log_level.into())?;

            let deduper = VideoDeduper::new(config);
            let summary = deduper.run().context("duplicate detection failed")?;
            info!("Run log written to {}", log_path.display());

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_summary(&summary);
            }
            Ok(())
        }

        Commands::Results {
            archive_dir,
            config,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(dir) = archive_dir {
                config.archive_dir = dir;
            }
            init_console_logger(config.log_level);

            let listing = results::list_archived(&config.archive_dir)?;
            println!("{}", serde_json::to_string_pretty(&listing)?);
            Ok(())
        }

        Commands::Ingest {
            files,
            input_dir,
            max_bytes,
            config,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(dir) = input_dir {
                config.input_dir = dir;
            }
            if let Some(bytes) = max_bytes {
                config.max_upload_bytes = bytes;
            }
            config.validate()?;
            init_console_logger(config.log_level);

            for file in &files {
                let stored = ingest::ingest_video(file, &config.input_dir, config.max_upload_bytes)
                    .with_context(|| format!("ingesting {}", file.display()))?;
                println!("{} -> {}", file.display(), stored.display());
            }
            Ok(())
        }

        Commands::Fetch {
            name,
            dest,
            archive_dir,
            config,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(dir) = archive_dir {
                config.archive_dir = dir;
            }
            init_console_logger(config.log_level);

            let source = results::locate_archived(&config.archive_dir, &name)?;
            let file_name = source
                .file_name()
                .with_context(|| format!("{} has no file name", source.display()))?;

            fs::create_dir_all(&dest)
                .with_context(|| format!("creating {}", dest.display()))?;
            let target = dest.join(file_name);
            fs::copy(&source, &target)
                .with_context(|| format!("copying {} to {}", source.display(), target.display()))?;

            println!("{}", target.display());
            Ok(())
        }

        Commands::Reset { yes, config } => {
            let config = load_config(config.as_deref())?;
            if !yes {
                bail!(
                    "reset deletes everything in {} and {}; pass --yes to confirm",
                    config.input_dir.display(),
                    config.archive_dir.display()
                );
            }
            init_console_logger(config.log_level);

            ingest::reset_directories(&config.input_dir, &config.archive_dir)?;
            println!(
                "Reset {} and {}",
                config.input_dir.display(),
                config.archive_dir.display()
            );
            Ok(())
        }

        Commands::GenerateConfig { path } => {
            let config = Config::default();
            config.save_to_file(&path)?;
            println!("Configuration file generated at: {}", path.display());
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let kind = err
                .downcast_ref::<video_deduper_core::Error>()
                .map_or("error", |e| e.kind());
            eprintln!("{}: {:#}", kind, err);
            ExitCode::FAILURE
        }
    }
}
