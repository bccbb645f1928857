use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use super::SignatureComparator;
use crate::archive::ArchiveWriter;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::processing::{VideoDecoder, VideoSignature};
use crate::types::{DetectionSummary, FileState, VideoFile};

/// Files already classified during the current run. Only ever grows.
#[derive(Debug, Default)]
pub struct ProcessedSet(HashSet<PathBuf>);

impl ProcessedSet {
    pub fn contains(&self, path: &Path) -> bool {
        self.0.contains(path)
    }

    /// Returns false when the path was already present
    pub fn insert(&mut self, path: &Path) -> bool {
        self.0.insert(path.to_path_buf())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Mutable state of one detection pass
struct RunState {
    processed: ProcessedSet,
    states: Vec<FileState>,
    summary: DetectionSummary,
}

impl RunState {
    fn new(file_count: usize, dry_run: bool) -> Self {
        Self {
            processed: ProcessedSet::default(),
            states: vec![FileState::Unseen; file_count],
            summary: DetectionSummary {
                files_processed: file_count,
                dry_run,
                ..DetectionSummary::default()
            },
        }
    }

    fn count(&self, state: FileState) -> usize {
        self.states.iter().filter(|s| **s == state).count()
    }
}

/// Splits a file set into originals and duplicates and archives the duplicates
pub struct DuplicateResolver<'a> {
    decoder: &'a dyn VideoDecoder,
    writer: &'a ArchiveWriter,
    comparator: SignatureComparator,
    threshold: f64,
    sample_interval: u32,
    threads: usize,
    dry_run: bool,
    show_progress: bool,
}

impl<'a> DuplicateResolver<'a> {
    pub fn new(config: &Config, decoder: &'a dyn VideoDecoder, writer: &'a ArchiveWriter) -> Self {
        Self {
            decoder,
            writer,
            comparator: SignatureComparator::new(config.hash_match),
            threshold: config.threshold,
            sample_interval: config.sample_interval_secs,
            threads: config.effective_threads(),
            dry_run: config.dry_run,
            show_progress: config.show_progress,
        }
    }

    fn progress_bar(&self, len: usize, message: &'static str) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }

        let bar = ProgressBar::new(len as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("[{eta}] {bar:40.cyan/blue} {pos}/{len} ({percent}%) {msg}")
        {
            bar.set_style(style.progress_chars("##-"));
        }
        bar.set_message(message);
        bar
    }

    /// Build one signature per file, in input order.
    ///
    /// Returns the signatures and the number of files that could not be read.
    pub fn build_signatures(&self, pool: &rayon::ThreadPool, files: &[VideoFile]) -> (Vec<VideoSignature>, usize) {
        let failures = AtomicUsize::new(0);
        let bar = self.progress_bar(files.len(), "Computing video signatures...");

        let signatures: Vec<VideoSignature> = pool.install(|| {
            files
                .par_iter()
                .map(|file| {
                    let signature =
                        match VideoSignature::try_build(&file.path, self.sample_interval, self.decoder) {
                            Ok(signature) => signature,
                            Err(e) => {
                                warn!("Error processing {}: {}", file.path.display(), e);
                                failures.fetch_add(1, Ordering::Relaxed);
                                VideoSignature::empty(&file.path)
                            }
                        };
                    bar.inc(1);
                    signature
                })
                .collect()
        });

        bar.finish_with_message("Signatures computed");
        (signatures, failures.into_inner())
    }

    /// Run the full pass over `files`, which must be in enumeration order
    pub fn resolve(&self, files: &[VideoFile]) -> Result<DetectionSummary> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .build()
            .map_err(|e| Error::Configuration(format!("Failed to build thread pool: {}", e)))?;

        let mut run = RunState::new(files.len(), self.dry_run);

        let (signatures, failures) = self.build_signatures(&pool, files);
        run.summary.signature_failures = failures;
        run.states.fill(FileState::SignatureBuilt);

        let bar = self.progress_bar(files.len(), "Comparing signatures...");

        for outer in 0..files.len() {
            bar.inc(1);
            // No signature, nothing to match
            if run.processed.contains(&files[outer].path) || signatures[outer].is_empty() {
                continue;
            }

            let candidates: Vec<usize> = (0..files.len())
                .filter(|&inner| {
                    inner != outer
                        && !signatures[inner].is_empty()
                        && !run.processed.contains(&files[inner].path)
                })
                .collect();

            let scores: Vec<f64> = pool.install(|| {
                candidates
                    .par_iter()
                    .map(|&inner| self.comparator.compare(&signatures[outer], &signatures[inner]))
                    .collect()
            });

            for (&inner, score) in candidates.iter().zip(scores) {
                if score < self.threshold {
                    continue;
                }
                if self.apply_match(&mut run, files, outer, inner, score)? {
                    // The outer file itself was archived
                    break;
                }
            }
        }

        bar.finish_and_clear();

        let kept = run.count(FileState::Kept);
        let summary = run.summary;
        if summary.duplicates.is_empty() {
            info!("No duplicates found!");
        } else if self.dry_run {
            info!(
                "Dry run completed! {} duplicates would be archived, {} originals kept, {} files processed",
                summary.duplicates_found(),
                kept,
                summary.files_processed
            );
        } else {
            info!(
                "Duplicate detection and archiving completed! {} duplicates archived, {} originals kept, {} files processed",
                summary.duplicates_found(),
                kept,
                summary.files_processed
            );
        }

        Ok(summary)
    }

    /// Record one pair at or above threshold. Returns true when the outer file was the duplicate.
    fn apply_match(
        &self,
        run: &mut RunState,
        files: &[VideoFile],
        outer: usize,
        inner: usize,
        score: f64,
    ) -> Result<bool> {
        run.processed.insert(&files[inner].path);

        // Older file is kept; on a tie the inner file goes
        let (original, duplicate) = if files[outer].last_modified <= files[inner].last_modified {
            (outer, inner)
        } else {
            (inner, outer)
        };

        info!(
            "Found duplicate:\nOriginal: {}\nDuplicate: {}\nSimilarity: {:.3}",
            files[original].path.display(),
            files[duplicate].path.display(),
            score
        );

        let record = if self.dry_run {
            self.writer.plan(&files[duplicate].path, &files[original].path)
        } else {
            self.writer.archive(&files[duplicate].path, &files[original].path)?
        };

        run.summary.duplicates.push(record);
        run.states[duplicate] = FileState::Archived;
        if run.states[original] != FileState::Archived {
            run.states[original] = FileState::Kept;
        }

        if duplicate == outer {
            run.processed.insert(&files[outer].path);
            return Ok(true);
        }
        Ok(false)
    }
}
