//! Per-file compression and the parallel batch runner.
//!
//! ## Per-file pipeline
//!
//! ```text
//! read → family from extension
//!   ├─ under budget → identify only, return unchanged (no backup, no write)
//!   └─ over budget  → decode → backup → enumerate → search → commit
//! ```
//!
//! Decoding happens before the backup so an unreadable file is reported
//! without leaving a stray backup behind. Nothing touches the original until
//! [`commit`](crate::safety::commit), which replaces it atomically.
//!
//! ## Parallel Processing
//!
//! Files are processed in parallel using [rayon](https://docs.rs/rayon); the
//! search within one file stays sequential. Results come back in input order
//! and progress is streamed over an optional `mpsc` channel as each file
//! finishes.

use crate::imaging::{BackendError, ImageBackend, RustBackend};
use crate::ladder::{CandidatePlan, enumerate};
use crate::policy::CompressionPolicy;
use crate::safety::{self, BackupStatus, SafetyError};
use crate::search::{SearchError, search};
use crate::trial::SourceImage;
use crate::types::{Candidate, CompressionOutcome, FormatFamily};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompressError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(PathBuf),
    #[error("Failed to decode: {0}")]
    Decode(#[source] BackendError),
    #[error(transparent)]
    Backup(SafetyError),
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error(transparent)]
    Commit(SafetyError),
}

/// Compress one file in place with the pure Rust backend.
pub fn compress_file(
    path: &Path,
    policy: &CompressionPolicy,
    backup_suffix: &str,
) -> Result<CompressionOutcome, CompressError> {
    compress_file_with_backend(&RustBackend::new(), path, policy, backup_suffix)
}

/// Compress one file using a specific backend (allows testing with mock).
pub fn compress_file_with_backend<B: ImageBackend>(
    backend: &B,
    path: &Path,
    policy: &CompressionPolicy,
    backup_suffix: &str,
) -> Result<CompressionOutcome, CompressError> {
    let family = FormatFamily::from_path(path)
        .ok_or_else(|| CompressError::UnsupportedFormat(path.to_path_buf()))?;
    let bytes = std::fs::read(path)?;
    let original_bytes = bytes.len() as u64;

    if policy.is_under_budget(original_bytes) {
        let dims = backend.identify(&bytes).map_err(CompressError::Decode)?;
        tracing::debug!(path = %path.display(), original_bytes, "under budget, skipping");
        return Ok(CompressionOutcome {
            path: path.to_path_buf(),
            family,
            original_bytes,
            final_bytes: original_bytes,
            original_width: dims.width,
            original_height: dims.height,
            final_width: dims.width,
            final_height: dims.height,
            scale: 1.0,
            quality: None,
            success: true,
            fallback: false,
            trials: 0,
            backup: None,
        });
    }

    let pixels = backend.decode(&bytes).map_err(CompressError::Decode)?;
    drop(bytes);
    let source = SourceImage {
        pixels,
        family,
        original_bytes,
    };

    let backup = safety::ensure_backup(path, backup_suffix).map_err(CompressError::Backup)?;

    let plan = enumerate(original_bytes, source.width(), family, policy);
    tracing::debug!(
        path = %path.display(),
        scales = ?plan.scales,
        max_trials = plan.max_trials(),
        "searching"
    );
    let found = search(
        backend,
        &source,
        &plan,
        policy.target_bytes,
        policy.time_budget,
    )?;

    safety::commit(path, &found.trial.encoded).map_err(CompressError::Commit)?;

    Ok(CompressionOutcome {
        path: path.to_path_buf(),
        family,
        original_bytes,
        final_bytes: found.trial.bytes(),
        original_width: source.width(),
        original_height: source.height(),
        final_width: found.trial.width,
        final_height: found.trial.height,
        scale: found.trial.scale,
        quality: found.trial.quality,
        success: true,
        fallback: found.fallback,
        trials: found.trials_run,
        backup: match backup {
            BackupStatus::Created(p) => Some(p),
            BackupStatus::AlreadyPresent(_) => None,
        },
    })
}

/// What [`compress_file`] would try for a file, without encoding anything.
#[derive(Debug, Clone, PartialEq)]
pub struct FilePlan {
    pub path: PathBuf,
    pub family: FormatFamily,
    pub bytes: u64,
    pub width: u32,
    pub height: u32,
    /// `None` when the file is already under budget.
    pub plan: Option<CandidatePlan>,
}

/// Enumerate the trials for a file from its header alone.
pub fn plan_file<B: ImageBackend>(
    backend: &B,
    path: &Path,
    policy: &CompressionPolicy,
) -> Result<FilePlan, CompressError> {
    let family = FormatFamily::from_path(path)
        .ok_or_else(|| CompressError::UnsupportedFormat(path.to_path_buf()))?;
    let bytes = std::fs::read(path)?;
    let original_bytes = bytes.len() as u64;
    let dims = backend.identify(&bytes).map_err(CompressError::Decode)?;
    let plan = (!policy.is_under_budget(original_bytes))
        .then(|| enumerate(original_bytes, dims.width, family, policy));
    Ok(FilePlan {
        path: path.to_path_buf(),
        family,
        bytes: original_bytes,
        width: dims.width,
        height: dims.height,
        plan,
    })
}

/// Progress events emitted during batch processing.
#[derive(Debug, Clone)]
pub enum ProcessEvent {
    /// A file finished, successfully or not. `index` is 1-based.
    Compressed {
        index: usize,
        total: usize,
        outcome: CompressionOutcome,
    },
    Failed {
        index: usize,
        total: usize,
        path: PathBuf,
        original_bytes: u64,
        error: String,
    },
}

/// Result for one file of a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum BatchItem {
    Compressed(CompressionOutcome),
    Failed {
        path: PathBuf,
        original_bytes: u64,
        error: String,
    },
}

impl BatchItem {
    pub fn path(&self) -> &Path {
        match self {
            BatchItem::Compressed(outcome) => &outcome.path,
            BatchItem::Failed { path, .. } => path,
        }
    }
}

/// Batch tally. A failed file counts with its original size on both sides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    pub successful: usize,
    pub failed: usize,
    /// Successful files that were already under budget.
    pub unchanged: usize,
    /// Successful files that needed the fallback.
    pub fallbacks: usize,
    pub original_bytes: u64,
    pub final_bytes: u64,
}

impl BatchSummary {
    pub fn from_items(items: &[BatchItem]) -> Self {
        let mut summary = Self::default();
        for item in items {
            match item {
                BatchItem::Compressed(outcome) => {
                    summary.successful += 1;
                    summary.unchanged += usize::from(outcome.unchanged());
                    summary.fallbacks += usize::from(outcome.fallback);
                    summary.original_bytes += outcome.original_bytes;
                    summary.final_bytes += outcome.final_bytes;
                }
                BatchItem::Failed { original_bytes, .. } => {
                    summary.failed += 1;
                    summary.original_bytes += original_bytes;
                    summary.final_bytes += original_bytes;
                }
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.successful + self.failed
    }

    pub fn saved_bytes(&self) -> u64 {
        self.original_bytes.saturating_sub(self.final_bytes)
    }

    pub fn saved_percent(&self) -> f64 {
        if self.original_bytes == 0 {
            return 0.0;
        }
        self.saved_bytes() as f64 / self.original_bytes as f64 * 100.0
    }

    pub fn average_final_bytes(&self) -> Option<u64> {
        (self.total() > 0).then(|| self.final_bytes / self.total() as u64)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub items: Vec<BatchItem>,
    pub summary: BatchSummary,
}

impl BatchReport {
    pub fn has_failures(&self) -> bool {
        self.summary.failed > 0
    }
}

/// Turn command-line paths into candidates, keeping their order.
///
/// A path that cannot be stat'ed stays in the list with size 0; the batch
/// then reports it as failed at its own position.
pub fn candidates_from_paths(paths: impl IntoIterator<Item = PathBuf>) -> Vec<Candidate> {
    paths
        .into_iter()
        .map(|path| match std::fs::metadata(&path) {
            Ok(meta) => Candidate {
                path,
                bytes: meta.len(),
            },
            Err(e) => {
                tracing::debug!(path = %path.display(), "cannot stat: {}", e);
                Candidate { path, bytes: 0 }
            }
        })
        .collect()
}

/// Compress every candidate. A failing file never stops the batch.
pub fn process_batch(
    candidates: &[Candidate],
    policy: &CompressionPolicy,
    backup_suffix: &str,
    progress: Option<Sender<ProcessEvent>>,
) -> BatchReport {
    process_batch_with_backend(
        &RustBackend::new(),
        candidates,
        policy,
        backup_suffix,
        progress,
    )
}

pub fn process_batch_with_backend<B: ImageBackend>(
    backend: &B,
    candidates: &[Candidate],
    policy: &CompressionPolicy,
    backup_suffix: &str,
    progress: Option<Sender<ProcessEvent>>,
) -> BatchReport {
    let total = candidates.len();
    let items: Vec<BatchItem> = candidates
        .par_iter()
        .enumerate()
        .map_with(progress, |progress, (i, candidate)| {
            let index = i + 1;
            match compress_file_with_backend(backend, &candidate.path, policy, backup_suffix) {
                Ok(outcome) => {
                    if let Some(tx) = progress {
                        tx.send(ProcessEvent::Compressed {
                            index,
                            total,
                            outcome: outcome.clone(),
                        })
                        .ok();
                    }
                    BatchItem::Compressed(outcome)
                }
                Err(e) => {
                    tracing::debug!(path = %candidate.path.display(), "failed: {}", e);
                    let error = e.to_string();
                    if let Some(tx) = progress {
                        tx.send(ProcessEvent::Failed {
                            index,
                            total,
                            path: candidate.path.clone(),
                            original_bytes: candidate.bytes,
                            error: error.clone(),
                        })
                        .ok();
                    }
                    BatchItem::Failed {
                        path: candidate.path.clone(),
                        original_bytes: candidate.bytes,
                        error,
                    }
                }
            }
        })
        .collect();

    let summary = BatchSummary::from_items(&items);
    BatchReport { items, summary }
}
