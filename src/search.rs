//! The search controller: walk a [`CandidatePlan`] until a trial fits.
//!
//! The walk is greedy. The first trial at or under the byte ceiling is
//! accepted and the rest of the grid is never evaluated. If nothing fits, or
//! the per-image time budget runs out, the plan's fallback is evaluated and
//! accepted regardless of its size, so the search always terminates after at
//! most [`CandidatePlan::max_trials`] evaluations.
//!
//! Only one encoded buffer is alive at a time: a rejected trial is dropped
//! before the next one runs.

use crate::imaging::{BackendError, ImageBackend};
use crate::ladder::CandidatePlan;
use crate::trial::{SourceImage, TrialResult, evaluate};
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Fallback trial failed: {0}")]
    FallbackFailed(#[source] BackendError),
}

/// The accepted trial.
#[derive(Debug)]
pub struct SearchResult {
    pub trial: TrialResult,
    /// True when no ladder trial met the ceiling.
    pub fallback: bool,
    /// Trials evaluated, fallback included.
    pub trials_run: usize,
}

pub fn search<B: ImageBackend>(
    backend: &B,
    source: &SourceImage<B::Image>,
    plan: &CandidatePlan,
    target_bytes: u64,
    time_budget: Option<Duration>,
) -> Result<SearchResult, SearchError> {
    let deadline = time_budget.map(|budget| Instant::now() + budget);
    let mut trials_run = 0;

    for config in plan.trials() {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            tracing::warn!(trials_run, "time budget exhausted, using fallback");
            break;
        }

        trials_run += 1;
        match evaluate(backend, source, config) {
            Ok(trial) => {
                tracing::debug!(
                    scale = trial.scale,
                    quality = ?trial.quality,
                    width = trial.width,
                    bytes = trial.bytes(),
                    "trial"
                );
                if trial.bytes() <= target_bytes {
                    return Ok(SearchResult {
                        trial,
                        fallback: false,
                        trials_run,
                    });
                }
            }
            Err(e) => {
                tracing::warn!(
                    scale = config.scale,
                    quality = ?config.setting.quality(),
                    "trial failed, skipping: {}",
                    e
                );
            }
        }
    }

    trials_run += 1;
    let trial = evaluate(backend, source, plan.fallback).map_err(SearchError::FallbackFailed)?;
    tracing::info!(
        scale = trial.scale,
        quality = ?trial.quality,
        bytes = trial.bytes(),
        target = target_bytes,
        "no trial met the target, using fallback"
    );
    Ok(SearchResult {
        trial,
        fallback: true,
        trials_run,
    })
}
