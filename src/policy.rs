//! The immutable compression policy for a run.
//!
//! Built once from the loaded [`Config`](crate::config::Config) and shared by
//! reference across every image in the batch.

use crate::config::Config;
use crate::imaging::PngCompression;
use std::time::Duration;

pub const KIB: u64 = 1024;

/// A scale ladder used for files larger than `above_bytes`.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleTier {
    pub above_bytes: u64,
    pub scales: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompressionPolicy {
    /// Byte ceiling a compressed file must meet.
    pub target_bytes: u64,
    /// Width floor in pixels.
    pub min_width: u32,
    /// Size tiers, largest threshold first. The first tier whose threshold the
    /// file exceeds supplies the scale ladder.
    pub tiers: Vec<ScaleTier>,
    /// Ladder for files that exceed no tier threshold.
    pub base_scales: Vec<f64>,
    /// JPEG qualities, descending.
    pub jpeg_qualities: Vec<u8>,
    pub png_compression: PngCompression,
    /// Per-image wall-clock budget for the ladder walk.
    pub time_budget: Option<Duration>,
}

impl CompressionPolicy {
    pub fn from_config(config: &Config) -> Self {
        let ladders = &config.ladders;
        let mut tiers = vec![
            ScaleTier {
                above_bytes: ladders.large_above_kb * KIB,
                scales: ladders.large.clone(),
            },
            ScaleTier {
                above_bytes: ladders.medium_above_kb * KIB,
                scales: ladders.medium.clone(),
            },
        ];
        tiers.sort_by(|a, b| b.above_bytes.cmp(&a.above_bytes));

        Self {
            target_bytes: config.budget.target_kb * KIB,
            min_width: config.budget.min_width,
            tiers,
            base_scales: ladders.small.clone(),
            jpeg_qualities: config.jpeg.qualities.clone(),
            png_compression: config.png.compression,
            time_budget: config.processing.time_budget_secs.map(Duration::from_secs),
        }
    }

    /// Unfiltered scale ladder for a file of `original_bytes`.
    pub fn ladder_for(&self, original_bytes: u64) -> &[f64] {
        self.tiers
            .iter()
            .find(|tier| original_bytes > tier.above_bytes)
            .map(|tier| tier.scales.as_slice())
            .unwrap_or(&self.base_scales)
    }

    pub fn is_under_budget(&self, bytes: u64) -> bool {
        bytes <= self.target_bytes
    }
}

impl Default for CompressionPolicy {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
