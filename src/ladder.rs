//! Candidate enumeration: which trials to run, in which order.
//!
//! The search is a walk over a small grid. Rows are scale factors from a
//! size-tiered ladder, columns are the family's encode settings:
//!
//! ```text
//!            q85   q75   q65   q55   q45        (PNG: one column)
//! 0.60  →     1     2     3     4     5
//! 0.50  →     6     7     8     9    10
//! ...
//! fallback: smallest allowed scale, lowest setting
//! ```
//!
//! Scales that would push the width under the floor are dropped before the
//! walk. The plan is never empty and always carries a fallback, so the search
//! terminates after at most `scales × settings + 1` trials.

use crate::family::profile;
use crate::imaging::{EncodeSetting, keeps_floor, min_scale_factor};
use crate::policy::CompressionPolicy;
use crate::types::FormatFamily;

/// One point of the grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialConfig {
    pub scale: f64,
    pub setting: EncodeSetting,
}

/// Ordered trials for one image plus its fallback.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidatePlan {
    pub scales: Vec<f64>,
    pub settings: Vec<EncodeSetting>,
    pub fallback: TrialConfig,
}

impl CandidatePlan {
    /// Trials in search order: scale-major, settings in ladder order.
    pub fn trials(&self) -> impl Iterator<Item = TrialConfig> + '_ {
        self.scales.iter().flat_map(move |&scale| {
            self.settings
                .iter()
                .map(move |&setting| TrialConfig { scale, setting })
        })
    }

    /// Upper bound on evaluated trials, fallback included.
    pub fn max_trials(&self) -> usize {
        self.scales.len() * self.settings.len() + 1
    }
}

/// Enumerate the trials for an image.
pub fn enumerate(
    original_bytes: u64,
    original_width: u32,
    family: FormatFamily,
    policy: &CompressionPolicy,
) -> CandidatePlan {
    let ladder = policy.ladder_for(original_bytes);
    let min_factor = min_scale_factor(original_width, policy.min_width);

    let mut scales: Vec<f64> = ladder
        .iter()
        .copied()
        .filter(|&s| keeps_floor(original_width, policy.min_width, s))
        .collect();
    if scales.is_empty() {
        scales.push(min_factor.min(1.0));
    }

    let smallest = ladder.iter().copied().fold(1.0_f64, f64::min);
    let fallback_scale = min_factor.max(smallest).min(1.0);

    let profile = profile(family);
    CandidatePlan {
        scales,
        settings: profile.settings(policy),
        fallback: TrialConfig {
            scale: fallback_scale,
            setting: profile.fallback_setting(policy),
        },
    }
}
