//! Run configuration.
//!
//! Handles loading, validating, and merging `downsize.toml`. Stock defaults
//! are the base layer; a user file only needs the keys it wants to change.
//!
//! ## Config File Location
//!
//! `--config <FILE>` if given, otherwise `downsize.toml` in the working
//! directory, otherwise the stock defaults.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [budget]
//! target_kb = 300           # Byte ceiling per image, in KiB
//! min_width = 670           # Never resample narrower than this (px)
//!
//! [ladders]
//! large_above_kb = 1000     # Files above this use the `large` ladder
//! large = [0.6, 0.5, 0.4, 0.35, 0.3, 0.25, 0.2, 0.15]
//! medium_above_kb = 500     # Files above this use the `medium` ladder
//! medium = [0.8, 0.7, 0.6, 0.5, 0.4, 0.3, 0.25, 0.2]
//! small = [1.0, 0.9, 0.8, 0.7, 0.6, 0.5, 0.4, 0.3, 0.25, 0.2]
//!
//! [jpeg]
//! qualities = [85, 75, 65, 55, 45]
//!
//! [png]
//! compression = "best"      # fast | default | best
//!
//! [backup]
//! suffix = ".backup"
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! time_budget_secs = 30     # Per-image search budget (omit for unlimited)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::PngCompression;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File looked up in the working directory when no `--config` is given.
pub const CONFIG_FILE: &str = "downsize.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `downsize.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub budget: BudgetConfig,
    pub ladders: LaddersConfig,
    pub jpeg: JpegConfig,
    pub png: PngConfig,
    pub backup: BackupConfig,
    pub processing: ProcessingConfig,
}

impl Config {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.budget.target_kb == 0 {
            return Err(ConfigError::Validation(
                "budget.target_kb must be positive".into(),
            ));
        }
        if self.budget.min_width == 0 {
            return Err(ConfigError::Validation(
                "budget.min_width must be positive".into(),
            ));
        }
        for (name, ladder) in [
            ("large", &self.ladders.large),
            ("medium", &self.ladders.medium),
            ("small", &self.ladders.small),
        ] {
            validate_ladder(name, ladder)?;
        }
        let qualities = &self.jpeg.qualities;
        if qualities.is_empty() {
            return Err(ConfigError::Validation(
                "jpeg.qualities must not be empty".into(),
            ));
        }
        if qualities.iter().any(|&q| q == 0 || q > 100) {
            return Err(ConfigError::Validation(
                "jpeg.qualities must be 1-100".into(),
            ));
        }
        if qualities.windows(2).any(|w| w[0] <= w[1]) {
            return Err(ConfigError::Validation(
                "jpeg.qualities must be strictly descending".into(),
            ));
        }
        let suffix = &self.backup.suffix;
        if suffix.is_empty() || suffix.contains(['/', '\\']) {
            return Err(ConfigError::Validation(
                "backup.suffix must be a non-empty file name suffix".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Apply command-line overrides and re-validate.
    pub fn with_overrides(
        mut self,
        target_kb: Option<u64>,
        min_width: Option<u32>,
    ) -> Result<Self, ConfigError> {
        if let Some(kb) = target_kb {
            self.budget.target_kb = kb;
        }
        if let Some(width) = min_width {
            self.budget.min_width = width;
        }
        self.validate()?;
        Ok(self)
    }
}

fn validate_ladder(name: &str, ladder: &[f64]) -> Result<(), ConfigError> {
    if ladder.is_empty() {
        return Err(ConfigError::Validation(format!(
            "ladders.{name} must not be empty"
        )));
    }
    if ladder.iter().any(|&s| !(s > 0.0 && s <= 1.0)) {
        return Err(ConfigError::Validation(format!(
            "ladders.{name} scales must be in (0, 1]"
        )));
    }
    if ladder.windows(2).any(|w| w[0] <= w[1]) {
        return Err(ConfigError::Validation(format!(
            "ladders.{name} must be strictly descending"
        )));
    }
    Ok(())
}

/// The byte ceiling and width floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BudgetConfig {
    /// Target size in KiB (1 KiB = 1024 bytes).
    pub target_kb: u64,
    /// Minimum output width in pixels. Narrower sources are never upscaled.
    pub min_width: u32,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            target_kb: 300,
            min_width: 670,
        }
    }
}

/// Size-tiered scale ladders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LaddersConfig {
    pub large_above_kb: u64,
    pub large: Vec<f64>,
    pub medium_above_kb: u64,
    pub medium: Vec<f64>,
    pub small: Vec<f64>,
}

impl Default for LaddersConfig {
    fn default() -> Self {
        Self {
            large_above_kb: 1000,
            large: vec![0.6, 0.5, 0.4, 0.35, 0.3, 0.25, 0.2, 0.15],
            medium_above_kb: 500,
            medium: vec![0.8, 0.7, 0.6, 0.5, 0.4, 0.3, 0.25, 0.2],
            small: vec![1.0, 0.9, 0.8, 0.7, 0.6, 0.5, 0.4, 0.3, 0.25, 0.2],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JpegConfig {
    /// Qualities tried at each scale, highest first.
    pub qualities: Vec<u8>,
}

impl Default for JpegConfig {
    fn default() -> Self {
        Self {
            qualities: vec![85, 75, 65, 55, 45],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PngConfig {
    pub compression: PngCompression,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackupConfig {
    /// Appended to the original file name, e.g. `photo.jpg.backup`.
    pub suffix: String,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            suffix: ".backup".to_string(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
    /// Per-image wall-clock budget for the ladder walk. Once spent, the
    /// search goes straight to the fallback.
    pub time_budget_secs: Option<u64>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(Config::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely, so a ladder
///   given in a user file replaces the stock ladder instead of extending it.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<Config, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: Config = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the run config.
///
/// An `explicit` path must exist. Without one, [`CONFIG_FILE`] in `dir` is
/// used if present, and the stock defaults otherwise.
pub fn load_config(explicit: Option<&Path>, dir: &Path) -> Result<Config, ConfigError> {
    let path: PathBuf = explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| dir.join(CONFIG_FILE));
    let overlay = match explicit {
        Some(_) => Some(toml::from_str(&fs::read_to_string(&path)?)?),
        None => load_raw_config(&path)?,
    };
    if overlay.is_some() {
        tracing::debug!(path = %path.display(), "loaded config");
    }
    resolve_config(stock_defaults_value()?, overlay)
}

/// Returns a fully-commented stock `downsize.toml` with all keys.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# downsize configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Size budget
# ---------------------------------------------------------------------------
[budget]
# Target size per image in KiB (1 KiB = 1024 bytes). Files at or under the
# target are left untouched.
target_kb = 300

# Minimum output width in pixels. Images already narrower than this keep
# their width; nothing is ever upscaled.
min_width = 670

# ---------------------------------------------------------------------------
# Scale ladders
# ---------------------------------------------------------------------------
# Scale factors tried in order, each strictly descending within (0, 1].
# Factors that would go under min_width are skipped.
[ladders]
# Files larger than this (KiB) are far over budget: start aggressive.
large_above_kb = 1000
large = [0.6, 0.5, 0.4, 0.35, 0.3, 0.25, 0.2, 0.15]

# Files larger than this (KiB) but not "large" use a moderate ladder.
medium_above_kb = 500
medium = [0.8, 0.7, 0.6, 0.5, 0.4, 0.3, 0.25, 0.2]

# Everything else starts unscaled.
small = [1.0, 0.9, 0.8, 0.7, 0.6, 0.5, 0.4, 0.3, 0.25, 0.2]

# ---------------------------------------------------------------------------
# JPEG
# ---------------------------------------------------------------------------
[jpeg]
# Qualities tried at every scale, highest first (1-100). The last one is
# also used by the fallback.
qualities = [85, 75, 65, 55, 45]

# ---------------------------------------------------------------------------
# PNG
# ---------------------------------------------------------------------------
[png]
# Lossless compression effort: "fast", "default" or "best".
compression = "best"

# ---------------------------------------------------------------------------
# Backups
# ---------------------------------------------------------------------------
[backup]
# Appended to the original file name. An existing backup is never
# overwritten.
suffix = ".backup"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers. Omit for auto (= number of CPU cores).
# Values larger than the core count are clamped down.
# max_processes = 4

# Per-image time budget in seconds. When spent, the search stops and the
# smallest allowed setting is used. Omit for no limit.
# time_budget_secs = 30
"##
}
