//! Trial evaluation: one (scale, setting) pair → encoded bytes.
//!
//! A trial resamples the source, normalizes its color mode for the family, and
//! encodes into an in-memory scratch buffer. Nothing is written to disk, and
//! the source is only borrowed, so a trial can run any number of times.

use crate::family::profile;
use crate::imaging::{BackendError, ImageBackend, Raster, scaled_dimensions};
use crate::ladder::TrialConfig;
use crate::types::FormatFamily;

/// A decoded image together with the facts fixed at load time.
pub struct SourceImage<I> {
    pub pixels: I,
    /// Inferred from the file extension, never re-inferred.
    pub family: FormatFamily,
    pub original_bytes: u64,
}

impl<I: Raster> SourceImage<I> {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

/// Outcome of one trial. The encoded buffer is owned, so dropping the result
/// releases the scratch memory.
#[derive(Debug, Clone, PartialEq)]
pub struct TrialResult {
    pub scale: f64,
    pub quality: Option<u8>,
    pub width: u32,
    pub height: u32,
    pub encoded: Vec<u8>,
}

impl TrialResult {
    pub fn bytes(&self) -> u64 {
        self.encoded.len() as u64
    }
}

/// Run one trial against `source`.
pub fn evaluate<B: ImageBackend>(
    backend: &B,
    source: &SourceImage<B::Image>,
    config: TrialConfig,
) -> Result<TrialResult, BackendError> {
    debug_assert_eq!(config.setting.family(), source.family);

    let (width, height) = scaled_dimensions((source.width(), source.height()), config.scale);
    let resampled;
    let resized: &B::Image = if (width, height) == (source.width(), source.height()) {
        &source.pixels
    } else {
        resampled = backend.resample(&source.pixels, width, height)?;
        &resampled
    };

    let target = profile(source.family).target_mode(resized.color_mode());
    let converted;
    let normalized: &B::Image = if resized.color_mode() == target {
        resized
    } else {
        converted = backend.convert(resized, target)?;
        &converted
    };

    let encoded = backend.encode(normalized, config.setting)?;
    Ok(TrialResult {
        scale: config.scale,
        quality: config.setting.quality(),
        width,
        height,
        encoded,
    })
}
