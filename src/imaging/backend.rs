//! Codec/resize backend trait and shared types.
//!
//! The [`ImageBackend`] trait is the only door to pixel work. It covers the
//! operations the search needs: identify, decode, resample, convert, and
//! encode. Everything above it (ladders, trials, the search) is
//! backend-agnostic.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), pure Rust on the `image`
//! crate. Tests use the recording `MockBackend`, whose "images" are just
//! dimensions and whose encoded sizes come from a formula.

use super::params::EncodeSetting;
use crate::types::ColorMode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Read-only view of a decoded pixel buffer.
pub trait Raster {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn color_mode(&self) -> ColorMode;

    fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width(),
            height: self.height(),
        }
    }
}

/// Trait for codec/resize backends.
///
/// Resample and convert are value-producing: they never mutate their input,
/// so one decoded source can feed any number of trials.
pub trait ImageBackend: Sync {
    type Image: Raster + Send + Sync;

    /// Read dimensions from the container header without a full decode.
    fn identify(&self, bytes: &[u8]) -> Result<Dimensions, BackendError>;

    /// Decode a complete file into a pixel buffer.
    fn decode(&self, bytes: &[u8]) -> Result<Self::Image, BackendError>;

    /// Resample to exact dimensions with a high-quality filter.
    fn resample(
        &self,
        image: &Self::Image,
        width: u32,
        height: u32,
    ) -> Result<Self::Image, BackendError>;

    /// Convert to another color mode.
    fn convert(&self, image: &Self::Image, mode: ColorMode) -> Result<Self::Image, BackendError>;

    /// Encode into an in-memory buffer.
    fn encode(&self, image: &Self::Image, setting: EncodeSetting)
    -> Result<Vec<u8>, BackendError>;
}
