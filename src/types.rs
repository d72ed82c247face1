//! Shared types passed between the search, the batch runner, and output.
//!
//! Types here are serializable so a batch run can be dumped as a JSON report.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Encoding family of an image, inferred once from its file extension.
///
/// The family decides the codec, the color-mode rule, and which parameter
/// ladder the search walks. Output always stays in the input family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatFamily {
    /// Lossy, quality-parameterized (JPEG).
    Photographic,
    /// Lossless, compression-level-parameterized (PNG).
    Graphic,
}

impl FormatFamily {
    /// Infer the family from a path's extension (case-insensitive).
    ///
    /// `.jpg`/`.jpeg` → [`Photographic`](Self::Photographic),
    /// `.png` → [`Graphic`](Self::Graphic), anything else → `None`.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(Self::Photographic),
            "png" => Some(Self::Graphic),
            _ => None,
        }
    }

    /// Container name used in CLI output.
    pub fn container(self) -> &'static str {
        match self {
            Self::Photographic => "JPEG",
            Self::Graphic => "PNG",
        }
    }
}

impl fmt::Display for FormatFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.container())
    }
}

/// Channel layout of a pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    Rgb,
    Rgba,
    Grayscale,
    GrayscaleAlpha,
    Palette,
}

impl ColorMode {
    pub fn has_alpha(self) -> bool {
        matches!(self, Self::Rgba | Self::GrayscaleAlpha)
    }
}

/// One file handed to the batch runner: path plus its size on disk when it
/// was selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub path: PathBuf,
    pub bytes: u64,
}

impl Candidate {
    /// Build a candidate from a path by reading its current size.
    pub fn from_path(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        let bytes = std::fs::metadata(&path)?.len();
        Ok(Self { path, bytes })
    }
}

/// Terminal record for one processed image.
///
/// `success` is true for every image that ended with a usable file on disk,
/// including the under-budget no-op and the fallback path. Failed images are
/// reported as errors by the batch runner instead.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompressionOutcome {
    pub path: PathBuf,
    pub family: FormatFamily,
    pub original_bytes: u64,
    pub final_bytes: u64,
    pub original_width: u32,
    pub original_height: u32,
    pub final_width: u32,
    pub final_height: u32,
    /// Scale factor of the committed trial (1.0 for the no-op).
    pub scale: f64,
    /// JPEG quality of the committed trial. `None` for PNG and the no-op.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<u8>,
    pub success: bool,
    pub fallback: bool,
    /// Number of trials evaluated, including the fallback trial.
    pub trials: usize,
    /// Backup created by this run. `None` when no backup was needed or one
    /// already existed from an earlier run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<PathBuf>,
}

impl CompressionOutcome {
    /// True when the file was left exactly as it was.
    pub fn unchanged(&self) -> bool {
        self.trials == 0
    }

    /// Percentage of bytes removed, `0.0` for an unchanged file.
    pub fn reduction_percent(&self) -> f64 {
        if self.original_bytes == 0 {
            return 0.0;
        }
        (1.0 - self.final_bytes as f64 / self.original_bytes as f64) * 100.0
    }
}
