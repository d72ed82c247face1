//! Parameter types for encode operations.
//!
//! These describe *what* to encode with, not *how*. The search picks them from
//! the family profile and hands them to the [`backend`](super::backend), so a
//! mock backend can stand in for the real codecs without touching search logic.
//!
//! ## Types
//!
//! - [`Quality`]: JPEG quality (1–100). Clamped on construction.
//! - [`PngCompression`]: PNG deflate effort; always lossless.
//! - [`EncodeSetting`]: one point on a family's parameter ladder.

use crate::types::FormatFamily;
use serde::{Deserialize, Serialize};

/// Quality setting for lossy JPEG encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Quality(u8);

impl Quality {
    pub fn new(value: u8) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

/// Lossless PNG compression effort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PngCompression {
    Fast,
    Default,
    /// Maximal lossless level.
    #[default]
    Best,
}

/// A single encode configuration. The variant fixes the container, so a
/// setting can only ever produce output of its own family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeSetting {
    Jpeg(Quality),
    Png(PngCompression),
}

impl EncodeSetting {
    pub fn family(self) -> FormatFamily {
        match self {
            Self::Jpeg(_) => FormatFamily::Photographic,
            Self::Png(_) => FormatFamily::Graphic,
        }
    }

    /// JPEG quality, if this is a lossy setting.
    pub fn quality(self) -> Option<u8> {
        match self {
            Self::Jpeg(q) => Some(q.value()),
            Self::Png(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(45).value(), 45);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn setting_family_matches_container() {
        assert_eq!(
            EncodeSetting::Jpeg(Quality::new(75)).family(),
            FormatFamily::Photographic
        );
        assert_eq!(
            EncodeSetting::Png(PngCompression::Best).family(),
            FormatFamily::Graphic
        );
    }

    #[test]
    fn only_jpeg_reports_quality() {
        assert_eq!(EncodeSetting::Jpeg(Quality::new(55)).quality(), Some(55));
        assert_eq!(EncodeSetting::Png(PngCompression::Best).quality(), None);
    }

    #[test]
    fn png_compression_parses_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            compression: PngCompression,
        }
        let w: Wrapper = toml::from_str(r#"compression = "fast""#).unwrap();
        assert_eq!(w.compression, PngCompression::Fast);
    }
}
