//! Per-family encode behavior.
//!
//! Everything that differs between JPEG-like and PNG-like images lives behind
//! [`FamilyProfile`]: which color mode a trial is encoded in, which settings
//! the search walks, and which setting the fallback uses. The ladder, trial,
//! and search modules never branch on the family themselves.

use crate::imaging::{EncodeSetting, Quality};
use crate::policy::CompressionPolicy;
use crate::types::{ColorMode, FormatFamily};

/// Color mode an image of `mode` must be in before encoding as `family`.
///
/// - Photographic output is always opaque RGB: alpha is discarded, grayscale
///   and palette images are expanded.
/// - Graphic output keeps alpha. Palette images become RGBA (a palette may
///   carry transparency), plain grayscale becomes RGB.
pub fn target_color_mode(mode: ColorMode, family: FormatFamily) -> ColorMode {
    match family {
        FormatFamily::Photographic => ColorMode::Rgb,
        FormatFamily::Graphic => match mode {
            ColorMode::Rgba | ColorMode::GrayscaleAlpha => mode,
            ColorMode::Palette => ColorMode::Rgba,
            ColorMode::Rgb | ColorMode::Grayscale => ColorMode::Rgb,
        },
    }
}

/// Encode policy of one format family.
pub trait FamilyProfile: Sync {
    fn family(&self) -> FormatFamily;

    /// Settings to try at every scale, in search order.
    fn settings(&self, policy: &CompressionPolicy) -> Vec<EncodeSetting>;

    /// Setting used by the fallback trial: the cheapest one in the ladder.
    fn fallback_setting(&self, policy: &CompressionPolicy) -> EncodeSetting;

    fn target_mode(&self, mode: ColorMode) -> ColorMode {
        target_color_mode(mode, self.family())
    }
}

/// Lossy JPEG: every scale is paired with the descending quality ladder.
pub struct Photographic;

impl FamilyProfile for Photographic {
    fn family(&self) -> FormatFamily {
        FormatFamily::Photographic
    }

    fn settings(&self, policy: &CompressionPolicy) -> Vec<EncodeSetting> {
        policy
            .jpeg_qualities
            .iter()
            .map(|&q| EncodeSetting::Jpeg(Quality::new(q)))
            .collect()
    }

    fn fallback_setting(&self, policy: &CompressionPolicy) -> EncodeSetting {
        let lowest = policy.jpeg_qualities.iter().copied().min().unwrap_or(1);
        EncodeSetting::Jpeg(Quality::new(lowest))
    }
}

/// Lossless PNG: one fixed compression level, only the scale varies.
pub struct Graphic;

impl FamilyProfile for Graphic {
    fn family(&self) -> FormatFamily {
        FormatFamily::Graphic
    }

    fn settings(&self, policy: &CompressionPolicy) -> Vec<EncodeSetting> {
        vec![EncodeSetting::Png(policy.png_compression)]
    }

    fn fallback_setting(&self, policy: &CompressionPolicy) -> EncodeSetting {
        EncodeSetting::Png(policy.png_compression)
    }
}

/// Profile for a family.
pub fn profile(family: FormatFamily) -> &'static dyn FamilyProfile {
    match family {
        FormatFamily::Photographic => &Photographic,
        FormatFamily::Graphic => &Graphic,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::PngCompression;

    const ALL_MODES: [ColorMode; 5] = [
        ColorMode::Rgb,
        ColorMode::Rgba,
        ColorMode::Grayscale,
        ColorMode::GrayscaleAlpha,
        ColorMode::Palette,
    ];

    #[test]
    fn photographic_is_always_opaque_rgb() {
        for mode in ALL_MODES {
            assert_eq!(
                target_color_mode(mode, FormatFamily::Photographic),
                ColorMode::Rgb,
                "{mode:?}"
            );
        }
    }

    #[test]
    fn graphic_preserves_alpha() {
        assert_eq!(
            target_color_mode(ColorMode::Rgba, FormatFamily::Graphic),
            ColorMode::Rgba
        );
        assert_eq!(
            target_color_mode(ColorMode::GrayscaleAlpha, FormatFamily::Graphic),
            ColorMode::GrayscaleAlpha
        );
    }

    #[test]
    fn graphic_expands_palette_and_gray() {
        assert_eq!(
            target_color_mode(ColorMode::Palette, FormatFamily::Graphic),
            ColorMode::Rgba
        );
        assert_eq!(
            target_color_mode(ColorMode::Grayscale, FormatFamily::Graphic),
            ColorMode::Rgb
        );
        assert_eq!(
            target_color_mode(ColorMode::Rgb, FormatFamily::Graphic),
            ColorMode::Rgb
        );
    }

    #[test]
    fn target_mode_is_idempotent() {
        for family in [FormatFamily::Photographic, FormatFamily::Graphic] {
            for mode in ALL_MODES {
                let once = target_color_mode(mode, family);
                assert_eq!(target_color_mode(once, family), once);
            }
        }
    }

    #[test]
    fn photographic_settings_follow_quality_ladder() {
        let policy = CompressionPolicy::default();
        let settings = Photographic.settings(&policy);
        let qualities: Vec<u8> = settings.iter().filter_map(|s| s.quality()).collect();
        assert_eq!(qualities, vec![85, 75, 65, 55, 45]);
        assert_eq!(
            Photographic.fallback_setting(&policy),
            EncodeSetting::Jpeg(Quality::new(45))
        );
    }

    #[test]
    fn graphic_has_single_lossless_setting() {
        let policy = CompressionPolicy::default();
        assert_eq!(
            Graphic.settings(&policy),
            vec![EncodeSetting::Png(PngCompression::Best)]
        );
        assert_eq!(
            Graphic.fallback_setting(&policy),
            EncodeSetting::Png(PngCompression::Best)
        );
    }

    #[test]
    fn profile_settings_stay_in_family() {
        let policy = CompressionPolicy::default();
        for family in [FormatFamily::Photographic, FormatFamily::Graphic] {
            let p = profile(family);
            assert_eq!(p.family(), family);
            assert!(p.settings(&policy).iter().all(|s| s.family() == family));
            assert_eq!(p.fallback_setting(&policy).family(), family);
        }
    }
}
