//! Pure calculation functions for trial dimensions and the width floor.
//!
//! All functions here are pure and testable without any I/O or images.

/// Dimensions of an image resampled by `scale`.
///
/// Each side is `round(side * scale)`, never below 1 px.
///
/// # Examples
/// ```
/// # use downsize::imaging::scaled_dimensions;
/// assert_eq!(scaled_dimensions((2000, 1500), 0.5), (1000, 750));
/// assert_eq!(scaled_dimensions((4000, 2000), 670.0 / 4000.0), (670, 335));
/// ```
pub fn scaled_dimensions(original: (u32, u32), scale: f64) -> (u32, u32) {
    let (w, h) = original;
    let side = |v: u32| ((v as f64 * scale).round() as u32).max(1);
    (side(w), side(h))
}

/// The narrowest width an output may have.
///
/// The floor never forces upscaling: an image already narrower than
/// `min_width` keeps its own width.
pub fn effective_floor(original_width: u32, min_width: u32) -> u32 {
    min_width.min(original_width)
}

/// Smallest scale factor that keeps the width at or above the floor.
///
/// Returns 1.0 when the image is not wider than `min_width`.
pub fn min_scale_factor(original_width: u32, min_width: u32) -> f64 {
    if original_width > min_width {
        min_width as f64 / original_width as f64
    } else {
        1.0
    }
}

/// Whether resampling by `scale` keeps the width at or above the floor.
pub fn keeps_floor(original_width: u32, min_width: u32, scale: f64) -> bool {
    let (w, _) = scaled_dimensions((original_width, 1), scale);
    w >= effective_floor(original_width, min_width)
}
