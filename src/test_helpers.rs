//! Shared test utilities: synthetic JPEG and PNG fixtures.
//!
//! Flat-color images compress to almost nothing, which makes every search
//! succeed on the first trial. The fixtures here are filled with seeded noise
//! so their encoded size actually depends on scale and quality.
//!
//! # Usage
//!
//! ```text
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! let path = write_fixture(&tmp, "photo.jpg", &jpeg_bytes(1600, 1200, 95));
//! ```

use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};
use std::io::Cursor;
use std::path::PathBuf;
use tempfile::TempDir;

/// Deterministic byte stream (64-bit LCG, high byte).
struct Noise(u64);

impl Noise {
    fn next(&mut self) -> u8 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 56) as u8
    }
}

/// Noisy RGB image with a gentle gradient underneath.
pub fn noisy_rgb(width: u32, height: u32) -> RgbImage {
    let mut noise = Noise(width as u64 * 31 + height as u64);
    RgbImage::from_fn(width, height, |x, y| {
        let base = ((x + y) % 256) as u8;
        image::Rgb([
            base.wrapping_add(noise.next() / 2),
            noise.next(),
            base / 2 + noise.next() / 4,
        ])
    })
}

/// Noisy RGBA image whose alpha varies across the frame.
pub fn noisy_rgba(width: u32, height: u32) -> RgbaImage {
    let rgb = noisy_rgb(width, height);
    RgbaImage::from_fn(width, height, |x, y| {
        let p = rgb.get_pixel(x, y).0;
        image::Rgba([p[0], p[1], p[2], (x * 255 / width.max(1)) as u8])
    })
}

/// Encode a noisy image as JPEG at `quality`.
pub fn jpeg_bytes(width: u32, height: u32, quality: u8) -> Vec<u8> {
    let mut buf = Vec::new();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality);
    DynamicImage::ImageRgb8(noisy_rgb(width, height))
        .write_with_encoder(encoder)
        .unwrap();
    buf
}

/// Encode a noisy image as PNG, with or without an alpha channel.
pub fn png_bytes(width: u32, height: u32, alpha: bool) -> Vec<u8> {
    let img = if alpha {
        DynamicImage::ImageRgba8(noisy_rgba(width, height))
    } else {
        DynamicImage::ImageRgb8(noisy_rgb(width, height))
    };
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

/// Insert an EXIF APP1 segment carrying `orientation` right after the JPEG
/// SOI marker.
pub fn with_exif_orientation(jpeg: &[u8], orientation: u16) -> Vec<u8> {
    let mut tiff = b"MM\x00\x2A\x00\x00\x00\x08".to_vec();
    tiff.extend_from_slice(&1u16.to_be_bytes());
    // Tag 0x0112, SHORT, count 1, value left-aligned in the 4-byte slot
    tiff.extend_from_slice(&[0x01, 0x12, 0x00, 0x03, 0x00, 0x00, 0x00, 0x01]);
    tiff.extend_from_slice(&orientation.to_be_bytes());
    tiff.extend_from_slice(&[0, 0, 0, 0, 0, 0]);

    let mut segment = b"Exif\x00\x00".to_vec();
    segment.extend_from_slice(&tiff);
    let len = (segment.len() + 2) as u16;

    let mut out = jpeg[..2].to_vec();
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(&segment);
    out.extend_from_slice(&jpeg[2..]);
    out
}

/// Write `bytes` to `name` inside `dir` and return the full path.
pub fn write_fixture(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

#[test]
fn noise_is_deterministic() {
    assert_eq!(jpeg_bytes(32, 32, 80), jpeg_bytes(32, 32, 80));
}

#[test]
fn exif_segment_follows_soi() {
    let bytes = with_exif_orientation(&jpeg_bytes(16, 16, 80), 6);
    assert_eq!(&bytes[..4], &[0xFF, 0xD8, 0xFF, 0xE1]);
    assert_eq!(&bytes[6..12], b"Exif\x00\x00");
}

#[test]
fn noisy_jpeg_shrinks_with_quality() {
    assert!(jpeg_bytes(256, 256, 40).len() < jpeg_bytes(256, 256, 95).len());
}
