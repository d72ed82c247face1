//! End-to-end tests through the public API with the pure Rust backend.
//!
//! Fixtures are synthetic noise images written to a temp dir, so the tests
//! need no checked-in binaries.
//!
//! Run with: cargo test --test compress_files

use downsize::config::Config;
use downsize::policy::{CompressionPolicy, KIB};
use downsize::imaging::RustBackend;
use downsize::process::{BatchItem, compress_file, plan_file, process_batch};
use downsize::safety::backup_path;
use downsize::types::{Candidate, FormatFamily};
use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn noise(width: u32, height: u32, seed: u64) -> RgbImage {
    let mut state = seed;
    RgbImage::from_fn(width, height, |_, _| {
        let mut px = [0u8; 3];
        for c in &mut px {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            *c = (state >> 56) as u8;
        }
        image::Rgb(px)
    })
}

fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
    buf
}

fn write(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, bytes).unwrap();
    path
}

/// JPEG stored on its side: EXIF orientation 6 after the SOI marker.
fn rotated_jpeg(width: u32, height: u32, seed: u64) -> Vec<u8> {
    let jpeg = encode(DynamicImage::ImageRgb8(noise(width, height, seed)), ImageFormat::Jpeg);
    let mut segment = b"Exif\x00\x00MM\x00\x2A\x00\x00\x00\x08\x00\x01".to_vec();
    segment.extend_from_slice(&[0x01, 0x12, 0x00, 0x03, 0x00, 0x00, 0x00, 0x01]);
    segment.extend_from_slice(&[0x00, 0x06, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
    let len = (segment.len() + 2) as u16;

    let mut out = vec![0xFF, 0xD8, 0xFF, 0xE1];
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(&segment);
    out.extend_from_slice(&jpeg[2..]);
    out
}

fn dimensions(path: &Path) -> (u32, u32) {
    image::image_dimensions(path).unwrap()
}

/// Policy with a target set relative to the fixture, so the tests do not
/// depend on exact encoder output sizes.
fn policy_with_target(target_bytes: u64) -> CompressionPolicy {
    CompressionPolicy {
        target_bytes,
        ..CompressionPolicy::from_config(&Config::default())
    }
}

#[test]
fn oversized_jpeg_meets_budget_above_floor() {
    let tmp = TempDir::new().unwrap();
    let bytes = encode(DynamicImage::ImageRgb8(noise(2000, 1500, 1)), ImageFormat::Jpeg);
    let path = write(&tmp, "photo.jpg", &bytes);
    let original = bytes.len() as u64;
    let policy = policy_with_target(original / 3);

    let outcome = compress_file(&path, &policy, ".backup").unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.family, FormatFamily::Photographic);
    let (w, _) = dimensions(&path);
    assert_eq!(w, outcome.final_width);
    assert!(w >= 670);
    let on_disk = fs::metadata(&path).unwrap().len();
    assert_eq!(on_disk, outcome.final_bytes);
    if !outcome.fallback {
        assert!(on_disk <= policy.target_bytes);
    }
    assert_eq!(
        image::guess_format(&fs::read(&path).unwrap()).unwrap(),
        ImageFormat::Jpeg
    );
    assert_eq!(fs::read(backup_path(&path, ".backup")).unwrap(), bytes);
}

#[test]
fn png_with_alpha_stays_png_with_alpha() {
    let tmp = TempDir::new().unwrap();
    let rgb = noise(1400, 900, 2);
    let rgba = RgbaImage::from_fn(1400, 900, |x, y| {
        let p = rgb.get_pixel(x, y).0;
        image::Rgba([p[0], p[1], p[2], (y % 256) as u8])
    });
    let bytes = encode(DynamicImage::ImageRgba8(rgba), ImageFormat::Png);
    let path = write(&tmp, "overlay.png", &bytes);
    let policy = policy_with_target(bytes.len() as u64 / 2);

    let outcome = compress_file(&path, &policy, ".backup").unwrap();

    assert_eq!(outcome.family, FormatFamily::Graphic);
    assert_eq!(outcome.quality, None);
    let written = image::open(&path).unwrap();
    assert!(written.color().has_alpha());
    assert!(written.width() >= 670);
}

#[test]
fn under_budget_file_is_untouched() {
    let tmp = TempDir::new().unwrap();
    let bytes = encode(DynamicImage::ImageRgb8(noise(64, 64, 3)), ImageFormat::Png);
    let path = write(&tmp, "icon.png", &bytes);

    let outcome = compress_file(&path, &CompressionPolicy::default(), ".backup").unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.trials, 0);
    assert_eq!(fs::read(&path).unwrap(), bytes);
    assert!(!backup_path(&path, ".backup").exists());
}

#[test]
fn narrow_image_is_never_upscaled() {
    // 500px is under the 670px floor: the only candidate is the original width
    let tmp = TempDir::new().unwrap();
    let bytes = encode(DynamicImage::ImageRgb8(noise(500, 400, 4)), ImageFormat::Jpeg);
    let path = write(&tmp, "narrow.jpg", &bytes);
    let policy = policy_with_target(bytes.len() as u64 / 2);

    let outcome = compress_file(&path, &policy, ".backup").unwrap();

    assert_eq!(dimensions(&path), (500, 400));
    assert_eq!(outcome.scale, 1.0);
}

#[test]
fn second_run_keeps_first_backup() {
    let tmp = TempDir::new().unwrap();
    let bytes = encode(DynamicImage::ImageRgb8(noise(1600, 1200, 5)), ImageFormat::Jpeg);
    let path = write(&tmp, "photo.jpg", &bytes);
    // Unreachable: every run takes the fallback and stays over budget
    let policy = policy_with_target(1);

    let first = compress_file(&path, &policy, ".backup").unwrap();
    let second = compress_file(&path, &policy, ".backup").unwrap();

    assert!(first.fallback && second.fallback);
    assert_eq!(first.final_width, 670);
    assert!(first.backup.is_some());
    assert!(second.backup.is_none());
    assert_eq!(fs::read(backup_path(&path, ".backup")).unwrap(), bytes);
}

#[test]
fn corrupt_file_fails_without_side_effects() {
    let tmp = TempDir::new().unwrap();
    let garbage = vec![0x42u8; 400 * KIB as usize];
    let path = write(&tmp, "broken.jpg", &garbage);

    let result = compress_file(&path, &CompressionPolicy::default(), ".backup");

    assert!(result.is_err());
    assert_eq!(fs::read(&path).unwrap(), garbage);
    assert!(!backup_path(&path, ".backup").exists());
}

#[test]
fn batch_reports_every_file() {
    let tmp = TempDir::new().unwrap();
    let big = write(
        &tmp,
        "big.jpg",
        &encode(DynamicImage::ImageRgb8(noise(1800, 1200, 6)), ImageFormat::Jpeg),
    );
    let small = write(
        &tmp,
        "small.png",
        &encode(DynamicImage::ImageRgb8(noise(32, 32, 7)), ImageFormat::Png),
    );
    let text = write(&tmp, "notes.txt", b"not an image");
    let candidates: Vec<Candidate> = [&big, &small, &text]
        .into_iter()
        .map(|p| Candidate::from_path(p).unwrap())
        .collect();
    let policy = policy_with_target(candidates[0].bytes / 2);

    let report = process_batch(&candidates, &policy, ".backup", None);

    assert_eq!(report.items.len(), 3);
    assert_eq!(report.summary.successful, 2);
    assert_eq!(report.summary.failed, 1);
    assert!(matches!(report.items[2], BatchItem::Failed { .. }));
    assert!(report.summary.final_bytes < report.summary.original_bytes);

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["items"][0]["status"], "compressed");
    assert_eq!(json["summary"]["failed"], 1);
}

#[test]
fn plan_matches_compress_for_rotated_jpeg() {
    // Stored 2000x1000, upright 1000x2000
    let tmp = TempDir::new().unwrap();
    let bytes = rotated_jpeg(2000, 1000, 8);
    let path = write(&tmp, "portrait.jpg", &bytes);
    let policy = policy_with_target(1);

    let planned = plan_file(&RustBackend::new(), &path, &policy).unwrap();
    let outcome = compress_file(&path, &policy, ".backup").unwrap();

    assert_eq!((planned.width, planned.height), (1000, 2000));
    assert_eq!(
        (outcome.original_width, outcome.original_height),
        (planned.width, planned.height)
    );
    assert!(outcome.fallback);
    assert_eq!(outcome.scale, planned.plan.unwrap().fallback.scale);
    assert_eq!(outcome.final_width, 670);
}

#[test]
fn under_budget_rotated_jpeg_reports_upright_size() {
    let tmp = TempDir::new().unwrap();
    let path = write(&tmp, "small.jpg", &rotated_jpeg(120, 40, 9));

    let outcome = compress_file(&path, &CompressionPolicy::default(), ".backup").unwrap();

    assert_eq!(outcome.trials, 0);
    assert_eq!((outcome.original_width, outcome.original_height), (40, 120));
}
