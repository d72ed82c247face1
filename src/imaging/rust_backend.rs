//! Pure Rust codec backend, zero system dependencies.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | decoder header + EXIF orientation (no pixel decode) |
//! | Decode (JPEG, PNG) | `image` crate decoders + EXIF orientation |
//! | Resample | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Convert | `to_rgb8` / `to_rgba8` / `to_luma8` / `to_luma_alpha8` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |
//! | Encode → PNG | `image::codecs::png::PngEncoder` (lossless, adaptive filter) |

use super::backend::{BackendError, Dimensions, ImageBackend, Raster};
use super::params::{EncodeSetting, PngCompression};
use crate::types::ColorMode;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{ColorType, DynamicImage, ImageDecoder, ImageReader};
use std::io::Cursor;

/// Pure Rust backend using the `image` crate.
///
/// Decoded images are always 8 bits per channel; deeper sources are reduced
/// at decode time so both encoders accept every buffer this backend produces.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Raster for DynamicImage {
    fn width(&self) -> u32 {
        DynamicImage::width(self)
    }

    fn height(&self) -> u32 {
        DynamicImage::height(self)
    }

    fn color_mode(&self) -> ColorMode {
        mode_of(self.color())
    }
}

/// Map an `image` color type onto our channel layouts.
///
/// The `image` crate expands palettes on decode, so `Palette` never comes out
/// of this backend.
fn mode_of(color: ColorType) -> ColorMode {
    match color {
        ColorType::L8 | ColorType::L16 => ColorMode::Grayscale,
        ColorType::La8 | ColorType::La16 => ColorMode::GrayscaleAlpha,
        ColorType::Rgba8 | ColorType::Rgba16 | ColorType::Rgba32F => ColorMode::Rgba,
        _ => ColorMode::Rgb,
    }
}

/// Reduce any bit depth to 8 bits per channel, keeping the channel layout.
fn to_eight_bit(img: DynamicImage) -> DynamicImage {
    match img {
        DynamicImage::ImageLuma8(_)
        | DynamicImage::ImageLumaA8(_)
        | DynamicImage::ImageRgb8(_)
        | DynamicImage::ImageRgba8(_) => img,
        other => match mode_of(other.color()) {
            ColorMode::Grayscale => DynamicImage::ImageLuma8(other.to_luma8()),
            ColorMode::GrayscaleAlpha => DynamicImage::ImageLumaA8(other.to_luma_alpha8()),
            ColorMode::Rgba => DynamicImage::ImageRgba8(other.to_rgba8()),
            _ => DynamicImage::ImageRgb8(other.to_rgb8()),
        },
    }
}

fn reader(bytes: &[u8]) -> Result<ImageReader<Cursor<&[u8]>>, BackendError> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(BackendError::Io)
}

/// Whether applying `orientation` turns the image on its side.
fn swaps_axes(orientation: Orientation) -> bool {
    matches!(
        orientation,
        Orientation::Rotate90
            | Orientation::Rotate270
            | Orientation::Rotate90FlipH
            | Orientation::Rotate270FlipH
    )
}

fn png_compression(level: PngCompression) -> CompressionType {
    match level {
        PngCompression::Fast => CompressionType::Fast,
        PngCompression::Default => CompressionType::Default,
        PngCompression::Best => CompressionType::Best,
    }
}

impl ImageBackend for RustBackend {
    type Image = DynamicImage;

    /// Upright dimensions, so they agree with what [`decode`](Self::decode)
    /// returns for the same bytes.
    fn identify(&self, bytes: &[u8]) -> Result<Dimensions, BackendError> {
        let header_err = |e: image::ImageError| {
            BackendError::ProcessingFailed(format!("Failed to read dimensions: {}", e))
        };
        let mut decoder = reader(bytes)?.into_decoder().map_err(header_err)?;
        let (width, height) = decoder.dimensions();
        let orientation = decoder.orientation().map_err(header_err)?;
        Ok(if swaps_axes(orientation) {
            Dimensions {
                width: height,
                height: width,
            }
        } else {
            Dimensions { width, height }
        })
    }

    /// Decode and apply the EXIF orientation so trials see the image upright.
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, BackendError> {
        let decode_err = |e: image::ImageError| {
            BackendError::ProcessingFailed(format!("Failed to decode: {}", e))
        };
        let mut decoder = reader(bytes)?.into_decoder().map_err(decode_err)?;
        let orientation = decoder.orientation().map_err(decode_err)?;
        let mut img = DynamicImage::from_decoder(decoder).map_err(decode_err)?;
        img.apply_orientation(orientation);
        Ok(to_eight_bit(img))
    }

    fn resample(
        &self,
        image: &DynamicImage,
        width: u32,
        height: u32,
    ) -> Result<DynamicImage, BackendError> {
        Ok(image.resize_exact(width, height, FilterType::Lanczos3))
    }

    fn convert(&self, image: &DynamicImage, mode: ColorMode) -> Result<DynamicImage, BackendError> {
        match mode {
            ColorMode::Rgb => Ok(DynamicImage::ImageRgb8(image.to_rgb8())),
            ColorMode::Rgba => Ok(DynamicImage::ImageRgba8(image.to_rgba8())),
            ColorMode::Grayscale => Ok(DynamicImage::ImageLuma8(image.to_luma8())),
            ColorMode::GrayscaleAlpha => Ok(DynamicImage::ImageLumaA8(image.to_luma_alpha8())),
            ColorMode::Palette => Err(BackendError::Unsupported(
                "conversion to a palette image".into(),
            )),
        }
    }

    fn encode(&self, image: &DynamicImage, setting: EncodeSetting) -> Result<Vec<u8>, BackendError> {
        let mut buffer = Vec::new();
        match setting {
            EncodeSetting::Jpeg(quality) => {
                let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.value());
                image.write_with_encoder(encoder).map_err(|e| {
                    BackendError::ProcessingFailed(format!("JPEG encode failed: {}", e))
                })?;
            }
            EncodeSetting::Png(level) => {
                let encoder = PngEncoder::new_with_quality(
                    &mut buffer,
                    png_compression(level),
                    PngFilter::Adaptive,
                );
                image.write_with_encoder(encoder).map_err(|e| {
                    BackendError::ProcessingFailed(format!("PNG encode failed: {}", e))
                })?;
            }
        }
        Ok(buffer)
    }
}
