//! Image processing in pure Rust, with zero system dependencies.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_dimensions` |
//! | **Decode** | `image` decoders + EXIF orientation |
//! | **Resample** | Lanczos3 `resize_exact` |
//! | **Encode** | `JpegEncoder` (quality) / `PngEncoder` (lossless) |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing encode settings
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]

pub mod backend;
mod calculations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend, Raster};
pub use calculations::{effective_floor, keeps_floor, min_scale_factor, scaled_dimensions};
pub use params::{EncodeSetting, PngCompression, Quality};
pub use rust_backend::RustBackend;
