//! Image processing: decode, fit, resample, encode.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` (format sniffed from bytes) |
//! | **Fit** | [`fit_within`] / [`plan_dimensions`] |
//! | **Resample** | `resize_exact` with Lanczos3 |
//! | **Encode** | `image` (JPEG, PNG), `webp` (lossy WebP) |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Data structures describing the requested output
//! - **Asset**: The decoded upload and the encoded artifact
//! - **Backend**: [`ImageCodec`] trait + [`RustCodec`]
//! - **Operations**: Preconditions and policy on top of the codec

mod asset;
pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use asset::{ImageAsset, OutputArtifact};
pub use backend::{DecodeError, Dimensions, EncodeError, ImageCodec};
pub use calculations::{fit_ratio, fit_within, plan_dimensions};
pub use operations::{
    OptimizerPolicy, check_format_bounds, check_surface, decode_upload, default_spec, encode_asset,
    is_image_mime, optimize,
};
pub use params::{FitPolicy, OutputFormat, Quality, TargetSpec};
pub use rust_backend::{RustCodec, supported_input_mime_types};
