//! Raster codec trait and its error types.
//!
//! The [`ImageCodec`] trait defines the two operations the pipeline needs
//! from a raster codec: turn uploaded bytes into pixels, and turn pixels into
//! an encoded file of exact dimensions.
//!
//! The production implementation is [`RustCodec`](super::rust_backend::RustCodec).
//! Tests use a recording mock so session logic can be exercised without
//! touching real pixel data.

use super::params::TargetSpec;
use image::DynamicImage;
use thiserror::Error;

/// Failure to turn an upload into an [`ImageAsset`](super::ImageAsset).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Not an image type, or an image format with no decoder compiled in.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("Corrupt image data: {0}")]
    CorruptData(String),
}

/// Failure to produce an [`OutputArtifact`](super::OutputArtifact).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("Cannot allocate a {width}x{height} drawing surface")]
    SurfaceUnavailable { width: u32, height: u32 },
    #[error("Encoding rejected: {0}")]
    EncodeRejected(String),
}

/// Pixel dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for raster codecs.
///
/// `Sync` so an encode job can run on a worker thread while the session that
/// issued it keeps accepting edits.
pub trait ImageCodec: Sync {
    /// Decode raw file bytes. The format is sniffed from the content.
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, DecodeError>;

    /// Resample `raster` to exactly `spec.width × spec.height` and serialize
    /// it as `spec.format` at `spec.quality`.
    fn encode(&self, raster: &DynamicImage, spec: &TargetSpec) -> Result<Vec<u8>, EncodeError>;
}
