//! Production raster codec built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Sniff + decode (JPEG, PNG, TIFF, WebP, GIF, BMP) | `image::ImageReader::with_guessed_format` |
//! | Resample | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |
//! | Encode → PNG | `image::codecs::png::PngEncoder` (quality ignored) |
//! | Encode → WebP | `webp` crate (libwebp, lossy) |

use super::backend::{DecodeError, EncodeError, ImageCodec};
use super::params::{OutputFormat, TargetSpec};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageError, ImageFormat, ImageReader};
use std::io::Cursor;

/// Input formats the decoder is expected to handle.
const DECODE_CANDIDATES: &[ImageFormat] = &[
    ImageFormat::Jpeg,
    ImageFormat::Png,
    ImageFormat::Tiff,
    ImageFormat::WebP,
    ImageFormat::Gif,
    ImageFormat::Bmp,
];

/// MIME types of the input formats that have working decoders compiled in.
pub fn supported_input_mime_types() -> Vec<&'static str> {
    DECODE_CANDIDATES
        .iter()
        .filter(|fmt| fmt.reading_enabled())
        .map(|fmt| fmt.to_mime_type())
        .collect()
}

/// Codec backed by the `image` crate, with libwebp for lossy WebP output.
pub struct RustCodec;

impl RustCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustCodec {
    fn default() -> Self {
        Self::new()
    }
}

fn map_decode_error(err: ImageError) -> DecodeError {
    match err {
        ImageError::Unsupported(e) => DecodeError::UnsupportedFormat(e.to_string()),
        other => DecodeError::CorruptData(other.to_string()),
    }
}

/// Drop or keep alpha so the pixel layout is one every encoder accepts.
fn to_8bit(img: &DynamicImage, keep_alpha: bool) -> DynamicImage {
    if keep_alpha && img.color().has_alpha() {
        DynamicImage::ImageRgba8(img.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(img.to_rgb8())
    }
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, EncodeError> {
    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, quality);
    to_8bit(img, false)
        .write_with_encoder(encoder)
        .map_err(|e| EncodeError::EncodeRejected(format!("JPEG encode failed: {e}")))?;
    Ok(out)
}

fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, EncodeError> {
    let mut out = Vec::new();
    let encoder = PngEncoder::new(&mut out);
    to_8bit(img, true)
        .write_with_encoder(encoder)
        .map_err(|e| EncodeError::EncodeRejected(format!("PNG encode failed: {e}")))?;
    Ok(out)
}

fn encode_webp(img: &DynamicImage, quality: f32) -> Result<Vec<u8>, EncodeError> {
    let rgba = img.to_rgba8();
    let encoder = webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height());
    let encoded = encoder
        .encode_simple(false, quality)
        .map_err(|e| EncodeError::EncodeRejected(format!("WebP encode failed: {e:?}")))?;
    Ok(encoded.to_vec())
}

impl ImageCodec for RustCodec {
    fn decode(&self, bytes: &[u8]) -> Result<DynamicImage, DecodeError> {
        let reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| DecodeError::CorruptData(e.to_string()))?;

        let Some(format) = reader.format() else {
            return Err(DecodeError::CorruptData(
                "Unrecognized image data".to_string(),
            ));
        };
        if !format.reading_enabled() {
            return Err(DecodeError::UnsupportedFormat(format!(
                "No decoder for {}",
                format.to_mime_type()
            )));
        }

        reader.decode().map_err(map_decode_error)
    }

    fn encode(&self, raster: &DynamicImage, spec: &TargetSpec) -> Result<Vec<u8>, EncodeError> {
        let surface = raster.resize_exact(spec.width, spec.height, FilterType::Lanczos3);
        let quality = spec.quality.value();

        match spec.format {
            OutputFormat::Jpeg => encode_jpeg(&surface, quality as u8),
            OutputFormat::Png => encode_png(&surface),
            OutputFormat::WebP => encode_webp(&surface, quality as f32),
        }
    }
}
