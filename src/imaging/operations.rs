//! High-level image operations.
//!
//! These functions combine calculations with codec execution. They hold the
//! preconditions (MIME check, surface bounds, non-empty output) so every
//! [`ImageCodec`] gets the same contract.

use super::asset::{ImageAsset, OutputArtifact};
use super::backend::{DecodeError, Dimensions, EncodeError, ImageCodec};
use super::calculations::plan_dimensions;
use super::params::{FitPolicy, OutputFormat, Quality, TargetSpec};
use crate::profile::PlatformProfile;
use serde::{Deserialize, Serialize};

/// Largest side a drawing surface may have.
pub const MAX_SURFACE_SIDE: u32 = 32_767;

/// Largest pixel area a drawing surface may have.
pub const MAX_SURFACE_AREA: u64 = 268_435_456;

/// Largest side libwebp will encode.
pub const MAX_WEBP_SIDE: u32 = 16_383;

/// Whether a declared MIME type names an image.
pub fn is_image_mime(mime: &str) -> bool {
    mime.trim().to_ascii_lowercase().starts_with("image/")
}

/// Accept an upload: check the declared type, decode, record dimensions.
///
/// Non-image types are rejected without calling the codec.
pub fn decode_upload(
    codec: &impl ImageCodec,
    bytes: Vec<u8>,
    declared_mime: &str,
) -> Result<ImageAsset, DecodeError> {
    if !is_image_mime(declared_mime) {
        return Err(DecodeError::UnsupportedFormat(format!(
            "{declared_mime:?} is not an image type"
        )));
    }

    let raster = codec.decode(&bytes)?;
    if raster.width() == 0 || raster.height() == 0 {
        return Err(DecodeError::CorruptData(format!(
            "Decoded image has no pixels ({}x{})",
            raster.width(),
            raster.height()
        )));
    }

    Ok(ImageAsset::new(bytes, declared_mime.to_string(), raster))
}

/// Check that a surface of the given size could be allocated.
///
/// This is format-independent; see [`check_format_bounds`] for per-format
/// output limits.
pub fn check_surface(width: u32, height: u32) -> Result<(), EncodeError> {
    let area = width as u64 * height as u64;
    if width == 0 || height == 0 || width.max(height) > MAX_SURFACE_SIDE || area > MAX_SURFACE_AREA
    {
        return Err(EncodeError::SurfaceUnavailable { width, height });
    }
    Ok(())
}

/// Check the spec against the output format's own size limit.
///
/// Only WebP has one tighter than the surface bound.
pub fn check_format_bounds(spec: &TargetSpec) -> Result<(), EncodeError> {
    if spec.format == OutputFormat::WebP && spec.width.max(spec.height) > MAX_WEBP_SIDE {
        return Err(EncodeError::EncodeRejected(format!(
            "WebP output is limited to {MAX_WEBP_SIDE}px per side, got {}x{}",
            spec.width, spec.height
        )));
    }
    Ok(())
}

/// Resample and encode an asset into a complete artifact.
pub fn encode_asset(
    codec: &impl ImageCodec,
    asset: &ImageAsset,
    spec: &TargetSpec,
) -> Result<OutputArtifact, EncodeError> {
    check_surface(spec.width, spec.height)?;
    check_format_bounds(spec)?;

    let bytes = codec.encode(asset.raster(), spec)?;
    if bytes.is_empty() {
        return Err(EncodeError::EncodeRejected(format!(
            "{} encoder produced no data",
            spec.format.mime_type()
        )));
    }

    Ok(OutputArtifact::new(bytes, *spec))
}

/// Static format/quality choice applied by [`optimize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptimizerPolicy {
    pub format: OutputFormat,
    pub quality: Quality,
    pub fit: FitPolicy,
}

impl Default for OptimizerPolicy {
    /// WebP at 85, upscaling allowed.
    fn default() -> Self {
        Self {
            format: OutputFormat::WebP,
            quality: Quality::new(85),
            fit: FitPolicy::AllowUpscale,
        }
    }
}

/// The spec a fresh upload starts with: intrinsic size, policy format/quality.
pub fn default_spec(source: Dimensions, policy: &OptimizerPolicy) -> TargetSpec {
    TargetSpec::new(source.width, source.height, policy.format, policy.quality)
}

/// Recommend a spec that fits `profile`.
///
/// Dimensions are fitted to the profile's bounds under `policy.fit`; format
/// and quality come from the policy unchanged. The payload limit is not
/// consulted. Nothing is encoded.
pub fn optimize(
    source: Dimensions,
    profile: &PlatformProfile,
    policy: &OptimizerPolicy,
) -> TargetSpec {
    let (width, height) = plan_dimensions(
        (source.width, source.height),
        profile.bounds(),
        policy.fit,
    );
    TargetSpec::new(width, height, policy.format, policy.quality)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockCodec, RecordedOp};

    fn dims(width: u32, height: u32) -> Dimensions {
        Dimensions { width, height }
    }

    fn loaded(width: u32, height: u32) -> (MockCodec, ImageAsset) {
        let codec = MockCodec::with_dimensions(vec![dims(width, height)]);
        let asset = decode_upload(&codec, b"raw".to_vec(), "image/png").unwrap();
        (codec, asset)
    }

    // =========================================================================
    // decode_upload tests
    // =========================================================================

    #[test]
    fn decode_records_intrinsic_size() {
        let (_, asset) = loaded(640, 480);
        assert_eq!(asset.dimensions(), dims(640, 480));
        assert_eq!(asset.mime_type(), "image/png");
        assert_eq!(asset.source_bytes(), b"raw");
    }

    #[test]
    fn decode_rejects_non_image_without_decoding() {
        let codec = MockCodec::with_dimensions(vec![dims(10, 10)]);
        let result = decode_upload(&codec, b"%PDF".to_vec(), "application/pdf");

        assert!(matches!(result, Err(DecodeError::UnsupportedFormat(_))));
        assert!(codec.get_operations().is_empty());
    }

    #[test]
    fn mime_check_is_case_insensitive() {
        assert!(is_image_mime("IMAGE/PNG"));
        assert!(is_image_mime("image/svg+xml"));
        assert!(!is_image_mime("text/plain"));
        assert!(!is_image_mime(""));
    }

    #[test]
    fn decode_propagates_corrupt_data() {
        let codec = MockCodec::new();
        codec.push_decode_error(DecodeError::CorruptData("bad huffman table".into()));

        let result = decode_upload(&codec, b"x".to_vec(), "image/jpeg");
        assert_eq!(
            result.unwrap_err(),
            DecodeError::CorruptData("bad huffman table".into())
        );
    }

    #[test]
    fn decode_rejects_empty_raster() {
        let codec = MockCodec::with_dimensions(vec![dims(0, 10)]);
        let result = decode_upload(&codec, b"x".to_vec(), "image/gif");
        assert!(matches!(result, Err(DecodeError::CorruptData(_))));
    }

    // =========================================================================
    // encode_asset tests
    // =========================================================================

    #[test]
    fn encode_builds_artifact_with_suggested_name() {
        let (codec, asset) = loaded(400, 300);
        let spec = TargetSpec::new(200, 150, OutputFormat::Jpeg, Quality::new(60));

        let artifact = encode_asset(&codec, &asset, &spec).unwrap();

        assert_eq!(artifact.suggested_file_name(), "optimized.jpeg");
        assert_eq!(artifact.mime_type(), "image/jpeg");
        assert_eq!(artifact.bytes(), b"200x150.jpeg@60");
        assert_eq!(artifact.spec(), &spec);
    }

    #[test]
    fn encode_zero_width_is_surface_unavailable() {
        let (codec, asset) = loaded(400, 300);
        let spec = TargetSpec::new(0, 150, OutputFormat::WebP, Quality::default());

        let result = encode_asset(&codec, &asset, &spec);

        assert_eq!(
            result.unwrap_err(),
            EncodeError::SurfaceUnavailable {
                width: 0,
                height: 150
            }
        );
        // The codec is never asked for an impossible surface
        assert!(
            !codec
                .get_operations()
                .iter()
                .any(|op| matches!(op, RecordedOp::Encode { .. }))
        );
    }

    #[test]
    fn surface_bounds() {
        assert!(check_surface(1, 1).is_ok());
        assert!(check_surface(MAX_SURFACE_SIDE, 8192).is_ok());
        assert!(check_surface(MAX_SURFACE_SIDE + 1, 1).is_err());
        assert!(check_surface(20_000, 20_000).is_err());
    }

    #[test]
    fn webp_over_side_limit_is_rejected_before_codec() {
        let (codec, asset) = loaded(400, 300);
        let spec = TargetSpec::new(
            MAX_WEBP_SIDE + 1,
            100,
            OutputFormat::WebP,
            Quality::default(),
        );

        let result = encode_asset(&codec, &asset, &spec);

        assert!(matches!(result, Err(EncodeError::EncodeRejected(_))));
        assert!(
            !codec
                .get_operations()
                .iter()
                .any(|op| matches!(op, RecordedOp::Encode { .. }))
        );
    }

    #[test]
    fn format_bounds_only_limit_webp() {
        let wide = |format| TargetSpec::new(20_000, 100, format, Quality::default());
        assert!(check_format_bounds(&wide(OutputFormat::WebP)).is_err());
        assert!(check_format_bounds(&wide(OutputFormat::Png)).is_ok());
        assert!(check_format_bounds(&wide(OutputFormat::Jpeg)).is_ok());

        let edge = TargetSpec::new(
            MAX_WEBP_SIDE,
            MAX_WEBP_SIDE,
            OutputFormat::WebP,
            Quality::default(),
        );
        assert!(check_format_bounds(&edge).is_ok());
    }

    #[test]
    fn encode_empty_output_is_rejected() {
        let (codec, asset) = loaded(400, 300);
        codec.push_encode_result(Ok(Vec::new()));
        let spec = TargetSpec::new(10, 10, OutputFormat::Png, Quality::default());

        let result = encode_asset(&codec, &asset, &spec);
        assert!(matches!(result, Err(EncodeError::EncodeRejected(_))));
    }

    // =========================================================================
    // optimize tests
    // =========================================================================

    #[test]
    fn optimize_large_landscape() {
        let spec = optimize(
            dims(4000, 2000),
            &PlatformProfile::DISCORD,
            &OptimizerPolicy::default(),
        );
        assert_eq!(spec.dimensions(), (1920, 960));
        assert_eq!(spec.format, OutputFormat::WebP);
        assert_eq!(spec.quality.value(), 85);
    }

    #[test]
    fn optimize_small_source_upscales_by_default() {
        let spec = optimize(
            dims(800, 600),
            &PlatformProfile::DISCORD,
            &OptimizerPolicy::default(),
        );
        assert_eq!(spec.dimensions(), (1440, 1080));
    }

    #[test]
    fn optimize_small_source_shrink_only() {
        let policy = OptimizerPolicy {
            fit: FitPolicy::ShrinkOnly,
            ..OptimizerPolicy::default()
        };
        let spec = optimize(dims(800, 600), &PlatformProfile::DISCORD, &policy);
        assert_eq!(spec.dimensions(), (800, 600));
    }

    #[test]
    fn optimize_stays_within_bounds() {
        let profile = PlatformProfile::DISCORD;
        for &(w, h) in &[(4000, 2000), (1080, 1920), (5, 5), (12000, 90), (1921, 1081)] {
            let spec = optimize(dims(w, h), &profile, &OptimizerPolicy::default());
            assert!(spec.width <= profile.max_width, "{w}x{h} -> {spec:?}");
            assert!(spec.height <= profile.max_height, "{w}x{h} -> {spec:?}");
        }
    }

    #[test]
    fn default_spec_uses_intrinsic_size() {
        let spec = default_spec(dims(640, 480), &OptimizerPolicy::default());
        assert_eq!(spec.dimensions(), (640, 480));
        assert_eq!(spec.format, OutputFormat::WebP);
    }
}
