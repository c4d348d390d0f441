//! The decoded upload and the encoded result.

use super::backend::Dimensions;
use super::params::TargetSpec;
use image::DynamicImage;
use std::fmt;

/// An accepted upload: original bytes, declared MIME type and decoded raster.
///
/// Immutable once built. Only [`decode_upload`](super::decode_upload) creates
/// one, and it never creates one with a zero dimension.
pub struct ImageAsset {
    source_bytes: Vec<u8>,
    mime_type: String,
    raster: DynamicImage,
}

impl ImageAsset {
    pub(crate) fn new(source_bytes: Vec<u8>, mime_type: String, raster: DynamicImage) -> Self {
        Self {
            source_bytes,
            mime_type,
            raster,
        }
    }

    pub fn source_bytes(&self) -> &[u8] {
        &self.source_bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn width(&self) -> u32 {
        self.raster.width()
    }

    pub fn height(&self) -> u32 {
        self.raster.height()
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width(),
            height: self.height(),
        }
    }

    pub fn raster(&self) -> &DynamicImage {
        &self.raster
    }
}

impl fmt::Debug for ImageAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageAsset")
            .field("mime_type", &self.mime_type)
            .field("width", &self.width())
            .field("height", &self.height())
            .field("source_len", &self.source_bytes.len())
            .finish()
    }
}

/// A complete encode result, ready to hand to a download collaborator.
#[derive(Clone, PartialEq, Eq)]
pub struct OutputArtifact {
    bytes: Vec<u8>,
    spec: TargetSpec,
}

impl OutputArtifact {
    /// Only built from a non-empty payload; see [`encode_asset`](super::encode_asset).
    pub(crate) fn new(bytes: Vec<u8>, spec: TargetSpec) -> Self {
        Self { bytes, spec }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn mime_type(&self) -> &'static str {
        self.spec.format.mime_type()
    }

    pub fn suggested_file_name(&self) -> String {
        self.spec.suggested_file_name()
    }

    /// The spec this artifact was encoded from.
    pub fn spec(&self) -> &TargetSpec {
        &self.spec
    }
}

impl fmt::Debug for OutputArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputArtifact")
            .field("mime_type", &self.mime_type())
            .field("len", &self.bytes.len())
            .field("spec", &self.spec)
            .finish()
    }
}
