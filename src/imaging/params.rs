//! Parameter types for image operations.
//!
//! These structs describe *what* to produce, not *how*. They are the interface
//! between the [`session`](crate::session) (which collects user edits) and the
//! [`backend`](super::backend) (which does the pixel work).
//!
//! ## Types
//!
//! - [`Quality`]: Lossy encoding quality (1–100, default 85). Clamped on construction.
//! - [`OutputFormat`]: JPEG, PNG or WebP, with file extension and MIME type.
//! - [`TargetSpec`]: Output dimensions, format and quality for one encode.
//! - [`FitPolicy`]: Whether fitting into a bounding box may upscale.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

impl From<u32> for Quality {
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

impl From<Quality> for u32 {
    fn from(q: Quality) -> Self {
        q.0
    }
}

/// Encodable output formats.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jpeg,
    Png,
    #[default]
    #[serde(rename = "webp")]
    #[value(name = "webp")]
    WebP,
}

impl OutputFormat {
    /// File extension, also used for the suggested download name.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::WebP => "webp",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::WebP => "image/webp",
        }
    }

    /// Whether [`Quality`] has any effect. PNG ignores it.
    pub fn is_lossy(self) -> bool {
        !matches!(self, Self::Png)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Desired output of an encode.
///
/// Width and height are not validated here: a user may type `0`, and that is
/// reported by the encoder as an unavailable surface rather than refused at
/// edit time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSpec {
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
    pub quality: Quality,
}

impl TargetSpec {
    pub fn new(width: u32, height: u32, format: OutputFormat, quality: Quality) -> Self {
        Self {
            width,
            height,
            format,
            quality,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Suggested download name for an artifact encoded from this spec.
    pub fn suggested_file_name(&self) -> String {
        format!("optimized.{}", self.format.extension())
    }
}

/// Caller-level policy for fitting into a bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FitPolicy {
    /// Scale by the fit ratio even when it is above 1.
    #[default]
    AllowUpscale,
    /// Never exceed the source dimensions.
    ShrinkOnly,
}
