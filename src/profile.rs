//! Platform upload constraints.
//!
//! A [`PlatformProfile`] is the set of limits the destination imposes on an
//! attachment. Two are built in:
//!
//! | Name | Max dimensions | Max payload |
//! |---|---|---|
//! | `discord` | 1920 × 1080 | 8 MiB |
//! | `discord-nitro` | 1920 × 1080 | 25 MiB |
//!
//! More can be declared under `[profiles.<name>]` in `config.toml`.
//!
//! Limits are advisory for user-entered specs: [`check_limits`] reports
//! overruns as [`LimitWarning`]s and never refuses an encode.

use crate::imaging::{OutputArtifact, TargetSpec};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Size constraints of a destination platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlatformProfile {
    pub max_width: u32,
    pub max_height: u32,
    pub max_payload_bytes: u64,
}

impl PlatformProfile {
    /// Discord's default attachment limits.
    pub const DISCORD: Self = Self {
        max_width: 1920,
        max_height: 1080,
        max_payload_bytes: 8 * 1024 * 1024,
    };

    /// Discord with a Nitro subscription.
    pub const DISCORD_NITRO: Self = Self {
        max_width: 1920,
        max_height: 1080,
        max_payload_bytes: 25 * 1024 * 1024,
    };

    /// Names accepted by [`PlatformProfile::builtin`].
    pub const BUILTIN_NAMES: &'static [&'static str] = &["discord", "discord-nitro"];

    /// Look up a built-in profile by name.
    pub fn builtin(name: &str) -> Option<Self> {
        match name {
            "discord" => Some(Self::DISCORD),
            "discord-nitro" => Some(Self::DISCORD_NITRO),
            _ => None,
        }
    }

    pub fn bounds(&self) -> (u32, u32) {
        (self.max_width, self.max_height)
    }
}

impl Default for PlatformProfile {
    fn default() -> Self {
        Self::DISCORD
    }
}

/// A limit the current spec or artifact exceeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitWarning {
    WidthExceeded { width: u32, max: u32 },
    HeightExceeded { height: u32, max: u32 },
    PayloadExceeded { bytes: u64, max: u64 },
}

impl fmt::Display for LimitWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WidthExceeded { width, max } => {
                write!(f, "width {width}px exceeds the {max}px limit")
            }
            Self::HeightExceeded { height, max } => {
                write!(f, "height {height}px exceeds the {max}px limit")
            }
            Self::PayloadExceeded { bytes, max } => write!(
                f,
                "file size {} exceeds the {} upload limit",
                format_bytes(*bytes),
                format_bytes(*max)
            ),
        }
    }
}

/// Human-readable byte size (`512 B`, `12.3 KiB`, `8.0 MiB`).
pub fn format_bytes(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    let b = bytes as f64;
    if b < KIB {
        format!("{bytes} B")
    } else if b < KIB * KIB {
        format!("{:.1} KiB", b / KIB)
    } else {
        format!("{:.1} MiB", b / (KIB * KIB))
    }
}

/// Compare a spec, and the artifact encoded from it if any, against a profile.
pub fn check_limits(
    spec: &TargetSpec,
    artifact: Option<&OutputArtifact>,
    profile: &PlatformProfile,
) -> Vec<LimitWarning> {
    let mut warnings = Vec::new();
    if spec.width > profile.max_width {
        warnings.push(LimitWarning::WidthExceeded {
            width: spec.width,
            max: profile.max_width,
        });
    }
    if spec.height > profile.max_height {
        warnings.push(LimitWarning::HeightExceeded {
            height: spec.height,
            max: profile.max_height,
        });
    }
    if let Some(bytes) = artifact.map(OutputArtifact::len) {
        if bytes > profile.max_payload_bytes {
            warnings.push(LimitWarning::PayloadExceeded {
                bytes,
                max: profile.max_payload_bytes,
            });
        }
    }
    warnings
}
