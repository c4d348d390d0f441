//! CLI output formatting.
//!
//! Output follows the image tool panel: what was uploaded, what will be
//! produced, what was produced, and anything over the platform limits.
//!
//! ```text
//! Source
//!     4000 x 2000 px, image/jpeg, 2.1 MiB
//! Target (discord: max 1920 x 1080, 8.0 MiB)
//!     1920 x 960 px, webp @ 85
//! Output
//!     optimized.webp → out/optimized.webp (312.4 KiB)
//! Warnings
//!     width 4000px exceeds the 1920px limit
//! ```
//!
//! Each section has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout.

use crate::imaging::{Dimensions, OutputArtifact, TargetSpec};
use crate::profile::{LimitWarning, PlatformProfile, format_bytes};
use serde::Serialize;
use std::path::Path;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn spec_line(spec: &TargetSpec) -> String {
    if spec.format.is_lossy() {
        format!(
            "{} x {} px, {} @ {}",
            spec.width,
            spec.height,
            spec.format,
            spec.quality.value()
        )
    } else {
        format!("{} x {} px, {} (lossless)", spec.width, spec.height, spec.format)
    }
}

pub fn format_source(dims: Dimensions, mime_type: &str, byte_len: u64) -> Vec<String> {
    vec![
        "Source".to_string(),
        format!(
            "{}{} x {} px, {}, {}",
            indent(1),
            dims.width,
            dims.height,
            mime_type,
            format_bytes(byte_len)
        ),
    ]
}

pub fn format_target(
    heading: &str,
    spec: &TargetSpec,
    profile_name: &str,
    profile: &PlatformProfile,
) -> Vec<String> {
    vec![
        format!(
            "{} ({}: max {} x {}, {})",
            heading,
            profile_name,
            profile.max_width,
            profile.max_height,
            format_bytes(profile.max_payload_bytes)
        ),
        format!("{}{}", indent(1), spec_line(spec)),
    ]
}

pub fn format_artifact(artifact: &OutputArtifact, written_to: &Path) -> Vec<String> {
    vec![
        "Output".to_string(),
        format!(
            "{}{} → {} ({})",
            indent(1),
            artifact.suggested_file_name(),
            written_to.display(),
            format_bytes(artifact.len())
        ),
    ]
}

/// Empty when there is nothing to warn about.
pub fn format_warnings(warnings: &[LimitWarning]) -> Vec<String> {
    if warnings.is_empty() {
        return Vec::new();
    }
    let mut lines = vec!["Warnings".to_string()];
    lines.extend(warnings.iter().map(|w| format!("{}{}", indent(1), w)));
    lines
}

/// Hint shown when an upload's format has no decoder.
pub fn format_supported_inputs(mime_types: &[&str]) -> Vec<String> {
    vec![
        "Supported inputs".to_string(),
        format!("{}{}", indent(1), mime_types.join(", ")),
    ]
}

/// Machine-readable summary printed by `inspect --json`.
#[derive(Debug, Serialize)]
pub struct InspectReport<'a> {
    pub width: u32,
    pub height: u32,
    pub mime_type: &'a str,
    pub bytes: u64,
    pub profile: &'a str,
    pub limits: PlatformProfile,
    pub recommended: TargetSpec,
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{}", line);
    }
}

pub fn print_source(dims: Dimensions, mime_type: &str, byte_len: u64) {
    print_lines(format_source(dims, mime_type, byte_len));
}

pub fn print_target(heading: &str, spec: &TargetSpec, profile_name: &str, profile: &PlatformProfile) {
    print_lines(format_target(heading, spec, profile_name, profile));
}

pub fn print_artifact(artifact: &OutputArtifact, written_to: &Path) {
    print_lines(format_artifact(artifact, written_to));
}

pub fn print_warnings(warnings: &[LimitWarning]) {
    print_lines(format_warnings(warnings));
}

/// Written to stderr, next to the error it explains.
pub fn print_supported_inputs(mime_types: &[&str]) {
    for line in format_supported_inputs(mime_types) {
        eprintln!("{}", line);
    }
}
