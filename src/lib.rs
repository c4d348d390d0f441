//! # discord-image-tools
//!
//! The image half of a Discord utility panel: take an uploaded image, fit it
//! to the platform's limits, re-encode it, and hand back a file to download.
//!
//! # Pipeline
//!
//! ```text
//! upload bytes + MIME ─▶ decode ─▶ ImageAsset ─▶ optimize ─▶ TargetSpec ─▶ encode ─▶ OutputArtifact
//!                                    │                         ▲
//!                                    └──── user edits ─────────┘
//! ```
//!
//! A [`session::Session`] owns one panel's state and sequences these steps.
//! The UI (or the bundled CLI) feeds it uploads and edits and reads back the
//! current dimensions, format, quality and artifact.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Decode, aspect-fit math, resample + encode, the optimizer |
//! | [`session`] | State machine, edit sequencing, stale-result guard |
//! | [`profile`] | Platform limits and informational limit checks |
//! | [`preview`] | Acquire/release of per-upload display handles |
//! | [`config`] | `config.toml` loading: profile selection, optimizer policy |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Upscaling Is a Policy, Not a Bug
//!
//! [`imaging::fit_within`] scales by `min(max_w / w, max_h / h)` without
//! capping at 1, so an 800×600 upload fitted to 1920×1080 becomes 1440×1080.
//! That is what the optimizer does by default. Callers that want
//! shrink-only behaviour select [`imaging::FitPolicy::ShrinkOnly`]
//! (`shrink_only = true` in config, `--shrink-only` on the CLI).
//!
//! ## Static Format Choice
//!
//! The optimizer always picks WebP at quality 85. It does not search for a
//! quality that fits the payload limit; an oversized result is reported by
//! [`profile::check_limits`] and left to the user.
//!
//! ## Latest Request Wins
//!
//! Encodes can finish out of order when they run off the owning thread. The
//! session tags each request with a generation number and ignores results
//! for anything but the latest one.

pub mod config;
pub mod imaging;
pub mod output;
pub mod preview;
pub mod profile;
pub mod session;

#[cfg(test)]
pub(crate) mod test_helpers;
