//! The image tool's session controller.
//!
//! A [`Session`] owns everything one image-tool panel shows: the uploaded
//! asset, the target spec being edited, the last encoded artifact and the
//! preview handle. The UI holds the session and calls into it; there is no
//! global state.
//!
//! # States
//!
//! ```text
//!            upload ok                 edit               begin_encode
//!   Empty ─────────────▶ Loaded ─────────────▶ Configuring ◀─────────────▶ Encoding
//!     ▲                    ▲                        ▲    encode failed        │
//!     │ teardown           │ upload ok (any state)  │ edit                    │ encode ok
//!     └────────────────────┴────────────────────────┴──────────── Ready ◀─────┘
//! ```
//!
//! # Stale results
//!
//! Encoding is split so it can run off the owning thread:
//! [`Session::begin_encode`] snapshots the asset and spec into an
//! [`EncodeJob`], [`EncodeJob::run`] does the pixel work, and
//! [`Session::complete_encode`] applies the result. Every edit, upload and
//! teardown bumps a generation counter, and a result is only applied if it
//! carries the current generation. A late result for an older spec is
//! dropped, so the artifact in `Ready` always matches the latest request.

use crate::imaging::{
    DecodeError, Dimensions, EncodeError, ImageAsset, ImageCodec, OptimizerPolicy, OutputArtifact,
    OutputFormat, Quality, TargetSpec, decode_upload, default_spec, encode_asset, fit_within,
    optimize,
};
use crate::preview::{PreviewHandle, PreviewRegistry};
use crate::profile::{LimitWarning, PlatformProfile, check_limits};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error("No image loaded")]
    NoAsset,
    #[error("An encode for the current settings is already running")]
    EncodeInProgress,
    #[error("No encoded image is ready")]
    NoArtifact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No asset.
    Empty,
    /// Fresh upload with its default spec.
    Loaded,
    /// Spec edited since the upload or the last encode.
    Configuring,
    /// An encode for the current generation is outstanding.
    Encoding,
    /// Artifact present and matching the current spec.
    Ready,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Empty => "empty",
            Self::Loaded => "loaded",
            Self::Configuring => "configuring",
            Self::Encoding => "encoding",
            Self::Ready => "ready",
        };
        f.write_str(name)
    }
}

/// What [`Session::complete_encode`] did with a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeOutcome {
    /// The artifact is now the session's current output.
    Applied,
    /// The session moved on since the job was issued; the result was dropped.
    Superseded,
}

/// A snapshot of one encode request. `Send`, so it can run on another thread.
pub struct EncodeJob {
    generation: u64,
    asset: Arc<ImageAsset>,
    spec: TargetSpec,
}

impl EncodeJob {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn spec(&self) -> &TargetSpec {
        &self.spec
    }

    pub fn run(self, codec: &impl ImageCodec) -> FinishedEncode {
        let result = encode_asset(codec, &self.asset, &self.spec);
        FinishedEncode {
            generation: self.generation,
            result,
        }
    }
}

/// The result of [`EncodeJob::run`], tagged with the job's generation.
#[derive(Debug)]
pub struct FinishedEncode {
    generation: u64,
    result: Result<OutputArtifact, EncodeError>,
}

impl FinishedEncode {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Single owner of one image-tool panel's state.
pub struct Session {
    profile: PlatformProfile,
    policy: OptimizerPolicy,
    previews: Arc<PreviewRegistry>,
    state: SessionState,
    asset: Option<Arc<ImageAsset>>,
    preview: Option<PreviewHandle>,
    spec: Option<TargetSpec>,
    artifact: Option<OutputArtifact>,
    generation: u64,
}

impl Session {
    pub fn new(profile: PlatformProfile, policy: OptimizerPolicy) -> Self {
        Self::with_registry(profile, policy, Arc::new(PreviewRegistry::new()))
    }

    /// Build a session that issues preview handles from a host-owned registry.
    pub fn with_registry(
        profile: PlatformProfile,
        policy: OptimizerPolicy,
        previews: Arc<PreviewRegistry>,
    ) -> Self {
        Self {
            profile,
            policy,
            previews,
            state: SessionState::Empty,
            asset: None,
            preview: None,
            spec: None,
            artifact: None,
            generation: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn asset(&self) -> Option<&ImageAsset> {
        self.asset.as_deref()
    }

    /// Intrinsic size of the current asset.
    pub fn source_dimensions(&self) -> Option<Dimensions> {
        self.asset.as_ref().map(|a| a.dimensions())
    }

    pub fn target_spec(&self) -> Option<&TargetSpec> {
        self.spec.as_ref()
    }

    pub fn artifact(&self) -> Option<&OutputArtifact> {
        self.artifact.as_ref()
    }

    pub fn preview(&self) -> Option<&PreviewHandle> {
        self.preview.as_ref()
    }

    pub fn previews(&self) -> &Arc<PreviewRegistry> {
        &self.previews
    }

    pub fn profile(&self) -> &PlatformProfile {
        &self.profile
    }

    pub fn policy(&self) -> &OptimizerPolicy {
        &self.policy
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    // =========================================================================
    // Upload
    // =========================================================================

    /// Accept an upload, replacing any current asset.
    ///
    /// On failure nothing changes: an empty session stays empty and a loaded
    /// one keeps its previous asset.
    pub fn accept_upload(
        &mut self,
        codec: &impl ImageCodec,
        bytes: Vec<u8>,
        declared_mime: &str,
    ) -> Result<Dimensions, SessionError> {
        let asset = decode_upload(codec, bytes, declared_mime).inspect_err(|e| {
            warn!(mime = declared_mime, error = %e, "upload rejected");
        })?;

        self.release_preview();
        let dims = asset.dimensions();
        self.preview = Some(self.previews.acquire());
        self.spec = Some(default_spec(dims, &self.policy));
        self.asset = Some(Arc::new(asset));
        self.artifact = None;
        self.generation += 1;
        self.transition(SessionState::Loaded);

        info!(
            width = dims.width,
            height = dims.height,
            mime = declared_mime,
            "image loaded"
        );
        Ok(dims)
    }

    /// Drop the asset and everything derived from it.
    pub fn teardown(&mut self) {
        self.release_preview();
        self.asset = None;
        self.spec = None;
        self.artifact = None;
        self.generation += 1;
        self.transition(SessionState::Empty);
    }

    fn release_preview(&mut self) {
        if let Some(handle) = self.preview.take() {
            debug!(url = handle.url(), "releasing preview");
            self.previews.release(handle);
        }
    }

    // =========================================================================
    // Spec edits
    // =========================================================================

    /// Apply an edit to the target spec.
    ///
    /// Any edit invalidates the current artifact and any in-flight encode.
    fn edit_spec(&mut self, edit: impl FnOnce(&mut TargetSpec)) -> Result<TargetSpec, SessionError> {
        let Some(spec) = self.spec.as_mut() else {
            return Err(SessionError::NoAsset);
        };
        edit(spec);
        let updated = *spec;

        self.generation += 1;
        if self.artifact.take().is_some() {
            debug!("discarding artifact for previous spec");
        }
        self.transition(SessionState::Configuring);
        Ok(updated)
    }

    pub fn set_width(&mut self, width: u32) -> Result<TargetSpec, SessionError> {
        self.edit_spec(|s| s.width = width)
    }

    pub fn set_height(&mut self, height: u32) -> Result<TargetSpec, SessionError> {
        self.edit_spec(|s| s.height = height)
    }

    pub fn set_dimensions(&mut self, width: u32, height: u32) -> Result<TargetSpec, SessionError> {
        self.edit_spec(|s| {
            s.width = width;
            s.height = height;
        })
    }

    /// Resize from a partial request, as typed into the width/height fields.
    ///
    /// With one side given the other follows the source aspect ratio. A 0 is
    /// stored as entered so the encode reports it. With neither side given
    /// the spec is returned unchanged.
    pub fn resize(
        &mut self,
        width: Option<u32>,
        height: Option<u32>,
    ) -> Result<TargetSpec, SessionError> {
        let dims = self.source_dimensions().ok_or(SessionError::NoAsset)?;
        let source = (dims.width, dims.height);
        match (width, height) {
            (Some(w), Some(h)) => self.set_dimensions(w, h),
            (Some(0), None) => self.set_width(0),
            (None, Some(0)) => self.set_height(0),
            (Some(w), None) => {
                let (w, h) = fit_within(source, (w, u32::MAX));
                self.set_dimensions(w, h)
            }
            (None, Some(h)) => {
                let (w, h) = fit_within(source, (u32::MAX, h));
                self.set_dimensions(w, h)
            }
            (None, None) => self.spec.ok_or(SessionError::NoAsset),
        }
    }

    pub fn set_format(&mut self, format: OutputFormat) -> Result<TargetSpec, SessionError> {
        self.edit_spec(|s| s.format = format)
    }

    /// Set quality; out-of-range values are clamped to 1–100.
    pub fn set_quality(&mut self, quality: u32) -> Result<TargetSpec, SessionError> {
        self.edit_spec(|s| s.quality = Quality::new(quality))
    }

    pub fn set_spec(&mut self, spec: TargetSpec) -> Result<TargetSpec, SessionError> {
        self.edit_spec(|s| *s = spec)
    }

    /// The spec the optimizer would pick for the current asset. Changes nothing.
    pub fn recommended_spec(&self) -> Result<TargetSpec, SessionError> {
        let dims = self.source_dimensions().ok_or(SessionError::NoAsset)?;
        Ok(optimize(dims, &self.profile, &self.policy))
    }

    /// Replace the spec with the optimizer's recommendation. Does not encode.
    pub fn apply_recommended(&mut self) -> Result<TargetSpec, SessionError> {
        let spec = self.recommended_spec()?;
        info!(
            width = spec.width,
            height = spec.height,
            format = %spec.format,
            quality = spec.quality.value(),
            "applying platform-optimized settings"
        );
        self.set_spec(spec)
    }

    // =========================================================================
    // Encoding
    // =========================================================================

    /// Start an encode of the current asset at the current spec.
    ///
    /// Fails with [`SessionError::EncodeInProgress`] if an encode for the same
    /// generation is already outstanding. After an edit, a new encode may be
    /// started; the older one's result will be dropped on completion.
    ///
    /// A job that is dropped without being completed leaves the session in
    /// `Encoding`; call [`Session::abandon_encode`] to get out of it.
    pub fn begin_encode(&mut self) -> Result<EncodeJob, SessionError> {
        let (Some(asset), Some(spec)) = (self.asset.as_ref(), self.spec) else {
            return Err(SessionError::NoAsset);
        };
        if self.state == SessionState::Encoding {
            return Err(SessionError::EncodeInProgress);
        }

        let job = EncodeJob {
            generation: self.generation,
            asset: Arc::clone(asset),
            spec,
        };
        self.artifact = None;
        self.transition(SessionState::Encoding);
        Ok(job)
    }

    /// Give up on the outstanding encode.
    ///
    /// Returns to `Configuring` and bumps the generation so the abandoned
    /// job's result, should it still arrive, is dropped. Returns `false` if
    /// no encode was outstanding.
    pub fn abandon_encode(&mut self) -> bool {
        if self.state != SessionState::Encoding {
            return false;
        }
        self.generation += 1;
        warn!(generation = self.generation, "encode abandoned");
        self.transition(SessionState::Configuring);
        true
    }

        /// Apply a finished encode if it is still current.
    ///
    /// A current failure returns the session to `Configuring` and is reported
    /// as an error. A stale result, success or failure, is dropped.
    pub fn complete_encode(
        &mut self,
        finished: FinishedEncode,
    ) -> Result<EncodeOutcome, SessionError> {
        if finished.generation != self.generation || self.state != SessionState::Encoding {
            warn!(
                job = finished.generation,
                current = self.generation,
                "dropping stale encode result"
            );
            return Ok(EncodeOutcome::Superseded);
        }

        match finished.result {
            Ok(artifact) => {
                info!(
                    bytes = artifact.len(),
                    file = %artifact.suggested_file_name(),
                    "encode finished"
                );
                self.artifact = Some(artifact);
                self.transition(SessionState::Ready);
                for warning in self.limit_warnings() {
                    warn!("{warning}");
                }
                Ok(EncodeOutcome::Applied)
            }
            Err(e) => {
                warn!(error = %e, "encode failed");
                self.transition(SessionState::Configuring);
                Err(e.into())
            }
        }
    }

    /// Encode on the calling thread and return the artifact.
    pub fn encode(&mut self, codec: &impl ImageCodec) -> Result<&OutputArtifact, SessionError> {
        let finished = self.begin_encode()?.run(codec);
        self.complete_encode(finished)?;
        self.export()
    }

    /// The artifact to hand to a download collaborator, if one is ready.
    pub fn export(&self) -> Result<&OutputArtifact, SessionError> {
        match (self.state, self.artifact.as_ref()) {
            (SessionState::Ready, Some(artifact)) => Ok(artifact),
            _ => Err(SessionError::NoArtifact),
        }
    }

    /// Profile limits the current spec or artifact exceeds. Informational only.
    pub fn limit_warnings(&self) -> Vec<LimitWarning> {
        match self.spec.as_ref() {
            Some(spec) => check_limits(spec, self.artifact.as_ref(), &self.profile),
            None => Vec::new(),
        }
    }

    fn transition(&mut self, next: SessionState) {
        if self.state != next {
            debug!(from = %self.state, to = %next, generation = self.generation, "session state");
        }
        self.state = next;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(PlatformProfile::default(), OptimizerPolicy::default())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.release_preview();
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("generation", &self.generation)
            .field("asset", &self.asset)
            .field("spec", &self.spec)
            .field("artifact", &self.artifact)
            .finish()
    }
}
