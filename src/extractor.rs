//! Idempotent media extraction for one logical cue.
//!
//! [`MediaExtractor::extract`] turns a marker and an [`ExtractionWindow`]
//! into a [`CueOutcome`]. Extraction never fails the run: anything that goes
//! wrong with the transcoder becomes a [`CueOutcome::Skipped`] carrying a
//! [`SkipReason`], and the caller decides what to do with it.
//!
//! Outputs are first written to a staging file in the working directory,
//! checked, then renamed into place without clobbering. A finished artifact
//! therefore either exists completely or not at all, and an artifact placed
//! by a concurrent run is simply adopted.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::io::ErrorKind;
use std::path::Path;

use serde::Serialize;

use crate::artifact::{self, ArtifactKind, MediaArtifact};
use crate::crop::CropSpec;
use crate::error::SubdeckError;
use crate::transcoder::{AudioRequest, ImageRequest, Transcoder};
use crate::window::ExtractionWindow;

/// Why a cue produced no card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// The padded, clamped audio window is empty.
    DegenerateWindow {
        /// Shifted cue start in milliseconds.
        start: i64,
        /// Shifted cue end in milliseconds.
        end: i64,
    },
    /// The transcoder could not be run, failed, or timed out.
    TranscoderFailed {
        /// Which artifact was being produced.
        kind: ArtifactKind,
        /// Diagnostic from the transcoder.
        message: String,
    },
    /// The transcoder reported success but the output is missing or unusable.
    InvalidOutput {
        /// Which artifact was being produced.
        kind: ArtifactKind,
        /// What was wrong with the file.
        message: String,
    },
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            SkipReason::DegenerateWindow { start, end } => {
                write!(f, "empty audio window ({start}ms..{end}ms after offset)")
            }
            SkipReason::TranscoderFailed { kind, message } => {
                write!(f, "{kind} extraction failed: {message}")
            }
            SkipReason::InvalidOutput { kind, message } => {
                write!(f, "{kind} output rejected: {message}")
            }
        }
    }
}

/// Result of extracting one logical cue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CueOutcome {
    /// Both artifacts are on disk.
    Extracted {
        /// The audio clip.
        audio: MediaArtifact,
        /// The still frame.
        image: MediaArtifact,
    },
    /// The cue produced no card.
    Skipped {
        /// What went wrong.
        reason: SkipReason,
        /// Artifacts that do exist for this cue anyway. They stay in the
        /// working directory as cache entries.
        produced: Vec<MediaArtifact>,
    },
}

impl CueOutcome {
    /// Returns `true` when both artifacts are available.
    pub fn is_extracted(&self) -> bool {
        matches!(self, CueOutcome::Extracted { .. })
    }

    /// The skip reason, if the cue was skipped.
    pub fn skip_reason(&self) -> Option<&SkipReason> {
        match self {
            CueOutcome::Extracted { .. } => None,
            CueOutcome::Skipped { reason, .. } => Some(reason),
        }
    }
}

/// Produces the audio clip and still frame for each cue of one video.
///
/// The extractor is cheap to construct and holds only borrowed state, so it
/// can be shared across worker threads.
pub struct MediaExtractor<'a, T: Transcoder + ?Sized> {
    video: &'a Path,
    directory: &'a Path,
    transcoder: &'a T,
}

impl<'a, T: Transcoder + ?Sized> MediaExtractor<'a, T> {
    /// Extract from `video` into `directory` using `transcoder`.
    ///
    /// `directory` must already exist.
    pub fn new(video: &'a Path, directory: &'a Path, transcoder: &'a T) -> Self {
        Self {
            video,
            directory,
            transcoder,
        }
    }

    /// Produce (or reuse) both artifacts for the cue with `marker`.
    ///
    /// Audio comes first. If it cannot be produced, the image is not
    /// attempted.
    pub fn extract(&self, marker: usize, window: &ExtractionWindow, crop: CropSpec) -> CueOutcome {
        let audio = MediaArtifact::new(self.directory, marker, ArtifactKind::Audio);
        let image = MediaArtifact::new(self.directory, marker, ArtifactKind::Image);

        let audio_result = self.produce(&audio, |output| {
            self.transcoder.extract_audio(&AudioRequest {
                video: self.video,
                output,
                start: window.audio_start,
                end: window.audio_end,
            })
        });
        if let Err(reason) = audio_result {
            let produced = image.exists().then_some(image).into_iter().collect();
            return CueOutcome::Skipped { reason, produced };
        }

        let image_result = self.produce(&image, |output| {
            self.transcoder.extract_image(&ImageRequest {
                video: self.video,
                output,
                instant: window.image_instant,
                crop,
            })
        });
        if let Err(reason) = image_result {
            return CueOutcome::Skipped {
                reason,
                produced: vec![audio],
            };
        }

        CueOutcome::Extracted { audio, image }
    }

    fn produce<F>(&self, artifact: &MediaArtifact, invoke: F) -> Result<(), SkipReason>
    where
        F: FnOnce(&Path) -> Result<(), SubdeckError>,
    {
        let kind = artifact.kind;
        if artifact.exists() {
            log::debug!("Reusing cached {}", artifact.path.display());
            return Ok(());
        }

        let staging = tempfile::Builder::new()
            .prefix(&format!(".{}.", artifact.marker))
            .suffix(&format!(".{}", kind.extension()))
            .tempfile_in(self.directory)
            .map_err(|e| SkipReason::TranscoderFailed {
                kind,
                message: format!("could not create staging file: {e}"),
            })?
            .into_temp_path();

        invoke(&staging).map_err(|e| SkipReason::TranscoderFailed {
            kind,
            message: e.to_string(),
        })?;

        artifact::verify(&staging, kind)
            .map_err(|message| SkipReason::InvalidOutput { kind, message })?;

        match staging.persist_noclobber(&artifact.path) {
            Ok(()) => {
                log::debug!("Wrote {}", artifact.path.display());
                Ok(())
            }
            Err(error) if error.error.kind() == ErrorKind::AlreadyExists => {
                log::debug!(
                    "{} was placed by another worker; keeping it",
                    artifact.path.display()
                );
                Ok(())
            }
            Err(error) => Err(SkipReason::TranscoderFailed {
                kind,
                message: format!("could not move output into place: {}", error.error),
            }),
        }
    }
}
