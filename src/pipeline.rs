//! End-to-end deck building.
//!
//! [`DeckBuilder`] wires the stages together: normalize the cues, compute a
//! window per logical cue, extract media, and assemble cards. Markers are
//! assigned from the normalized order *before* extraction, so a cue keeps
//! its marker (and its cached file names) no matter which other cues fail.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use subdeck::{DeckBuilder, DeckOptions, FfmpegTranscoder, load_cues, working_directory_for};
//!
//! let video = Path::new("episode01.mkv");
//! let cues = load_cues("episode01.ass")?;
//! let deck = DeckBuilder::new(DeckOptions::new().with_offset_ms(-500)).build(
//!     &cues,
//!     video,
//!     &working_directory_for(video),
//!     &FfmpegTranscoder::new(),
//! )?;
//! println!("{} cards", deck.cards.len());
//! # Ok::<(), subdeck::SubdeckError>(())
//! ```

use std::path::{Path, PathBuf};

use crate::card::{CardAssembler, Deck};
use crate::configuration::DeckOptions;
use crate::cue::{Cue, LogicalCue, normalize};
use crate::error::SubdeckError;
use crate::extractor::{CueOutcome, MediaExtractor, SkipReason};
use crate::progress::ProgressTracker;
use crate::transcoder::Transcoder;
use crate::window::ExtractionWindow;

/// The working directory for `video`: a sibling directory named after the
/// file stem (`show/ep01.mkv` → `show/ep01`).
///
/// A video without an extension gets `<name>.media` instead, so the
/// directory never collides with the video itself.
pub fn working_directory_for(video: &Path) -> PathBuf {
    let directory = video.with_extension("");
    if directory == video {
        video.with_extension("media")
    } else {
        directory
    }
}

/// A logical cue with its marker and computed window.
#[derive(Debug, Clone)]
pub struct PlannedCue {
    /// 1-based position in the normalized sequence.
    pub marker: usize,
    /// The merged, cleaned cue.
    pub cue: LogicalCue,
    /// Where to cut, or why nothing can be cut.
    pub window: Result<ExtractionWindow, SkipReason>,
}

/// Drives a full build with fixed [`DeckOptions`].
#[derive(Debug, Clone, Default)]
pub struct DeckBuilder {
    options: DeckOptions,
}

impl DeckBuilder {
    /// Create a builder.
    pub fn new(options: DeckOptions) -> Self {
        Self { options }
    }

    /// The options this builder runs with.
    pub fn options(&self) -> &DeckOptions {
        &self.options
    }

    /// Normalize `cues` and compute every window, without touching disk.
    pub fn plan(&self, cues: &[Cue]) -> Vec<PlannedCue> {
        normalize(cues, &self.options.styles)
            .into_iter()
            .enumerate()
            .map(|(index, cue)| {
                let window = ExtractionWindow::compute(&cue, self.options.offset_ms);
                PlannedCue {
                    marker: index + 1,
                    cue,
                    window,
                }
            })
            .collect()
    }

    /// Build a deck sequentially, one cue at a time, audio before image.
    ///
    /// Per-cue failures are recorded in [`Deck::report`] and never abort
    /// the build.
    ///
    /// # Errors
    ///
    /// - [`SubdeckError::MissingInput`] if `video` does not exist.
    /// - [`SubdeckError::IoError`] if `directory` cannot be created.
    /// - [`SubdeckError::Cancelled`] if the cancellation token fires.
    pub fn build<T: Transcoder + ?Sized>(
        &self,
        cues: &[Cue],
        video: &Path,
        directory: &Path,
        transcoder: &T,
    ) -> Result<Deck, SubdeckError> {
        let plan = self.prepare(cues, video, directory)?;
        let extractor = MediaExtractor::new(video, directory, transcoder);
        let mut tracker = ProgressTracker::new(
            self.options.progress.clone(),
            Some(plan.len() as u64),
            self.options.batch_size,
        );
        let mut assembler = CardAssembler::new();

        for planned in plan {
            if self.options.is_cancelled() {
                return Err(SubdeckError::Cancelled);
            }
            let outcome = self.extract_one(&extractor, &planned);
            log_outcome(&planned, &outcome);
            tracker.advance(planned.marker, outcome.is_extracted());
            assembler.accept(planned.marker, &planned.cue, outcome);
        }

        tracker.finish();
        let deck = assembler.finish();
        log::info!(
            "Built {} card(s), skipped {} cue(s)",
            deck.cards.len(),
            deck.report.len() - deck.cards.len()
        );
        Ok(deck)
    }

    /// Build a deck with up to [`DeckOptions::workers`] cues extracted at
    /// once.
    ///
    /// Cards, markers and the manifest come out exactly as from
    /// [`build`](DeckBuilder::build); only the extraction runs concurrently.
    ///
    /// # Errors
    ///
    /// Same as [`build`](DeckBuilder::build).
    #[cfg(feature = "rayon")]
    pub fn build_parallel<T: Transcoder + ?Sized>(
        &self,
        cues: &[Cue],
        video: &Path,
        directory: &Path,
        transcoder: &T,
    ) -> Result<Deck, SubdeckError> {
        let plan = self.prepare(cues, video, directory)?;
        let extractor = MediaExtractor::new(video, directory, transcoder);
        let outcomes = crate::parallel::extract_all(self, &extractor, &plan)?;

        let mut assembler = CardAssembler::new();
        for (planned, outcome) in plan.iter().zip(outcomes) {
            log_outcome(planned, &outcome);
            assembler.accept(planned.marker, &planned.cue, outcome);
        }
        let deck = assembler.finish();
        log::info!(
            "Built {} card(s), skipped {} cue(s) using {} worker(s)",
            deck.cards.len(),
            deck.report.len() - deck.cards.len(),
            self.options.workers
        );
        Ok(deck)
    }

    fn prepare(
        &self,
        cues: &[Cue],
        video: &Path,
        directory: &Path,
    ) -> Result<Vec<PlannedCue>, SubdeckError> {
        if !video.is_file() {
            return Err(SubdeckError::MissingInput {
                path: video.to_path_buf(),
            });
        }
        std::fs::create_dir_all(directory)?;
        log::debug!("Caching media in {}", directory.display());
        Ok(self.plan(cues))
    }

    pub(crate) fn extract_one<T: Transcoder + ?Sized>(
        &self,
        extractor: &MediaExtractor<'_, T>,
        planned: &PlannedCue,
    ) -> CueOutcome {
        match &planned.window {
            Ok(window) => extractor.extract(planned.marker, window, self.options.crop),
            Err(reason) => CueOutcome::Skipped {
                reason: reason.clone(),
                produced: Vec::new(),
            },
        }
    }
}

fn log_outcome(planned: &PlannedCue, outcome: &CueOutcome) {
    match outcome {
        CueOutcome::Extracted { .. } => {
            log::debug!("#{} {:?}", planned.marker, planned.cue.text);
        }
        CueOutcome::Skipped { reason, .. } => {
            log::warn!(
                "Skipping #{} ({}ms..{}ms) {:?}: {reason}",
                planned.marker,
                planned.cue.start,
                planned.cue.end,
                planned.cue.text
            );
        }
    }
}
