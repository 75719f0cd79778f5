//! # subdeck
//!
//! Turn a video and its subtitles into an Anki sentence-card deck.
//!
//! Every dialogue line becomes a card carrying the line's text, an audio clip
//! cut from the video around the line, and a still frame taken from its
//! middle. Media is produced by an external transcoder (FFmpeg by default)
//! into a per-video working directory that doubles as a cache, so an
//! interrupted run picks up where it stopped.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//!
//! use subdeck::{
//!     ApkgPackager, DeckBuilder, DeckId, DeckOptions, DeckPackager, FfmpegTranscoder,
//!     NoteModel, PackageRequest, load_cues, working_directory_for,
//! };
//!
//! let video = Path::new("episode01.mkv");
//! let cues = load_cues("episode01.ass")?;
//!
//! let options = DeckOptions::new().with_styles(["Default"]).with_offset_ms(-300);
//! let deck = DeckBuilder::new(options).build(
//!     &cues,
//!     video,
//!     &working_directory_for(video),
//!     &FfmpegTranscoder::new(),
//! )?;
//!
//! let model = NoteModel::default();
//! let request = PackageRequest::new(DeckId::random(), "episode01", &model, &deck);
//! ApkgPackager::new().package(&request, Path::new("episode01.apkg"))?;
//! # Ok::<(), subdeck::SubdeckError>(())
//! ```
//!
//! ## Pipeline
//!
//! 1. [`load_cues`] reads ASS/SSA or SRT dialogue.
//! 2. [`normalize`] drops cues outside the style allow-list, strips markup
//!    and merges runs of cues with identical timing.
//! 3. [`ExtractionWindow::compute`] pads the audio window and picks the
//!    frame instant.
//! 4. [`MediaExtractor`] asks a [`Transcoder`] for both artifacts, staging
//!    and verifying them before they land in the cache.
//! 5. [`CardAssembler`] turns extracted cues into [`Card`]s and records the
//!    media manifest.
//! 6. A [`DeckPackager`] writes the package.
//!
//! A cue whose media cannot be produced is reported as
//! [`CueOutcome::Skipped`] and the run carries on.
//!
//! ### Optional Features
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `rayon` | `DeckBuilder::build_parallel` extracts several cues at once |
//! | `probe` | Audio clips are demuxed with FFmpeg before being accepted |
//! | `full` | Enables all of the above |
//!
//! ## Requirements
//!
//! An `ffmpeg` binary must be available at run time. The `probe` feature
//! additionally needs the FFmpeg development libraries at build time.

pub mod artifact;
pub mod card;
pub mod configuration;
pub mod crop;
pub mod cue;
pub mod error;
pub mod extractor;
pub mod ffmpeg;
pub mod model;
pub mod package;
#[cfg(feature = "rayon")]
mod parallel;
pub mod pipeline;
#[cfg(feature = "probe")]
pub mod probe;
pub mod progress;
pub mod subtitle;
pub mod transcoder;
pub mod validation;
pub mod window;

pub use artifact::{ArtifactKind, MediaArtifact};
pub use card::{Card, CardAssembler, CueReport, Deck, audio_ref, image_ref};
pub use configuration::DeckOptions;
pub use crop::CropSpec;
pub use cue::{Cue, LogicalCue, StyleFilter, clean_text, normalize};
pub use error::SubdeckError;
pub use extractor::{CueOutcome, MediaExtractor, SkipReason};
pub use ffmpeg::{
    DEFAULT_TIMEOUT, FfmpegLogLevel, FfmpegTranscoder, audio_arguments, image_arguments,
};
pub use model::{CardTemplate, DEFAULT_FIELDS, DEFAULT_MODEL_ID, DEFAULT_MODEL_NAME, NoteModel};
pub use package::{
    ApkgPackager, DeckId, DeckPackager, PackageRequest, field_checksum, note_guid,
};
pub use pipeline::{DeckBuilder, PlannedCue, working_directory_for};
#[cfg(feature = "probe")]
pub use probe::verify_audio_stream;
pub use progress::{CancellationToken, ProgressCallback, ProgressInfo};
pub use subtitle::{SubtitleFormat, load_cues, parse_ass, parse_srt};
pub use transcoder::{AudioRequest, ImageRequest, Transcoder};
pub use validation::{ValidationReport, validate_plan};
pub use window::{AUDIO_LEAD, AUDIO_TRAIL, ExtractionWindow, IMAGE_OFFSET, Timestamp};
