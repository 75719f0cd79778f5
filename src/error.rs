//! Error types for the `subdeck` crate.
//!
//! This module defines [`SubdeckError`], the unified error type returned by
//! all fallible operations in the crate. Per-cue extraction problems are not
//! errors: they surface as [`CueOutcome::Skipped`](crate::CueOutcome) so a
//! single bad timestamp never aborts a deck.

use std::{io::Error as IoError, path::PathBuf, time::Duration};

use image::ImageError;
use tempfile::PathPersistError;
use thiserror::Error;
use zip::result::ZipError;

/// The unified error type for all `subdeck` operations.
///
/// Every public method that can fail returns `Result<T, SubdeckError>`.
/// Variants carry enough context to diagnose the problem without needing
/// additional logging at the call site.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SubdeckError {
    /// A required input file does not exist.
    #[error("Input file not found: {}", path.display())]
    MissingInput {
        /// Path that was expected to exist.
        path: PathBuf,
    },

    /// The subtitle file could not be parsed.
    #[error("Failed to parse subtitles at {}:{line}: {reason}", path.display())]
    SubtitleParse {
        /// Subtitle file being read.
        path: PathBuf,
        /// One-based line number of the offending line.
        line: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// The subtitle file extension is not one of the supported formats.
    #[error("Unsupported subtitle format: {0}")]
    UnsupportedSubtitleFormat(String),

    /// A timestamp string could not be parsed.
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// The external transcoder could not be started or exited unsuccessfully.
    #[error("Transcoder failed: {0}")]
    TranscoderFailed(String),

    /// The external transcoder did not finish within the configured bound.
    #[error("Transcoder timed out after {0:?}")]
    TranscoderTimeout(Duration),

    /// Writing the deck package failed.
    #[error("Failed to write package: {0}")]
    Package(String),

    /// An error from the embedded SQLite collection.
    #[error("Collection database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// An error while writing the package archive.
    #[error("Package archive error: {0}")]
    Zip(#[from] ZipError),

    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while checking a still frame.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// The operation was cancelled via a [`CancellationToken`](crate::CancellationToken).
    #[error("Operation cancelled")]
    Cancelled,

    /// An error originating from the FFmpeg libraries.
    #[cfg(feature = "probe")]
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),
}

impl From<PathPersistError> for SubdeckError {
    fn from(error: PathPersistError) -> Self {
        SubdeckError::IoError(error.error)
    }
}

#[cfg(feature = "rayon")]
impl From<rayon::ThreadPoolBuildError> for SubdeckError {
    fn from(error: rayon::ThreadPoolBuildError) -> Self {
        SubdeckError::IoError(IoError::other(format!("could not start workers: {error}")))
    }
}

#[cfg(feature = "probe")]
impl From<ffmpeg_next::Error> for SubdeckError {
    fn from(error: ffmpeg_next::Error) -> Self {
        SubdeckError::FfmpegError(error.to_string())
    }
}
