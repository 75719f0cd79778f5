//! Build configuration.
//!
//! [`DeckOptions`] is a builder that threads the time offset, crop margins,
//! style allow-list, progress callbacks and cancellation through a build
//! without polluting every function signature. It is constructed once and
//! never mutated while a build runs.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use subdeck::{CancellationToken, CropSpec, DeckOptions, ProgressCallback, ProgressInfo};
//!
//! struct LogProgress;
//! impl ProgressCallback for LogProgress {
//!     fn on_progress(&self, info: &ProgressInfo) {
//!         println!("{} cues done", info.current);
//!     }
//! }
//!
//! let token = CancellationToken::new();
//! let options = DeckOptions::new()
//!     .with_offset_ms(-1200)
//!     .with_crop(CropSpec::new(0, 0, 120, 0))
//!     .with_styles(["Default", "Main"])
//!     .with_progress(Arc::new(LogProgress))
//!     .with_cancellation(token.clone())
//!     .with_batch_size(10);
//! ```

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;

use crate::crop::CropSpec;
use crate::cue::StyleFilter;
use crate::progress::{CancellationToken, NoOpProgress, ProgressCallback};

/// Configuration for a deck build.
///
/// All fields have sensible defaults: no offset, no crop, every style, no
/// progress callback, no cancellation.
#[derive(Clone)]
#[must_use]
pub struct DeckOptions {
    pub(crate) offset_ms: i64,
    pub(crate) crop: CropSpec,
    pub(crate) styles: StyleFilter,
    pub(crate) progress: Arc<dyn ProgressCallback>,
    pub(crate) cancellation: Option<CancellationToken>,
    pub(crate) batch_size: u64,
    pub(crate) workers: usize,
}

impl Debug for DeckOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("DeckOptions")
            .field("offset_ms", &self.offset_ms)
            .field("crop", &self.crop)
            .field("styles", &self.styles)
            .field("has_cancellation", &self.cancellation.is_some())
            .field("batch_size", &self.batch_size)
            .field("workers", &self.workers)
            .finish()
    }
}

impl Default for DeckOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl DeckOptions {
    /// Create options with default settings.
    pub fn new() -> Self {
        Self {
            offset_ms: 0,
            crop: CropSpec::default(),
            styles: StyleFilter::all(),
            progress: Arc::new(NoOpProgress),
            cancellation: None,
            batch_size: 1,
            workers: 1,
        }
    }

    /// Shift every cue by `offset_ms` milliseconds before windowing.
    ///
    /// Use a negative value when the subtitles run late.
    pub fn with_offset_ms(mut self, offset_ms: i64) -> Self {
        self.offset_ms = offset_ms;
        self
    }

    /// Crop still frames by the given margins.
    pub fn with_crop(mut self, crop: CropSpec) -> Self {
        self.crop = crop;
        self
    }

    /// Keep only cues whose style is one of `styles`.
    ///
    /// An empty list keeps every cue.
    pub fn with_styles<I, S>(mut self, styles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.styles = StyleFilter::only(styles);
        self
    }

    /// Attach a progress callback.
    ///
    /// The callback is invoked every [`batch_size`](DeckOptions::with_batch_size)
    /// cues.
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = callback;
        self
    }

    /// Attach a cancellation token.
    ///
    /// When the token is cancelled, the build stops before the next cue and
    /// returns [`SubdeckError::Cancelled`](crate::SubdeckError::Cancelled).
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Set how often the progress callback fires.
    ///
    /// A value of 1 means every cue; 10 means every 10th cue.
    /// Clamped to a minimum of 1.
    pub fn with_batch_size(mut self, size: u64) -> Self {
        self.batch_size = size.max(1);
        self
    }

    /// Number of cues extracted concurrently by
    /// [`DeckBuilder::build_parallel`](crate::DeckBuilder). Clamped to a
    /// minimum of 1. Sequential builds ignore it.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Global time offset in milliseconds.
    pub fn offset_ms(&self) -> i64 {
        self.offset_ms
    }

    /// Crop margins for still frames.
    pub fn crop(&self) -> CropSpec {
        self.crop
    }

    /// Style allow-list.
    pub fn styles(&self) -> &StyleFilter {
        &self.styles
    }

    /// Configured worker count.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Returns `true` if cancellation has been requested.
    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(|token| token.is_cancelled())
    }
}
