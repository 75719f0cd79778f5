//! Parallel media extraction.
//!
//! This module distributes cue extraction across a dedicated rayon thread
//! pool sized by [`DeckOptions::workers`](crate::DeckOptions::workers).
//! Workers share nothing but the working directory, whose artifacts are
//! placed with a no-clobber rename, so two workers racing on one file both
//! end up with a valid artifact.
//!
//! The public API is exposed through
//! [`DeckBuilder::build_parallel`](crate::DeckBuilder); this module
//! contains only the internal implementation.

use std::sync::Mutex;

use ::rayon::ThreadPoolBuilder;
use ::rayon::iter::{IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator};

use crate::error::SubdeckError;
use crate::extractor::{CueOutcome, MediaExtractor};
use crate::pipeline::{DeckBuilder, PlannedCue};
use crate::progress::ProgressTracker;
use crate::transcoder::Transcoder;

/// Extract every planned cue and return the outcomes in plan order.
pub(crate) fn extract_all<T: Transcoder + ?Sized>(
    builder: &DeckBuilder,
    extractor: &MediaExtractor<'_, T>,
    plan: &[PlannedCue],
) -> Result<Vec<CueOutcome>, SubdeckError> {
    let options = builder.options();
    let pool = ThreadPoolBuilder::new()
        .num_threads(options.workers)
        .thread_name(|index| format!("subdeck-extract-{index}"))
        .build()?;

    let tracker = Mutex::new(ProgressTracker::new(
        options.progress.clone(),
        Some(plan.len() as u64),
        options.batch_size,
    ));

    let outcomes: Result<Vec<CueOutcome>, SubdeckError> = pool.install(|| {
        plan.par_iter()
            .with_max_len(1)
            .map(|planned| {
                if options.is_cancelled() {
                    return Err(SubdeckError::Cancelled);
                }
                let outcome = builder.extract_one(extractor, planned);
                if let Ok(mut tracker) = tracker.lock() {
                    tracker.advance(planned.marker, outcome.is_extracted());
                }
                Ok(outcome)
            })
            .collect()
    });

    if let Ok(mut tracker) = tracker.lock() {
        tracker.finish();
    }
    outcomes
}
