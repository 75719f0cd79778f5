//! Audio windows and image instants for logical cues.
//!
//! [`ExtractionWindow::compute`] is a pure function of a [`LogicalCue`] and
//! the global offset. The audio window is widened by [`AUDIO_LEAD`] and
//! [`AUDIO_TRAIL`] so clipped onsets and trailing syllables survive, and the
//! still frame is sampled at the midpoint of the (shifted) cue.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::Serialize;

use crate::cue::LogicalCue;
use crate::error::SubdeckError;
use crate::extractor::SkipReason;

/// Padding applied to the start of every audio window, in milliseconds.
pub const AUDIO_LEAD: i64 = -250;

/// Padding applied to the end of every audio window, in milliseconds.
pub const AUDIO_TRAIL: i64 = 250;

/// Shift applied to the image sampling instant, in milliseconds.
pub const IMAGE_OFFSET: i64 = 0;

/// A non-negative media position with millisecond precision.
///
/// Displays as `H:MM:SS.mmm`, which FFmpeg accepts for `-ss` and `-to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Create a timestamp from milliseconds.
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Milliseconds since the start of the media.
    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// Parse `SS(.fff)`, `MM:SS(.fff)` or `H:MM:SS(.fff)`.
    ///
    /// Fractions beyond three digits are truncated.
    ///
    /// # Errors
    ///
    /// Returns [`SubdeckError::InvalidTimestamp`] for anything else.
    pub fn parse(value: &str) -> Result<Self, SubdeckError> {
        let invalid = || SubdeckError::InvalidTimestamp(value.to_string());
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(invalid());
        }

        let parts: Vec<&str> = trimmed.split(':').collect();
        if parts.len() > 3 {
            return Err(invalid());
        }

        let (whole_parts, seconds_part) = parts.split_at(parts.len() - 1);
        let mut minutes: u64 = 0;
        for part in whole_parts {
            let unit: u64 = part.parse().map_err(|_| invalid())?;
            minutes = minutes
                .checked_mul(60)
                .and_then(|total| total.checked_add(unit))
                .ok_or_else(invalid)?;
        }

        let (seconds, fraction) = seconds_part[0]
            .split_once('.')
            .unwrap_or((seconds_part[0], ""));
        let seconds: u64 = seconds.parse().map_err(|_| invalid())?;
        if !whole_parts.is_empty() && seconds >= 60 {
            return Err(invalid());
        }
        if !fraction.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let millis: u64 = fraction
            .chars()
            .chain(std::iter::repeat('0'))
            .take(3)
            .collect::<String>()
            .parse()
            .map_err(|_| invalid())?;

        minutes
            .checked_mul(60)
            .and_then(|total| total.checked_add(seconds))
            .and_then(|total| total.checked_mul(1000))
            .and_then(|total| total.checked_add(millis))
            .map(Self)
            .ok_or_else(invalid)
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let total_seconds = self.0 / 1000;
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;
        let millis = self.0 % 1000;
        write!(f, "{hours}:{minutes:02}:{seconds:02}.{millis:03}")
    }
}

/// Where to cut audio and sample a frame for one logical cue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExtractionWindow {
    /// Start of the audio clip.
    pub audio_start: Timestamp,
    /// End of the audio clip. Always after `audio_start`.
    pub audio_end: Timestamp,
    /// Position of the still frame.
    pub image_instant: Timestamp,
}

impl ExtractionWindow {
    /// Compute the window for `cue` shifted by `offset_ms`.
    ///
    /// Positions that would fall before the start of the media are clamped
    /// to zero. When clamping leaves no audio to cut, the window is
    /// degenerate and the cue must be skipped.
    ///
    /// # Errors
    ///
    /// Returns [`SkipReason::DegenerateWindow`] when `audio_end <= audio_start`
    /// after clamping.
    ///
    /// # Example
    ///
    /// ```
    /// use subdeck::{Cue, ExtractionWindow, StyleFilter, normalize};
    ///
    /// let cue = &normalize(&[Cue::new(1000, 2000, "hi")], &StyleFilter::all())[0];
    /// let window = ExtractionWindow::compute(cue, 0).unwrap();
    /// assert_eq!(window.audio_start.as_millis(), 750);
    /// assert_eq!(window.audio_end.as_millis(), 2250);
    /// assert_eq!(window.image_instant.as_millis(), 1500);
    /// ```
    pub fn compute(cue: &LogicalCue, offset_ms: i64) -> Result<Self, SkipReason> {
        let shifted_start = cue.start + offset_ms;
        let shifted_end = cue.end + offset_ms;

        let audio_start = (shifted_start + AUDIO_LEAD).max(0);
        let audio_end = (shifted_end + AUDIO_TRAIL).max(0);
        if audio_end <= audio_start {
            return Err(SkipReason::DegenerateWindow {
                start: shifted_start,
                end: shifted_end,
            });
        }

        let midpoint = (shifted_start + shifted_end).div_euclid(2);
        let image_instant = (midpoint + IMAGE_OFFSET).max(0);

        Ok(Self {
            audio_start: Timestamp(audio_start as u64),
            audio_end: Timestamp(audio_end as u64),
            image_instant: Timestamp(image_instant as u64),
        })
    }

    /// Length of the audio clip in milliseconds.
    pub fn audio_duration_ms(&self) -> u64 {
        self.audio_end.0 - self.audio_start.0
    }
}
