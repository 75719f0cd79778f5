//! The transcoder capability.
//!
//! Media is produced by an external tool. The rest of the crate only talks
//! to it through [`Transcoder`], so windowing, caching and card assembly can
//! be exercised with a fake that records requests instead of spawning
//! processes. [`FfmpegTranscoder`](crate::FfmpegTranscoder) is the real
//! implementation.

use std::path::Path;

use crate::crop::CropSpec;
use crate::error::SubdeckError;
use crate::window::Timestamp;

/// Sample rate of every audio clip, in Hz.
pub const AUDIO_SAMPLE_RATE: u32 = 44_100;

/// Channel count of every audio clip.
pub const AUDIO_CHANNELS: u32 = 2;

/// Bitrate of every audio clip.
pub const AUDIO_BITRATE: &str = "96k";

/// Audio codec of every clip.
pub const AUDIO_CODEC: &str = "mp3";

/// Cut the audio between two positions of `video` into `output`.
///
/// The video stream is discarded and the audio re-encoded with the fixed
/// profile above.
#[derive(Debug, Clone, Copy)]
pub struct AudioRequest<'a> {
    /// Source video.
    pub video: &'a Path,
    /// File to write.
    pub output: &'a Path,
    /// Start of the clip.
    pub start: Timestamp,
    /// End of the clip.
    pub end: Timestamp,
}

/// Grab exactly one frame of `video` at `instant` into `output`.
#[derive(Debug, Clone, Copy)]
pub struct ImageRequest<'a> {
    /// Source video.
    pub video: &'a Path,
    /// File to write.
    pub output: &'a Path,
    /// Position of the frame.
    pub instant: Timestamp,
    /// Margins to remove. An empty spec applies no filter.
    pub crop: CropSpec,
}

/// Something that can cut audio clips and still frames out of a video.
///
/// Implementations write the requested output file on success. An `Ok`
/// return does not by itself prove that a usable file exists: the extractor
/// still checks the output before accepting it.
///
/// Implementations must be [`Send`] and [`Sync`] because extraction may run
/// on worker threads.
pub trait Transcoder: Send + Sync {
    /// Produce an audio clip.
    fn extract_audio(&self, request: &AudioRequest<'_>) -> Result<(), SubdeckError>;

    /// Produce a still frame.
    fn extract_image(&self, request: &ImageRequest<'_>) -> Result<(), SubdeckError>;
}

impl<T: Transcoder + ?Sized> Transcoder for &T {
    fn extract_audio(&self, request: &AudioRequest<'_>) -> Result<(), SubdeckError> {
        (**self).extract_audio(request)
    }

    fn extract_image(&self, request: &ImageRequest<'_>) -> Result<(), SubdeckError> {
        (**self).extract_image(request)
    }
}
