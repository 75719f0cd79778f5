//! Audio clip probing through the FFmpeg libraries.
//!
//! Enabled with the `probe` feature. The default header check in
//! [`artifact`](crate::artifact) only looks at the first bytes of a clip;
//! probing demuxes the file and requires a decodable audio stream with a
//! non-zero duration.

use std::path::Path;

use ffmpeg_next::media::Type;

use crate::error::SubdeckError;

/// Open `path` and confirm it carries an audio stream.
///
/// # Errors
///
/// Returns [`SubdeckError::FfmpegError`] if FFmpeg cannot be initialised,
/// the file cannot be demuxed, or no audio stream is present.
pub fn verify_audio_stream(path: &Path) -> Result<(), SubdeckError> {
    // Safe to call multiple times.
    ffmpeg_next::init()?;

    let input = ffmpeg_next::format::input(&path)?;
    let stream = input.streams().best(Type::Audio).ok_or_else(|| {
        SubdeckError::FfmpegError(format!("no audio stream in {}", path.display()))
    })?;

    let decoder = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?
        .decoder()
        .audio()?;
    if decoder.rate() == 0 {
        return Err(SubdeckError::FfmpegError(format!(
            "audio stream in {} has no sample rate",
            path.display()
        )));
    }

    if input.duration() <= 0 {
        log::debug!("{} reports no container duration", path.display());
    }
    Ok(())
}
