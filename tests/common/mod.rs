//! Shared helpers for integration tests.
//!
//! [`RecordingTranscoder`] stands in for FFmpeg: it records every request
//! and writes small but valid artifacts (an ID3-tagged stub for audio, a
//! real JPEG for images), so the extractor's output checks pass without any
//! external binary.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use subdeck::{AudioRequest, CropSpec, ImageRequest, SubdeckError, Transcoder};

/// One request seen by the fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Audio { start: u64, end: u64 },
    Image { instant: u64, crop: CropSpec },
}

/// How the fake should misbehave.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Failure {
    #[default]
    None,
    /// Audio requests return an error.
    Audio,
    /// Image requests return an error.
    Image,
    /// Audio requests succeed but write bytes that are not MPEG audio.
    GarbageAudio,
    /// Image requests succeed but write nothing.
    EmptyImage,
    /// Another writer places the final audio file while this one stages.
    RacedAudio,
}

/// Bytes the competing writer leaves at the final audio path.
pub const RACED_AUDIO: &[u8] = b"ID3\x04\x00\x00\x00\x00\x00\x00other worker";

#[derive(Debug, Default)]
pub struct RecordingTranscoder {
    calls: Mutex<Vec<Call>>,
    failure: Failure,
    fail_markers: Vec<usize>,
}

impl RecordingTranscoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(failure: Failure) -> Self {
        Self {
            failure,
            ..Self::default()
        }
    }

    /// Fail every request whose output belongs to one of `markers`.
    pub fn failing_markers(markers: &[usize]) -> Self {
        Self {
            fail_markers: markers.to_vec(),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn fails_marker(&self, output: &Path) -> bool {
        staged_marker(output).is_some_and(|marker| self.fail_markers.contains(&marker))
    }
}

impl Transcoder for RecordingTranscoder {
    fn extract_audio(&self, request: &AudioRequest<'_>) -> Result<(), SubdeckError> {
        self.calls.lock().unwrap().push(Call::Audio {
            start: request.start.as_millis(),
            end: request.end.as_millis(),
        });
        if self.failure == Failure::Audio || self.fails_marker(request.output) {
            return Err(SubdeckError::TranscoderFailed("audio stream not found".into()));
        }
        let bytes: &[u8] = if self.failure == Failure::GarbageAudio {
            b"RIFF....WAVE"
        } else {
            b"ID3\x04\x00\x00\x00\x00\x00\x00stub clip"
        };
        std::fs::write(request.output, bytes)?;
        if self.failure == Failure::RacedAudio {
            if let (Some(directory), Some(marker)) =
                (request.output.parent(), staged_marker(request.output))
            {
                std::fs::write(directory.join(format!("{marker}.mp3")), RACED_AUDIO)?;
            }
        }
        Ok(())
    }

    fn extract_image(&self, request: &ImageRequest<'_>) -> Result<(), SubdeckError> {
        self.calls.lock().unwrap().push(Call::Image {
            instant: request.instant.as_millis(),
            crop: request.crop,
        });
        if self.failure == Failure::Image || self.fails_marker(request.output) {
            return Err(SubdeckError::TranscoderFailed("seek past end of file".into()));
        }
        if self.failure == Failure::EmptyImage {
            std::fs::write(request.output, b"")?;
            return Ok(());
        }
        image::RgbImage::from_pixel(8, 6, image::Rgb([40, 90, 160])).save(request.output)?;
        Ok(())
    }
}

/// Marker encoded in a staging file name of the form `.{marker}.XXXXXX.{ext}`.
fn staged_marker(output: &Path) -> Option<usize> {
    let name = output.file_name()?.to_string_lossy().into_owned();
    name.trim_start_matches('.').split('.').next()?.parse().ok()
}

/// Create an empty stand-in video inside `directory`.
pub fn fake_video(directory: &Path) -> PathBuf {
    let video = directory.join("episode.mkv");
    std::fs::write(&video, b"not really a video").unwrap();
    video
}

/// File names currently present in `directory`, sorted.
pub fn file_names(directory: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(directory)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
