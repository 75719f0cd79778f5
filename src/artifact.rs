//! Generated media files and their sanity checks.
//!
//! A [`MediaArtifact`] names one audio clip or still frame in the working
//! directory. Files are keyed by the cue's marker, so the working directory
//! doubles as a cache: an artifact that already exists is never regenerated.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// The two kinds of media attached to every card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// An MP3 clip covering the padded audio window.
    Audio,
    /// A JPEG still frame at the window midpoint.
    Image,
}

impl ArtifactKind {
    /// File extension used for this kind.
    pub const fn extension(self) -> &'static str {
        match self {
            ArtifactKind::Audio => "mp3",
            ArtifactKind::Image => "jpg",
        }
    }

    /// File name for the artifact of this kind belonging to `marker`.
    pub fn file_name(self, marker: usize) -> String {
        format!("{marker}.{}", self.extension())
    }
}

impl Display for ArtifactKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ArtifactKind::Audio => write!(f, "audio"),
            ArtifactKind::Image => write!(f, "image"),
        }
    }
}

/// A media file produced for one logical cue.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct MediaArtifact {
    /// Marker of the cue this artifact belongs to.
    pub marker: usize,
    /// Audio clip or still frame.
    pub kind: ArtifactKind,
    /// Location on disk.
    pub path: PathBuf,
}

impl MediaArtifact {
    /// Describe the artifact of `kind` for `marker` inside `directory`.
    pub fn new(directory: &Path, marker: usize, kind: ArtifactKind) -> Self {
        Self {
            marker,
            kind,
            path: directory.join(kind.file_name(marker)),
        }
    }

    /// File name without the directory, as referenced from card fields.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.kind.file_name(self.marker))
    }

    /// Whether the artifact is already present on disk.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }
}

/// Check that a freshly written file is a usable artifact of `kind`.
///
/// A file that is missing, empty or not recognisable as the expected format
/// is reported as an error string; callers treat that exactly like a
/// missing output.
pub(crate) fn verify(path: &Path, kind: ArtifactKind) -> Result<(), String> {
    let metadata = std::fs::metadata(path).map_err(|_| "output was not written".to_string())?;
    if metadata.len() == 0 {
        return Err("output is empty".to_string());
    }

    match kind {
        ArtifactKind::Image => image::image_dimensions(path)
            .map(|_| ())
            .map_err(|e| format!("unreadable still frame: {e}")),
        ArtifactKind::Audio => {
            verify_audio_header(path)?;
            #[cfg(feature = "probe")]
            crate::probe::verify_audio_stream(path).map_err(|e| e.to_string())?;
            Ok(())
        }
    }
}

/// Accept an ID3v2 tag or an MPEG audio frame sync at the start of the file.
fn verify_audio_header(path: &Path) -> Result<(), String> {
    let mut header = [0u8; 3];
    File::open(path)
        .and_then(|mut file| file.read_exact(&mut header))
        .map_err(|_| "audio clip is truncated".to_string())?;

    let has_id3 = &header == b"ID3";
    let has_frame_sync = header[0] == 0xFF && header[1] & 0xE0 == 0xE0;
    if has_id3 || has_frame_sync {
        Ok(())
    } else {
        Err("audio clip is not MPEG audio".to_string())
    }
}
