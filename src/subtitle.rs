//! Subtitle file readers.
//!
//! This module turns ASS/SSA and SubRip files into [`Cue`] sequences. It is
//! deliberately small: cues keep their raw text (markup included) and their
//! original order, and everything else happens in [`normalize`](crate::normalize).
//!
//! # Example
//!
//! ```no_run
//! use subdeck::{SubdeckError, load_cues};
//!
//! let cues = load_cues("episode01.ass")?;
//! for cue in &cues {
//!     println!("[{} → {}] {:?} {}", cue.start, cue.end, cue.style, cue.text);
//! }
//! # Ok::<(), SubdeckError>(())
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::Path;

use crate::cue::Cue;
use crate::error::SubdeckError;
use crate::window::Timestamp;

/// Column layout assumed when an `[Events]` section has no `Format:` line.
const DEFAULT_ASS_FORMAT: [&str; 10] = [
    "layer", "start", "end", "style", "name", "marginl", "marginr", "marginv", "effect", "text",
];

/// Supported subtitle file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitleFormat {
    /// Advanced SubStation Alpha / SubStation Alpha (.ass, .ssa).
    Ass,
    /// SubRip Text (.srt).
    Srt,
}

impl SubtitleFormat {
    /// Pick a format from the file extension.
    ///
    /// # Errors
    ///
    /// Returns [`SubdeckError::UnsupportedSubtitleFormat`] for any other
    /// extension.
    pub fn from_path(path: &Path) -> Result<Self, SubdeckError> {
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "ass" | "ssa" => Ok(SubtitleFormat::Ass),
            "srt" => Ok(SubtitleFormat::Srt),
            _ => Err(SubdeckError::UnsupportedSubtitleFormat(
                path.display().to_string(),
            )),
        }
    }
}

impl Display for SubtitleFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            SubtitleFormat::Ass => write!(f, "ASS"),
            SubtitleFormat::Srt => write!(f, "SRT"),
        }
    }
}

/// Read every cue from a subtitle file, in file order.
///
/// # Errors
///
/// - [`SubdeckError::MissingInput`] if the file does not exist.
/// - [`SubdeckError::UnsupportedSubtitleFormat`] for unknown extensions.
/// - [`SubdeckError::SubtitleParse`] for malformed entries.
pub fn load_cues<P: AsRef<Path>>(path: P) -> Result<Vec<Cue>, SubdeckError> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(SubdeckError::MissingInput {
            path: path.to_path_buf(),
        });
    }

    let format = SubtitleFormat::from_path(path)?;
    let bytes = std::fs::read(path)?;
    let content = String::from_utf8_lossy(&bytes);
    let cues = match format {
        SubtitleFormat::Ass => parse_ass(&content, path)?,
        SubtitleFormat::Srt => parse_srt(&content, path)?,
    };

    log::debug!("Read {} {format} cue(s) from {}", cues.len(), path.display());
    Ok(cues)
}

/// Parse the `[Events]` section of an ASS/SSA script.
///
/// `Dialogue:` lines are read using the section's `Format:` line; the text
/// column takes everything after the preceding commas, commas included.
/// `Comment:` lines and every other section are ignored. `path` is only used
/// for error messages.
///
/// # Errors
///
/// Returns [`SubdeckError::SubtitleParse`] for a dialogue line with too few
/// columns or an unreadable timestamp.
pub fn parse_ass(content: &str, path: &Path) -> Result<Vec<Cue>, SubdeckError> {
    let mut cues = Vec::new();
    let mut in_events = false;
    let mut format: Option<Vec<String>> = None;

    for (index, raw_line) in content.lines().enumerate() {
        let line_number = index + 1;
        let line = raw_line.trim_start_matches('\u{feff}').trim_start();
        let error = |reason: String| SubdeckError::SubtitleParse {
            path: path.to_path_buf(),
            line: line_number,
            reason,
        };

        if line.starts_with('[') {
            in_events = line.trim_end().eq_ignore_ascii_case("[events]");
            continue;
        }
        if !in_events {
            continue;
        }

        if let Some(columns) = line.strip_prefix("Format:") {
            format = Some(
                columns
                    .split(',')
                    .map(|column| column.trim().to_ascii_lowercase())
                    .collect(),
            );
            continue;
        }

        let Some(values) = line.strip_prefix("Dialogue:") else {
            continue;
        };

        let columns: Vec<&str> = match &format {
            Some(columns) => columns.iter().map(String::as_str).collect(),
            None => DEFAULT_ASS_FORMAT.to_vec(),
        };
        let column = |name: &str| {
            columns
                .iter()
                .position(|column| *column == name)
                .ok_or_else(|| error(format!("Format line has no {name:?} column")))
        };
        let (start_index, end_index, text_index) = (column("start")?, column("end")?, column("text")?);
        let style_index = columns.iter().position(|column| *column == "style");

        let values: Vec<&str> = values.trim_start().splitn(columns.len(), ',').collect();
        if values.len() < columns.len() {
            return Err(error(format!(
                "expected {} fields, found {}",
                columns.len(),
                values.len()
            )));
        }

        let start = parse_time(values[start_index]).map_err(error)?;
        let end = parse_time(values[end_index]).map_err(error)?;
        let text = values[text_index].trim_end_matches(['\r', '\n']);

        let mut cue = Cue::new(start, end, text);
        if let Some(style) = style_index
            .map(|index| values[index].trim())
            .filter(|style| !style.is_empty())
        {
            cue = cue.with_style(style);
        }
        cues.push(cue);
    }

    Ok(cues)
}

/// Parse a SubRip file.
///
/// Blocks are separated by blank lines; the index line is optional and the
/// timing line may carry trailing position hints. Multi-line text is joined
/// with `\N`, the same break marker ASS uses. `path` is only used for error
/// messages.
///
/// # Errors
///
/// Returns [`SubdeckError::SubtitleParse`] for an unreadable timing line.
pub fn parse_srt(content: &str, path: &Path) -> Result<Vec<Cue>, SubdeckError> {
    let mut cues = Vec::new();
    let mut lines = content.lines().enumerate().peekable();

    while let Some((index, raw_line)) = lines.next() {
        let line = raw_line.trim_start_matches('\u{feff}').trim();
        let Some((start, rest)) = line.split_once("-->") else {
            continue;
        };
        let error = |reason: String| SubdeckError::SubtitleParse {
            path: path.to_path_buf(),
            line: index + 1,
            reason,
        };

        let end = rest.split_whitespace().next().unwrap_or_default();
        let start = parse_time(&start.replace(',', ".")).map_err(error)?;
        let end = parse_time(&end.replace(',', ".")).map_err(error)?;

        let mut text_lines: Vec<&str> = Vec::new();
        while let Some((_, next)) = lines.peek() {
            if next.trim().is_empty() {
                break;
            }
            text_lines.push(next.trim_end());
            lines.next();
        }

        cues.push(Cue::new(start, end, text_lines.join("\\N")));
    }

    Ok(cues)
}

fn parse_time(value: &str) -> Result<i64, String> {
    Timestamp::parse(value)
        .ok()
        .and_then(|timestamp| i64::try_from(timestamp.as_millis()).ok())
        .ok_or_else(|| format!("invalid timestamp {:?}", value.trim()))
}
