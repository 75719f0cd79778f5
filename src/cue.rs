//! Subtitle cues and their normalization into logical cues.
//!
//! A [`Cue`] is one timed entry as produced by a subtitle reader. Before any
//! media is extracted, the raw sequence is filtered by style, cleaned of
//! inline markup and collapsed so that cues sharing exactly the same timing
//! become a single [`LogicalCue`].
//!
//! # Example
//!
//! ```
//! use subdeck::{Cue, StyleFilter, normalize};
//!
//! let cues = vec![
//!     Cue::new(0, 1000, "A"),
//!     Cue::new(0, 1000, "B"),
//!     Cue::new(2000, 3000, "C"),
//! ];
//! let logical = normalize(&cues, &StyleFilter::all());
//! assert_eq!(logical.len(), 2);
//! assert_eq!(logical[0].text, "A B");
//! ```

use std::collections::BTreeSet;

use serde::Serialize;

/// A single timed subtitle entry.
///
/// Times are integer milliseconds from the start of the video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cue {
    /// When the cue starts displaying.
    pub start: i64,
    /// When the cue stops displaying. Never less than `start`.
    pub end: i64,
    /// Raw text payload, markup included.
    pub text: String,
    /// Style (or class) label, when the subtitle format has one.
    pub style: Option<String>,
}

impl Cue {
    /// Create an unstyled cue.
    ///
    /// A reversed pair of timestamps is swapped so that `end >= start`
    /// always holds.
    pub fn new(start: i64, end: i64, text: impl Into<String>) -> Self {
        let (start, end) = if end < start { (end, start) } else { (start, end) };
        Self {
            start,
            end,
            text: text.into(),
            style: None,
        }
    }

    /// Attach a style label.
    #[must_use]
    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }
}

/// One or more cues merged because they share identical timing.
///
/// This is the unit that becomes a flashcard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogicalCue {
    /// Shared start time in milliseconds.
    pub start: i64,
    /// Shared end time in milliseconds.
    pub end: i64,
    /// Cleaned text of every merged cue, space-joined in arrival order.
    pub text: String,
    /// How many input cues were folded into this one.
    pub merged: usize,
}

impl LogicalCue {
    fn from_cue(cue: &Cue) -> Self {
        Self {
            start: cue.start,
            end: cue.end,
            text: clean_text(&cue.text),
            merged: 1,
        }
    }

    fn shares_timing(&self, cue: &Cue) -> bool {
        self.start == cue.start && self.end == cue.end
    }

    fn absorb(&mut self, cue: &Cue) {
        let text = clean_text(&cue.text);
        if !text.is_empty() {
            if !self.text.is_empty() {
                self.text.push(' ');
            }
            self.text.push_str(&text);
        }
        self.merged += 1;
    }
}

/// Style allow-list applied before merging.
///
/// The default filter lets every cue through. A restricted filter keeps only
/// cues whose style is an exact, case-sensitive member; unstyled cues are
/// dropped by a restricted filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleFilter {
    allowed: Option<BTreeSet<String>>,
}

impl StyleFilter {
    /// A filter that accepts every cue.
    pub fn all() -> Self {
        Self { allowed: None }
    }

    /// A filter that accepts only the given styles.
    ///
    /// An empty iterator yields [`StyleFilter::all`]: an allow-list with no
    /// members is treated as "not configured".
    pub fn only<I, S>(styles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let allowed: BTreeSet<String> = styles.into_iter().map(Into::into).collect();
        if allowed.is_empty() {
            Self::all()
        } else {
            Self {
                allowed: Some(allowed),
            }
        }
    }

    /// Returns `true` when no allow-list is configured.
    pub fn is_unrestricted(&self) -> bool {
        self.allowed.is_none()
    }

    /// The configured styles, if any.
    pub fn styles(&self) -> impl Iterator<Item = &str> {
        self.allowed.iter().flatten().map(String::as_str)
    }

    /// Whether `cue` passes the filter.
    pub fn allows(&self, cue: &Cue) -> bool {
        match (&self.allowed, &cue.style) {
            (None, _) => true,
            (Some(allowed), Some(style)) => allowed.contains(style),
            (Some(_), None) => false,
        }
    }
}

/// Filter, clean and merge a raw cue sequence.
///
/// Filtering happens first, so a cue with a disallowed style never takes
/// part in the adjacency check. A cue then joins the last logical cue in the
/// output iff both timestamps match it exactly; the stored entry is extended
/// in place, which collapses any run of identical timings into one entry.
pub fn normalize(cues: &[Cue], filter: &StyleFilter) -> Vec<LogicalCue> {
    let mut logical: Vec<LogicalCue> = Vec::with_capacity(cues.len());

    for cue in cues.iter().filter(|cue| filter.allows(cue)) {
        match logical.last_mut() {
            Some(last) if last.shares_timing(cue) => last.absorb(cue),
            _ => logical.push(LogicalCue::from_cue(cue)),
        }
    }

    log::debug!(
        "Normalized {} cue(s) into {} logical cue(s)",
        cues.len(),
        logical.len()
    );
    logical
}

/// Strip inline markup from subtitle text.
///
/// Removes `{\...}` override blocks and the `\N` / `\n` line-break markers.
/// Both collapse to nothing rather than to a space. Braces that do not open
/// with a backslash are ordinary text, and an override block that is never
/// closed is kept verbatim.
pub fn clean_text(raw: &str) -> String {
    let mut result = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(open) = rest.find("{\\") {
        let Some(close) = rest[open..].find('}') else {
            break;
        };
        result.push_str(&rest[..open]);
        rest = &rest[open + close + 1..];
    }
    result.push_str(rest);

    result
        .replace("\\N", "")
        .replace("\\n", "")
        .trim()
        .to_string()
}
