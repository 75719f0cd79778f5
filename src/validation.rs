//! Pre-flight checks for a build.
//!
//! [`validate_plan`] looks at the inputs and the planned cues without
//! running the transcoder and returns a [`ValidationReport`] describing
//! anything that would lead to a thin or empty deck.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use subdeck::{DeckBuilder, DeckOptions, load_cues, validate_plan};
//!
//! let cues = load_cues("episode01.ass")?;
//! let plan = DeckBuilder::new(DeckOptions::new()).plan(&cues);
//! let report = validate_plan(Path::new("episode01.mkv"), &cues, &plan);
//! if !report.is_valid() {
//!     for error in &report.errors {
//!         println!("Error: {error}");
//!     }
//! }
//! # Ok::<(), subdeck::SubdeckError>(())
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::Path;

use serde::Serialize;

use crate::cue::Cue;
use crate::pipeline::PlannedCue;

/// Summary of pre-flight validation.
///
/// Contains lists of informational notices, warnings, and errors found during
/// validation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    /// Informational notices (not problems).
    pub info: Vec<String>,
    /// Non-fatal issues that will cost cards.
    pub warnings: Vec<String>,
    /// Fatal issues that will prevent a build.
    pub errors: Vec<String>,
}

impl ValidationReport {
    /// Returns `true` if no errors were found.
    ///
    /// Warnings do not affect this result; only errors make the report
    /// invalid.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Total number of issues (info + warnings + errors).
    pub fn issue_count(&self) -> usize {
        self.info.len() + self.warnings.len() + self.errors.len()
    }
}

impl Display for ValidationReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        for item in &self.info {
            writeln!(f, "[INFO] {item}")?;
        }
        for item in &self.warnings {
            writeln!(f, "[WARN] {item}")?;
        }
        for item in &self.errors {
            writeln!(f, "[ERROR] {item}")?;
        }
        if self.issue_count() == 0 {
            writeln!(f, "No issues found.")?;
        }
        Ok(())
    }
}

/// Check the video, the raw cues and the plan derived from them.
pub fn validate_plan(video: &Path, cues: &[Cue], plan: &[PlannedCue]) -> ValidationReport {
    let mut report = ValidationReport::default();

    // ── Inputs ─────────────────────────────────────────────────────
    if !video.is_file() {
        report
            .errors
            .push(format!("Video not found: {}", video.display()));
    }

    if cues.is_empty() {
        report
            .errors
            .push("Subtitle file contains no dialogue".to_string());
    } else if plan.is_empty() {
        report.errors.push(format!(
            "All {} cue(s) were removed by the style filter",
            cues.len()
        ));
    }

    let unstyled = cues.iter().filter(|cue| cue.style.is_none()).count();
    if unstyled > 0 && unstyled < cues.len() {
        report.info.push(format!(
            "{unstyled} cue(s) have no style and only pass an unrestricted filter"
        ));
    }

    // ── Plan ───────────────────────────────────────────────────────
    let merged: usize = plan.iter().map(|planned| planned.cue.merged - 1).sum();
    if merged > 0 {
        report.info.push(format!(
            "{merged} cue(s) merged into neighbours with identical timing"
        ));
    }

    for planned in plan {
        if let Err(reason) = &planned.window {
            report
                .warnings
                .push(format!("Cue #{} will be skipped: {reason}", planned.marker));
        }
        if planned.cue.text.is_empty() {
            report.warnings.push(format!(
                "Cue #{} has no text after markup is removed",
                planned.marker
            ));
        }
    }

    let usable = plan.iter().filter(|planned| planned.window.is_ok()).count();
    if !plan.is_empty() {
        report.info.push(format!(
            "{} logical cue(s) from {} subtitle line(s), {usable} with a usable window",
            plan.len(),
            cues.len()
        ));
        if usable == 0 {
            report
                .errors
                .push("No cue has a usable extraction window".to_string());
        }
    }

    report
}
