//! Pre-flight validation tests.

use std::path::Path;

use subdeck::{Cue, DeckBuilder, DeckOptions, ValidationReport, validate_plan};
use tempfile::TempDir;

fn report_for(video: &Path, cues: &[Cue], options: DeckOptions) -> ValidationReport {
    let plan = DeckBuilder::new(options).plan(cues);
    validate_plan(video, cues, &plan)
}

fn existing_video(directory: &TempDir) -> std::path::PathBuf {
    let video = directory.path().join("episode.mkv");
    std::fs::write(&video, b"video").unwrap();
    video
}

#[test]
fn healthy_inputs_are_valid() {
    let directory = TempDir::new().unwrap();
    let video = existing_video(&directory);
    let report = report_for(
        &video,
        &[Cue::new(0, 1000, "A"), Cue::new(2000, 3000, "B")],
        DeckOptions::new(),
    );

    assert!(report.is_valid());
    assert!(report.warnings.is_empty());
    let has_summary = report.info.iter().any(|line| line.contains("2 logical cue(s)"));
    assert!(has_summary, "Info should summarise the plan: {report}");
}

#[test]
fn missing_video_is_an_error() {
    let report = report_for(
        Path::new("/nonexistent/episode.mkv"),
        &[Cue::new(0, 1000, "A")],
        DeckOptions::new(),
    );
    assert!(!report.is_valid());
    assert!(report.errors[0].contains("Video not found"));
}

#[test]
fn empty_subtitles_are_an_error() {
    let directory = TempDir::new().unwrap();
    let video = existing_video(&directory);
    let report = report_for(&video, &[], DeckOptions::new());
    assert!(!report.is_valid());
}

#[test]
fn filter_that_removes_everything_is_an_error() {
    let directory = TempDir::new().unwrap();
    let video = existing_video(&directory);
    let report = report_for(
        &video,
        &[Cue::new(0, 1000, "A").with_style("Sign")],
        DeckOptions::new().with_styles(["Default"]),
    );
    assert!(!report.is_valid());
    assert!(report.errors.iter().any(|e| e.contains("style filter")));
}

#[test]
fn degenerate_windows_and_empty_text_are_warnings() {
    let directory = TempDir::new().unwrap();
    let video = existing_video(&directory);
    let report = report_for(
        &video,
        &[
            Cue::new(0, 500, "early"),
            Cue::new(10_000, 11_000, "{\\an8}"),
        ],
        DeckOptions::new().with_offset_ms(-5000),
    );

    assert!(report.is_valid());
    assert_eq!(report.warnings.len(), 2);
    assert!(report.warnings[0].contains("#1"));
    assert!(report.warnings[1].contains("#2"));
}

#[test]
fn merges_are_reported() {
    let directory = TempDir::new().unwrap();
    let video = existing_video(&directory);
    let report = report_for(
        &video,
        &[Cue::new(0, 1000, "A"), Cue::new(0, 1000, "B")],
        DeckOptions::new(),
    );
    assert!(report.info.iter().any(|line| line.starts_with("1 cue(s) merged")));
}

#[test]
fn display_lists_issues_by_severity() {
    let report = ValidationReport {
        info: vec!["note".to_string()],
        warnings: vec!["careful".to_string()],
        errors: vec!["broken".to_string()],
    };
    assert_eq!(
        report.to_string(),
        "[INFO] note\n[WARN] careful\n[ERROR] broken\n"
    );
    assert_eq!(report.issue_count(), 3);
    assert_eq!(ValidationReport::default().to_string(), "No issues found.\n");
}
