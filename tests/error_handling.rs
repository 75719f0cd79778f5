//! Error handling integration tests.
//!
//! These tests verify that fatal errors carry enough context to act on.

use std::path::PathBuf;
use std::time::Duration;

use subdeck::{SubdeckError, load_cues};

#[test]
fn missing_input_names_the_path() {
    let error = SubdeckError::MissingInput {
        path: PathBuf::from("show/ep01.mkv"),
    };
    assert_eq!(error.to_string(), "Input file not found: show/ep01.mkv");
}

#[test]
fn subtitle_parse_error_has_location() {
    let error = SubdeckError::SubtitleParse {
        path: PathBuf::from("ep01.ass"),
        line: 42,
        reason: "invalid timestamp \"x\"".to_string(),
    };
    let message = error.to_string();
    assert!(
        message.contains("ep01.ass:42"),
        "Error message should point at the line: {message}",
    );
}

#[test]
fn timeout_mentions_duration() {
    let message = SubdeckError::TranscoderTimeout(Duration::from_secs(120)).to_string();
    assert!(message.contains("120s"), "unexpected message: {message}");
}

#[test]
fn io_errors_convert() {
    let error: SubdeckError = std::io::Error::other("disk full").into();
    assert!(matches!(error, SubdeckError::IoError(_)));
}

#[test]
fn json_errors_convert() {
    let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let error: SubdeckError = json_error.into();
    assert!(matches!(error, SubdeckError::Json(_)));
}

#[test]
fn non_utf8_subtitles_are_read_lossily() {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let path = directory.path().join("latin1.srt");
    let mut content = b"1\n00:00:01,000 --> 00:00:02,000\ncaf".to_vec();
    content.push(0xE9);
    content.push(b'\n');
    std::fs::write(&path, content).expect("Failed to write subtitles");

    let cues = load_cues(&path).expect("Lossy decoding should not fail");
    assert_eq!(cues.len(), 1);
    assert!(cues[0].text.starts_with("caf"));
}

#[cfg(feature = "rayon")]
#[test]
fn worker_pool_failure_is_an_io_error() {
    // Only the first global pool can be installed; the second attempt fails.
    let _ = rayon::ThreadPoolBuilder::new().build_global();
    let failure = rayon::ThreadPoolBuilder::new().build_global().unwrap_err();

    let error: SubdeckError = failure.into();
    assert!(matches!(error, SubdeckError::IoError(_)));
    assert!(error.to_string().contains("could not start workers"));
}
