//! Media extractor tests, driven by a recording fake transcoder.
//!
//! The fake writes stub audio that only passes the header check, so these
//! tests are compiled out when the `probe` feature demuxes every clip.

#![cfg(not(feature = "probe"))]

mod common;

use common::{Call, Failure, RACED_AUDIO, RecordingTranscoder, fake_video, file_names};
use subdeck::{
    ArtifactKind, CropSpec, Cue, CueOutcome, ExtractionWindow, MediaArtifact, MediaExtractor,
    SkipReason, StyleFilter, normalize,
};
use tempfile::TempDir;

fn window(start: i64, end: i64) -> ExtractionWindow {
    let cue = normalize(&[Cue::new(start, end, "line")], &StyleFilter::all()).remove(0);
    ExtractionWindow::compute(&cue, 0).unwrap()
}

// ── Success ────────────────────────────────────────────────────────

#[test]
fn extract_writes_both_artifacts_named_by_marker() {
    let directory = TempDir::new().unwrap();
    let video = fake_video(directory.path());
    let media = directory.path().join("media");
    std::fs::create_dir(&media).unwrap();
    let transcoder = RecordingTranscoder::new();

    let extractor = MediaExtractor::new(&video, &media, &transcoder);
    let outcome = extractor.extract(7, &window(1000, 2000), CropSpec::default());

    match &outcome {
        CueOutcome::Extracted { audio, image } => {
            assert_eq!(audio, &MediaArtifact::new(&media, 7, ArtifactKind::Audio));
            assert_eq!(image.file_name(), "7.jpg");
        }
        other => panic!("expected extraction, got {other:?}"),
    }
    assert_eq!(file_names(&media), ["7.jpg", "7.mp3"]);
    assert_eq!(
        transcoder.calls(),
        [
            Call::Audio {
                start: 750,
                end: 2250
            },
            Call::Image {
                instant: 1500,
                crop: CropSpec::default()
            },
        ]
    );
}

#[test]
fn crop_is_passed_through() {
    let directory = TempDir::new().unwrap();
    let video = fake_video(directory.path());
    let transcoder = RecordingTranscoder::new();
    let crop = CropSpec::new(0, 0, 120, 0);

    MediaExtractor::new(&video, directory.path(), &transcoder).extract(1, &window(0, 1000), crop);

    assert!(transcoder.calls().contains(&Call::Image { instant: 500, crop }));
}

// ── Idempotence ────────────────────────────────────────────────────

#[test]
fn second_run_makes_no_transcoder_calls() {
    let directory = TempDir::new().unwrap();
    let video = fake_video(directory.path());
    let media = directory.path().join("media");
    std::fs::create_dir(&media).unwrap();

    let first = RecordingTranscoder::new();
    let first_outcome =
        MediaExtractor::new(&video, &media, &first).extract(3, &window(0, 1000), CropSpec::default());
    assert_eq!(first.call_count(), 2);

    let second = RecordingTranscoder::new();
    let second_outcome = MediaExtractor::new(&video, &media, &second).extract(
        3,
        &window(0, 1000),
        CropSpec::default(),
    );

    assert_eq!(second.call_count(), 0);
    assert_eq!(first_outcome, second_outcome);
}

#[test]
fn cached_audio_is_kept_when_only_image_is_missing() {
    let directory = TempDir::new().unwrap();
    let video = fake_video(directory.path());
    let media = directory.path().join("media");
    std::fs::create_dir(&media).unwrap();

    let failing = RecordingTranscoder::failing(Failure::Image);
    MediaExtractor::new(&video, &media, &failing).extract(2, &window(0, 1000), CropSpec::default());
    assert_eq!(file_names(&media), ["2.mp3"]);

    let retry = RecordingTranscoder::new();
    let outcome =
        MediaExtractor::new(&video, &media, &retry).extract(2, &window(0, 1000), CropSpec::default());

    assert!(outcome.is_extracted());
    assert_eq!(
        retry.calls(),
        [Call::Image {
            instant: 500,
            crop: CropSpec::default()
        }]
    );
}

#[test]
fn output_placed_by_another_writer_wins() {
    let directory = TempDir::new().unwrap();
    let video = fake_video(directory.path());
    let media = directory.path().join("media");
    std::fs::create_dir(&media).unwrap();
    let transcoder = RecordingTranscoder::failing(Failure::RacedAudio);

    let outcome =
        MediaExtractor::new(&video, &media, &transcoder).extract(6, &window(0, 1000), CropSpec::default());

    assert!(outcome.is_extracted());
    assert_eq!(std::fs::read(media.join("6.mp3")).unwrap(), RACED_AUDIO);
    assert_eq!(file_names(&media), ["6.jpg", "6.mp3"]);
}

// ── Failures ───────────────────────────────────────────────────────

#[test]
fn image_failure_skips_but_keeps_audio_on_disk() {
    let directory = TempDir::new().unwrap();
    let video = fake_video(directory.path());
    let transcoder = RecordingTranscoder::failing(Failure::Image);

    let outcome = MediaExtractor::new(&video, directory.path(), &transcoder).extract(
        1,
        &window(0, 1000),
        CropSpec::default(),
    );

    match outcome {
        CueOutcome::Skipped { reason, produced } => {
            assert!(matches!(
                reason,
                SkipReason::TranscoderFailed {
                    kind: ArtifactKind::Image,
                    ..
                }
            ));
            assert_eq!(produced.len(), 1);
            assert_eq!(produced[0].kind, ArtifactKind::Audio);
            assert!(produced[0].exists());
        }
        other => panic!("expected a skip, got {other:?}"),
    }
}

#[test]
fn audio_failure_does_not_attempt_image() {
    let directory = TempDir::new().unwrap();
    let video = fake_video(directory.path());
    let transcoder = RecordingTranscoder::failing(Failure::Audio);

    let outcome = MediaExtractor::new(&video, directory.path(), &transcoder).extract(
        1,
        &window(0, 1000),
        CropSpec::default(),
    );

    assert!(!outcome.is_extracted());
    assert_eq!(transcoder.call_count(), 1);
    assert!(matches!(transcoder.calls()[0], Call::Audio { .. }));
}

#[test]
fn unrecognised_audio_is_rejected_and_not_cached() {
    let directory = TempDir::new().unwrap();
    let video = fake_video(directory.path());
    let media = directory.path().join("media");
    std::fs::create_dir(&media).unwrap();
    let transcoder = RecordingTranscoder::failing(Failure::GarbageAudio);

    let outcome =
        MediaExtractor::new(&video, &media, &transcoder).extract(4, &window(0, 1000), CropSpec::default());

    assert!(matches!(
        outcome.skip_reason(),
        Some(SkipReason::InvalidOutput {
            kind: ArtifactKind::Audio,
            ..
        })
    ));
    assert!(file_names(&media).is_empty(), "staging file must be cleaned up");
}

#[test]
fn empty_image_is_rejected() {
    let directory = TempDir::new().unwrap();
    let video = fake_video(directory.path());
    let media = directory.path().join("media");
    std::fs::create_dir(&media).unwrap();
    let transcoder = RecordingTranscoder::failing(Failure::EmptyImage);

    let outcome =
        MediaExtractor::new(&video, &media, &transcoder).extract(5, &window(0, 1000), CropSpec::default());

    assert!(matches!(
        outcome.skip_reason(),
        Some(SkipReason::InvalidOutput {
            kind: ArtifactKind::Image,
            ..
        })
    ));
    assert_eq!(file_names(&media), ["5.mp3"]);
}

#[test]
fn skip_reasons_read_well() {
    let reason = SkipReason::TranscoderFailed {
        kind: ArtifactKind::Audio,
        message: "boom".to_string(),
    };
    assert_eq!(reason.to_string(), "audio extraction failed: boom");

    let degenerate = SkipReason::DegenerateWindow {
        start: -900,
        end: -400,
    };
    assert!(degenerate.to_string().contains("-900ms..-400ms"));
}
