//! FFmpeg argument construction and crop filter tests.
//!
//! Only the transcoder tests at the end spawn a process.

use std::ffi::OsString;
use std::path::Path;
use std::time::Duration;

use subdeck::{
    AudioRequest, CropSpec, DEFAULT_TIMEOUT, FfmpegLogLevel, FfmpegTranscoder, ImageRequest,
    SubdeckError, Timestamp, Transcoder, audio_arguments, image_arguments,
};

fn strings(arguments: Vec<OsString>) -> Vec<String> {
    arguments
        .into_iter()
        .map(|argument| argument.to_string_lossy().into_owned())
        .collect()
}

fn image_request(crop: CropSpec) -> Vec<String> {
    strings(image_arguments(
        &ImageRequest {
            video: Path::new("in.mkv"),
            output: Path::new("out/1.jpg"),
            instant: Timestamp::from_millis(1500),
            crop,
        },
        FfmpegLogLevel::default(),
    ))
}

// ── Audio ──────────────────────────────────────────────────────────

#[test]
fn audio_arguments_seek_then_encode() {
    let arguments = strings(audio_arguments(
        &AudioRequest {
            video: Path::new("in.mkv"),
            output: Path::new("out/1.mp3"),
            start: Timestamp::from_millis(750),
            end: Timestamp::from_millis(2250),
        },
        FfmpegLogLevel::Error,
    ));

    assert_eq!(
        arguments,
        [
            "-hide_banner",
            "-nostdin",
            "-loglevel",
            "error",
            "-y",
            "-ss",
            "0:00:00.750",
            "-to",
            "0:00:02.250",
            "-i",
            "in.mkv",
            "-vn",
            "-ar",
            "44100",
            "-ac",
            "2",
            "-ab",
            "96k",
            "-acodec",
            "mp3",
            "out/1.mp3",
        ]
    );
}

#[test]
fn log_level_is_forwarded() {
    let arguments = strings(audio_arguments(
        &AudioRequest {
            video: Path::new("in.mkv"),
            output: Path::new("1.mp3"),
            start: Timestamp::from_millis(0),
            end: Timestamp::from_millis(1),
        },
        FfmpegLogLevel::Quiet,
    ));
    let position = arguments.iter().position(|a| a == "-loglevel").unwrap();
    assert_eq!(arguments[position + 1], "quiet");
}

// ── Image ──────────────────────────────────────────────────────────

#[test]
fn image_arguments_grab_one_frame() {
    assert_eq!(
        image_request(CropSpec::default()),
        [
            "-hide_banner",
            "-nostdin",
            "-loglevel",
            "error",
            "-y",
            "-ss",
            "0:00:01.500",
            "-i",
            "in.mkv",
            "-frames:v",
            "1",
            "out/1.jpg",
        ]
    );
}

#[test]
fn zero_crop_emits_no_filter() {
    assert!(!image_request(CropSpec::new(0, 0, 0, 0)).contains(&"-vf".to_string()));
}

#[test]
fn any_single_margin_emits_the_filter() {
    for crop in [
        CropSpec::new(1, 0, 0, 0),
        CropSpec::new(0, 1, 0, 0),
        CropSpec::new(0, 0, 1, 0),
        CropSpec::new(0, 0, 0, 1),
    ] {
        let arguments = image_request(crop);
        let position = arguments.iter().position(|a| a == "-vf").unwrap();
        assert_eq!(arguments[position + 1], crop.to_string());
        assert_eq!(arguments.last().unwrap(), "out/1.jpg");
    }
}

// ── CropSpec ───────────────────────────────────────────────────────

#[test]
fn crop_filter_expression() {
    let crop = CropSpec::new(10, 20, 30, 40);
    assert_eq!(
        crop.filter().as_deref(),
        Some("crop=in_w-20-40:in_h-10-30:40:10")
    );
    assert!(!crop.is_empty());
    assert!(CropSpec::default().is_empty());
    assert_eq!(CropSpec::default().filter(), None);
}

// ── FfmpegLogLevel ─────────────────────────────────────────────────

#[test]
fn log_level_parsing() {
    assert_eq!(FfmpegLogLevel::parse("WARN"), Some(FfmpegLogLevel::Warning));
    assert_eq!(FfmpegLogLevel::parse("trace"), Some(FfmpegLogLevel::Trace));
    assert_eq!(FfmpegLogLevel::parse("chatty"), None);
    assert_eq!(FfmpegLogLevel::default().as_arg(), "error");
}

// ── FfmpegTranscoder ───────────────────────────────────────────────

#[test]
fn missing_binary_is_a_transcoder_failure() {
    let transcoder = FfmpegTranscoder::new()
        .with_program("/nonexistent/subdeck-ffmpeg")
        .with_timeout(Some(Duration::from_secs(1)));
    let result = transcoder.extract_audio(&AudioRequest {
        video: Path::new("in.mkv"),
        output: Path::new("out.mp3"),
        start: Timestamp::from_millis(0),
        end: Timestamp::from_millis(1000),
    });
    assert!(matches!(result, Err(SubdeckError::TranscoderFailed(_))));
}

#[test]
fn default_timeout_is_two_minutes() {
    assert_eq!(DEFAULT_TIMEOUT, Duration::from_secs(120));
}

#[cfg(unix)]
#[test]
fn timeout_is_not_held_up_by_a_wrapped_child() {
    use std::os::unix::fs::PermissionsExt;
    use std::time::Instant;

    let directory = tempfile::tempdir().unwrap();
    let script = directory.path().join("slow-ffmpeg.sh");
    std::fs::write(&script, "#!/bin/sh\nsleep 10\n").unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

    let transcoder = FfmpegTranscoder::new()
        .with_program(&script)
        .with_timeout(Some(Duration::from_millis(300)));
    let started = Instant::now();
    let result = transcoder.extract_audio(&AudioRequest {
        video: Path::new("in.mkv"),
        output: Path::new("out.mp3"),
        start: Timestamp::from_millis(0),
        end: Timestamp::from_millis(1000),
    });

    assert!(matches!(result, Err(SubdeckError::TranscoderTimeout(_))));
    assert!(
        started.elapsed() < Duration::from_secs(5),
        "timed out only after {:?}",
        started.elapsed()
    );
}
