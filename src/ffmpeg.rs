//! The `ffmpeg` command-line transcoder.
//!
//! [`FfmpegTranscoder`] implements [`Transcoder`] by spawning the `ffmpeg`
//! binary once per artifact. Argument lists are built by
//! [`audio_arguments`] and [`image_arguments`], which are pure and can be
//! inspected without FFmpeg installed.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use subdeck::{FfmpegLogLevel, FfmpegTranscoder};
//!
//! let transcoder = FfmpegTranscoder::new()
//!     .with_program("/opt/ffmpeg/bin/ffmpeg")
//!     .with_log_level(FfmpegLogLevel::Error)
//!     .with_timeout(Some(Duration::from_secs(60)));
//! ```

use std::ffi::OsString;
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::SubdeckError;
use crate::transcoder::{
    AUDIO_BITRATE, AUDIO_CHANNELS, AUDIO_CODEC, AUDIO_SAMPLE_RATE, AudioRequest, ImageRequest,
    Transcoder,
};

/// How long a transcoder invocation may run before it is killed.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// FFmpeg log verbosity, passed as `-loglevel`.
///
/// # Ordering (most verbose → most quiet)
///
/// `Trace` > `Debug` > `Verbose` > `Info` > `Warning` > `Error` > `Fatal` > `Panic` > `Quiet`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FfmpegLogLevel {
    /// Print no output at all.
    Quiet,
    /// Only log conditions the process cannot recover from.
    Panic,
    /// Only log unrecoverable errors.
    Fatal,
    /// Log recoverable errors. This is the default: failures are captured
    /// and attached to skip reasons.
    #[default]
    Error,
    /// Log warnings.
    Warning,
    /// Log informational messages.
    Info,
    /// Log verbose informational messages.
    Verbose,
    /// Log debugging messages.
    Debug,
    /// Extremely verbose tracing output.
    Trace,
}

impl FfmpegLogLevel {
    /// The value FFmpeg expects after `-loglevel`.
    pub const fn as_arg(self) -> &'static str {
        match self {
            FfmpegLogLevel::Quiet => "quiet",
            FfmpegLogLevel::Panic => "panic",
            FfmpegLogLevel::Fatal => "fatal",
            FfmpegLogLevel::Error => "error",
            FfmpegLogLevel::Warning => "warning",
            FfmpegLogLevel::Info => "info",
            FfmpegLogLevel::Verbose => "verbose",
            FfmpegLogLevel::Debug => "debug",
            FfmpegLogLevel::Trace => "trace",
        }
    }

    /// Parse a level name as accepted on the command line.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "quiet" => Some(FfmpegLogLevel::Quiet),
            "panic" => Some(FfmpegLogLevel::Panic),
            "fatal" => Some(FfmpegLogLevel::Fatal),
            "error" => Some(FfmpegLogLevel::Error),
            "warning" | "warn" => Some(FfmpegLogLevel::Warning),
            "info" => Some(FfmpegLogLevel::Info),
            "verbose" => Some(FfmpegLogLevel::Verbose),
            "debug" => Some(FfmpegLogLevel::Debug),
            "trace" => Some(FfmpegLogLevel::Trace),
            _ => None,
        }
    }
}

/// Build the argument list for an audio clip.
///
/// Seeking happens on the input side (`-ss`/`-to` before `-i`), the video
/// stream is dropped and the audio is re-encoded with the fixed profile.
pub fn audio_arguments(request: &AudioRequest<'_>, log_level: FfmpegLogLevel) -> Vec<OsString> {
    let mut arguments = common_arguments(log_level);
    arguments.extend([
        "-ss".into(),
        request.start.to_string().into(),
        "-to".into(),
        request.end.to_string().into(),
        "-i".into(),
        request.video.as_os_str().to_owned(),
        "-vn".into(),
        "-ar".into(),
        AUDIO_SAMPLE_RATE.to_string().into(),
        "-ac".into(),
        AUDIO_CHANNELS.to_string().into(),
        "-ab".into(),
        AUDIO_BITRATE.into(),
        "-acodec".into(),
        AUDIO_CODEC.into(),
        request.output.as_os_str().to_owned(),
    ]);
    arguments
}

/// Build the argument list for a still frame.
///
/// A `-vf crop=...` pair is only present when the request carries a
/// non-empty [`CropSpec`](crate::CropSpec).
pub fn image_arguments(request: &ImageRequest<'_>, log_level: FfmpegLogLevel) -> Vec<OsString> {
    let mut arguments = common_arguments(log_level);
    arguments.extend([
        "-ss".into(),
        request.instant.to_string().into(),
        "-i".into(),
        request.video.as_os_str().to_owned(),
        "-frames:v".into(),
        "1".into(),
    ]);
    if let Some(filter) = request.crop.filter() {
        arguments.push("-vf".into());
        arguments.push(filter.into());
    }
    arguments.push(request.output.as_os_str().to_owned());
    arguments
}

fn common_arguments(log_level: FfmpegLogLevel) -> Vec<OsString> {
    vec![
        "-hide_banner".into(),
        "-nostdin".into(),
        "-loglevel".into(),
        log_level.as_arg().into(),
        "-y".into(),
    ]
}

/// Runs the `ffmpeg` binary as a child process.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    program: PathBuf,
    log_level: FfmpegLogLevel,
    timeout: Option<Duration>,
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegTranscoder {
    /// Use `ffmpeg` from `PATH`, error-level logging and [`DEFAULT_TIMEOUT`].
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("ffmpeg"),
            log_level: FfmpegLogLevel::default(),
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }

    /// Use a specific FFmpeg binary.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Set FFmpeg's own log verbosity.
    #[must_use]
    pub fn with_log_level(mut self, level: FfmpegLogLevel) -> Self {
        self.log_level = level;
        self
    }

    /// Bound each invocation. `None` waits forever.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn run(&self, arguments: Vec<OsString>) -> Result<(), SubdeckError> {
        log::debug!("{} {:?}", self.program.display(), arguments);

        let mut child = Command::new(&self.program)
            .args(&arguments)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                SubdeckError::TranscoderFailed(format!(
                    "could not start {}: {e}",
                    self.program.display()
                ))
            })?;

        // Stderr is drained on a side thread while the child is polled.
        let stderr = child.stderr.take();
        let reader = thread::spawn(move || {
            let mut diagnostics = String::new();
            if let Some(mut stderr) = stderr {
                let _ = stderr.read_to_string(&mut diagnostics);
            }
            diagnostics
        });

        // On timeout the reader is detached: a grandchild may still hold the pipe.
        let status = self.wait(&mut child)?;
        let diagnostics = reader.join().unwrap_or_default();

        if status.success() {
            return Ok(());
        }
        let detail = diagnostics
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .unwrap_or("no diagnostics");
        Err(SubdeckError::TranscoderFailed(format!(
            "{} exited with {status}: {detail}",
            self.program.display()
        )))
    }

    fn wait(&self, child: &mut Child) -> Result<ExitStatus, SubdeckError> {
        let Some(timeout) = self.timeout else {
            return Ok(child.wait()?);
        };

        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                log::warn!("Killing {} after {timeout:?}", self.program.display());
                let _ = child.kill();
                let _ = child.wait();
                return Err(SubdeckError::TranscoderTimeout(timeout));
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl Transcoder for FfmpegTranscoder {
    fn extract_audio(&self, request: &AudioRequest<'_>) -> Result<(), SubdeckError> {
        self.run(audio_arguments(request, self.log_level))
    }

    fn extract_image(&self, request: &ImageRequest<'_>) -> Result<(), SubdeckError> {
        self.run(image_arguments(request, self.log_level))
    }
}
