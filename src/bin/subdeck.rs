use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use subdeck::{
    ApkgPackager, CropSpec, Cue, Deck, DeckBuilder, DeckId, DeckOptions, DeckPackager,
    FfmpegLogLevel, FfmpegTranscoder, NoteModel, PackageRequest, ProgressCallback, ProgressInfo,
    SubdeckError, Transcoder, load_cues, validate_plan, working_directory_for,
};

const CLI_AFTER_HELP: &str = "Examples:\n  subdeck build -i episode01.mkv\n  subdeck build -i episode01.mkv -s episode01.srt --style Default --offset -500 --progress\n  subdeck inspect -i episode01.mkv --json\n  subdeck completions zsh > _subdeck";

#[derive(Debug, Parser)]
#[command(
    name = "subdeck",
    version,
    about = "Build Anki sentence cards from a video and its subtitles",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show additional logging output.
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar while extracting media.
    #[arg(long, global = true)]
    progress: bool,

    /// Allow overwriting an existing package.
    #[arg(long, global = true)]
    overwrite: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Debug, Args, Clone)]
struct InputArgs {
    /// Source video.
    #[arg(short = 'i', long = "in")]
    input: PathBuf,

    /// Subtitle file (.ass, .ssa or .srt). Defaults to the video path with `.ass`.
    #[arg(short, long)]
    subs: Option<PathBuf>,

    /// Only keep cues with this style. Repeat for several styles.
    #[arg(long = "style")]
    styles: Vec<String>,

    /// Milliseconds added to every cue; negative when the subtitles run late.
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    offset: i64,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract media and write an .apkg package.
    #[command(
        about = "Build a deck",
        after_help = "Examples:\n  subdeck build -i episode01.mkv -o deck.apkg -n \"Episode 1\"\n  subdeck build -i episode01.mkv --crop-bottom 120 --workers 4"
    )]
    Build {
        #[command(flatten)]
        inputs: InputArgs,

        /// Output package. Defaults to the video path with `.apkg`.
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Deck name. Defaults to the video file stem.
        #[arg(short, long)]
        name: Option<String>,

        /// Pixels cut from the top of every still frame.
        #[arg(long, default_value_t = 0)]
        crop_top: u32,
        /// Pixels cut from the right of every still frame.
        #[arg(long, default_value_t = 0)]
        crop_right: u32,
        /// Pixels cut from the bottom of every still frame.
        #[arg(long, default_value_t = 0)]
        crop_bottom: u32,
        /// Pixels cut from the left of every still frame.
        #[arg(long, default_value_t = 0)]
        crop_left: u32,

        /// Fixed deck id, so re-imports update the same deck.
        #[arg(long)]
        deck_id: Option<i64>,

        /// FFmpeg binary to run.
        #[arg(long, default_value = "ffmpeg")]
        ffmpeg: PathBuf,

        /// Seconds a single FFmpeg call may take; 0 waits forever.
        #[arg(long, default_value_t = 120)]
        timeout: u64,

        /// Cues extracted concurrently (requires the `rayon` feature).
        #[arg(long)]
        workers: Option<usize>,
    },

    /// Show the planned cards and check the inputs, without extracting.
    #[command(
        about = "Inspect cues and windows",
        after_help = "Examples:\n  subdeck inspect -i episode01.mkv\n  subdeck inspect -i episode01.mkv --style Default --json"
    )]
    Inspect {
        #[command(flatten)]
        inputs: InputArgs,

        /// Output machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    #[command(
        about = "Generate shell completions",
        after_help = "Examples:\n  subdeck completions bash > subdeck.bash\n  subdeck completions zsh > _subdeck"
    )]
    Completions {
        /// Shell to generate completions for.
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn default_subtitles(video: &Path) -> PathBuf {
    video.with_extension("ass")
}

fn default_output(video: &Path) -> PathBuf {
    video.with_extension("apkg")
}

fn default_deck_name(video: &Path) -> String {
    video
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "subdeck".to_string())
}

fn parse_timeout(seconds: u64) -> Option<Duration> {
    (seconds > 0).then(|| Duration::from_secs(seconds))
}

fn parse_log_level(value: Option<&str>) -> Result<FfmpegLogLevel, Box<dyn std::error::Error>> {
    match value {
        None => Ok(FfmpegLogLevel::default()),
        Some(level) => Ok(FfmpegLogLevel::parse(level)
            .ok_or(format!("unsupported --log-level: {level}"))?),
    }
}

fn ensure_writable_path(path: &Path, overwrite: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        if overwrite {
            eprintln!(
                "{} {}",
                "warning:".yellow().bold(),
                format!("overwriting {}", path.display()).yellow()
            );
        } else {
            return Err(format!(
                "output already exists: {} (use --overwrite to replace)",
                path.display()
            )
            .into());
        }
    }
    Ok(())
}

fn init_logging(global: &GlobalOptions) {
    let level = if global.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}

fn read_inputs(inputs: &InputArgs) -> Result<(PathBuf, Vec<Cue>), Box<dyn std::error::Error>> {
    let subtitles = inputs
        .subs
        .clone()
        .unwrap_or_else(|| default_subtitles(&inputs.input));
    let cues = load_cues(&subtitles)?;
    Ok((subtitles, cues))
}

fn build_deck<T: Transcoder>(
    builder: &DeckBuilder,
    cues: &[Cue],
    video: &Path,
    directory: &Path,
    transcoder: &T,
) -> Result<Deck, SubdeckError> {
    #[cfg(feature = "rayon")]
    if builder.options().workers() > 1 {
        return builder.build_parallel(cues, video, directory, transcoder);
    }

    #[cfg(not(feature = "rayon"))]
    if builder.options().workers() > 1 {
        eprintln!(
            "{} {}",
            "warning:".yellow().bold(),
            "--workers requires building with the `rayon` feature".yellow()
        );
    }

    builder.build(cues, video, directory, transcoder)
}

struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(0);
        let style =
            ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}")?;
        bar.set_style(style.progress_chars("##-"));
        Ok(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        if let Some(total) = info.total {
            self.bar.set_length(total);
        }
        self.bar.set_position(info.current);
        self.bar
            .set_message(format!("{} cards, {} skipped", info.extracted, info.skipped));
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli.global);
    let log_level = parse_log_level(cli.global.log_level.as_deref())?;

    match cli.command {
        Commands::Build {
            inputs,
            out,
            name,
            crop_top,
            crop_right,
            crop_bottom,
            crop_left,
            deck_id,
            ffmpeg,
            timeout,
            workers,
        } => {
            let video = inputs.input.clone();
            let output = out.unwrap_or_else(|| default_output(&video));
            let name = name.unwrap_or_else(|| default_deck_name(&video));
            ensure_writable_path(&output, cli.global.overwrite)?;

            let (subtitles, cues) = read_inputs(&inputs)?;
            if cli.global.verbose {
                eprintln!(
                    "{} {} cue(s) from {}",
                    "read".cyan().bold(),
                    cues.len(),
                    subtitles.display()
                );
            }

            let transcoder = FfmpegTranscoder::new()
                .with_program(ffmpeg)
                .with_log_level(log_level)
                .with_timeout(parse_timeout(timeout));

            let mut options = DeckOptions::new()
                .with_offset_ms(inputs.offset)
                .with_crop(CropSpec::new(crop_top, crop_right, crop_bottom, crop_left))
                .with_styles(inputs.styles.clone())
                .with_workers(workers.unwrap_or(1));

            let progress = if cli.global.progress {
                let progress = Arc::new(TerminalProgress::new()?);
                options = options.with_progress(progress.clone());
                Some(progress)
            } else {
                None
            };

            let directory = working_directory_for(&video);
            let builder = DeckBuilder::new(options);
            let deck = build_deck(&builder, &cues, &video, &directory, &transcoder);
            if let Some(progress) = &progress {
                progress.finish();
            }
            let deck = deck?;

            let skipped: Vec<_> = deck.skipped().collect();
            if cli.global.verbose {
                for (marker, reason) in &skipped {
                    eprintln!("{} #{marker}: {reason}", "skipped".yellow().bold());
                }
            }

            if deck.is_empty() {
                return Err(format!(
                    "no cards could be built from {} cue(s); nothing written",
                    deck.report.len()
                )
                .into());
            }

            let model = NoteModel::default();
            let deck_id = deck_id.map(DeckId::new).unwrap_or_else(DeckId::random);
            let request = PackageRequest::new(deck_id, &name, &model, &deck);
            ApkgPackager::new().package(&request, &output)?;

            println!(
                "{} {} card(s), {} skipped -> {}",
                "done".green().bold(),
                deck.cards.len(),
                skipped.len(),
                output.display()
            );
            if cli.global.verbose {
                println!("Deck: {name} (id {deck_id})");
                println!("Media cache: {}", directory.display());
            }
        }
        Commands::Inspect { inputs, json } => {
            let (subtitles, cues) = read_inputs(&inputs)?;
            let options = DeckOptions::new()
                .with_offset_ms(inputs.offset)
                .with_styles(inputs.styles.clone());
            let plan = DeckBuilder::new(options).plan(&cues);
            let report = validate_plan(&inputs.input, &cues, &plan);

            if json {
                let payload = json!({
                    "video": inputs.input.display().to_string(),
                    "subtitles": subtitles.display().to_string(),
                    "cues": plan.iter().map(|planned| json!({
                        "marker": planned.marker,
                        "start": planned.cue.start,
                        "end": planned.cue.end,
                        "text": planned.cue.text,
                        "merged": planned.cue.merged,
                        "window": planned.window.as_ref().ok(),
                        "skip": planned.window.as_ref().err(),
                    })).collect::<Vec<_>>(),
                    "report": report,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                for planned in &plan {
                    match &planned.window {
                        Ok(window) => println!(
                            "#{:<5} {} -> {} @ {}  {}",
                            planned.marker,
                            window.audio_start,
                            window.audio_end,
                            window.image_instant,
                            planned.cue.text
                        ),
                        Err(reason) => println!(
                            "#{:<5} {} {}  {}",
                            planned.marker,
                            "skip".yellow().bold(),
                            reason,
                            planned.cue.text
                        ),
                    }
                }
                println!();
                print!("{report}");
            }

            if !report.is_valid() {
                return Err("validation failed".into());
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "subdeck", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}
