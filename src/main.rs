// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, Context};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{info, warn, LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::io::Write;
use std::path::{Path, PathBuf};

use subclip::app_config::{self, Config, RenderConfig};
use subclip::app_controller::Controller;
use subclip::interval::Interval;
use subclip::timecode::format_timecode;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Cut, caption and render the configured intervals (default command)
    Run(RunArgs),

    /// Show the clip plan, remapped captions and filter chain for a local SRT file
    Preview(PreviewArgs),

    /// Generate shell completions for subclip
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug, Clone)]
struct RunArgs {
    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Video URL to clip
    #[arg(short, long)]
    url: Option<String>,

    /// Local video file to use instead of downloading
    #[arg(short, long)]
    source: Option<PathBuf>,

    /// Interval to keep as FROM-TO, e.g. 00:01:19-00:01:40 (repeatable)
    #[arg(short, long = "interval", value_name = "FROM-TO")]
    intervals: Vec<Interval>,

    /// Caption language code (e.g., 'pt', 'en')
    #[arg(short = 'L', long)]
    language: Option<String>,

    /// Output video path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Force overwrite of an existing output file
    #[arg(short, long)]
    force_overwrite: bool,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

#[derive(Args, Debug)]
struct PreviewArgs {
    /// SRT file to run through the caption pipeline
    #[arg(long, value_name = "FILE.srt")]
    subtitles: PathBuf,

    /// Interval to keep as FROM-TO (defaults to the configured intervals)
    #[arg(short, long = "interval", value_name = "FROM-TO")]
    intervals: Vec<Interval>,

    /// Configuration file path, used for intervals and layout when present
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,
}

/// subclip - clip a video and burn in its captions
///
/// Cuts a list of intervals out of a video, joins them, re-times the video's
/// captions onto the joined timeline and renders them into the frame.
#[derive(Parser, Debug)]
#[command(name = "subclip")]
#[command(version)]
#[command(about = "Clip a video and burn in its re-timed captions")]
#[command(long_about = "subclip downloads a video and its captions, cuts the configured intervals, joins them and renders the captions onto the result.

EXAMPLES:
    subclip                                         # Run using conf.json
    subclip -f -o clip.mp4                          # Force overwrite of clip.mp4
    subclip -i 00:01:19-00:01:40 -i 00:04:30-00:05:00
    subclip -s video.mp4 -u https://youtu.be/ID     # Local video, captions from the URL
    subclip preview --subtitles talk.srt -i 00:00:10-00:00:30
    subclip completions bash > subclip.bash         # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically.

REQUIREMENTS:
    ffmpeg and yt-dlp must be installed, or configured under \"tools\".")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    run: RunArgs,
}

// @struct: Custom logger implementation, filtered by the global max level
struct CustomLogger;

impl CustomLogger {
    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        log::set_boxed_logger(Box::new(CustomLogger))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour and tag for level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("\x1B[1;31m", "ERROR"),
            Level::Warn => ("\x1B[1;33m", "WARN "),
            Level::Info => ("\x1B[1;32m", "INFO "),
            Level::Debug => ("\x1B[1;36m", "DEBUG"),
            Level::Trace => ("\x1B[1;35m", "TRACE"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (colour, tag) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "{}{} {} {}\x1B[0m", colour, now, tag, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default
    // We'll update the level after loading the config if needed
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "subclip", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Preview(args)) => run_preview(args),
        Some(Commands::Run(args)) => run_pipeline(args).await,
        // Bare invocation runs the pipeline with the top-level options
        None => run_pipeline(cli.run).await,
    }
}

/// Load the config file, creating it with defaults when missing
fn load_or_create_config(config_path: &str) -> Result<Config> {
    if Path::new(config_path).exists() {
        return Config::from_file(config_path);
    }

    warn!("Config file not found at '{}', creating default config.", config_path);
    let config = Config::default();
    config
        .save(config_path)
        .context(format!("Failed to write default config to file: {}", config_path))?;
    Ok(config)
}

fn apply_overrides(config: &mut Config, options: &RunArgs) {
    if let Some(url) = &options.url {
        config.source_url = url.clone();
    }

    if let Some(source) = &options.source {
        config.local_source = Some(source.clone());
    }

    if !options.intervals.is_empty() {
        config.intervals = options.intervals.clone();
    }

    if let Some(language) = &options.language {
        config.subtitle_language = language.clone();
    }

    if let Some(output) = &options.output {
        config.output_path = output.clone();
    }

    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }
}

async fn run_pipeline(options: RunArgs) -> Result<()> {
    // If log level is set via command line, apply it immediately
    if let Some(cmd_log_level) = &options.log_level {
        log::set_max_level(level_filter(&cmd_log_level.clone().into()));
    }

    let mut config = load_or_create_config(&options.config_path)?;
    apply_overrides(&mut config, &options);

    // Validate the configuration after loading and overriding
    config.validate()
        .context("Configuration validation failed")?;

    log::set_max_level(level_filter(&config.log_level));

    let controller = Controller::with_config(config)?;
    controller.run(options.force_overwrite).await?;

    Ok(())
}

fn run_preview(options: PreviewArgs) -> Result<()> {
    // Preview never writes a config file
    let config = if Path::new(&options.config_path).exists() {
        Config::from_file(&options.config_path)?
    } else {
        Config::default()
    };

    let intervals = if options.intervals.is_empty() {
        config.intervals.clone()
    } else {
        options.intervals
    };
    let render: &RenderConfig = &config.render;

    let report = Controller::preview(&options.subtitles, &intervals, render)?;

    info!("{} clip(s), {} caption(s)", report.spans.len(), report.cues.len());

    let mut stdout = std::io::stdout();
    writeln!(stdout, "Clips:")?;
    for span in &report.spans {
        writeln!(
            stdout,
            "  #{} seek {} for {:.1}s",
            span.index + 1,
            span.seek,
            span.duration_secs
        )?;
    }

    writeln!(stdout, "Captions:")?;
    for cue in &report.cues {
        let (start, end) = cue.window()?;
        writeln!(
            stdout,
            "  {} --> {}  {}",
            format_timecode(start),
            format_timecode(end),
            cue.text
        )?;
    }

    writeln!(stdout, "Filter chain:")?;
    for filter in &report.filters {
        writeln!(stdout, "  {}", filter)?;
    }

    Ok(())
}
