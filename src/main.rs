// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{error, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;

use subburn::app_config::{self, Config};
use subburn::app_controller::Controller;
use subburn::timestamp::Offset;

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

#[derive(Subcommand, Debug)]
enum Commands {
    /// Shift all subtitle timings by a number of seconds
    Shift {
        /// Input WebVTT file
        input: PathBuf,

        /// Output WebVTT file
        output: PathBuf,

        /// Seconds to shift (positive to delay, negative to advance)
        #[arg(allow_hyphen_values = true)]
        seconds: Offset,
    },

    /// Combine two WebVTT files, the second following the first
    Combine {
        /// First WebVTT file, kept as is
        first: PathBuf,

        /// Second WebVTT file, offset by FIRST_DURATION
        second: PathBuf,

        /// Output WebVTT file
        output: PathBuf,

        /// Duration of the first episode in seconds
        #[arg(allow_hyphen_values = true)]
        first_duration: Offset,
    },

    /// Convert a WebVTT file into a top-positioned ASS overlay script
    Convert {
        /// Input WebVTT file
        input: PathBuf,

        /// Output ASS file
        output: PathBuf,

        /// Time offset for subtitles in seconds
        #[arg(short, long, allow_hyphen_values = true, default_value = "0")]
        offset: Offset,
    },

    /// Burn subtitles into a video using the configured encoder
    Burn {
        /// Source video file
        video: PathBuf,

        /// WebVTT subtitle file
        subtitle: PathBuf,

        /// Output video file
        output: PathBuf,

        /// Time offset for subtitles in seconds
        #[arg(short, long, allow_hyphen_values = true, default_value = "0")]
        offset: Offset,

        /// Render only the first minute (configurable) for a quick check
        #[arg(long, alias = "debug")]
        preview: bool,
    },

    /// Generate shell completions for subburn
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// subburn - subtitle timing and burning
///
/// Shifts and combines WebVTT subtitle tracks with millisecond precision and
/// burns them into videos as top-positioned overlays.
#[derive(Parser, Debug)]
#[command(name = "subburn")]
#[command(version)]
#[command(about = "Subtitle timing adjuster and burner")]
#[command(long_about = "subburn shifts and combines WebVTT subtitles without precision loss and burns them into videos.

EXAMPLES:
    subburn shift ep1.vtt ep1.fixed.vtt -1.25          # Advance all cues by 1.25s
    subburn combine ep1.vtt ep2.vtt both.vtt 1420.5     # Append ep2 after a 1420.5s episode
    subburn convert ep1.vtt ep1.ass --offset 2          # Write an overlay script
    subburn burn ep1.mp4 ep1.vtt out/ep1.mp4 --preview  # Burn the first minute only
    subburn completions bash > subburn.bash             # Generate bash completions

CONFIGURATION:
    Overlay style and encoder settings are stored in conf.json by default. You can
    specify a different config file with --config. If the config file doesn't exist,
    a default one will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long = "config", global = true, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, global = true, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI colour for log level
    fn colour_for_level(level: Level) -> &'static str {
        match level {
            Level::Error => "\x1B[1;31m",
            Level::Warn => "\x1B[1;33m",
            Level::Info => "\x1B[1;32m",
            Level::Debug => "\x1B[1;36m",
            Level::Trace => "\x1B[1;35m",
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}{} {:<5} {}\x1B[0m",
                Self::colour_for_level(record.level()),
                now,
                record.level(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() {
    // Trace is the ceiling; the effective level is lowered once the config is known
    if let Err(e) = CustomLogger::init(LevelFilter::Trace) {
        eprintln!("Failed to initialize logger: {}", e);
    }
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: CommandLineOptions) -> Result<()> {
    if let Commands::Completions { shell } = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "subburn", &mut std::io::stdout());
        return Ok(());
    }

    // A command line log level applies before the config is even read
    if let Some(level) = &cli.log_level {
        let level: app_config::LogLevel = level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let mut config = Config::load_or_create(&cli.config_path)?;
    if let Some(level) = cli.log_level {
        config.log_level = level.into();
    }
    log::set_max_level(config.log_level.to_level_filter());

    let controller = Controller::with_config(config)?;

    match cli.command {
        Commands::Shift { input, output, seconds } => {
            controller.shift_file(&input, &output, seconds)?;
        }
        Commands::Combine { first, second, output, first_duration } => {
            controller.combine_files(&first, &second, &output, first_duration)?;
        }
        Commands::Convert { input, output, offset } => {
            controller.convert_file(&input, &output, offset)?;
        }
        Commands::Burn { video, subtitle, output, offset, preview } => {
            controller.burn(&video, &subtitle, &output, offset, preview).await?;
        }
        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}
