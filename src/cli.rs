//! Command-line interface: argument parsing and logging configuration.

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use log::LevelFilter;

use voice_classify::config::AppConfig;

/// voice-classify - normalize audio to 16 kHz WAV and classify it
#[derive(Parser, Debug)]
#[command(name = "voice-classify")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Increase logging verbosity
    /// -v = info, -vv = debug, -vvv = trace
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Read settings from this file instead of the platform default
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Normalize audio files and send them to the classifier
    File {
        /// WAV files or headerless PCM (with --content-type); several files
        /// are classified in one request
        #[arg(required = true, num_args = 1..)]
        paths: Vec<PathBuf>,

        /// Override the detected content type of every file, e.g. "audio/pcm; rate=48000; channels=2"
        #[arg(long)]
        content_type: Option<String>,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Record from the default microphone, then normalize and classify
    #[cfg(feature = "capture")]
    Record {
        /// Recording length in seconds
        #[arg(long, default_value_t = 5.0)]
        seconds: f32,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Print the effective configuration as TOML
    Config {
        /// Also write it to the settings file
        #[arg(long)]
        write: bool,
    },
}

/// Per-run overrides shared by `file` and `record`.
#[derive(ClapArgs, Debug, Clone, Default)]
pub struct RunArgs {
    /// Write the normalized WAV file here (a directory when several files
    /// are given)
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Skip the classification upload
    #[arg(long)]
    pub no_upload: bool,

    /// Target sample rate in Hz
    #[arg(long)]
    pub rate: Option<u32>,

    /// Target channel count
    #[arg(long)]
    pub channels: Option<u16>,

    /// Classifier endpoint URL
    #[arg(long)]
    pub endpoint: Option<String>,
}

impl RunArgs {
    /// Fold the command-line overrides into `config`.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(rate) = self.rate {
            config.audio.target_sample_rate = rate;
        }
        if let Some(channels) = self.channels {
            config.audio.target_channels = channels;
        }
        if let Some(endpoint) = &self.endpoint {
            config.upload.endpoint = endpoint.clone();
        }
        if self.no_upload {
            config.upload.enabled = false;
        }
    }
}

impl Args {
    /// Get the log level filter based on verbosity flags
    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            LevelFilter::Error
        } else {
            match self.verbose {
                0 => LevelFilter::Warn,
                1 => LevelFilter::Info,
                2 => LevelFilter::Debug,
                _ => LevelFilter::Trace,
            }
        }
    }
}

/// Initialize the logging system based on CLI arguments.  `RUST_LOG`, when
/// set, is applied on top.
pub fn init_logging(args: &Args) {
    let mut builder = env_logger::Builder::new();

    // Dependencies stay at warn.
    builder.filter_level(LevelFilter::Warn);
    builder.filter_module("voice_classify", args.log_level());

    builder.parse_env("RUST_LOG");
    builder.format_timestamp_millis().init();
}
