use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Meeting recorder & transcriber
#[derive(Debug, Parser)]
#[command(name = "meetrec", version, about)]
pub struct Cli {
    /// Suppress progress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a TOML settings file
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List audio devices
    Devices {
        #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
        format: OutputFormat,
    },

    /// Record a meeting
    Record {
        /// Device id to record from (defaults to the system input device)
        #[arg(short, long)]
        device: Option<usize>,

        /// Stop automatically after this many seconds
        #[arg(short = 't', long)]
        duration: Option<u64>,

        /// Transcribe the recording once it is saved
        #[arg(long)]
        auto_transcribe: bool,
    },

    /// List recordings
    List {
        #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
        format: OutputFormat,

        /// Show at most this many recordings
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Transcribe a recording
    Transcribe {
        /// Audio file to transcribe
        file: PathBuf,
    },

    /// Print a transcript
    Show {
        /// Audio file or transcript file
        file: PathBuf,

        /// Print only the first N lines
        #[arg(long)]
        lines: Option<usize>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    Tsv,
}
