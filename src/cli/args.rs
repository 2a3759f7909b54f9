use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fanout")]
#[command(about = "Read an input once and fan it out to several concurrent consumers")]
#[command(version)]
pub struct Cli {
    /// JSON configuration file (channel_depth, thread_name_prefix)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute line, byte, longest-line and distinct-word statistics in one pass
    Stats {
        /// Input file (reads stdin when omitted)
        input: Option<PathBuf>,

        /// Buffer depth per consumer (overrides the config file)
        #[arg(short, long)]
        depth: Option<usize>,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Count matching lines for several patterns with a single read of the input
    Grep {
        /// Substrings to search for (one consumer per pattern)
        #[arg(required = true)]
        patterns: Vec<String>,

        /// Input file (reads stdin when omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Buffer depth per consumer (overrides the config file)
        #[arg(short, long)]
        depth: Option<usize>,

        /// Match case-insensitively
        #[arg(short = 'I', long)]
        ignore_case: bool,
    },
}
