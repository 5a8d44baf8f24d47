//! CLI commands and argument parsing

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Singer tap for the Snapchat Marketing API
#[derive(Parser, Debug)]
#[command(name = "tap-snapchat-ads")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Inline config JSON, takes precedence over --config
    #[arg(long, global = true)]
    pub config_json: Option<String>,

    /// State file (JSON), rewritten as bookmarks advance
    #[arg(short, long, global = true)]
    pub state: Option<PathBuf>,

    /// Inline state JSON
    #[arg(long, global = true)]
    pub state_json: Option<String>,

    /// Catalog file (JSON) with stream selections
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,

    /// Output format for discover, check and streams
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Test the credentials against the API
    Check,

    /// Print the catalog of every stream
    Discover,

    /// Replicate the selected streams as Singer messages
    Sync {
        /// Streams to select (comma-separated), overrides catalog selection
        #[arg(long)]
        streams: Option<String>,
    },

    /// List stream names with their parent and replication method
    Streams,
}

/// Output format for non-sync commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// One JSON document per line
    #[default]
    Json,
    /// Pretty-printed JSON
    Pretty,
}

/// Split a comma-separated `--streams` value, dropping blanks
pub fn parse_stream_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
