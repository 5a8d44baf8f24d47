//! CLI module
//!
//! Command-line interface for running the tap.
//!
//! # Commands
//!
//! - `check` - Refresh the access token and fetch `me`
//! - `discover` - Print the catalog of every stream
//! - `sync` - Replicate selected streams as Singer messages
//! - `streams` - List stream names with parent and replication method

mod commands;
mod runner;

pub use commands::{parse_stream_list, Cli, Commands, OutputFormat};
pub use runner::{check_connection, Runner};
