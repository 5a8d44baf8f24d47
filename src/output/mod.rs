//! Output module
//!
//! Singer messages and the sinks they are written to.
//!
//! # Overview
//!
//! - `Message` - SCHEMA, RECORD and STATE lines
//! - `JsonLinesWriter` - newline-delimited JSON, stdout in production
//! - `MemoryWriter` - captures messages for inspection

mod message;
mod writer;

pub use message::Message;
pub use writer::{JsonLinesWriter, MemoryWriter, MessageWriter};

/// Writer for standard output
pub type StdoutWriter = JsonLinesWriter<std::io::Stdout>;
