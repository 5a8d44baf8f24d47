//! Message sinks

use super::message::Message;
use crate::error::{Error, Result};
use crate::types::JsonObject;
use std::io::Write;
use std::sync::Mutex;

/// Destination for tap output
pub trait MessageWriter: Send + Sync {
    /// Write one message
    fn write(&self, message: &Message) -> Result<()>;
}

/// Writes one JSON document per line, flushing after each
#[derive(Debug)]
pub struct JsonLinesWriter<W: Write + Send> {
    inner: Mutex<W>,
}

impl<W: Write + Send> JsonLinesWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner: Mutex::new(inner),
        }
    }

    /// Recover the underlying writer
    pub fn into_inner(self) -> Result<W> {
        self.inner
            .into_inner()
            .map_err(|_| Error::output("writer lock poisoned"))
    }
}

impl JsonLinesWriter<std::io::Stdout> {
    /// Writer for the process's standard output
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> MessageWriter for JsonLinesWriter<W> {
    fn write(&self, message: &Message) -> Result<()> {
        let line = serde_json::to_string(message)
            .map_err(|e| Error::output(format!("Failed to serialize message: {e}")))?;
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| Error::output("writer lock poisoned"))?;
        writeln!(inner, "{line}")?;
        inner.flush()?;
        Ok(())
    }
}

/// Collects messages in memory
#[derive(Debug, Default)]
pub struct MemoryWriter {
    messages: Mutex<Vec<Message>>,
}

impl MemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far
    pub fn messages(&self) -> Vec<Message> {
        self.messages
            .lock()
            .map(|m| m.clone())
            .unwrap_or_default()
    }

    /// Records written for one stream, in order
    pub fn records(&self, stream: &str) -> Vec<JsonObject> {
        self.messages()
            .into_iter()
            .filter_map(|m| match m {
                Message::Record {
                    stream: s, record, ..
                } if s == stream => Some(record),
                _ => None,
            })
            .collect()
    }

    /// Streams that received a SCHEMA message, in order
    pub fn schema_streams(&self) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter_map(|m| match m {
                Message::Schema { stream, .. } => Some(stream),
                _ => None,
            })
            .collect()
    }

    /// Value of the last STATE message
    pub fn last_state(&self) -> Option<serde_json::Value> {
        self.messages().into_iter().rev().find_map(|m| match m {
            Message::State { value } => Some(value),
            _ => None,
        })
    }
}

impl MessageWriter for MemoryWriter {
    fn write(&self, message: &Message) -> Result<()> {
        self.messages
            .lock()
            .map_err(|_| Error::output("writer lock poisoned"))?
            .push(message.clone());
        Ok(())
    }
}
