//! Engine types
//!
//! Message types, sinks and statistics for the sync engine.

use crate::error::{Error, Result};
use crate::streams::TapStream;
use crate::types::LogLevel;
use chrono::{DateTime, Utc};
use futures::channel::mpsc::UnboundedSender;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// A message emitted during sync, written as one JSON line
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    /// Schema of a stream, sent before its first record
    Schema {
        /// Stream name
        stream: String,
        /// JSON schema
        schema: Value,
        /// Primary key fields
        key_properties: Vec<String>,
        /// Replication key fields
        bookmark_properties: Vec<String>,
    },
    /// One validated record
    Record {
        /// Stream name
        stream: String,
        /// The record
        record: Value,
        /// When the record was fetched
        time_extracted: DateTime<Utc>,
    },
    /// Log message
    Log {
        /// Log level
        level: LogLevel,
        /// Log message
        message: String,
    },
}

impl Message {
    /// Create the schema message for a stream
    pub fn schema(stream: &TapStream) -> Self {
        Self::Schema {
            stream: stream.name().to_string(),
            schema: stream.schema().to_json(),
            key_properties: stream.primary_key().to_vec(),
            bookmark_properties: stream.replication_key().map(String::from).into_iter().collect(),
        }
    }

    /// Create a record message
    pub fn record(stream: impl Into<String>, record: Value, time_extracted: DateTime<Utc>) -> Self {
        Self::Record {
            stream: stream.into(),
            record,
            time_extracted,
        }
    }

    /// Create a log message
    pub fn log(level: LogLevel, message: impl Into<String>) -> Self {
        Self::Log {
            level,
            message: message.into(),
        }
    }

    /// Create an info log
    pub fn info(message: impl Into<String>) -> Self {
        Self::log(LogLevel::Info, message)
    }

    /// Create a warning log
    pub fn warn(message: impl Into<String>) -> Self {
        Self::log(LogLevel::Warn, message)
    }

    /// Stream the message belongs to
    pub fn stream(&self) -> Option<&str> {
        match self {
            Self::Schema { stream, .. } | Self::Record { stream, .. } => Some(stream),
            Self::Log { .. } => None,
        }
    }

    /// Check if this is a record message
    pub fn is_record(&self) -> bool {
        matches!(self, Self::Record { .. })
    }

    /// Check if this is a log message
    pub fn is_log(&self) -> bool {
        matches!(self, Self::Log { .. })
    }

    /// Convert to JSON value
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }

    /// Single-line JSON
    pub fn to_line(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Destination for messages as the engine produces them
pub trait MessageSink: Send {
    /// Accept one message; an error aborts the sync
    fn emit(&mut self, message: Message) -> Result<()>;
}

impl MessageSink for Vec<Message> {
    fn emit(&mut self, message: Message) -> Result<()> {
        self.push(message);
        Ok(())
    }
}

impl MessageSink for UnboundedSender<Result<Message>> {
    fn emit(&mut self, message: Message) -> Result<()> {
        let stream = message.stream().unwrap_or_default().to_string();
        self.unbounded_send(Ok(message))
            .map_err(|_| Error::SinkClosed { stream })
    }
}

/// Statistics from a sync operation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Records emitted, all streams
    pub records_emitted: usize,
    /// Records excluded by a filter
    pub records_filtered: usize,
    /// Records emitted per stream
    pub records_per_stream: BTreeMap<String, usize>,
    /// HTTP requests issued
    pub requests: usize,
    /// Parent records that produced a job context
    pub parent_contexts: usize,
    /// Child fetches skipped by the lookback gate
    pub child_fetches_skipped: usize,
    /// Child fetches skipped because the job did not list the file
    pub child_files_missing: usize,
    /// Child fetches skipped because the context lacked a path variable
    pub child_contexts_incomplete: usize,
    /// Child fetches served from a body already downloaded for the same job
    pub responses_reused: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl SyncStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Count an emitted record
    pub fn add_record(&mut self, stream: &str) {
        self.records_emitted += 1;
        *self.records_per_stream.entry(stream.to_string()).or_default() += 1;
    }

    /// Records emitted for one stream
    pub fn records_for(&self, stream: &str) -> usize {
        self.records_per_stream.get(stream).copied().unwrap_or(0)
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}
