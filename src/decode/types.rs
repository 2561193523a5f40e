//! Decoder types and traits
//!
//! Defines the record parser abstraction and the catalog-facing decoder config.

use super::decoders::{CsvDecoder, JsonDecoder, JsonlDecoder};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lazy sequence of parsed records borrowed from a response body.
///
/// The iterator is finite and cannot be restarted; the first `Err` it yields
/// is fatal for the sync and consumers stop pulling after it.
pub type RecordIter<'a> = Box<dyn Iterator<Item = Result<Value>> + Send + 'a>;

/// Shape of a response body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecoderFormat {
    /// A JSON document; a path selects the record array
    #[default]
    Json,
    /// Newline-delimited JSON, one record per line
    Jsonl,
    /// CSV with a header row
    Csv,
}

/// Decoder configuration as declared in the stream catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DecoderConfig {
    /// JSON decoder
    Json {
        /// Path to the record array (`$[*]`, `data.items`, `$.data[*]`)
        #[serde(default)]
        records_path: Option<String>,
    },
    /// JSONL decoder
    Jsonl,
    /// CSV decoder
    Csv {
        /// Field delimiter
        #[serde(default = "default_csv_delimiter")]
        delimiter: char,
    },
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self::Json { records_path: None }
    }
}

fn default_csv_delimiter() -> char {
    ','
}

impl DecoderConfig {
    /// JSON decoder with a record path
    pub fn json_with_path(path: impl Into<String>) -> Self {
        Self::Json {
            records_path: Some(path.into()),
        }
    }

    /// Format of this decoder
    pub fn format(&self) -> DecoderFormat {
        match self {
            Self::Json { .. } => DecoderFormat::Json,
            Self::Jsonl => DecoderFormat::Jsonl,
            Self::Csv { .. } => DecoderFormat::Csv,
        }
    }

    /// Build the decoder described by this config
    pub fn build(&self) -> Box<dyn RecordDecoder> {
        match self {
            Self::Json {
                records_path: Some(path),
            } => Box::new(JsonDecoder::with_path(path.clone())),
            Self::Json { records_path: None } => Box::new(JsonDecoder::new()),
            Self::Jsonl => Box::new(JsonlDecoder::new()),
            Self::Csv { delimiter } => Box::new(CsvDecoder::with_delimiter(*delimiter)),
        }
    }
}

/// Trait for turning response bodies into records
pub trait RecordDecoder: Send + Sync + std::fmt::Debug {
    /// Decode the response body into a lazy record sequence
    fn decode<'a>(&self, body: &'a str) -> Result<RecordIter<'a>>;

    /// Decode and collect every record, failing on the first bad one
    fn decode_all(&self, body: &str) -> Result<Vec<Value>> {
        self.decode(body)?.collect()
    }
}
