//! Record parser module
//!
//! Supports: JSON, JSONL, CSV
//!
//! # Overview
//!
//! Turns a raw response body into a lazy sequence of record mappings.
//! JSON bodies are parsed once and a record path selects the array to walk;
//! JSONL and CSV bodies are parsed line by line as the sequence is pulled.

mod decoders;
mod types;

pub use decoders::{CsvDecoder, JsonDecoder, JsonlDecoder};
pub use types::{DecoderConfig, DecoderFormat, RecordDecoder, RecordIter};

#[cfg(test)]
mod tests;
