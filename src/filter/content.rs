//! Content-type filter
//!
//! Export files mix every kind of conversation activity in one file; each
//! content-item stream keeps only the records whose `content.type` matches
//! its configured sub-type.

use crate::error::{Error, Result};
use crate::types::lookup;
use serde_json::Value;

/// Path of the discriminator inside a content record
pub const CONTENT_TYPE_PATH: &str = "content.type";

/// Whether `record.content.type` equals `expected`, ignoring ASCII case.
///
/// A record without the discriminator never matches.
pub fn matches(record: &Value, expected: &str) -> bool {
    content_type_of(record).is_some_and(|actual| actual.eq_ignore_ascii_case(expected))
}

/// Read the discriminator of a content record
pub fn content_type_of(record: &Value) -> Option<&str> {
    lookup(record, CONTENT_TYPE_PATH).and_then(Value::as_str)
}

/// Per-stream content filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentFilter {
    expected: String,
}

impl ContentFilter {
    /// Create a filter for one content sub-type
    pub fn new(expected: impl Into<String>) -> Self {
        Self {
            expected: expected.into(),
        }
    }

    /// The sub-type this filter keeps
    pub fn expected(&self) -> &str {
        &self.expected
    }

    /// Decide whether a record belongs to this filter's sub-type.
    ///
    /// Every line of an export file carries `content.type`; a record without
    /// it is malformed input and fails the sync instead of being dropped.
    pub fn check(&self, record: &Value) -> Result<bool> {
        match content_type_of(record) {
            Some(actual) => Ok(actual.eq_ignore_ascii_case(&self.expected)),
            None => Err(Error::decode(format!(
                "record has no '{CONTENT_TYPE_PATH}' discriminator (expected '{}')",
                self.expected
            ))),
        }
    }
}
