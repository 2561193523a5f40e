//! Record filtering module
//!
//! Post-processing applied between parsing and emission:
//! - `ContentFilter` - keep one `content.type` sub-type
//! - `DateWindow` - keep records whose timestamp lies in `[start, end]`
//! - `JobLookbackGate` - skip child fetches for jobs that are too old
//!
//! Exclusion is never an error. Malformed input (missing discriminator,
//! unparseable timestamp) is.

mod content;
mod lookback;
mod window;

pub use content::{content_type_of, matches, ContentFilter, CONTENT_TYPE_PATH};
pub use lookback::{job_age_days, JobLookbackGate, LookbackDecision};
pub use window::{in_window, parse_timestamp, DateWindow};

use crate::error::Result;
use serde_json::Value;

/// Filter chain applied to every record of one stream
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    content: Option<ContentFilter>,
    window: Option<(String, DateWindow)>,
}

impl RecordFilter {
    /// A filter that keeps everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only one content sub-type
    #[must_use]
    pub fn with_content(mut self, filter: ContentFilter) -> Self {
        self.content = Some(filter);
        self
    }

    /// Keep only records whose `field` timestamp lies in `window`
    #[must_use]
    pub fn with_window(mut self, field: impl Into<String>, window: DateWindow) -> Self {
        self.window = Some((field.into(), window));
        self
    }

    /// Content filter, if any
    pub fn content(&self) -> Option<&ContentFilter> {
        self.content.as_ref()
    }

    /// Whether no predicate is configured
    pub fn is_pass_through(&self) -> bool {
        self.content.is_none() && self.window.is_none()
    }

    /// Run the chain; `Ok(false)` excludes the record
    pub fn accepts(&self, record: &Value) -> Result<bool> {
        if let Some(content) = &self.content {
            if !content.check(record)? {
                return Ok(false);
            }
        }

        if let Some((field, window)) = &self.window {
            if !window.check(record, field)? {
                return Ok(false);
            }
        }

        Ok(true)
    }
}
