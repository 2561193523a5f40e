//! Streams module
//!
//! The tap's stream graph: export jobs at the root, per-job export files
//! as children, plus a few reference and report streams.
//!
//! - `ContentType` - conversation-item sub-types and their schema ids
//! - `Job` / `JobContext` - what a job record hands to its children
//! - `TapStream` - one fetchable stream
//! - `StreamCatalog` - all streams and their parent/child relations

mod catalog;
mod content_type;
mod job;
mod stream;

pub use catalog::{Selection, StreamCatalog};
pub use content_type::ContentType;
pub use job::{Job, JobContext, JobParameters, JobStatus};
pub use stream::TapStream;
