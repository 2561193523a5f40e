// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # tap-gladly
//!
//! Extracts data from the Gladly REST API: export jobs, the files each
//! completed job produced (conversation items split by content type,
//! conversations, topics), plus inboxes, agents and a work-session report.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use futures::StreamExt;
//! use tap_gladly::{Connector, GladlyTap, Result, TapConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = TapConfig::from_json(r#"{
//!         "api_url_base": "https://acme.gladly.com/api/v1",
//!         "username": "agent@acme.com",
//!         "password": "...",
//!         "start_date": "2024-01-01T00:00:00Z",
//!         "max_job_lookback": 7
//!     }"#)?;
//!
//!     let tap = GladlyTap::new()?;
//!     let streams = vec!["jobs".to_string(), "conversation_items_chat_message".to_string()];
//!     let mut messages = tap.read(&config, Some(&streams)).await?;
//!     while let Some(message) = messages.next().await {
//!         println!("{}", message?.to_line()?);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Connector Interface                         │
//! │  spec() → SpecConfig   check() → CheckResult   discover()       │
//! │  read(config, streams) → Stream<Message>                        │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬───────────┬─────────────┐
//! │  Loader  │  Streams  │    Engine     │  Filter   │   Schema    │
//! ├──────────┼───────────┼───────────────┼───────────┼─────────────┤
//! │ YAML     │ Jobs      │ Depth first   │ Content   │ Registry    │
//! │ Catalog  │ Context   │ Lookback gate │ Window    │ Validation  │
//! │ Checks   │ Selection │ Sinks         │ Lookback  │             │
//! └──────────┴───────────┴───────────────┴───────────┴─────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the tap
pub mod error;

/// Common types and type aliases
pub mod types;

/// Basic authentication
pub mod auth;

/// HTTP client with retry and rate limiting
pub mod http;

/// Response decoders (JSON, JSONL, CSV)
pub mod decode;

/// Record filters: content type, date window, job lookback
pub mod filter;

/// Sync engine
pub mod engine;

/// Tap configuration and catalog types
pub mod config;

/// Connector trait and the Gladly tap
pub mod connector;

/// YAML stream catalog
pub mod loader;

/// Placeholder templates
pub mod template;

/// Command-line interface
pub mod cli;

/// JSON schemas and record validation
pub mod schema;

/// Streams, export jobs and job contexts
pub mod streams;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::TapConfig;
pub use connector::{CheckResult, Connector, GladlyTap, MessageStream};
pub use engine::{Message, MessageSink, SyncEngine, SyncStats};
pub use streams::{ContentType, JobContext, StreamCatalog};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
