//! CLI module
//!
//! Command-line interface for running the tap.
//!
//! # Commands
//!
//! - `spec` - Show the configuration specification
//! - `check` - Test connection to the API
//! - `discover` - Print streams and their schemas
//! - `streams` - List stream names (lightweight)
//! - `read` - Extract data from streams

mod commands;
mod runner;

pub use commands::{parse_stream_list, Cli, Commands, OutputFormat};
pub use runner::Runner;
