//! YAML Loader module
//!
//! Parse stream catalogs from YAML.
//!
//! # Overview
//!
//! The loader module provides:
//! - `CatalogDefinition` - Declarative list of the tap's streams
//! - `StreamDefinition` - One stream's request, decoder and schema
//! - `ContentStreamsDefinition` - A stream template expanded per content type
//! - YAML parsing with validation

mod parser;
mod types;

pub use parser::{builtin_catalog, load_catalog, load_catalog_from_str, GLADLY_CATALOG};
pub use types::{
    CatalogDefinition, ContentStreamsDefinition, DateWindowDefinition, RequestDefinition,
    StreamDefinition, StreamKind,
};
