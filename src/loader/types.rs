//! Loader types
//!
//! Declarative stream catalog types for YAML parsing.

use crate::decode::DecoderConfig;
use crate::streams::ContentType;
use crate::types::{JsonValue, Method, StringMap};
use serde::{Deserialize, Serialize};

// ============================================================================
// Catalog Definition
// ============================================================================

/// Top-level stream catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CatalogDefinition {
    /// Tap name
    pub name: String,
    /// Catalog version
    #[serde(default = "default_version")]
    pub version: String,
    /// Plain stream definitions
    #[serde(default)]
    pub streams: Vec<StreamDefinition>,
    /// Table of conversation-item streams, one per content type
    #[serde(default)]
    pub content_streams: Option<ContentStreamsDefinition>,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

impl CatalogDefinition {
    /// All stream definitions, with the content-stream table expanded
    pub fn all_streams(&self) -> Vec<StreamDefinition> {
        let mut streams = self.streams.clone();
        if let Some(table) = &self.content_streams {
            streams.extend(table.expand());
        }
        streams
    }
}

// ============================================================================
// Stream Definition
// ============================================================================

/// Kind of stream, driving extra setup checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    /// Records are emitted as parsed
    #[default]
    Plain,
    /// Conversation items restricted to one content type
    ContentItems,
}

/// Stream definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StreamDefinition {
    /// Stream name
    pub name: String,
    /// Parent stream providing the job context
    #[serde(default)]
    pub parent: Option<String>,
    /// Request configuration
    pub request: RequestDefinition,
    /// Response decoder
    #[serde(default)]
    pub decoder: DecoderConfig,
    /// Primary key fields
    #[serde(default)]
    pub primary_key: Vec<String>,
    /// Replication key; when set, requests ask for ascending order on it
    #[serde(default)]
    pub replication_key: Option<String>,
    /// Schema identifier
    pub schema: String,
    /// Date-window filter
    #[serde(default)]
    pub date_window: Option<DateWindowDefinition>,
    /// Stream kind
    #[serde(default)]
    pub kind: StreamKind,
    /// Content type, required for `content_items` streams
    #[serde(default)]
    pub content_type: Option<ContentType>,
}

/// Request configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RequestDefinition {
    /// HTTP method
    #[serde(default)]
    pub method: Method,
    /// URL path template, relative to `api_url_base`
    pub path: String,
    /// Query parameters
    #[serde(default)]
    pub params: StringMap,
    /// JSON body template for POST requests
    #[serde(default)]
    pub body: Option<JsonValue>,
}

/// Date-window filter configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindowDefinition {
    /// Dot path of the timestamp field
    pub field: String,
}

// ============================================================================
// Content Streams
// ============================================================================

/// One stream definition shared by every content type
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ContentStreamsDefinition {
    /// Stream names are `<name_prefix><content_type>`
    pub name_prefix: String,
    /// Parent stream
    pub parent: String,
    /// Request configuration
    pub request: RequestDefinition,
    /// Response decoder
    #[serde(default)]
    pub decoder: DecoderConfig,
    /// Primary key fields
    #[serde(default)]
    pub primary_key: Vec<String>,
    /// Replication key
    #[serde(default)]
    pub replication_key: Option<String>,
    /// Date-window filter
    #[serde(default)]
    pub date_window: Option<DateWindowDefinition>,
    /// Content types to generate streams for
    pub types: Vec<ContentType>,
}

impl ContentStreamsDefinition {
    /// One `content_items` stream per listed type
    pub fn expand(&self) -> Vec<StreamDefinition> {
        self.types
            .iter()
            .map(|content_type| StreamDefinition {
                name: format!("{}{}", self.name_prefix, content_type),
                parent: Some(self.parent.clone()),
                request: self.request.clone(),
                decoder: self.decoder.clone(),
                primary_key: self.primary_key.clone(),
                replication_key: self.replication_key.clone(),
                schema: content_type.schema_id().to_string(),
                date_window: self.date_window.clone(),
                kind: StreamKind::ContentItems,
                content_type: Some(*content_type),
            })
            .collect()
    }
}
