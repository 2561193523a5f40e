//! Runtime stream built from a catalog definition

use super::content_type::ContentType;
use super::job::JobContext;
use crate::config::{CatalogStream, TapConfig};
use crate::decode::RecordDecoder;
use crate::error::{Error, Result};
use crate::filter::{ContentFilter, RecordFilter};
use crate::http::RequestConfig;
use crate::loader::{StreamDefinition, StreamKind};
use crate::schema::{JsonSchema, SchemaRegistry};
use crate::template;
use crate::types::{JsonValue, Method, ReplicationMethod, StringMap};

/// One stream of the tap, ready to fetch
#[derive(Debug)]
pub struct TapStream {
    name: String,
    parent: Option<String>,
    method: Method,
    path: String,
    params: StringMap,
    body: Option<JsonValue>,
    decoder: Box<dyn RecordDecoder>,
    filter: RecordFilter,
    schema: JsonSchema,
    primary_key: Vec<String>,
    replication_key: Option<String>,
    content_type: Option<ContentType>,
}

impl TapStream {
    /// Build a stream from its definition.
    ///
    /// A `content_items` stream without a content type is a configuration
    /// error, as is a schema id missing from the registry.
    pub fn from_definition(
        def: &StreamDefinition,
        config: &TapConfig,
        schemas: &SchemaRegistry,
    ) -> Result<Self> {
        let mut filter = RecordFilter::new();

        if def.kind == StreamKind::ContentItems {
            let content_type = def.content_type.ok_or_else(|| {
                Error::config(format!(
                    "Stream '{}' reads conversation items but has no content type",
                    def.name
                ))
            })?;
            filter = filter.with_content(ContentFilter::new(content_type.as_str()));
        }

        if let Some(window) = &def.date_window {
            filter = filter.with_window(window.field.clone(), config.window);
        }

        Ok(Self {
            name: def.name.clone(),
            parent: def.parent.clone(),
            method: def.request.method,
            path: def.request.path.clone(),
            params: def.request.params.clone(),
            body: def.request.body.clone(),
            decoder: def.decoder.build(),
            filter,
            schema: schemas.get(&def.schema)?.clone(),
            primary_key: def.primary_key.clone(),
            replication_key: def.replication_key.clone(),
            content_type: def.content_type,
        })
    }

    /// Stream name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parent stream name
    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Whether the stream runs without a parent context
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// HTTP method
    pub fn method(&self) -> Method {
        self.method
    }

    /// Content type of a conversation-items stream
    pub fn content_type(&self) -> Option<ContentType> {
        self.content_type
    }

    /// Record schema
    pub fn schema(&self) -> &JsonSchema {
        &self.schema
    }

    /// Primary key fields
    pub fn primary_key(&self) -> &[String] {
        &self.primary_key
    }

    /// Replication key
    pub fn replication_key(&self) -> Option<&str> {
        self.replication_key.as_deref()
    }

    /// Replication method implied by the replication key
    pub fn replication_method(&self) -> ReplicationMethod {
        if self.replication_key.is_some() {
            ReplicationMethod::Incremental
        } else {
            ReplicationMethod::FullTable
        }
    }

    /// Response decoder
    pub fn decoder(&self) -> &dyn RecordDecoder {
        self.decoder.as_ref()
    }

    /// Record filter chain
    pub fn filter(&self) -> &RecordFilter {
        &self.filter
    }

    /// Export file this stream reads, e.g. `topics.jsonl`
    pub fn file_name(&self) -> Option<&str> {
        self.path
            .rsplit('/')
            .next()
            .filter(|segment| segment.contains('.') && !template::has_placeholders(segment))
    }

    /// Variables the request path references
    pub fn path_variables(&self) -> Vec<String> {
        template::placeholders(&self.path)
    }

    /// Request path with context values substituted
    pub fn request_path(&self, context: Option<&JobContext>) -> Result<String> {
        let vars = context.map(JobContext::template_vars).unwrap_or_default();
        template::render(&self.path, &vars)
    }

    /// Query parameters and body for one request.
    ///
    /// Streams with a replication key ask for ascending order on it.
    pub fn request_config(&self, body_vars: &StringMap) -> Result<RequestConfig> {
        let mut request = RequestConfig::new();
        for (key, value) in &self.params {
            request = request.query(key.clone(), value.clone());
        }

        if let Some(key) = &self.replication_key {
            request = request.query("sort", "asc").query("order_by", key.clone());
        }

        if let Some(body) = &self.body {
            request = request.json(template::render_value(body, body_vars)?);
        }

        Ok(request)
    }

    /// Catalog entry for `discover`
    pub fn to_catalog_stream(&self) -> CatalogStream {
        CatalogStream {
            stream: self.name.clone(),
            parent_stream: self.parent.clone(),
            schema: self.schema.to_json(),
            key_properties: self.primary_key.clone(),
            replication_key: self.replication_key.clone(),
            replication_method: self.replication_method(),
        }
    }
}
