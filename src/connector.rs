//! Connector trait and the Gladly tap
//!
//! Defines the operations a tap exposes (`spec`, `check`, `discover`,
//! `read`) and implements them over the stream catalog.

use crate::config::{Catalog, SpecConfig, TapConfig};
use crate::engine::{Message, SyncEngine};
use crate::error::Result;
use crate::http::HttpClient;
use crate::loader::{builtin_catalog, CatalogDefinition};
use crate::schema::SchemaRegistry;
use crate::streams::StreamCatalog;
use async_trait::async_trait;
use futures::channel::mpsc;
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use tracing::{debug, info};

/// Stream probed by `check` when the catalog has it
const CHECK_STREAM: &str = "agents";

// ============================================================================
// Connector Spec
// ============================================================================

/// Connector specification returned by spec()
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorSpec {
    /// Connector name
    pub name: String,

    /// Connector version
    pub version: String,

    /// Human-readable title
    pub title: String,

    /// Configuration specification
    pub spec: SpecConfig,
}

// ============================================================================
// Check Result
// ============================================================================

/// Result of a connection check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    /// Whether the check succeeded
    pub success: bool,

    /// Error message if failed
    pub message: Option<String>,
}

impl CheckResult {
    /// Create a successful check result
    pub fn success() -> Self {
        Self {
            success: true,
            message: None,
        }
    }

    /// Create a failed check result
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
        }
    }
}

// ============================================================================
// Connector Trait
// ============================================================================

/// Type alias for the message stream returned by read()
pub type MessageStream = Pin<Box<dyn Stream<Item = Result<Message>> + Send>>;

/// Operations every tap supports
#[async_trait]
pub trait Connector: Send + Sync {
    /// Returns the connector specification
    fn spec(&self) -> ConnectorSpec;

    /// Tests if credentials and configuration are valid
    async fn check(&self, config: &TapConfig) -> Result<CheckResult>;

    /// Lists available streams with their schemas
    async fn discover(&self, config: &TapConfig) -> Result<Catalog>;

    /// Reads data from selected streams; `None` selects every stream.
    ///
    /// The stream yields SCHEMA messages first, then records in sync order.
    /// A failed sync ends the stream with its error.
    async fn read(&self, config: &TapConfig, streams: Option<&[String]>)
        -> Result<MessageStream>;
}

// ============================================================================
// Gladly Tap
// ============================================================================

/// Tap over the Gladly export and reporting APIs
#[derive(Debug)]
pub struct GladlyTap {
    definition: CatalogDefinition,
    schemas: SchemaRegistry,
}

impl GladlyTap {
    /// Create the tap with its built-in catalog and schemas
    pub fn new() -> Result<Self> {
        Ok(Self::with_definition(
            builtin_catalog()?,
            SchemaRegistry::builtin()?,
        ))
    }

    /// Create a tap over a custom catalog
    pub fn with_definition(definition: CatalogDefinition, schemas: SchemaRegistry) -> Self {
        Self {
            definition,
            schemas,
        }
    }

    /// Catalog definition
    pub fn definition(&self) -> &CatalogDefinition {
        &self.definition
    }

    /// Runtime streams for a config
    pub fn streams(&self, config: &TapConfig) -> Result<StreamCatalog> {
        StreamCatalog::build(&self.definition, config, &self.schemas)
    }

    fn client(config: &TapConfig) -> Result<HttpClient> {
        HttpClient::with_auth(config.http_client_config(), config.auth.clone())
    }
}

#[async_trait]
impl Connector for GladlyTap {
    fn spec(&self) -> ConnectorSpec {
        ConnectorSpec {
            name: self.definition.name.clone(),
            version: self.definition.version.clone(),
            title: "Gladly".to_string(),
            spec: TapConfig::spec(),
        }
    }

    async fn check(&self, config: &TapConfig) -> Result<CheckResult> {
        let catalog = self.streams(config)?;
        let probe = catalog
            .get(CHECK_STREAM)
            .filter(|s| s.is_root())
            .or_else(|| catalog.roots().next());

        let Some(probe) = probe else {
            return Ok(CheckResult::failure("Catalog has no root stream to probe"));
        };

        let path = probe.request_path(None)?;
        info!(stream = probe.name(), "Checking connection");

        let client = Self::client(config)?;
        match client.get(&path).await {
            Ok(_) => Ok(CheckResult::success()),
            Err(e) if e.is_config() => Err(e),
            Err(e) => Ok(CheckResult::failure(format!("Connection failed: {e}"))),
        }
    }

    async fn discover(&self, config: &TapConfig) -> Result<Catalog> {
        Ok(self.streams(config)?.to_catalog())
    }

    async fn read(
        &self,
        config: &TapConfig,
        streams: Option<&[String]>,
    ) -> Result<MessageStream> {
        let catalog = self.streams(config)?;
        let selection = catalog.select(streams)?;
        let client = Self::client(config)?;
        let config = config.clone();

        let (mut tx, rx) = mpsc::unbounded();
        tokio::spawn(async move {
            let mut engine = SyncEngine::new(client, config);
            if let Err(e) = engine.run(&catalog, &selection, &mut tx).await {
                if tx.unbounded_send(Err(e)).is_err() {
                    debug!("Reader went away before the sync failed");
                }
            }
        });

        Ok(Box::pin(rx))
    }
}
