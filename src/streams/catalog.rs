//! Parent/child graph of runtime streams

use super::stream::TapStream;
use crate::config::{Catalog, TapConfig};
use crate::error::{Error, Result};
use crate::loader::{CatalogDefinition, StreamKind};
use crate::schema::SchemaRegistry;
use std::collections::HashSet;
use tracing::debug;

/// Every stream of the tap, in catalog order
#[derive(Debug)]
pub struct StreamCatalog {
    streams: Vec<TapStream>,
}

impl StreamCatalog {
    /// Build the runtime streams for a config.
    ///
    /// With `content_type` configured, conversation-items streams for every
    /// other content type are left out.
    pub fn build(
        def: &CatalogDefinition,
        config: &TapConfig,
        schemas: &SchemaRegistry,
    ) -> Result<Self> {
        let mut streams = Vec::new();

        for stream_def in def.all_streams() {
            if let (StreamKind::ContentItems, Some(wanted), Some(actual)) =
                (stream_def.kind, config.content_type, stream_def.content_type)
            {
                if wanted != actual {
                    debug!(stream = %stream_def.name, "Content type {} not selected", actual);
                    continue;
                }
            }
            streams.push(TapStream::from_definition(&stream_def, config, schemas)?);
        }

        Ok(Self { streams })
    }

    /// All streams
    pub fn streams(&self) -> &[TapStream] {
        &self.streams
    }

    /// Stream names, in catalog order
    pub fn names(&self) -> Vec<&str> {
        self.streams.iter().map(TapStream::name).collect()
    }

    /// Look up a stream
    pub fn get(&self, name: &str) -> Option<&TapStream> {
        self.streams.iter().find(|s| s.name() == name)
    }

    /// Streams without a parent
    pub fn roots(&self) -> impl Iterator<Item = &TapStream> {
        self.streams.iter().filter(|s| s.is_root())
    }

    /// Direct children of a stream
    pub fn children<'a>(&'a self, parent: &'a str) -> impl Iterator<Item = &'a TapStream> + 'a {
        self.streams
            .iter()
            .filter(move |s| s.parent() == Some(parent))
    }

    /// Resolve a stream selection; `None` or empty selects everything
    pub fn select(&self, names: Option<&[String]>) -> Result<Selection> {
        let Some(names) = names.filter(|n| !n.is_empty()) else {
            return Ok(Selection::all(self));
        };

        let mut selected = HashSet::new();
        for name in names {
            if self.get(name).is_none() {
                return Err(Error::StreamNotFound {
                    stream: name.clone(),
                });
            }
            selected.insert(name.clone());
        }
        Ok(Selection { selected })
    }

    /// Catalog for `discover`
    pub fn to_catalog(&self) -> Catalog {
        Catalog {
            streams: self.streams.iter().map(TapStream::to_catalog_stream).collect(),
        }
    }
}

/// Streams chosen for a sync
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    selected: HashSet<String>,
}

impl Selection {
    /// Select every stream in the catalog
    pub fn all(catalog: &StreamCatalog) -> Self {
        Self {
            selected: catalog.names().into_iter().map(String::from).collect(),
        }
    }

    /// Whether a stream emits records
    pub fn contains(&self, name: &str) -> bool {
        self.selected.contains(name)
    }

    /// Whether a parent has to run: it is selected or drives a selected child
    pub fn requires(&self, catalog: &StreamCatalog, stream: &TapStream) -> bool {
        self.contains(stream.name())
            || catalog
                .children(stream.name())
                .any(|child| self.contains(child.name()))
    }

    /// Number of selected streams
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    /// Whether nothing is selected
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}
