//! YAML parser for stream catalogs
//!
//! Parses and validates catalog YAML. The tap ships one catalog embedded in
//! the binary; a custom file can be loaded for testing against other
//! deployments.

use crate::error::{Error, Result};
use crate::loader::types::{CatalogDefinition, StreamDefinition, StreamKind};
use crate::streams::{ContentType, JobContext};
use crate::template;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

/// The Gladly stream catalog embedded in the binary
pub const GLADLY_CATALOG: &str = include_str!("../../catalog/gladly.yaml");

/// Placeholders a request body may reference
const BODY_VARIABLES: [&str; 2] = ["start_date", "end_date"];

/// Load and validate the embedded catalog.
///
/// Unlike custom catalogs, the embedded one must provide a stream for every
/// content type.
pub fn builtin_catalog() -> Result<CatalogDefinition> {
    let def = load_catalog_from_str(GLADLY_CATALOG)?;
    validate_content_coverage(&def)?;
    Ok(def)
}

/// Load a catalog from a YAML file
pub fn load_catalog(path: impl AsRef<Path>) -> Result<CatalogDefinition> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        Error::config(format!(
            "Failed to read catalog file '{}': {}",
            path.display(),
            e
        ))
    })?;
    load_catalog_from_str(&content)
}

/// Load a catalog from a YAML string
pub fn load_catalog_from_str(yaml: &str) -> Result<CatalogDefinition> {
    let def: CatalogDefinition = serde_yaml::from_str(yaml)?;

    validate_catalog(&def)?;
    Ok(def)
}

/// Validate a catalog definition
fn validate_catalog(def: &CatalogDefinition) -> Result<()> {
    if def.name.is_empty() {
        return Err(Error::config("Catalog name cannot be empty"));
    }

    if let Some(table) = &def.content_streams {
        let unique: HashSet<_> = table.types.iter().collect();
        if unique.len() != table.types.len() {
            return Err(Error::config("Duplicate content type in content_streams"));
        }
    }

    let streams = def.all_streams();
    if streams.is_empty() {
        return Err(Error::config("Catalog must have at least one stream"));
    }

    let mut by_name: HashMap<&str, &StreamDefinition> = HashMap::new();
    for stream in &streams {
        if by_name.insert(stream.name.as_str(), stream).is_some() {
            return Err(Error::config(format!(
                "Duplicate stream name '{}'",
                stream.name
            )));
        }
    }

    for stream in &streams {
        validate_stream(stream)?;
        if let Some(parent) = &stream.parent {
            validate_parent(stream, parent, &by_name)?;
        }
    }

    Ok(())
}

/// Validate a single stream definition
fn validate_stream(stream: &StreamDefinition) -> Result<()> {
    if stream.name.is_empty() {
        return Err(Error::config("Stream name cannot be empty"));
    }

    if stream.request.path.is_empty() {
        return Err(Error::config(format!(
            "Stream '{}' path cannot be empty",
            stream.name
        )));
    }

    if stream.schema.is_empty() {
        return Err(Error::config(format!(
            "Stream '{}' must name a schema",
            stream.name
        )));
    }

    // Roots run without a context, so their paths must be literal
    let allowed: &[&str] = if stream.parent.is_some() {
        &JobContext::KEYS
    } else {
        &[]
    };
    for name in template::placeholders(&stream.request.path) {
        if !allowed.contains(&name.as_str()) {
            return Err(Error::config(format!(
                "Stream '{}' path references unknown variable '{{{}}}'",
                stream.name, name
            )));
        }
    }

    if let Some(body) = &stream.request.body {
        for name in template::json_placeholders(body) {
            if !BODY_VARIABLES.contains(&name.as_str()) {
                return Err(Error::config(format!(
                    "Stream '{}' body references unknown variable '{{{}}}'",
                    stream.name, name
                )));
            }
        }
    }

    if stream.kind == StreamKind::Plain && stream.content_type.is_some() {
        return Err(Error::config(format!(
            "Stream '{}' sets content_type but is not a content_items stream",
            stream.name
        )));
    }

    Ok(())
}

/// Children hang directly off a root stream
fn validate_parent(
    stream: &StreamDefinition,
    parent: &str,
    by_name: &HashMap<&str, &StreamDefinition>,
) -> Result<()> {
    let Some(parent_def) = by_name.get(parent) else {
        return Err(Error::config(format!(
            "Stream '{}' has unknown parent '{}'",
            stream.name, parent
        )));
    };

    if parent_def.parent.is_some() {
        return Err(Error::config(format!(
            "Stream '{}' has parent '{}' which is itself a child stream",
            stream.name, parent
        )));
    }

    Ok(())
}

/// Every content type must have a conversation-items stream
pub(super) fn validate_content_coverage(def: &CatalogDefinition) -> Result<()> {
    let covered: HashSet<ContentType> = def
        .content_streams
        .iter()
        .flat_map(|table| table.types.iter().copied())
        .chain(def.streams.iter().filter_map(|s| s.content_type))
        .collect();

    let missing: Vec<_> = ContentType::ALL
        .iter()
        .filter(|ct| !covered.contains(ct))
        .map(ContentType::as_str)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::config(format!(
            "Catalog has no stream for content types: {}",
            missing.join(", ")
        )))
    }
}
