//! Record validation against a stream schema
//!
//! Only the subset of JSON Schema used by the catalog is checked: `type`
//! (single or union), `properties`, `required`, `items` and
//! `additionalProperties`.

use super::types::{JsonSchema, JsonType, SchemaProperty};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// First mismatch found in a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaViolation {
    /// Location of the offending value, `$` being the record
    pub path: String,
    /// What is wrong with it
    pub message: String,
}

impl SchemaViolation {
    fn new(path: &str, message: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

impl JsonSchema {
    /// Check a record against this schema, stopping at the first violation
    pub fn validate(&self, record: &Value) -> Result<(), SchemaViolation> {
        let Some(object) = record.as_object() else {
            return Err(SchemaViolation::new(
                "$",
                format!("expected object, found {}", JsonType::of(record)),
            ));
        };

        validate_object(
            "$",
            object,
            &self.properties,
            &self.required,
            self.additional_properties,
        )
    }
}

fn validate_object(
    path: &str,
    object: &Map<String, Value>,
    properties: &BTreeMap<String, SchemaProperty>,
    required: &[String],
    additional_properties: bool,
) -> Result<(), SchemaViolation> {
    if let Some(missing) = required.iter().find(|name| !object.contains_key(*name)) {
        return Err(SchemaViolation::new(
            path,
            format!("missing required property '{missing}'"),
        ));
    }

    for (name, value) in object {
        let child_path = format!("{path}.{name}");
        match properties.get(name) {
            Some(property) => validate_property(&child_path, property, value)?,
            None if !additional_properties => {
                return Err(SchemaViolation::new(
                    &child_path,
                    "property not allowed by schema",
                ));
            }
            None => {}
        }
    }

    Ok(())
}

fn validate_property(
    path: &str,
    property: &SchemaProperty,
    value: &Value,
) -> Result<(), SchemaViolation> {
    if !property.json_type.accepts(value) {
        return Err(SchemaViolation::new(
            path,
            format!(
                "expected {}, found {}",
                property.json_type,
                JsonType::of(value)
            ),
        ));
    }

    match value {
        Value::Object(object) => {
            let empty = BTreeMap::new();
            validate_object(
                path,
                object,
                property.properties.as_ref().unwrap_or(&empty),
                property.required.as_deref().unwrap_or_default(),
                property.additional_properties.unwrap_or(true),
            )
        }
        Value::Array(items) => match &property.items {
            Some(item_schema) => items.iter().enumerate().try_for_each(|(i, item)| {
                validate_property(&format!("{path}[{i}]"), item_schema, item)
            }),
            None => Ok(()),
        },
        _ => Ok(()),
    }
}
