//! Schema module
//!
//! JSON schemas for every stream, embedded in the binary, and the record
//! validation applied before emission.

mod registry;
mod types;
mod validate;

pub use registry::{SchemaRegistry, BUILTIN_SCHEMAS};
pub use types::{JsonSchema, JsonType, JsonTypeOrArray, SchemaProperty};
pub use validate::SchemaViolation;
