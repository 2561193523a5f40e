//! Decoder implementations
//!
//! Each decoder handles a specific response format.

use super::types::{RecordDecoder, RecordIter};
use crate::error::{Error, Result};
use serde_json::{Map, Value};

// ============================================================================
// JSON Decoder
// ============================================================================

/// JSON decoder with optional record path extraction
#[derive(Debug, Clone, Default)]
pub struct JsonDecoder {
    /// Path selecting the record array
    record_path: Option<String>,
}

impl JsonDecoder {
    /// Create a new JSON decoder
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a JSON decoder with a record path
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            record_path: Some(path.into()),
        }
    }

    /// Extract records from a JSON value using the configured path
    fn extract_records(&self, value: Value) -> Result<Vec<Value>> {
        let path = match self.record_path.as_deref() {
            None | Some("$" | "$[*]") => return Ok(into_records(value)),
            Some(path) => path,
        };

        if path.contains('*') {
            return extract_with_jsonpath(&value, path);
        }

        Ok(extract_simple_path(&value, path).map_or_else(Vec::new, into_records))
    }
}

impl RecordDecoder for JsonDecoder {
    fn decode<'a>(&self, body: &'a str) -> Result<RecordIter<'a>> {
        let value: Value = serde_json::from_str(body)
            .map_err(|e| Error::decode(format!("Failed to parse JSON: {e}")))?;
        let records = self.extract_records(value)?;
        Ok(Box::new(records.into_iter().map(Ok)))
    }
}

/// An array selects its elements; anything else is a single record
fn into_records(value: Value) -> Vec<Value> {
    match value {
        Value::Array(arr) => arr,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

// ============================================================================
// JSONL Decoder
// ============================================================================

/// JSON Lines decoder (one JSON object per line)
#[derive(Debug, Clone, Default)]
pub struct JsonlDecoder;

impl JsonlDecoder {
    /// Create a new JSONL decoder
    pub fn new() -> Self {
        Self
    }
}

impl RecordDecoder for JsonlDecoder {
    fn decode<'a>(&self, body: &'a str) -> Result<RecordIter<'a>> {
        let records = body.lines().enumerate().filter_map(|(line_num, line)| {
            let line = line.trim();
            if line.is_empty() {
                return None;
            }
            Some(serde_json::from_str::<Value>(line).map_err(|e| {
                Error::decode(format!("Failed to parse JSONL at line {}: {e}", line_num + 1))
            }))
        });

        Ok(Box::new(records))
    }
}

// ============================================================================
// CSV Decoder
// ============================================================================

/// CSV decoder; the first non-empty row names the fields
#[derive(Debug, Clone)]
pub struct CsvDecoder {
    /// Field delimiter
    delimiter: char,
}

impl Default for CsvDecoder {
    fn default() -> Self {
        Self { delimiter: ',' }
    }
}

impl CsvDecoder {
    /// Create a new CSV decoder with a comma delimiter
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a CSV decoder with a custom delimiter
    pub fn with_delimiter(delimiter: char) -> Self {
        Self { delimiter }
    }
}

impl RecordDecoder for CsvDecoder {
    fn decode<'a>(&self, body: &'a str) -> Result<RecordIter<'a>> {
        let delimiter = self.delimiter;
        let mut lines = body
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty());

        let Some((_, header_line)) = lines.next() else {
            return Ok(Box::new(std::iter::empty()));
        };
        let headers = parse_csv_line(header_line, delimiter);

        let records = lines.map(move |(line_num, line)| {
            let fields = parse_csv_line(line, delimiter);
            if fields.len() > headers.len() {
                return Err(Error::CsvParse {
                    message: format!(
                        "line {} has {} fields but the header has {}",
                        line_num + 1,
                        fields.len(),
                        headers.len()
                    ),
                });
            }

            let mut obj = Map::new();
            for (i, header) in headers.iter().enumerate() {
                let value = fields.get(i).map_or(Value::Null, |f| parse_csv_value(f));
                obj.insert(header.clone(), value);
            }
            Ok(Value::Object(obj))
        });

        Ok(Box::new(records))
    }
}

/// Parse a CSV line into fields
fn parse_csv_line(line: &str, delimiter: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '"' {
            if in_quotes && chars.peek() == Some(&'"') {
                current.push('"');
                chars.next();
            } else {
                in_quotes = !in_quotes;
            }
        } else if c == delimiter && !in_quotes {
            fields.push(std::mem::take(&mut current).trim().to_string());
        } else {
            current.push(c);
        }
    }

    fields.push(current.trim().to_string());
    fields
}

/// Parse a CSV value into a typed JSON value
fn parse_csv_value(value: &str) -> Value {
    if value.is_empty() || value.eq_ignore_ascii_case("null") {
        return Value::Null;
    }

    if let Ok(n) = value.parse::<i64>() {
        return Value::Number(n.into());
    }

    if let Ok(n) = value.parse::<f64>() {
        if let Some(num) = serde_json::Number::from_f64(n) {
            return Value::Number(num);
        }
    }

    match value.to_ascii_lowercase().as_str() {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(value.to_string()),
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Extract a value using simple dot-notation path with optional array index
fn extract_simple_path(value: &Value, path: &str) -> Option<Value> {
    let path = path.strip_prefix("$.").unwrap_or(path);

    let mut current = value;
    for part in path.split('.') {
        let Some(bracket_pos) = part.find('[') else {
            current = current.get(part)?;
            continue;
        };

        let name = &part[..bracket_pos];
        if !name.is_empty() {
            current = current.get(name)?;
        }

        let index: i64 = part[bracket_pos + 1..].trim_end_matches(']').parse().ok()?;
        let arr = current.as_array()?;
        #[allow(clippy::cast_possible_wrap)]
        let idx = if index < 0 {
            arr.len() as i64 + index
        } else {
            index
        };
        current = arr.get(usize::try_from(idx).ok()?)?;
    }

    Some(current.clone())
}

/// Extract records using jsonpath-rust
fn extract_with_jsonpath(value: &Value, path: &str) -> Result<Vec<Value>> {
    use jsonpath_rust::JsonPath;

    let jp = JsonPath::try_from(path).map_err(|e| Error::JsonPath {
        message: format!("Invalid JSONPath '{path}': {e}"),
    })?;

    Ok(into_records(jp.find(value)))
}
