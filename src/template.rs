//! Template interpolation for request paths and bodies
//!
//! Handles `{name}` placeholders in catalog paths (`/export/jobs/{job_id}/files/...`)
//! and in JSON report bodies (`"startAt": "{start_date}"`).

use crate::error::{Error, Result};
use crate::types::StringMap;
use regex::{Captures, Regex};
use serde_json::Value;
use std::sync::LazyLock;

/// Regex for matching placeholders: {name}
static PLACEHOLDER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([a-zA-Z_][a-zA-Z0-9_]*)\}").unwrap());

/// Render a template string; every placeholder must be defined
pub fn render(template: &str, vars: &StringMap) -> Result<String> {
    let mut missing = Vec::new();

    let rendered = PLACEHOLDER_REGEX.replace_all(template, |caps: &Captures<'_>| {
        let name = &caps[1];
        match vars.get(name) {
            Some(value) => value.clone(),
            None => {
                missing.push(name.to_string());
                caps[0].to_string()
            }
        }
    });

    if missing.is_empty() {
        Ok(rendered.into_owned())
    } else {
        Err(Error::undefined_var(missing.join(", ")))
    }
}

/// Check if a string contains placeholders
pub fn has_placeholders(s: &str) -> bool {
    PLACEHOLDER_REGEX.is_match(s)
}

/// Placeholder names in order of appearance
pub fn placeholders(template: &str) -> Vec<String> {
    PLACEHOLDER_REGEX
        .captures_iter(template)
        .map(|cap| cap[1].to_string())
        .collect()
}

/// Placeholder names in every string of a JSON value
pub fn json_placeholders(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => placeholders(s),
        Value::Array(items) => items.iter().flat_map(json_placeholders).collect(),
        Value::Object(map) => map.values().flat_map(json_placeholders).collect(),
        _ => Vec::new(),
    }
}

/// Render every string in a JSON value; keys are left untouched
pub fn render_value(value: &Value, vars: &StringMap) -> Result<Value> {
    match value {
        Value::String(s) if has_placeholders(s) => Ok(Value::String(render(s, vars)?)),
        Value::Object(map) => {
            let mut rendered = serde_json::Map::new();
            for (k, v) in map {
                rendered.insert(k.clone(), render_value(v, vars)?);
            }
            Ok(Value::Object(rendered))
        }
        Value::Array(items) => items
            .iter()
            .map(|v| render_value(v, vars))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        _ => Ok(value.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vars(pairs: &[(&str, &str)]) -> StringMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_simple_substitution() {
        let result = render(
            "/export/jobs/{job_id}/files/topics.jsonl",
            &vars(&[("job_id", "j-42")]),
        )
        .unwrap();
        assert_eq!(result, "/export/jobs/j-42/files/topics.jsonl");
    }

    #[test]
    fn test_repeated_placeholder() {
        let result = render("{a}-{a}-{b}", &vars(&[("a", "x"), ("b", "y")])).unwrap();
        assert_eq!(result, "x-x-y");
    }

    #[test]
    fn test_undefined_variable() {
        let err = render("/jobs/{job_id}/{missing}", &vars(&[("job_id", "1")])).unwrap_err();
        assert!(matches!(err, Error::UndefinedVariable { .. }));
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_no_placeholders() {
        assert_eq!(render("/inboxes", &StringMap::new()).unwrap(), "/inboxes");
        assert!(!has_placeholders("/inboxes"));
        assert!(has_placeholders("/jobs/{job_id}"));
        assert!(!has_placeholders("{ not a placeholder }"));
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(
            placeholders("/export/jobs/{job_id}/at/{updated_at}"),
            vec!["job_id", "updated_at"]
        );
    }

    #[test]
    fn test_json_placeholders() {
        let body = json!({
            "metric": "WorkSessionsReport",
            "startAt": "{start_date}",
            "filters": [{"endAt": "{end_date}"}],
            "limit": 10
        });
        let mut found = json_placeholders(&body);
        found.sort();
        assert_eq!(found, vec!["end_date", "start_date"]);
    }

    #[test]
    fn test_render_value_object() {
        let body = json!({
            "metric": "WorkSessionsReport",
            "startAt": "{start_date}",
            "range": ["{start_date}", "{end_date}"],
            "limit": 10
        });

        let result = render_value(
            &body,
            &vars(&[("start_date", "2024-01-01"), ("end_date", "2024-01-31")]),
        )
        .unwrap();
        assert_eq!(
            result,
            json!({
                "metric": "WorkSessionsReport",
                "startAt": "2024-01-01",
                "range": ["2024-01-01", "2024-01-31"],
                "limit": 10
            })
        );
    }

    #[test]
    fn test_render_value_undefined() {
        let body = json!({"startAt": "{start_date}"});
        assert!(render_value(&body, &StringMap::new()).is_err());
    }
}
