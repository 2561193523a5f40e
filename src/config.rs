//! Tap configuration
//!
//! The JSON object passed with `--config` / `--config-json`, validated into
//! a typed [`TapConfig`]. Also holds the property specification returned by
//! `spec` and the catalog types returned by `discover`.

use crate::auth::AuthConfig;
use crate::error::{Error, Result};
use crate::filter::{parse_timestamp, DateWindow, JobLookbackGate};
use crate::http::{default_user_agent, HttpClientConfig, RateLimiterConfig};
use crate::streams::ContentType;
use crate::types::{OptionStringExt, ReplicationMethod, StringMap};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use url::Url;

/// Default client-side request rate
pub const DEFAULT_RATE_LIMIT_RPS: u32 = 10;

// ============================================================================
// Tap Config
// ============================================================================

/// Raw config object, before validation
#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    api_url_base: Option<String>,
    username: Option<String>,
    password: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    max_job_lookback: Option<Value>,
    content_type: Option<String>,
    user_agent: Option<String>,
    rate_limit_rps: Option<u32>,
}

/// Validated tap configuration
#[derive(Debug, Clone, PartialEq)]
pub struct TapConfig {
    /// API root, e.g. `https://acme.gladly.com/api/v1`
    pub api_url_base: Url,
    /// Basic credentials, when configured
    pub auth: AuthConfig,
    /// Date window from `start_date` / `end_date`
    pub window: DateWindow,
    /// Job lookback limit in days
    pub max_job_lookback: Option<u32>,
    /// Restrict conversation-item streams to one content type
    pub content_type: Option<ContentType>,
    /// `User-Agent` header override
    pub user_agent: Option<String>,
    /// Client-side request rate
    pub rate_limit_rps: u32,
}

impl TapConfig {
    /// Validate a config object
    pub fn from_value(value: &Value) -> Result<Self> {
        if !value.is_object() {
            return Err(Error::config("Config must be a JSON object"));
        }

        let raw: RawConfig = serde_json::from_value(value.clone())
            .map_err(|e| Error::config(format!("Invalid config: {e}")))?;

        let api_url_base = raw
            .api_url_base
            .none_if_empty()
            .ok_or_else(|| Error::missing_field("api_url_base"))?;
        let api_url_base = Url::parse(&api_url_base)
            .map_err(|e| Error::invalid_value("api_url_base", e.to_string()))?;

        let auth = match (raw.username.none_if_empty(), raw.password) {
            (Some(username), Some(password)) => AuthConfig::basic(username, password),
            (None, None) => AuthConfig::None,
            (Some(_), None) => return Err(Error::missing_field("password")),
            (None, Some(_)) => return Err(Error::missing_field("username")),
        };

        let start = raw
            .start_date
            .none_if_empty()
            .ok_or_else(|| Error::missing_field("start_date"))?;
        let start = parse_date_field("start_date", &start)?;
        let end = raw
            .end_date
            .none_if_empty()
            .map(|end| parse_date_field("end_date", &end))
            .transpose()?;
        let window = DateWindow::new(start, end)?;

        let max_job_lookback = raw
            .max_job_lookback
            .map(|v| parse_lookback(&v))
            .transpose()?
            .flatten();

        let content_type = raw
            .content_type
            .none_if_empty()
            .map(|ct| ct.parse::<ContentType>())
            .transpose()?;

        let rate_limit_rps = match raw.rate_limit_rps {
            Some(0) => {
                return Err(Error::invalid_value(
                    "rate_limit_rps",
                    "must be greater than zero",
                ))
            }
            Some(rps) => rps,
            None => DEFAULT_RATE_LIMIT_RPS,
        };

        Ok(Self {
            api_url_base,
            auth,
            window,
            max_job_lookback,
            content_type,
            user_agent: raw.user_agent.none_if_empty(),
            rate_limit_rps,
        })
    }

    /// Parse and validate a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| Error::config(format!("Config is not valid JSON: {e}")))?;
        Self::from_value(&value)
    }

    /// Read, parse and validate a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&content)
    }

    /// Lookback gate for child fetches
    pub fn lookback_gate(&self) -> JobLookbackGate {
        JobLookbackGate::new(self.max_job_lookback)
    }

    /// HTTP client settings
    pub fn http_client_config(&self) -> HttpClientConfig {
        HttpClientConfig::builder()
            .base_url(self.api_url_base.as_str())
            .user_agent(self.user_agent.clone().unwrap_or_else(default_user_agent))
            .rate_limit(RateLimiterConfig::per_second(self.rate_limit_rps))
            .build()
    }

    /// Values available to request body templates.
    ///
    /// Without a configured `end_date` the window ends at `now`.
    pub fn template_vars(&self, now: DateTime<Utc>) -> StringMap {
        let mut vars = StringMap::new();
        vars.insert("start_date".to_string(), format_timestamp(self.window.start()));
        vars.insert(
            "end_date".to_string(),
            format_timestamp(self.window.end().unwrap_or(now)),
        );
        vars
    }

    /// Property specification for the `spec` command
    pub fn spec() -> SpecConfig {
        let mut properties = BTreeMap::new();

        properties.insert(
            "api_url_base".to_string(),
            PropertyConfig::new(PropertyType::String, "The url for the API service")
                .required()
                .with_format("uri"),
        );
        properties.insert(
            "username".to_string(),
            PropertyConfig::new(
                PropertyType::String,
                "The username to authenticate against the API service",
            ),
        );
        properties.insert(
            "password".to_string(),
            PropertyConfig::new(
                PropertyType::String,
                "The password or API token to authenticate against the API service",
            )
            .secret(),
        );
        properties.insert(
            "start_date".to_string(),
            PropertyConfig::new(PropertyType::String, "The earliest job date to sync")
                .required()
                .with_format("date-time"),
        );
        properties.insert(
            "end_date".to_string(),
            PropertyConfig::new(PropertyType::String, "The latest job date to sync")
                .with_format("date-time"),
        );
        properties.insert(
            "max_job_lookback".to_string(),
            PropertyConfig::new(
                PropertyType::Integer,
                "Skip export files of jobs last updated more than this many days ago",
            ),
        );
        properties.insert(
            "content_type".to_string(),
            PropertyConfig::new(
                PropertyType::String,
                "Only sync conversation items of this content type",
            )
            .with_allowed(ContentType::ALL.iter().map(|ct| Value::from(ct.as_str())).collect()),
        );
        properties.insert(
            "user_agent".to_string(),
            PropertyConfig::new(PropertyType::String, "User-Agent header sent with requests"),
        );
        properties.insert(
            "rate_limit_rps".to_string(),
            PropertyConfig::new(PropertyType::Integer, "Maximum requests per second")
                .with_default(Value::from(DEFAULT_RATE_LIMIT_RPS)),
        );

        SpecConfig { properties }
    }
}

fn parse_date_field(field: &str, value: &str) -> Result<DateTime<Utc>> {
    parse_timestamp(value).map_err(|e| Error::invalid_value(field, e.to_string()))
}

/// Accepts a non-negative integer, a numeric string, or null
fn parse_lookback(value: &Value) -> Result<Option<u32>> {
    let invalid = || {
        Error::invalid_value(
            "max_job_lookback",
            format!("expected a non-negative integer, got {value}"),
        )
    };
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_u64()
            .and_then(|days| u32::try_from(days).ok())
            .map(Some)
            .ok_or_else(invalid),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s.trim().parse::<u32>().map(Some).map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

fn format_timestamp(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

// ============================================================================
// Spec Config
// ============================================================================

/// Property value type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    #[default]
    String,
    Integer,
    Boolean,
    Array,
}

/// Configuration specification for tap setup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpecConfig {
    /// Configuration properties
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyConfig>,
}

/// Configuration property definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyConfig {
    /// Property type
    #[serde(rename = "type")]
    pub property_type: PropertyType,

    /// Property description
    pub description: String,

    /// Whether this is a secret (should be masked)
    #[serde(default)]
    pub secret: bool,

    /// Whether this property is required
    #[serde(default)]
    pub required: bool,

    /// Default value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Format hint (e.g., "date-time", "uri")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Enum of allowed values
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<Value>>,
}

impl PropertyConfig {
    /// Create an optional property
    pub fn new(property_type: PropertyType, description: impl Into<String>) -> Self {
        Self {
            property_type,
            description: description.into(),
            secret: false,
            required: false,
            default: None,
            format: None,
            allowed_values: None,
        }
    }

    /// Mark as required
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Mark as secret
    #[must_use]
    pub fn secret(mut self) -> Self {
        self.secret = true;
        self
    }

    /// Set format hint
    #[must_use]
    pub fn with_format(mut self, format: &str) -> Self {
        self.format = Some(format.to_string());
        self
    }

    /// Set default value
    #[must_use]
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Restrict to a set of values
    #[must_use]
    pub fn with_allowed(mut self, values: Vec<Value>) -> Self {
        self.allowed_values = Some(values);
        self
    }
}

// ============================================================================
// Catalog Types
// ============================================================================

/// Discovered catalog (available streams)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    /// Available streams
    pub streams: Vec<CatalogStream>,
}

/// Stream in the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogStream {
    /// Stream name
    pub stream: String,

    /// Parent stream, for streams fetched per export job
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_stream: Option<String>,

    /// JSON schema for the stream
    pub schema: Value,

    /// Primary key fields
    #[serde(default)]
    pub key_properties: Vec<String>,

    /// Replication key, if the stream is ordered by one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_key: Option<String>,

    /// How the stream is replicated
    pub replication_method: ReplicationMethod,
}
