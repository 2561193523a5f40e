//! Export jobs and the context they hand to child streams

use crate::error::{Error, Result};
use crate::filter::parse_timestamp;
use crate::types::StringMap;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Status of an export job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    /// Scheduled, not yet started
    Pending,
    /// Export running
    InProgress,
    /// Files are ready to download
    Completed,
    /// Export failed
    Failed,
    /// Any status this tap does not know
    #[serde(other)]
    Unknown,
}

/// Scheduling parameters of an export job
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobParameters {
    /// Export type
    #[serde(rename = "type")]
    pub export_type: Option<String>,
    /// Start of the exported period
    pub start_at: Option<String>,
    /// End of the exported period
    pub end_at: Option<String>,
}

/// An export job as returned by `GET /export/jobs`.
///
/// Every field is optional so that a partial record still deserializes;
/// whether it can drive child streams is decided by [`JobContext::from_job`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Job identifier
    pub id: Option<String>,
    /// Schedule that created the job
    pub schedule_id: Option<String>,
    /// Job status
    pub status: Option<JobStatus>,
    /// Last update, as sent by the API
    pub updated_at: Option<String>,
    /// Exported period and type
    pub parameters: Option<JobParameters>,
    /// Files the job produced
    #[serde(default)]
    pub files: Vec<String>,
}

impl Job {
    /// Read a job out of a parsed `jobs` record
    pub fn from_record(record: &Value) -> Result<Self> {
        serde_json::from_value(record.clone())
            .map_err(|e| Error::decode(format!("Invalid export job record: {e}")))
    }
}

/// Context passed from one job record to its child streams
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobContext {
    /// Job identifier, substituted into `{job_id}`
    pub job_id: String,
    /// Last update of the job, used by the lookback gate
    pub updated_at: Option<DateTime<Utc>>,
    /// Files the job produced; empty when the API did not list them
    pub files: Vec<String>,
}

impl JobContext {
    /// Keys a child path template may reference
    pub const KEYS: [&'static str; 2] = ["job_id", "updated_at"];

    /// Create a context for a job id
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            updated_at: None,
            files: Vec::new(),
        }
    }

    /// Set the job's last update time
    #[must_use]
    pub fn with_updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = Some(updated_at);
        self
    }

    /// Set the job's produced files
    #[must_use]
    pub fn with_files(mut self, files: Vec<String>) -> Self {
        self.files = files;
        self
    }

    /// Derive a child context from a job.
    ///
    /// Returns `Ok(None)` when the job has no id or has not completed: its
    /// children have nothing to fetch. A present but unparseable `updatedAt`
    /// is an error.
    pub fn from_job(job: &Job) -> Result<Option<Self>> {
        let Some(job_id) = job.id.as_deref().filter(|id| !id.is_empty()) else {
            return Ok(None);
        };

        if matches!(job.status, Some(status) if status != JobStatus::Completed) {
            return Ok(None);
        }

        let updated_at = job.updated_at.as_deref().map(parse_timestamp).transpose()?;

        Ok(Some(Self {
            job_id: job_id.to_string(),
            updated_at,
            files: job.files.clone(),
        }))
    }

    /// Shorthand for `Job::from_record` followed by `from_job`
    pub fn from_record(record: &Value) -> Result<Option<Self>> {
        Self::from_job(&Job::from_record(record)?)
    }

    /// Values available to child path templates
    pub fn template_vars(&self) -> StringMap {
        let mut vars = StringMap::new();
        vars.insert("job_id".to_string(), self.job_id.clone());
        if let Some(updated_at) = self.updated_at {
            vars.insert(
                "updated_at".to_string(),
                updated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            );
        }
        vars
    }

    /// Whether the job produced `file`; jobs without a file list produced all
    pub fn lists_file(&self, file: &str) -> bool {
        self.files.is_empty() || self.files.iter().any(|f| f == file)
    }
}
