//! Job-lookback gate
//!
//! Export files of old jobs may already be purged server side. The gate
//! decides, before any request is issued, whether a job is recent enough
//! for its files to be fetched.

use chrono::{DateTime, Utc};

const SECONDS_PER_DAY: i64 = 86_400;

/// Outcome of the lookback check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookbackDecision {
    /// Fetch the child resource
    Fetch,
    /// Skip the fetch; the job is older than the configured limit
    Skip {
        /// Job age in whole days
        age_days: i64,
        /// Configured limit in days
        limit_days: u32,
    },
}

impl LookbackDecision {
    /// Whether the child resource should be requested
    pub fn should_fetch(&self) -> bool {
        matches!(self, Self::Fetch)
    }
}

/// Whole days between `updated_at` and `now`, rounded down
pub fn job_age_days(updated_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - updated_at).num_seconds().div_euclid(SECONDS_PER_DAY)
}

/// Gate built from the `max_job_lookback` option
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobLookbackGate {
    max_days: Option<u32>,
}

impl JobLookbackGate {
    /// Create a gate; `None` always fetches
    pub fn new(max_days: Option<u32>) -> Self {
        Self { max_days }
    }

    /// Configured limit
    pub fn max_days(&self) -> Option<u32> {
        self.max_days
    }

    /// Decide for a job last updated at `updated_at`.
    ///
    /// `age_days == limit` is still fetched. A job without `updated_at`
    /// cannot be aged and is always fetched.
    pub fn decide(&self, updated_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> LookbackDecision {
        let (Some(limit_days), Some(updated_at)) = (self.max_days, updated_at) else {
            return LookbackDecision::Fetch;
        };

        let age_days = job_age_days(updated_at, now);
        if age_days > i64::from(limit_days) {
            LookbackDecision::Skip {
                age_days,
                limit_days,
            }
        } else {
            LookbackDecision::Fetch
        }
    }
}
