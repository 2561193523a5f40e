//! Execution engine module
//!
//! Main read loop and stream orchestration.
//!
//! # Overview
//!
//! Streams run one at a time, depth first: each root stream is fetched,
//! and every record that yields a [`JobContext`] immediately drives the
//! selected child streams before the next root record is processed.
//! Per invocation a stream fetches, parses, filters, validates and emits.
//! Children of one job that request the same file share a single download.
//! Any error aborts the whole sync.

mod types;

pub use types::{Message, MessageSink, SyncStats};

use crate::config::TapConfig;
use crate::error::{Error, Result};
use crate::filter::LookbackDecision;
use crate::http::{HttpClient, RequestConfig};
use crate::streams::{JobContext, Selection, StreamCatalog, TapStream};
use crate::types::Method;
use chrono::{DateTime, Utc};
use std::time::Instant;
use tracing::{debug, info};

/// Sync engine for orchestrating data extraction
pub struct SyncEngine {
    /// HTTP client
    client: HttpClient,
    /// Tap configuration
    config: TapConfig,
    /// Reference time for the lookback gate and open-ended windows
    now: DateTime<Utc>,
    /// Statistics
    stats: SyncStats,
}

impl SyncEngine {
    /// Create a new sync engine
    pub fn new(client: HttpClient, config: TapConfig) -> Self {
        Self {
            client,
            config,
            now: Utc::now(),
            stats: SyncStats::default(),
        }
    }

    /// Fix the reference time of the run
    #[must_use]
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Get statistics
    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    /// Sync every selected stream into `sink`
    pub async fn run(
        &mut self,
        catalog: &StreamCatalog,
        selection: &Selection,
        sink: &mut dyn MessageSink,
    ) -> Result<()> {
        let start = Instant::now();

        for stream in catalog.streams() {
            if selection.contains(stream.name()) {
                sink.emit(Message::schema(stream))?;
            }
        }

        for root in catalog.roots() {
            if selection.requires(catalog, root) {
                self.sync_root(catalog, selection, root, sink).await?;
            }
        }

        self.stats
            .set_duration(u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX));
        info!(
            "Sync complete: {} records, {} requests, {} child fetches skipped in {}ms",
            self.stats.records_emitted,
            self.stats.requests,
            self.stats.child_fetches_skipped,
            self.stats.duration_ms
        );
        Ok(())
    }

    /// Run a root stream and, per record, its selected children
    async fn sync_root(
        &mut self,
        catalog: &StreamCatalog,
        selection: &Selection,
        root: &TapStream,
        sink: &mut dyn MessageSink,
    ) -> Result<()> {
        info!(stream = root.name(), "Syncing stream");

        let emit = selection.contains(root.name());
        let children: Vec<&TapStream> = catalog
            .children(root.name())
            .filter(|child| selection.contains(child.name()))
            .collect();

        let body = self.fetch_root(root).await?;
        let extracted_at = Utc::now();

        for record in root.decoder().decode(&body)? {
            let record = record?;
            if !root.filter().accepts(&record)? {
                self.stats.records_filtered += 1;
                continue;
            }

            let context = if children.is_empty() {
                None
            } else {
                JobContext::from_record(&record)?
            };

            if emit {
                self.emit_record(root, record, extracted_at, sink)?;
            }

            let Some(context) = context else {
                continue;
            };
            self.stats.parent_contexts += 1;

            let mut bodies = FetchedBodies::default();
            for child in &children {
                self.sync_child(child, &context, &mut bodies, sink).await?;
            }
        }

        Ok(())
    }

    /// Run one child stream for one parent context.
    ///
    /// Children of the same job that issue an identical request share one
    /// download through `bodies`.
    async fn sync_child(
        &mut self,
        child: &TapStream,
        context: &JobContext,
        bodies: &mut FetchedBodies,
        sink: &mut dyn MessageSink,
    ) -> Result<()> {
        let gate = self.config.lookback_gate();
        if let LookbackDecision::Skip {
            age_days,
            limit_days,
        } = gate.decide(context.updated_at, self.now)
        {
            self.stats.child_fetches_skipped += 1;
            return sink.emit(Message::warn(format!(
                "Skipping {} for job {}: last updated {} days ago, beyond max_job_lookback of {} days",
                child.name(),
                context.job_id,
                age_days,
                limit_days
            )));
        }

        let vars = context.template_vars();
        let missing: Vec<String> = child
            .path_variables()
            .into_iter()
            .filter(|name| !vars.contains_key(name))
            .collect();
        if !missing.is_empty() {
            debug!(
                stream = child.name(),
                job_id = %context.job_id,
                "Job has no value for {}", missing.join(", ")
            );
            self.stats.child_contexts_incomplete += 1;
            return Ok(());
        }

        if let Some(file) = child.file_name() {
            if !context.lists_file(file) {
                debug!(
                    stream = child.name(),
                    job_id = %context.job_id,
                    "Job did not produce {}", file
                );
                self.stats.child_files_missing += 1;
                return Ok(());
            }
        }

        debug!(stream = child.name(), job_id = %context.job_id, "Syncing child stream");

        let path = child.request_path(Some(context))?;
        let request = child.request_config(&self.config.template_vars(self.now))?;
        let index = match bodies.position(child.method(), &path, &request) {
            Some(index) => {
                self.stats.responses_reused += 1;
                index
            }
            None => {
                self.stats.requests += 1;
                let body = self
                    .client
                    .fetch_text(child.method(), &path, request.clone())
                    .await?;
                bodies.push(child.method(), path, request, body)
            }
        };
        let extracted_at = Utc::now();

        for record in child.decoder().decode(bodies.body(index))? {
            let record = record?;
            if child.filter().accepts(&record)? {
                self.emit_record(child, record, extracted_at, sink)?;
            } else {
                self.stats.records_filtered += 1;
            }
        }

        Ok(())
    }

    /// Issue a root stream's request and return the body
    async fn fetch_root(&mut self, stream: &TapStream) -> Result<String> {
        let path = stream.request_path(None)?;
        let request = stream.request_config(&self.config.template_vars(self.now))?;

        self.stats.requests += 1;
        self.client.fetch_text(stream.method(), &path, request).await
    }

    /// Validate and emit one record
    fn emit_record(
        &mut self,
        stream: &TapStream,
        record: serde_json::Value,
        extracted_at: DateTime<Utc>,
        sink: &mut dyn MessageSink,
    ) -> Result<()> {
        stream
            .schema()
            .validate(&record)
            .map_err(|violation| Error::schema_validation(stream.name(), violation.to_string()))?;

        sink.emit(Message::record(stream.name(), record, extracted_at))?;
        self.stats.add_record(stream.name());
        Ok(())
    }
}

/// Response bodies downloaded for one parent record
#[derive(Debug, Default)]
struct FetchedBodies {
    entries: Vec<(Method, String, RequestConfig, String)>,
}

impl FetchedBodies {
    fn position(&self, method: Method, path: &str, request: &RequestConfig) -> Option<usize> {
        self.entries
            .iter()
            .position(|(m, p, r, _)| *m == method && p == path && r == request)
    }

    fn push(
        &mut self,
        method: Method,
        path: String,
        request: RequestConfig,
        body: String,
    ) -> usize {
        self.entries.push((method, path, request, body));
        self.entries.len() - 1
    }

    fn body(&self, index: usize) -> &str {
        &self.entries[index].3
    }
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("client", &self.client)
            .field("now", &self.now)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
