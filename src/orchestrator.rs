//! # Batch Orchestrator
//!
//! Drives a documentation job over a list of endpoints.
//!
//! Endpoints are split into fixed-size batches in input order. Each batch's
//! generation calls run concurrently and are joined settle-all: one failure
//! never cancels its siblings. Failures become a Markdown fallback notice
//! under the endpoint's key, so the result always has one entry per distinct
//! `"<METHOD> <path>"` key. Batches run strictly one after another with a
//! fixed pause between them (none after the last).
//!
//! Progress is published on a [`tokio::sync::watch`] channel; see
//! [`BatchOrchestrator::subscribe`].

use crate::error::PipelineError;
use crate::generation::GenerationClient;
use crate::spec::{EndpointDescriptor, SchemaInfo};
use futures::future::join_all;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

pub const DEFAULT_BATCH_SIZE: usize = 2;
pub const DEFAULT_INTER_BATCH_DELAY: Duration = Duration::from_millis(2000);

/// Message recorded for endpoints a cancelled job never finished.
pub const CANCELLED_MESSAGE: &str = "generation cancelled";

/// Markdown notice stored in place of a summary that could not be generated.
pub fn fallback_notice(message: &str) -> String {
    format!(
        "⚠️ Failed to generate summary for this endpoint.\n\n\
         Error: {message}\n\n\
         Please try regenerating the documentation or check your network connection."
    )
}

/// Lifecycle of a job. There is no failed state: per-endpoint failures are
/// part of a completed result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum JobState {
    Pending,
    /// `batch` is 1-based.
    Running { batch: usize, total: usize },
    Completed,
    Cancelled,
}

/// Outcome of a job: one entry per endpoint key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JobResult {
    /// `"<METHOD> <path>"` → summary or fallback notice.
    pub summaries: HashMap<String, String>,
    /// Keys whose entry is a fallback notice.
    pub failed: HashSet<String>,
}

impl JobResult {
    pub fn len(&self) -> usize {
        self.summaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.summaries.get(key).map(String::as_str)
    }

    pub fn is_failed(&self, key: &str) -> bool {
        self.failed.contains(key)
    }

    pub fn succeeded(&self) -> usize {
        self.summaries.len() - self.failed.len()
    }

    fn record(&mut self, key: String, outcome: Result<String, String>) {
        match outcome {
            Ok(summary) => {
                self.failed.remove(&key);
                self.summaries.insert(key, summary);
            }
            Err(message) => {
                self.summaries.insert(key.clone(), fallback_notice(&message));
                self.failed.insert(key);
            }
        }
    }
}

pub struct BatchOrchestrator {
    client: GenerationClient,
    batch_size: usize,
    inter_batch_delay: Duration,
    state: watch::Sender<JobState>,
}

impl BatchOrchestrator {
    pub fn new(client: GenerationClient) -> Self {
        Self {
            client,
            batch_size: DEFAULT_BATCH_SIZE,
            inter_batch_delay: DEFAULT_INTER_BATCH_DELAY,
            state: watch::Sender::new(JobState::Pending),
        }
    }

    /// Batch size; zero is treated as one.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_inter_batch_delay(mut self, delay: Duration) -> Self {
        self.inter_batch_delay = delay;
        self
    }

    pub fn client(&self) -> &GenerationClient {
        &self.client
    }

    /// Watch job progress.
    pub fn subscribe(&self) -> watch::Receiver<JobState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> JobState {
        *self.state.borrow()
    }

    pub async fn run(
        &self,
        endpoints: &[EndpointDescriptor],
        schema_info: &SchemaInfo,
    ) -> Result<JobResult, PipelineError> {
        self.run_with_cancel(endpoints, schema_info, &CancellationToken::new())
            .await
    }

    /// Like [`run`](Self::run), stopping early once `cancel` fires.
    ///
    /// On cancellation the in-flight batch is abandoned, no further batch is
    /// started, and every endpoint still without a result gets a fallback
    /// notice carrying [`CANCELLED_MESSAGE`].
    pub async fn run_with_cancel(
        &self,
        endpoints: &[EndpointDescriptor],
        schema_info: &SchemaInfo,
        cancel: &CancellationToken,
    ) -> Result<JobResult, PipelineError> {
        if endpoints.is_empty() {
            return Err(PipelineError::NoEndpoints);
        }

        let batches: Vec<&[EndpointDescriptor]> = endpoints.chunks(self.batch_size).collect();
        let total = batches.len();
        let mut result = JobResult::default();
        info!(endpoints = endpoints.len(), batches = total, batch_size = self.batch_size, "Starting documentation job");

        let mut cancelled = false;
        for (index, batch) in batches.iter().enumerate() {
            let batch_number = index + 1;
            self.state.send_replace(JobState::Running {
                batch: batch_number,
                total,
            });
            info!(batch = batch_number, total, size = batch.len(), "Processing batch");

            let calls = batch.iter().map(|endpoint| async move {
                let outcome = self.client.generate(endpoint, schema_info).await;
                (endpoint.key(), outcome)
            });

            let settled = tokio::select! {
                _ = cancel.cancelled() => None,
                settled = join_all(calls) => Some(settled),
            };
            let Some(settled) = settled else {
                cancelled = true;
                break;
            };

            for (key, outcome) in settled {
                let outcome = outcome.map_err(|err| {
                    error!(endpoint = %key, error = %err, "Failed to generate summary");
                    err.to_string()
                });
                result.record(key, outcome);
            }

            if batch_number < total {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        cancelled = true;
                        break;
                    }
                    _ = tokio::time::sleep(self.inter_batch_delay) => {}
                }
            }
        }

        if cancelled {
            let mut abandoned = 0;
            for endpoint in endpoints {
                let key = endpoint.key();
                if !result.summaries.contains_key(&key) {
                    result.record(key, Err(CANCELLED_MESSAGE.to_string()));
                    abandoned += 1;
                }
            }
            warn!(abandoned, "Documentation job cancelled");
            self.state.send_replace(JobState::Cancelled);
        } else {
            self.state.send_replace(JobState::Completed);
        }

        info!(
            summaries = result.len(),
            failed = result.failed.len(),
            "Documentation job finished"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_notice_wording() {
        let notice = fallback_notice("HTTP 500: Internal Server Error");
        assert_eq!(
            notice,
            "⚠️ Failed to generate summary for this endpoint.\n\nError: HTTP 500: Internal Server Error\n\nPlease try regenerating the documentation or check your network connection."
        );
    }

    #[test]
    fn test_record_last_write_wins() {
        let mut result = JobResult::default();
        result.record("GET /a".into(), Err("boom".into()));
        assert!(result.is_failed("GET /a"));
        result.record("GET /a".into(), Ok("fine".into()));
        assert!(!result.is_failed("GET /a"));
        assert_eq!(result.get("GET /a"), Some("fine"));
        assert_eq!(result.len(), 1);
        assert_eq!(result.succeeded(), 1);
    }

    #[test]
    fn test_job_state_serialization() {
        let value = serde_json::to_value(JobState::Running { batch: 2, total: 3 }).unwrap();
        assert_eq!(value, serde_json::json!({"state": "running", "batch": 2, "total": 3}));
    }
}
