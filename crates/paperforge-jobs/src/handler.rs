//! Job handler abstraction.
//!
//! A handler owns the whole execution of one job kind. It receives a
//! [`JobContext`] carrying the job id, the request payload, and a handle
//! to the job store for progress reporting; the orchestrator takes care
//! of moving the record through its lifecycle around the handler.

use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tracing::warn;
use uuid::Uuid;

use paperforge_core::{Error, JobKind, JobStore, Result};

/// Context provided to job handlers.
pub struct JobContext {
    job_id: Uuid,
    payload: JsonValue,
    store: Arc<dyn JobStore>,
}

impl JobContext {
    pub fn new(job_id: Uuid, payload: JsonValue, store: Arc<dyn JobStore>) -> Self {
        Self {
            job_id,
            payload,
            store,
        }
    }

    pub fn job_id(&self) -> Uuid {
        self.job_id
    }

    /// Deserialize the request payload into the handler's request type.
    pub fn request<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.payload.clone())
            .map_err(|e| Error::InvalidInput(format!("job payload: {}", e)))
    }

    /// Report progress. Store errors are logged, not propagated: a failed
    /// progress write must not kill a running pipeline.
    pub async fn report_progress(&self, percent: i32, message: &str) {
        if let Err(e) = self
            .store
            .set_progress(self.job_id, percent, Some(message))
            .await
        {
            warn!(
                subsystem = "jobs",
                job_id = %self.job_id,
                progress = percent,
                error_msg = %e,
                "Failed to persist job progress"
            );
        }
    }
}

/// Result of job execution.
#[derive(Debug)]
pub enum JobResult {
    /// Job completed successfully with optional result data.
    Success(Option<JsonValue>),
    /// Job failed with a human-readable error message.
    Failed(String),
}

impl JobResult {
    /// Map an error into the failed variant with its display text.
    pub fn from_error(e: &Error) -> Self {
        Self::Failed(e.to_string())
    }
}

/// Trait for job handlers.
#[async_trait]
pub trait JobHandler: Send + Sync {
    /// The job kind this handler processes.
    fn kind(&self) -> JobKind;

    /// Execute the job.
    async fn execute(&self, ctx: &JobContext) -> JobResult;
}

/// No-op handler for orchestrator tests.
pub struct NoOpHandler {
    kind: JobKind,
}

impl NoOpHandler {
    pub fn new(kind: JobKind) -> Self {
        Self { kind }
    }
}

#[async_trait]
impl JobHandler for NoOpHandler {
    fn kind(&self) -> JobKind {
        self.kind
    }

    async fn execute(&self, ctx: &JobContext) -> JobResult {
        ctx.report_progress(50, "Processing").await;
        JobResult::Success(None)
    }
}
