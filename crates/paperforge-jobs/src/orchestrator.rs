//! Job orchestration: one spawned task per submitted job.
//!
//! `submit` creates the job record, moves it to Processing, and runs the
//! handler on a detached tokio task so callers get the job id back
//! immediately and poll the store for completion. There is no
//! cancellation; a failed handler leaves a Failed record with its error
//! text, never a stuck Processing one.

use std::sync::Arc;

use serde_json::{json, Value as JsonValue};
use tracing::{error, info};
use uuid::Uuid;

use paperforge_core::{JobStore, Result};

use crate::handler::{JobContext, JobHandler, JobResult};

pub struct Orchestrator {
    store: Arc<dyn JobStore>,
}

impl Orchestrator {
    pub fn new(store: Arc<dyn JobStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn JobStore> {
        &self.store
    }

    /// Submit a job for background execution, returning its id at once.
    pub async fn submit(
        &self,
        handler: Arc<dyn JobHandler>,
        payload: JsonValue,
    ) -> Result<Uuid> {
        let id = self.store.create(handler.kind()).await?;
        self.store.set_processing(id).await?;

        info!(
            subsystem = "jobs",
            component = "orchestrator",
            op = "submit",
            job_id = %id,
            job_kind = %handler.kind(),
            "Submitted job"
        );

        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            run_job(id, payload, handler, store).await;
        });

        Ok(id)
    }

    /// Run a job to completion on the calling task. Used by tests and
    /// embedded callers that want the terminal record synchronously.
    pub async fn run_blocking(
        &self,
        handler: Arc<dyn JobHandler>,
        payload: JsonValue,
    ) -> Result<Uuid> {
        let id = self.store.create(handler.kind()).await?;
        self.store.set_processing(id).await?;
        run_job(id, payload, handler, Arc::clone(&self.store)).await;
        Ok(id)
    }
}

async fn run_job(
    id: Uuid,
    payload: JsonValue,
    handler: Arc<dyn JobHandler>,
    store: Arc<dyn JobStore>,
) {
    let ctx = JobContext::new(id, payload, Arc::clone(&store));

    let outcome = match handler.execute(&ctx).await {
        JobResult::Success(result) => {
            info!(
                subsystem = "jobs",
                component = "orchestrator",
                job_id = %id,
                success = true,
                "Job completed"
            );
            store.complete(id, result.unwrap_or_else(|| json!({}))).await
        }
        JobResult::Failed(message) => {
            error!(
                subsystem = "jobs",
                component = "orchestrator",
                job_id = %id,
                error_msg = %message,
                "Job failed"
            );
            store.fail(id, &message).await
        }
    };

    if let Err(e) = outcome {
        error!(
            subsystem = "jobs",
            component = "orchestrator",
            job_id = %id,
            error_msg = %e,
            "Failed to persist terminal job state"
        );
    }
}
