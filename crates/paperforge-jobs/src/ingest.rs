//! Document ingestion pipeline.
//!
//! Pages are segmented into overlapping chunks, embedded in fixed-size
//! batches, and inserted into the chunk store with their metadata in the
//! same operation so index and metadata stay row-aligned. Any provider
//! failure fails the whole job and marks the document Failed; partial
//! batches already inserted remain (re-ingestion appends, it does not
//! replace).

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use paperforge_core::{
    defaults, ChunkMeta, DocumentStatus, DocumentStore, EmbeddingBackend, Error, IngestRequest,
    JobKind, Result,
};
use paperforge_db::{ChunkStore, Segmenter};

use crate::handler::{JobContext, JobHandler, JobResult};

pub struct IngestHandler {
    documents: Arc<dyn DocumentStore>,
    store: Arc<ChunkStore>,
    embedder: Arc<dyn EmbeddingBackend>,
    segmenter: Segmenter,
}

impl IngestHandler {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        store: Arc<ChunkStore>,
        embedder: Arc<dyn EmbeddingBackend>,
    ) -> Self {
        Self {
            documents,
            store,
            embedder,
            segmenter: Segmenter::default(),
        }
    }

    async fn run(&self, ctx: &JobContext, req: &IngestRequest) -> Result<usize> {
        self.documents
            .update_status(req.document_id, DocumentStatus::Processing)
            .await?;

        ctx.report_progress(5, "Segmenting pages").await;

        let mut metas: Vec<ChunkMeta> = Vec::new();
        let mut ordinal = 0i32;
        for page in &req.pages {
            for segment in self.segmenter.segment(&page.text) {
                metas.push(ChunkMeta {
                    document_id: req.document_id,
                    kind: req.kind,
                    ordinal,
                    page: page.page,
                    text: segment.text,
                });
                ordinal += 1;
            }
        }

        if metas.is_empty() {
            return Err(Error::InvalidInput(
                "document produced no usable text".to_string(),
            ));
        }

        info!(
            subsystem = "jobs",
            component = "ingest",
            document_id = %req.document_id,
            chunk_count = metas.len(),
            "Segmented document"
        );

        let batches: Vec<&[ChunkMeta]> = metas.chunks(defaults::EMBED_BATCH_SIZE).collect();
        let total_batches = batches.len();
        let mut inserted = 0usize;

        for (i, batch) in batches.into_iter().enumerate() {
            let texts: Vec<String> = batch.iter().map(|m| m.text.clone()).collect();
            let vectors = self.embedder.embed_texts(&texts).await?;
            if vectors.len() != batch.len() {
                return Err(Error::ProviderError(format!(
                    "embedded {} of {} chunks in batch",
                    vectors.len(),
                    batch.len()
                )));
            }

            self.store.insert(&vectors, batch).await?;
            inserted += batch.len();

            // Embedding dominates the job; spread 10..90 across batches.
            let progress = 10 + (80 * (i + 1) / total_batches) as i32;
            ctx.report_progress(progress, &format!("Indexed {} chunks", inserted))
                .await;
        }

        self.documents
            .update_status(req.document_id, DocumentStatus::Completed)
            .await?;
        Ok(inserted)
    }
}

#[async_trait]
impl JobHandler for IngestHandler {
    fn kind(&self) -> JobKind {
        JobKind::Ingest
    }

    async fn execute(&self, ctx: &JobContext) -> JobResult {
        let req: IngestRequest = match ctx.request() {
            Ok(req) => req,
            Err(e) => return JobResult::from_error(&e),
        };

        match self.run(ctx, &req).await {
            Ok(count) => JobResult::Success(Some(serde_json::json!({
                "document_id": req.document_id,
                "chunks_indexed": count,
            }))),
            Err(e) => {
                if let Err(status_err) = self
                    .documents
                    .update_status(req.document_id, DocumentStatus::Failed)
                    .await
                {
                    warn!(
                        subsystem = "jobs",
                        component = "ingest",
                        document_id = %req.document_id,
                        error_msg = %status_err,
                        "Could not mark document failed"
                    );
                }
                JobResult::from_error(&e)
            }
        }
    }
}
