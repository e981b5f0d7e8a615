//! Filtered similarity retrieval over the chunk store.
//!
//! Filtering happens after the nearest-neighbor scan, so the index is
//! over-queried by a fixed factor to leave headroom for dropped hits. The
//! result is re-sorted by distance and truncated to the requested size, so
//! callers always see the k best chunks that survive the filter.

use std::sync::Arc;
use std::time::Instant;

use tracing::debug;
use uuid::Uuid;

use paperforge_core::{defaults, DocumentKind, EmbeddingBackend, Error, Result, ScoredChunk};
use paperforge_db::ChunkStore;

/// Equality constraints applied to retrieved chunks.
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    pub document_id: Option<Uuid>,
    pub kind: Option<DocumentKind>,
}

impl SearchFilter {
    pub fn for_document(document_id: Uuid) -> Self {
        Self {
            document_id: Some(document_id),
            kind: None,
        }
    }

    pub fn for_kind(kind: DocumentKind) -> Self {
        Self {
            document_id: None,
            kind: Some(kind),
        }
    }

    fn matches(&self, chunk: &ScoredChunk) -> bool {
        if let Some(doc) = self.document_id {
            if chunk.meta.document_id != doc {
                return false;
            }
        }
        if let Some(kind) = self.kind {
            if chunk.meta.kind != kind {
                return false;
            }
        }
        true
    }
}

/// Embeds queries and runs filtered nearest-neighbor retrieval.
pub struct Retriever {
    embedder: Arc<dyn EmbeddingBackend>,
    store: Arc<ChunkStore>,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn EmbeddingBackend>, store: Arc<ChunkStore>) -> Self {
        Self { embedder, store }
    }

    pub fn store(&self) -> &Arc<ChunkStore> {
        &self.store
    }

    /// Retrieve up to `k` chunks matching the filter, most similar first.
    /// An empty store yields an empty result rather than an error.
    pub async fn search(
        &self,
        query: &str,
        k: usize,
        filter: &SearchFilter,
    ) -> Result<Vec<ScoredChunk>> {
        if k == 0 || self.store.is_empty() {
            return Ok(Vec::new());
        }

        let start = Instant::now();
        let vectors = self.embedder.embed_texts(&[query.to_string()]).await?;
        let query_vec = vectors
            .into_iter()
            .next()
            .ok_or_else(|| Error::InvalidInput("query embedded to nothing".to_string()))?;

        // Over-fetch so post-scan filtering still leaves k survivors for
        // all but the most selective filters.
        let fetch = k.saturating_mul(defaults::SEARCH_OVERSAMPLE).max(k);
        let mut hits = self.store.query(&query_vec, fetch).await?;
        hits.retain(|c| filter.matches(c));
        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        hits.truncate(k);

        debug!(
            subsystem = "search",
            component = "retriever",
            op = "search",
            query_len = query.len(),
            k,
            result_count = hits.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Similarity search"
        );
        Ok(hits)
    }
}
