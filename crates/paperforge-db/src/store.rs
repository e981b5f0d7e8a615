//! Composed chunk store: vector index plus row-aligned metadata.
//!
//! The invariant this module exists to hold: metadata row N describes
//! vector slot N, and both sides have the same length. Writers are
//! serialized through one async mutex so concurrent batches cannot
//! interleave their id assignments; a metadata failure after the index
//! append compensates by truncating the just-appended vectors.

use std::collections::HashMap;
use std::ops::Range;

use tokio::sync::Mutex;
use tracing::{error, warn};

use paperforge_core::{ChunkMeta, DocumentKind, Error, Result, ScoredChunk};

use crate::index::FlatVectorIndex;
use crate::metadata::ChunkMetaRepository;

/// Vector index paired with its metadata table.
pub struct ChunkStore {
    index: FlatVectorIndex,
    meta: ChunkMetaRepository,
    write_lock: Mutex<()>,
}

impl ChunkStore {
    pub fn new(index: FlatVectorIndex, meta: ChunkMetaRepository) -> Self {
        Self {
            index,
            meta,
            write_lock: Mutex::new(()),
        }
    }

    /// Number of indexed vectors.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// The vector dimension this store accepts.
    pub fn dimension(&self) -> usize {
        self.index.dimension()
    }

    /// Insert an aligned batch of vectors and their metadata, returning
    /// the assigned id range.
    pub async fn insert(
        &self,
        vectors: &[Vec<f32>],
        metas: &[ChunkMeta],
    ) -> Result<Range<i64>> {
        if vectors.len() != metas.len() {
            return Err(Error::InvalidInput(format!(
                "batch has {} vectors but {} metadata rows",
                vectors.len(),
                metas.len()
            )));
        }

        let _guard = self.write_lock.lock().await;

        self.check_alignment().await?;

        if vectors.is_empty() {
            let at = self.index.len() as i64;
            return Ok(at..at);
        }

        let range = self.index.append(vectors)?;
        if let Err(e) = self.meta.insert_batch(range.start, metas).await {
            warn!(
                subsystem = "database",
                component = "chunk_store",
                op = "insert",
                start_id = range.start,
                "Metadata insert failed, rolling back appended vectors"
            );
            if let Err(rollback) = self.index.truncate(range.start) {
                error!(
                    subsystem = "database",
                    component = "chunk_store",
                    error_msg = %rollback,
                    "Vector rollback failed, store is skewed"
                );
                return Err(Error::StoreSkew(format!(
                    "metadata insert failed ({}) and vector rollback failed ({})",
                    e, rollback
                )));
            }
            return Err(e);
        }

        Ok(range)
    }

    /// Nearest-neighbor query materialized with metadata, ascending by
    /// distance. Ids whose metadata row is missing are dropped.
    pub async fn query(&self, vector: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        let hits = self.index.query(vector, k);
        if hits.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = hits.iter().map(|(id, _)| *id).collect();
        let mut metas = self.meta.fetch(&ids).await?;

        let mut out = Vec::with_capacity(hits.len());
        for (id, distance) in hits {
            if let Some(meta) = metas.remove(&id) {
                out.push(ScoredChunk { id, distance, meta });
            } else {
                warn!(
                    subsystem = "database",
                    component = "chunk_store",
                    op = "query",
                    chunk_id = id,
                    "Dropping hit with no metadata row"
                );
            }
        }
        Ok(out)
    }

    /// Fetch metadata rows for the given ids.
    pub async fn fetch_metadata(&self, ids: &[i64]) -> Result<HashMap<i64, ChunkMeta>> {
        self.meta.fetch(ids).await
    }

    /// Pick up to `n` random chunks of the given kind.
    pub async fn sample_by_kind(
        &self,
        kind: DocumentKind,
        n: usize,
    ) -> Result<Vec<(i64, ChunkMeta)>> {
        self.meta.sample_by_kind(kind, n).await
    }

    /// Number of chunks indexed for one document.
    pub async fn count_for_document(&self, document_id: uuid::Uuid) -> Result<i64> {
        self.meta.count_for_document(document_id).await
    }

    /// Fail with [`Error::StoreSkew`] when the index and metadata table
    /// disagree on length.
    pub async fn verify_alignment(&self) -> Result<()> {
        self.check_alignment().await
    }

    async fn check_alignment(&self) -> Result<()> {
        let index_len = self.index.len() as i64;
        let meta_len = self.meta.count().await?;
        if index_len != meta_len {
            return Err(Error::StoreSkew(format!(
                "index holds {} vectors but metadata has {} rows",
                index_len, meta_len
            )));
        }
        Ok(())
    }
}
