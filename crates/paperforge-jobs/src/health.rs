//! Service health snapshot.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use paperforge_core::{EmbeddingBackend, GenerationBackend};
use paperforge_db::ChunkStore;

/// Point-in-time health of the pipeline's dependencies.
#[derive(Debug, Clone, Serialize)]
pub struct HealthSnapshot {
    pub embedding_ok: bool,
    pub generation_ok: bool,
    pub indexed_chunks: usize,
    pub store_aligned: bool,
}

impl HealthSnapshot {
    pub fn overall(&self) -> bool {
        self.embedding_ok && self.generation_ok && self.store_aligned
    }
}

/// Probe every dependency. Failures are reported, never propagated.
pub async fn health_snapshot(
    embedder: &Arc<dyn EmbeddingBackend>,
    generator: &Arc<dyn GenerationBackend>,
    store: &Arc<ChunkStore>,
) -> HealthSnapshot {
    let embedding_ok = embedder
        .embed_texts(&["health check".to_string()])
        .await
        .is_ok();
    let generation_ok = generator.health_check().await.unwrap_or(false);
    let store_aligned = store.verify_alignment().await.is_ok();

    let snapshot = HealthSnapshot {
        embedding_ok,
        generation_ok,
        indexed_chunks: store.len(),
        store_aligned,
    };
    debug!(
        subsystem = "jobs",
        component = "health",
        embedding_ok,
        generation_ok,
        store_aligned,
        chunk_count = snapshot.indexed_chunks,
        "Health snapshot"
    );
    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;
    use paperforge_db::{create_pool, ChunkMetaRepository, FlatVectorIndex};
    use paperforge_inference::MockInferenceBackend;
    use tempfile::TempDir;

    async fn store(dir: &TempDir) -> Arc<ChunkStore> {
        let pool = create_pool(dir.path().join("h.db")).await.unwrap();
        let index = FlatVectorIndex::open(dir.path().join("h.json"), 16).unwrap();
        Arc::new(ChunkStore::new(index, ChunkMetaRepository::new(pool)))
    }

    #[tokio::test]
    async fn test_healthy_snapshot() {
        let dir = TempDir::new().unwrap();
        let mock = MockInferenceBackend::new().with_dimension(16);
        let embedder: Arc<dyn EmbeddingBackend> = Arc::new(mock.clone());
        let generator: Arc<dyn GenerationBackend> = Arc::new(mock);
        let store = store(&dir).await;

        let snap = health_snapshot(&embedder, &generator, &store).await;
        assert!(snap.overall());
        assert_eq!(snap.indexed_chunks, 0);
    }

    #[tokio::test]
    async fn test_embedding_outage_reported() {
        let dir = TempDir::new().unwrap();
        let broken = MockInferenceBackend::new()
            .with_dimension(16)
            .with_embedding_failure();
        let embedder: Arc<dyn EmbeddingBackend> = Arc::new(broken.clone());
        let generator: Arc<dyn GenerationBackend> = Arc::new(broken);
        let store = store(&dir).await;

        let snap = health_snapshot(&embedder, &generator, &store).await;
        assert!(!snap.embedding_ok);
        assert!(!snap.overall());
        assert!(snap.store_aligned);
    }
}
