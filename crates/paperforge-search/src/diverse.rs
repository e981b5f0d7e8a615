//! Diverse context gathering for question generation.
//!
//! A single nearest-neighbor query tends to pull one tight cluster of
//! chunks, which makes generated questions repetitive. This module fans a
//! set of facet probes (plus any caller-supplied focus topics) over the
//! retriever, then deduplicates near-identical chunks and drops fragments
//! too short to support a question.

use tracing::debug;
use uuid::Uuid;

use paperforge_core::{defaults, Result, ScoredChunk};

use crate::retriever::{Retriever, SearchFilter};

/// Facet probes fanned over every source regardless of its topics.
const FACET_PROBES: [&str; 5] = [
    "definition concept theory",
    "properties characteristics features",
    "applications uses examples",
    "process method procedure",
    "classification types categories",
];

/// Gather a diverse set of chunks from one document.
///
/// Chunks are returned in probe order (facet probes first, then focus
/// topics), deduplicated on their leading text, and capped at
/// `max(needed * 2, 10)`.
pub async fn gather_diverse(
    retriever: &Retriever,
    document_id: Uuid,
    focus_topics: &[String],
    needed: usize,
) -> Result<Vec<ScoredChunk>> {
    let filter = SearchFilter::for_document(document_id);

    let mut queries: Vec<String> = FACET_PROBES.iter().map(|s| s.to_string()).collect();
    queries.extend(focus_topics.iter().cloned());

    let cap = (needed * 2).max(10);
    let mut seen_prefixes: Vec<String> = Vec::new();
    let mut out: Vec<ScoredChunk> = Vec::new();

    for query in &queries {
        let hits = retriever
            .search(query, defaults::DIVERSE_K_PER_QUERY, &filter)
            .await?;
        for chunk in hits {
            if chunk.meta.text.chars().count() <= defaults::MIN_CHUNK_TEXT_LEN {
                continue;
            }
            let prefix: String = chunk
                .meta
                .text
                .chars()
                .take(defaults::DEDUP_PREFIX_LEN)
                .collect();
            if seen_prefixes.contains(&prefix) {
                continue;
            }
            seen_prefixes.push(prefix);
            out.push(chunk);
            if out.len() >= cap {
                break;
            }
        }
        if out.len() >= cap {
            break;
        }
    }

    debug!(
        subsystem = "search",
        component = "diverse",
        op = "gather",
        document_id = %document_id,
        probe_count = queries.len(),
        result_count = out.len(),
        cap,
        "Gathered diverse context"
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Arc;
    use tempfile::TempDir;

    use paperforge_core::{ChunkMeta, DocumentKind, EmbeddingBackend};
    use paperforge_db::{ChunkMetaRepository, ChunkStore, FlatVectorIndex};

    const DIM: usize = 8;

    /// Buckets texts onto an axis by hashing their bytes, so different
    /// probes land on different stored chunks.
    struct HashEmbedder;

    #[async_trait]
    impl EmbeddingBackend for HashEmbedder {
        async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .filter(|t| !t.trim().is_empty())
                .map(|t| {
                    let hot = t.bytes().map(|b| b as usize).sum::<usize>() % DIM;
                    let mut v = vec![0.0; DIM];
                    v[hot] = 1.0;
                    v
                })
                .collect())
        }

        fn dimension(&self) -> usize {
            DIM
        }

        fn model_name(&self) -> &str {
            "hash-test"
        }
    }

    async fn retriever_with(dir: &TempDir, texts: &[(Uuid, &str)]) -> Retriever {
        let pool = paperforge_db::create_pool(dir.path().join("d.db"))
            .await
            .unwrap();
        let index = FlatVectorIndex::open(dir.path().join("d.json"), DIM).unwrap();
        let store = ChunkStore::new(index, ChunkMetaRepository::new(pool));

        let embedder = HashEmbedder;
        let strings: Vec<String> = texts.iter().map(|(_, t)| t.to_string()).collect();
        let vectors = embedder.embed_texts(&strings).await.unwrap();
        let metas: Vec<ChunkMeta> = texts
            .iter()
            .enumerate()
            .map(|(i, (doc, t))| ChunkMeta {
                document_id: *doc,
                kind: DocumentKind::Textbook,
                ordinal: i as i32,
                page: 0,
                text: t.to_string(),
            })
            .collect();
        store.insert(&vectors, &metas).await.unwrap();

        Retriever::new(Arc::new(HashEmbedder), Arc::new(store))
    }

    fn long_text(tag: &str) -> String {
        format!(
            "{} is explained at length here with enough substance to support \
             a generated exam question about it.",
            tag
        )
    }

    #[tokio::test]
    async fn test_gather_respects_document_filter() {
        let dir = TempDir::new().unwrap();
        let mine = Uuid::new_v4();
        let other = Uuid::new_v4();
        let a = long_text("Osmosis");
        let b = long_text("Diffusion");
        let c = long_text("Entropy");
        let retriever =
            retriever_with(&dir, &[(mine, &a), (other, &b), (mine, &c)]).await;

        let chunks = gather_diverse(&retriever, mine, &[], 5).await.unwrap();
        assert!(!chunks.is_empty());
        assert!(chunks.iter().all(|c| c.meta.document_id == mine));
    }

    #[tokio::test]
    async fn test_gather_dedups_identical_leading_text() {
        let dir = TempDir::new().unwrap();
        let doc = Uuid::new_v4();
        let text = long_text("Photosynthesis");
        // Same chunk text indexed twice (overlapping windows do this).
        let retriever = retriever_with(&dir, &[(doc, &text), (doc, &text)]).await;

        let chunks = gather_diverse(&retriever, doc, &[], 5).await.unwrap();
        assert_eq!(chunks.len(), 1);
    }

    #[tokio::test]
    async fn test_gather_drops_short_fragments() {
        let dir = TempDir::new().unwrap();
        let doc = Uuid::new_v4();
        let long = long_text("Mitosis");
        let retriever = retriever_with(&dir, &[(doc, "Too short."), (doc, &long)]).await;

        let chunks = gather_diverse(&retriever, doc, &[], 5).await.unwrap();
        assert!(chunks.iter().all(|c| c.meta.text.chars().count() > 50));
    }

    #[tokio::test]
    async fn test_gather_uses_focus_topics_as_extra_probes() {
        let dir = TempDir::new().unwrap();
        let doc = Uuid::new_v4();
        let texts: Vec<String> = (0..6).map(|i| long_text(&format!("Topic{}", i))).collect();
        let pairs: Vec<(Uuid, &str)> = texts.iter().map(|t| (doc, t.as_str())).collect();
        let retriever = retriever_with(&dir, &pairs).await;

        let without = gather_diverse(&retriever, doc, &[], 3).await.unwrap();
        let topics = vec!["thermal equilibrium".to_string(), "heat engines".to_string()];
        let with = gather_diverse(&retriever, doc, &topics, 3).await.unwrap();
        assert!(with.len() >= without.len());
    }

    #[tokio::test]
    async fn test_gather_empty_store_is_empty() {
        let dir = TempDir::new().unwrap();
        let retriever = retriever_with(&dir, &[]).await;
        let chunks = gather_diverse(&retriever, Uuid::new_v4(), &[], 5)
            .await
            .unwrap();
        assert!(chunks.is_empty());
    }
}
