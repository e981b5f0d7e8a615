//! Chunk metadata repository.
//!
//! Each row is keyed by the vector slot id it describes and stores the
//! [`ChunkMeta`] as a JSON blob, so the schema never chases the metadata
//! shape. Batch inserts are transactional: a batch lands fully or not at
//! all, which the composed store relies on for index/metadata alignment.

use std::collections::HashMap;

use sqlx::{Row, SqlitePool};
use tracing::debug;

use paperforge_core::{ChunkMeta, DocumentKind, Error, Result};

/// SQLite-backed chunk metadata store.
#[derive(Clone)]
pub struct ChunkMetaRepository {
    pool: SqlitePool,
}

impl ChunkMetaRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a batch of metadata rows at ids `start_id..start_id + len`,
    /// all-or-nothing.
    pub async fn insert_batch(&self, start_id: i64, metas: &[ChunkMeta]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for (i, meta) in metas.iter().enumerate() {
            let data = serde_json::to_string(meta)?;
            sqlx::query("INSERT INTO chunk_meta (id, data) VALUES (?, ?)")
                .bind(start_id + i as i64)
                .bind(data)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        debug!(
            subsystem = "database",
            component = "chunk_meta",
            op = "insert_batch",
            start_id,
            count = metas.len(),
            "Inserted chunk metadata batch"
        );
        Ok(())
    }

    /// Fetch metadata for the given ids. Ids with no row are simply absent
    /// from the returned map.
    pub async fn fetch(&self, ids: &[i64]) -> Result<HashMap<i64, ChunkMeta>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT id, data FROM chunk_meta WHERE id IN ({})",
            placeholders
        );

        let mut query = sqlx::query(&sql);
        for id in ids {
            query = query.bind(id);
        }

        let rows = query.fetch_all(&self.pool).await?;
        let mut out = HashMap::with_capacity(rows.len());
        for row in rows {
            let id: i64 = row.get("id");
            let data: String = row.get("data");
            let meta: ChunkMeta = serde_json::from_str(&data)
                .map_err(|e| Error::Serialization(format!("chunk {} metadata: {}", id, e)))?;
            out.insert(id, meta);
        }
        Ok(out)
    }

    /// Total number of metadata rows.
    pub async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM chunk_meta")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }

    /// Number of metadata rows belonging to one document.
    pub async fn count_for_document(&self, document_id: uuid::Uuid) -> Result<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS n FROM chunk_meta
             WHERE json_extract(data, '$.document_id') = ?",
        )
        .bind(document_id.to_string())
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get("n"))
    }

    /// Pick up to `n` random chunks of the given kind.
    pub async fn sample_by_kind(
        &self,
        kind: DocumentKind,
        n: usize,
    ) -> Result<Vec<(i64, ChunkMeta)>> {
        let rows = sqlx::query(
            "SELECT id, data FROM chunk_meta
             WHERE json_extract(data, '$.kind') = ?
             ORDER BY RANDOM()
             LIMIT ?",
        )
        .bind(kind.to_string())
        .bind(n as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let id: i64 = row.get("id");
            let data: String = row.get("data");
            let meta: ChunkMeta = serde_json::from_str(&data)
                .map_err(|e| Error::Serialization(format!("chunk {} metadata: {}", id, e)))?;
            out.push((id, meta));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::create_pool;
    use tempfile::TempDir;
    use uuid::Uuid;

    fn meta(doc: Uuid, kind: DocumentKind, ordinal: i32) -> ChunkMeta {
        ChunkMeta {
            document_id: doc,
            kind,
            ordinal,
            page: 1,
            text: format!("chunk body {}", ordinal),
        }
    }

    async fn repo(dir: &TempDir) -> ChunkMetaRepository {
        let pool = create_pool(dir.path().join("meta.db")).await.unwrap();
        ChunkMetaRepository::new(pool)
    }

    #[tokio::test]
    async fn test_insert_batch_and_fetch() {
        let dir = TempDir::new().unwrap();
        let repo = repo(&dir).await;
        let doc = Uuid::new_v4();

        let metas: Vec<ChunkMeta> = (0..3)
            .map(|i| meta(doc, DocumentKind::Textbook, i))
            .collect();
        repo.insert_batch(0, &metas).await.unwrap();

        let fetched = repo.fetch(&[0, 2, 99]).await.unwrap();
        assert_eq!(fetched.len(), 2);
        assert_eq!(fetched[&0].ordinal, 0);
        assert_eq!(fetched[&2].ordinal, 2);
        assert!(!fetched.contains_key(&99));
    }

    #[tokio::test]
    async fn test_fetch_empty_ids_is_empty() {
        let dir = TempDir::new().unwrap();
        let repo = repo(&dir).await;
        assert!(repo.fetch(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_id_rolls_back_whole_batch() {
        let dir = TempDir::new().unwrap();
        let repo = repo(&dir).await;
        let doc = Uuid::new_v4();

        repo.insert_batch(0, &[meta(doc, DocumentKind::Textbook, 0)])
            .await
            .unwrap();

        // Second batch collides on id 0; nothing from it may land.
        let batch: Vec<ChunkMeta> = (0..2).map(|i| meta(doc, DocumentKind::Sample, i)).collect();
        assert!(repo.insert_batch(0, &batch).await.is_err());
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_count_for_document() {
        let dir = TempDir::new().unwrap();
        let repo = repo(&dir).await;
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        repo.insert_batch(
            0,
            &[
                meta(a, DocumentKind::Textbook, 0),
                meta(a, DocumentKind::Textbook, 1),
                meta(b, DocumentKind::Sample, 0),
            ],
        )
        .await
        .unwrap();

        assert_eq!(repo.count_for_document(a).await.unwrap(), 2);
        assert_eq!(repo.count_for_document(b).await.unwrap(), 1);
        assert_eq!(repo.count_for_document(Uuid::new_v4()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_sample_by_kind_filters_and_limits() {
        let dir = TempDir::new().unwrap();
        let repo = repo(&dir).await;
        let doc = Uuid::new_v4();

        let mut batch = Vec::new();
        for i in 0..6 {
            batch.push(meta(doc, DocumentKind::Textbook, i));
        }
        for i in 0..4 {
            batch.push(meta(doc, DocumentKind::Sample, i));
        }
        repo.insert_batch(0, &batch).await.unwrap();

        let sampled = repo.sample_by_kind(DocumentKind::Sample, 3).await.unwrap();
        assert_eq!(sampled.len(), 3);
        assert!(sampled.iter().all(|(_, m)| m.kind == DocumentKind::Sample));

        // Asking for more than exist returns what exists.
        let sampled = repo.sample_by_kind(DocumentKind::Sample, 10).await.unwrap();
        assert_eq!(sampled.len(), 4);
    }
}
