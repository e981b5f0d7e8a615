//! Document registry repository.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use paperforge_core::{
    Document, DocumentKind, DocumentStatus, DocumentStore, Error, Result,
};

/// SQLite-backed implementation of [`DocumentStore`].
#[derive(Clone)]
pub struct SqliteDocumentStore {
    pool: SqlitePool,
}

impl SqliteDocumentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn row_to_document(row: &sqlx::sqlite::SqliteRow) -> Result<Document> {
    let id: String = row.get("id");
    let kind: String = row.get("kind");
    let status: String = row.get("status");
    let created_at: String = row.get("created_at");

    Ok(Document {
        id: Uuid::from_str(&id)
            .map_err(|e| Error::Serialization(format!("document id {}: {}", id, e)))?,
        name: row.get("name"),
        kind: kind
            .parse::<DocumentKind>()
            .map_err(Error::Serialization)?,
        status: status
            .parse::<DocumentStatus>()
            .map_err(Error::Serialization)?,
        created_at: DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| Error::Serialization(format!("document timestamp: {}", e)))?
            .with_timezone(&Utc),
    })
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn register(&self, doc: &Document) -> Result<()> {
        sqlx::query(
            "INSERT OR REPLACE INTO documents (id, name, kind, status, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(doc.id.to_string())
        .bind(&doc.name)
        .bind(doc.kind.to_string())
        .bind(doc.status.to_string())
        .bind(doc.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        debug!(
            subsystem = "database",
            component = "documents",
            op = "register",
            document_id = %doc.id,
            kind = %doc.kind,
            "Registered document"
        );
        Ok(())
    }

    async fn fetch(&self, id: Uuid) -> Result<Document> {
        let row = sqlx::query("SELECT * FROM documents WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?
            .ok_or(Error::DocumentNotFound(id))?;
        row_to_document(&row)
    }

    async fn list(&self) -> Result<Vec<Document>> {
        let rows = sqlx::query("SELECT * FROM documents ORDER BY created_at DESC, id")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_document).collect()
    }

    async fn update_status(&self, id: Uuid, status: DocumentStatus) -> Result<()> {
        let result = sqlx::query("UPDATE documents SET status = ? WHERE id = ?")
            .bind(status.to_string())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::DocumentNotFound(id));
        }

        debug!(
            subsystem = "database",
            component = "documents",
            op = "update_status",
            document_id = %id,
            status = %status,
            "Updated document status"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::create_pool;
    use tempfile::TempDir;

    async fn store(dir: &TempDir) -> SqliteDocumentStore {
        let pool = create_pool(dir.path().join("docs.db")).await.unwrap();
        SqliteDocumentStore::new(pool)
    }

    #[tokio::test]
    async fn test_register_and_fetch() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir).await;

        let doc = Document::new("thermo.pdf", DocumentKind::Textbook);
        store.register(&doc).await.unwrap();

        let fetched = store.fetch(doc.id).await.unwrap();
        assert_eq!(fetched.id, doc.id);
        assert_eq!(fetched.name, "thermo.pdf");
        assert_eq!(fetched.kind, DocumentKind::Textbook);
        assert_eq!(fetched.status, DocumentStatus::Uploaded);
    }

    #[tokio::test]
    async fn test_fetch_unknown_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir).await;
        let id = Uuid::new_v4();
        assert!(matches!(
            store.fetch(id).await.unwrap_err(),
            Error::DocumentNotFound(got) if got == id
        ));
    }

    #[tokio::test]
    async fn test_register_replaces_existing_record() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir).await;

        let mut doc = Document::new("sample.pdf", DocumentKind::Sample);
        store.register(&doc).await.unwrap();

        doc.name = "sample-2024.pdf".to_string();
        store.register(&doc).await.unwrap();

        let fetched = store.fetch(doc.id).await.unwrap();
        assert_eq!(fetched.name, "sample-2024.pdf");
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_status_lifecycle() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir).await;

        let doc = Document::new("bio.pdf", DocumentKind::Textbook);
        store.register(&doc).await.unwrap();

        store
            .update_status(doc.id, DocumentStatus::Processing)
            .await
            .unwrap();
        store
            .update_status(doc.id, DocumentStatus::Completed)
            .await
            .unwrap();
        assert_eq!(
            store.fetch(doc.id).await.unwrap().status,
            DocumentStatus::Completed
        );

        assert!(matches!(
            store
                .update_status(Uuid::new_v4(), DocumentStatus::Failed)
                .await
                .unwrap_err(),
            Error::DocumentNotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir).await;

        let mut older = Document::new("a.pdf", DocumentKind::Textbook);
        older.created_at = Utc::now() - chrono::Duration::hours(1);
        let newer = Document::new("b.pdf", DocumentKind::Sample);

        store.register(&older).await.unwrap();
        store.register(&newer).await.unwrap();

        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, newer.id);
        assert_eq!(listed[1].id, older.id);
    }
}
