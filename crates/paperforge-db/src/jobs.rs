//! Job record stores.
//!
//! Two implementations of [`JobStore`]: a SQLite-backed one for normal
//! operation and an in-memory one for tests and embedded use. Both treat
//! Completed/Failed as final: late progress updates against a terminal job
//! are silently dropped rather than resurrecting it.

use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::{Row, SqlitePool};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use paperforge_core::{Error, Job, JobKind, JobStatus, JobStore, Result};

// =============================================================================
// SQLITE STORE
// =============================================================================

/// SQLite-backed implementation of [`JobStore`].
#[derive(Clone)]
pub struct SqliteJobStore {
    pool: SqlitePool,
}

impl SqliteJobStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn row_to_job(row: &sqlx::sqlite::SqliteRow) -> Result<Job> {
    let id: String = row.get("id");
    let kind: String = row.get("kind");
    let status: String = row.get("status");
    let result: Option<String> = row.get("result");
    let created_at: String = row.get("created_at");
    let completed_at: Option<String> = row.get("completed_at");

    let parse_ts = |s: &str| -> Result<DateTime<Utc>> {
        Ok(DateTime::parse_from_rfc3339(s)
            .map_err(|e| Error::Serialization(format!("job timestamp: {}", e)))?
            .with_timezone(&Utc))
    };

    Ok(Job {
        id: Uuid::from_str(&id)
            .map_err(|e| Error::Serialization(format!("job id {}: {}", id, e)))?,
        kind: kind.parse::<JobKind>().map_err(Error::Serialization)?,
        status: status.parse::<JobStatus>().map_err(Error::Serialization)?,
        progress: row.get("progress"),
        message: row.get("message"),
        result: result
            .map(|s| serde_json::from_str(&s))
            .transpose()
            .map_err(|e| Error::Serialization(format!("job result: {}", e)))?,
        error: row.get("error"),
        created_at: parse_ts(&created_at)?,
        completed_at: completed_at.as_deref().map(parse_ts).transpose()?,
    })
}

#[async_trait]
impl JobStore for SqliteJobStore {
    async fn create(&self, kind: JobKind) -> Result<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO jobs (id, kind, status, progress, created_at)
             VALUES (?, ?, 'pending', 0, ?)",
        )
        .bind(id.to_string())
        .bind(kind.to_string())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        debug!(
            subsystem = "database",
            component = "jobs",
            op = "create",
            job_id = %id,
            job_kind = %kind,
            "Created job"
        );
        Ok(id)
    }

    async fn set_processing(&self, id: Uuid) -> Result<()> {
        sqlx::query(
            "UPDATE jobs SET status = 'processing'
             WHERE id = ? AND status NOT IN ('completed', 'failed')",
        )
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn set_progress(&self, id: Uuid, progress: i32, message: Option<&str>) -> Result<()> {
        sqlx::query(
            "UPDATE jobs SET progress = ?, message = COALESCE(?, message)
             WHERE id = ? AND status NOT IN ('completed', 'failed')",
        )
        .bind(progress.clamp(0, 100))
        .bind(message)
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn complete(&self, id: Uuid, result: JsonValue) -> Result<()> {
        sqlx::query(
            "UPDATE jobs
             SET status = 'completed', progress = 100, result = ?, completed_at = ?
             WHERE id = ? AND status NOT IN ('completed', 'failed')",
        )
        .bind(serde_json::to_string(&result)?)
        .bind(Utc::now().to_rfc3339())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        debug!(
            subsystem = "database",
            component = "jobs",
            op = "complete",
            job_id = %id,
            "Completed job"
        );
        Ok(())
    }

    async fn fail(&self, id: Uuid, error: &str) -> Result<()> {
        sqlx::query(
            "UPDATE jobs
             SET status = 'failed', error = ?, completed_at = ?
             WHERE id = ? AND status NOT IN ('completed', 'failed')",
        )
        .bind(error)
        .bind(Utc::now().to_rfc3339())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        debug!(
            subsystem = "database",
            component = "jobs",
            op = "fail",
            job_id = %id,
            error_msg = error,
            "Failed job"
        );
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Job> {
        let row = sqlx::query("SELECT * FROM jobs WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => row_to_job(&row),
            None => Ok(Job::not_found(id)),
        }
    }
}

// =============================================================================
// IN-MEMORY STORE
// =============================================================================

/// In-memory implementation of [`JobStore`].
#[derive(Default)]
pub struct InMemoryJobStore {
    jobs: RwLock<HashMap<Uuid, Job>>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn create(&self, kind: JobKind) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let job = Job {
            id,
            kind,
            status: JobStatus::Pending,
            progress: 0,
            message: None,
            result: None,
            error: None,
            created_at: Utc::now(),
            completed_at: None,
        };
        self.jobs.write().await.insert(id, job);
        Ok(id)
    }

    async fn set_processing(&self, id: Uuid) -> Result<()> {
        if let Some(job) = self.jobs.write().await.get_mut(&id) {
            if !job.status.is_terminal() {
                job.status = JobStatus::Processing;
            }
        }
        Ok(())
    }

    async fn set_progress(&self, id: Uuid, progress: i32, message: Option<&str>) -> Result<()> {
        if let Some(job) = self.jobs.write().await.get_mut(&id) {
            if !job.status.is_terminal() {
                job.progress = progress.clamp(0, 100);
                if let Some(m) = message {
                    job.message = Some(m.to_string());
                }
            }
        }
        Ok(())
    }

    async fn complete(&self, id: Uuid, result: JsonValue) -> Result<()> {
        if let Some(job) = self.jobs.write().await.get_mut(&id) {
            if !job.status.is_terminal() {
                job.status = JobStatus::Completed;
                job.progress = 100;
                job.result = Some(result);
                job.completed_at = Some(Utc::now());
            }
        }
        Ok(())
    }

    async fn fail(&self, id: Uuid, error: &str) -> Result<()> {
        if let Some(job) = self.jobs.write().await.get_mut(&id) {
            if !job.status.is_terminal() {
                job.status = JobStatus::Failed;
                job.error = Some(error.to_string());
                job.completed_at = Some(Utc::now());
            }
        }
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Job> {
        Ok(self
            .jobs
            .read()
            .await
            .get(&id)
            .cloned()
            .unwrap_or_else(|| Job::not_found(id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::create_pool;
    use serde_json::json;
    use tempfile::TempDir;

    async fn sqlite_store(dir: &TempDir) -> SqliteJobStore {
        let pool = create_pool(dir.path().join("jobs.db")).await.unwrap();
        SqliteJobStore::new(pool)
    }

    async fn lifecycle(store: &dyn JobStore) {
        let id = store.create(JobKind::Generate).await.unwrap();
        assert_eq!(store.get(id).await.unwrap().status, JobStatus::Pending);

        store.set_processing(id).await.unwrap();
        store.set_progress(id, 25, Some("Analyzing structure")).await.unwrap();

        let job = store.get(id).await.unwrap();
        assert_eq!(job.status, JobStatus::Processing);
        assert_eq!(job.progress, 25);
        assert_eq!(job.message.as_deref(), Some("Analyzing structure"));

        store.complete(id, json!({"paper": "text"})).await.unwrap();
        let job = store.get(id).await.unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.progress, 100);
        assert_eq!(job.result, Some(json!({"paper": "text"})));
        assert!(job.completed_at.is_some());
    }

    async fn terminal_is_final(store: &dyn JobStore) {
        let id = store.create(JobKind::Ingest).await.unwrap();
        store.fail(id, "provider down").await.unwrap();

        // Late updates from a stale worker must not resurrect the job.
        store.set_progress(id, 50, Some("late")).await.unwrap();
        store.complete(id, json!({})).await.unwrap();

        let job = store.get(id).await.unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.progress, 0);
        assert_eq!(job.error.as_deref(), Some("provider down"));
    }

    async fn unknown_id_sentinel(store: &dyn JobStore) {
        let id = Uuid::new_v4();
        let job = store.get(id).await.unwrap();
        assert_eq!(job.id, id);
        assert_eq!(job.status, JobStatus::NotFound);
    }

    #[tokio::test]
    async fn test_sqlite_lifecycle() {
        let dir = TempDir::new().unwrap();
        lifecycle(&sqlite_store(&dir).await).await;
    }

    #[tokio::test]
    async fn test_sqlite_terminal_is_final() {
        let dir = TempDir::new().unwrap();
        terminal_is_final(&sqlite_store(&dir).await).await;
    }

    #[tokio::test]
    async fn test_sqlite_unknown_id_sentinel() {
        let dir = TempDir::new().unwrap();
        unknown_id_sentinel(&sqlite_store(&dir).await).await;
    }

    #[tokio::test]
    async fn test_memory_lifecycle() {
        lifecycle(&InMemoryJobStore::new()).await;
    }

    #[tokio::test]
    async fn test_memory_terminal_is_final() {
        terminal_is_final(&InMemoryJobStore::new()).await;
    }

    #[tokio::test]
    async fn test_memory_unknown_id_sentinel() {
        unknown_id_sentinel(&InMemoryJobStore::new()).await;
    }

    #[tokio::test]
    async fn test_progress_clamped() {
        let store = InMemoryJobStore::new();
        let id = store.create(JobKind::Generate).await.unwrap();
        store.set_progress(id, 150, None).await.unwrap();
        assert_eq!(store.get(id).await.unwrap().progress, 100);
        store.set_progress(id, -5, None).await.unwrap();
        assert_eq!(store.get(id).await.unwrap().progress, 0);
    }
}
