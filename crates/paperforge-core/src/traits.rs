//! Core traits for paperforge abstractions.
//!
//! These traits define the interfaces that concrete implementations must
//! satisfy, enabling pluggable backends and testability.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::defaults;
use crate::error::Result;
use crate::models::{Document, DocumentStatus, Job, JobKind};

// =============================================================================
// DOCUMENT STORE
// =============================================================================

/// Registry of ingested documents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Register a new document (idempotent on id: replaces the record).
    async fn register(&self, doc: &Document) -> Result<()>;

    /// Fetch a document by id.
    async fn fetch(&self, id: Uuid) -> Result<Document>;

    /// List all registered documents, newest first.
    async fn list(&self) -> Result<Vec<Document>>;

    /// Update the lifecycle status of a document.
    async fn update_status(&self, id: Uuid, status: DocumentStatus) -> Result<()>;
}

// =============================================================================
// JOB STORE
// =============================================================================

/// Store of job records keyed by id.
///
/// Concurrent updates to one id are last-write-wins; callers serialize
/// their own progress updates per job. Lookups of unknown ids return the
/// [`Job::not_found`] sentinel rather than an error.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Create a new pending job, returning its id.
    async fn create(&self, kind: JobKind) -> Result<Uuid>;

    /// Move a job into the Processing state.
    async fn set_processing(&self, id: Uuid) -> Result<()>;

    /// Update progress (and optional human-readable message) of a
    /// processing job. Progress is clamped to [0, 100].
    async fn set_progress(&self, id: Uuid, progress: i32, message: Option<&str>) -> Result<()>;

    /// Mark a job completed with its result payload. Terminal.
    async fn complete(&self, id: Uuid, result: JsonValue) -> Result<()>;

    /// Mark a job failed with a human-readable error. Terminal.
    async fn fail(&self, id: Uuid, error: &str) -> Result<()>;

    /// Fetch the current job record, or the NotFound sentinel.
    async fn get(&self, id: Uuid) -> Result<Job>;
}

// =============================================================================
// INFERENCE PORTS
// =============================================================================

/// Backend for embedding generation.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Generate embeddings for the given texts.
    ///
    /// Blank inputs are dropped; otherwise returns one vector per input,
    /// in input order. Fails with `Error::ProviderUnavailable` when the
    /// underlying model cannot be reached or loaded.
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// The fixed dimension of produced vectors.
    fn dimension(&self) -> usize;

    /// The model name being used.
    fn model_name(&self) -> &str;
}

/// Options for a single generation call.
#[derive(Debug, Clone)]
pub struct GenerationOptions {
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout: Duration,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_tokens: defaults::GEN_MAX_TOKENS,
            temperature: defaults::GEN_TEMPERATURE,
            timeout: Duration::from_secs(defaults::GEN_TIMEOUT_SECS),
        }
    }
}

/// Backend for text generation (LLM).
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate text given a prompt.
    ///
    /// Fails with `Error::Timeout` past the configured deadline,
    /// `Error::ProviderError` on a non-success response, and
    /// `Error::EmptyResponse` when the provider returns no choices.
    async fn generate(&self, prompt: &str, opts: &GenerationOptions) -> Result<String>;

    /// The model name being used.
    fn model_name(&self) -> &str;

    /// Check whether the backend is available and responding.
    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}
