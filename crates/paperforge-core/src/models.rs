//! Core data model for paperforge: documents, chunks, jobs, and the
//! weighted-source specification driving paper generation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::defaults;

// =============================================================================
// DOCUMENTS
// =============================================================================

/// Category of an ingested document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// Subject-matter source (questions are generated from these).
    Textbook,
    /// Sample exam paper (provides the structural format).
    Sample,
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Textbook => write!(f, "textbook"),
            Self::Sample => write!(f, "sample"),
        }
    }
}

impl std::str::FromStr for DocumentKind {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "textbook" => Ok(Self::Textbook),
            "sample" => Ok(Self::Sample),
            _ => Err(format!("Invalid document kind: {}", s)),
        }
    }
}

/// Lifecycle status of a document in the ingestion pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Uploaded,
    Processing,
    Completed,
    Failed,
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uploaded => write!(f, "uploaded"),
            Self::Processing => write!(f, "processing"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for DocumentStatus {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "uploaded" => Ok(Self::Uploaded),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid document status: {}", s)),
        }
    }
}

/// An ingested source document. Created on upload; only the ingestion
/// pipeline mutates its status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub name: String,
    pub kind: DocumentKind,
    pub status: DocumentStatus,
    pub created_at: DateTime<Utc>,
}

impl Document {
    /// Create a freshly uploaded document record.
    pub fn new(name: impl Into<String>, kind: DocumentKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
            status: DocumentStatus::Uploaded,
            created_at: Utc::now(),
        }
    }
}

/// One page of extracted document text, as delivered by the (external)
/// text-extraction layer. Page numbers are best-effort; 0 means unknown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageText {
    pub page: i32,
    pub text: String,
}

// =============================================================================
// CHUNKS
// =============================================================================

/// Metadata stored alongside each embedded chunk, row-aligned with the
/// vector index (metadata row N describes vector slot N).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkMeta {
    pub document_id: Uuid,
    pub kind: DocumentKind,
    /// Zero-based chunk sequence number within the document.
    pub ordinal: i32,
    /// Source page number; 0 if unknown.
    pub page: i32,
    /// Cleaned chunk text.
    pub text: String,
}

/// A chunk materialized from a similarity query, with its store id and
/// squared-L2 distance to the query vector (smaller is more similar).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub id: i64,
    pub distance: f32,
    #[serde(flatten)]
    pub meta: ChunkMeta,
}

// =============================================================================
// JOBS
// =============================================================================

/// Kind of background job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    Ingest,
    Generate,
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ingest => write!(f, "ingest"),
            Self::Generate => write!(f, "generate"),
        }
    }
}

impl std::str::FromStr for JobKind {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ingest" => Ok(Self::Ingest),
            "generate" => Ok(Self::Generate),
            _ => Err(format!("Invalid job kind: {}", s)),
        }
    }
}

/// Status of a background job. Terminal states are final: a job never
/// returns from Completed/Failed to Processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    /// Sentinel returned by lookups for unknown job ids.
    NotFound,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::NotFound)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Processing => write!(f, "processing"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::NotFound => write!(f, "not_found"),
        }
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "not_found" => Ok(Self::NotFound),
            _ => Err(format!("Invalid job status: {}", s)),
        }
    }
}

/// A background job record. Exactly one record exists per id; concurrent
/// updates are last-write-wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub kind: JobKind,
    pub status: JobStatus,
    /// Integer progress in [0, 100], monotone while processing.
    pub progress: i32,
    pub message: Option<String>,
    pub result: Option<JsonValue>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Job {
    /// Sentinel record returned for unknown job ids.
    pub fn not_found(id: Uuid) -> Self {
        Self {
            id,
            kind: JobKind::Generate,
            status: JobStatus::NotFound,
            progress: 0,
            message: None,
            result: None,
            error: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }
}

// =============================================================================
// GENERATION REQUESTS
// =============================================================================

/// Requested difficulty for questions drawn from a source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

/// How heavily one source document should contribute to a generation job.
///
/// Percentages across the sources of one request are normalized to sum to
/// 100 before being converted into per-source question quotas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceWeightage {
    pub document_id: Uuid,
    /// Display label for the chapter/source ("Chapter 3: Thermodynamics").
    pub chapter: String,
    /// Declared contribution weight, nominally 0..=100.
    pub percentage: u32,
    /// Topics the retrieval probes should emphasize for this source.
    #[serde(default)]
    pub focus_topics: Vec<String>,
    #[serde(default)]
    pub difficulty: Difficulty,
}

/// Structural configuration of the generated paper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperConfig {
    pub total_questions: usize,
    pub total_marks: u32,
    pub marks_per_question: u32,
    pub word_limit_min: u32,
    pub word_limit_max: u32,
}

impl Default for PaperConfig {
    fn default() -> Self {
        Self {
            total_questions: defaults::TOTAL_QUESTIONS,
            total_marks: defaults::TOTAL_MARKS,
            marks_per_question: defaults::MARKS_PER_QUESTION,
            word_limit_min: defaults::WORD_LIMIT_MIN,
            word_limit_max: defaults::WORD_LIMIT_MAX,
        }
    }
}

/// Request payload for a paper generation job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Weighted sources in declared order. Order is load-bearing: sources
    /// are processed in this order and the last one absorbs quota rounding.
    pub sources: Vec<SourceWeightage>,
    /// Sample paper providing the structural format.
    pub sample_document_id: Uuid,
    #[serde(default)]
    pub config: PaperConfig,
    #[serde(default)]
    pub special_instructions: Option<String>,
}

/// Request payload for an ingestion job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestRequest {
    pub document_id: Uuid,
    pub kind: DocumentKind,
    pub pages: Vec<PageText>,
}

/// Per-source summary of how generation quota was actually filled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceUsage {
    pub document_id: Uuid,
    pub chapter: String,
    pub questions_generated: usize,
    pub weightage_applied: u32,
    pub topics_covered: Vec<String>,
}
