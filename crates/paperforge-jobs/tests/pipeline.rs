//! End-to-end pipeline tests: ingest documents into a real store, then
//! generate a paper against it with a deterministic mock backend.

use std::sync::Arc;

use serde_json::json;
use tempfile::TempDir;
use uuid::Uuid;

use paperforge_core::{
    Difficulty, Document, DocumentKind, DocumentStatus, DocumentStore, GenerateRequest,
    IngestRequest, JobStatus, JobStore, PageText, PaperConfig, SourceWeightage,
};
use paperforge_db::{
    create_pool, ChunkMetaRepository, ChunkStore, FlatVectorIndex, InMemoryJobStore,
    SqliteDocumentStore,
};
use paperforge_inference::MockInferenceBackend;
use paperforge_jobs::{GenerateHandler, IngestHandler, Orchestrator};
use paperforge_search::Retriever;

const DIM: usize = 16;

struct Pipeline {
    documents: Arc<SqliteDocumentStore>,
    store: Arc<ChunkStore>,
    jobs: Arc<dyn JobStore>,
    embedder: Arc<MockInferenceBackend>,
    orchestrator: Orchestrator,
}

async fn pipeline(dir: &TempDir) -> Pipeline {
    let pool = create_pool(dir.path().join("pipeline.db")).await.unwrap();
    let index = FlatVectorIndex::open(dir.path().join("pipeline.json"), DIM).unwrap();
    let store = Arc::new(ChunkStore::new(index, ChunkMetaRepository::new(pool.clone())));
    let jobs: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());
    Pipeline {
        documents: Arc::new(SqliteDocumentStore::new(pool)),
        store,
        jobs: jobs.clone(),
        embedder: Arc::new(MockInferenceBackend::new().with_dimension(DIM)),
        orchestrator: Orchestrator::new(jobs),
    }
}

fn textbook_pages(subject: &str) -> Vec<PageText> {
    (1..=3)
        .map(|page| PageText {
            page,
            text: format!(
                "{subject} page {page}. {}",
                format!(
                    "The study of {subject} covers fundamental principles, \
                     practical applications, and analytical methods used \
                     throughout the field. Each concept builds on earlier \
                     definitions and supports later problem solving. "
                )
                .repeat(6)
            ),
        })
        .collect()
}

fn sample_pages() -> Vec<PageText> {
    vec![PageText {
        page: 1,
        text: "Time : 3 Hours Marks : 80. Solve any four sub-questions. \
               a) Describe the structure of the examination paper in detail. 5 \
               b) Explain how sub-questions are distributed across blocks. 5 \
               c) State the word limits that apply to every answer given. 5"
            .to_string(),
    }]
}

async fn ingest(p: &Pipeline, name: &str, kind: DocumentKind, pages: Vec<PageText>) -> Uuid {
    let doc = Document::new(name, kind);
    p.documents.register(&doc).await.unwrap();

    let handler = Arc::new(IngestHandler::new(
        p.documents.clone(),
        p.store.clone(),
        p.embedder.clone(),
    ));
    let req = IngestRequest {
        document_id: doc.id,
        kind,
        pages,
    };
    let job_id = p
        .orchestrator
        .run_blocking(handler, serde_json::to_value(&req).unwrap())
        .await
        .unwrap();
    assert_eq!(
        p.jobs.get(job_id).await.unwrap().status,
        JobStatus::Completed
    );
    doc.id
}

fn numbered_questions(n: usize) -> String {
    (1..=n)
        .map(|i| format!("{i}. Explain examined concept number {i} in depth?"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn generate_request(sources: Vec<(Uuid, u32)>, sample: Uuid) -> GenerateRequest {
    GenerateRequest {
        sources: sources
            .into_iter()
            .enumerate()
            .map(|(i, (id, pct))| SourceWeightage {
                document_id: id,
                chapter: format!("Chapter {}", i + 1),
                percentage: pct,
                focus_topics: vec![],
                difficulty: Difficulty::Medium,
            })
            .collect(),
        sample_document_id: sample,
        config: PaperConfig::default(),
        special_instructions: None,
    }
}

#[tokio::test]
async fn test_ingest_then_generate_produces_valid_paper() {
    let dir = TempDir::new().unwrap();
    let p = pipeline(&dir).await;

    let physics = ingest(&p, "physics.pdf", DocumentKind::Textbook, textbook_pages("physics")).await;
    let biology = ingest(&p, "biology.pdf", DocumentKind::Textbook, textbook_pages("biology")).await;
    let sample = ingest(&p, "sample.pdf", DocumentKind::Sample, sample_pages()).await;

    assert!(p.store.len() > 0);
    p.store.verify_alignment().await.unwrap();

    let generator = Arc::new(
        MockInferenceBackend::new().with_default_response(numbered_questions(20)),
    );
    let retriever = Arc::new(Retriever::new(p.embedder.clone(), p.store.clone()));
    let handler = Arc::new(GenerateHandler::new(retriever, generator));

    let req = generate_request(vec![(physics, 50), (biology, 50)], sample);
    let job_id = p
        .orchestrator
        .run_blocking(handler, serde_json::to_value(&req).unwrap())
        .await
        .unwrap();

    let job = p.jobs.get(job_id).await.unwrap();
    assert_eq!(job.status, JobStatus::Completed, "error: {:?}", job.error);
    assert_eq!(job.progress, 100);

    let result = job.result.unwrap();
    assert_eq!(result["total_questions"], json!(20));
    assert_eq!(result["format_valid"], json!(true));
    assert_eq!(result["questions_synthesized"], json!(0));

    let paper = result["paper"].as_str().unwrap();
    assert!(paper.contains("Marks : 80"));
    assert!(paper.contains("Explain examined concept number 1 in depth?"));
    assert!(!paper.contains("{Q"));

    let sources_used = result["sources_used"].as_array().unwrap();
    assert_eq!(sources_used.len(), 2);
    assert_eq!(sources_used[0]["questions_generated"], json!(10));
    assert_eq!(sources_used[1]["questions_generated"], json!(10));
}

#[tokio::test]
async fn test_generate_fails_without_sample_structure() {
    let dir = TempDir::new().unwrap();
    let p = pipeline(&dir).await;

    let physics = ingest(&p, "physics.pdf", DocumentKind::Textbook, textbook_pages("physics")).await;

    // Sample document registered but never ingested: no chunks for it.
    let sample = Document::new("sample.pdf", DocumentKind::Sample);
    p.documents.register(&sample).await.unwrap();

    let generator = Arc::new(
        MockInferenceBackend::new().with_default_response(numbered_questions(20)),
    );
    let retriever = Arc::new(Retriever::new(p.embedder.clone(), p.store.clone()));
    let handler = Arc::new(GenerateHandler::new(retriever, generator));

    let req = generate_request(vec![(physics, 100)], sample.id);
    let job_id = p
        .orchestrator
        .run_blocking(handler, serde_json::to_value(&req).unwrap())
        .await
        .unwrap();

    let job = p.jobs.get(job_id).await.unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.error.unwrap().contains("structure"));
}

#[tokio::test]
async fn test_generate_fails_on_insufficient_yield() {
    let dir = TempDir::new().unwrap();
    let p = pipeline(&dir).await;

    let physics = ingest(&p, "physics.pdf", DocumentKind::Textbook, textbook_pages("physics")).await;
    let sample = ingest(&p, "sample.pdf", DocumentKind::Sample, sample_pages()).await;

    // Every generation call fails with a skippable provider error, so all
    // sources are skipped and the yield gate trips.
    let generator = Arc::new(MockInferenceBackend::new().with_generation_failure());
    let retriever = Arc::new(Retriever::new(p.embedder.clone(), p.store.clone()));
    let handler = Arc::new(GenerateHandler::new(retriever, generator));

    let req = generate_request(vec![(physics, 100)], sample);
    let job_id = p
        .orchestrator
        .run_blocking(handler, serde_json::to_value(&req).unwrap())
        .await
        .unwrap();

    let job = p.jobs.get(job_id).await.unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    let error = job.error.unwrap();
    assert!(error.contains("0"), "unexpected error: {}", error);
}

#[tokio::test]
async fn test_failed_documents_leave_no_partial_generation() {
    let dir = TempDir::new().unwrap();
    let p = pipeline(&dir).await;

    // Ingestion failure marks the document failed and indexes nothing.
    let doc = Document::new("broken.pdf", DocumentKind::Textbook);
    p.documents.register(&doc).await.unwrap();

    let broken_embedder = Arc::new(
        MockInferenceBackend::new()
            .with_dimension(DIM)
            .with_embedding_failure(),
    );
    let handler = Arc::new(IngestHandler::new(
        p.documents.clone(),
        p.store.clone(),
        broken_embedder,
    ));
    let req = IngestRequest {
        document_id: doc.id,
        kind: DocumentKind::Textbook,
        pages: textbook_pages("chemistry"),
    };
    let job_id = p
        .orchestrator
        .run_blocking(handler, serde_json::to_value(&req).unwrap())
        .await
        .unwrap();

    assert_eq!(p.jobs.get(job_id).await.unwrap().status, JobStatus::Failed);
    assert_eq!(
        p.documents.fetch(doc.id).await.unwrap().status,
        DocumentStatus::Failed
    );
    assert!(p.store.is_empty());
}
