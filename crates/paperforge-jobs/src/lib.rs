//! # paperforge-jobs
//!
//! Background job orchestration for paperforge.
//!
//! This crate provides:
//! - A job handler abstraction with progress reporting
//! - An orchestrator spawning one task per submitted job
//! - The document ingestion pipeline (segment, embed, index)
//! - The paper generation pipeline (plan, retrieve, generate, render)
//! - A health snapshot over the pipeline's dependencies

pub mod generate;
pub mod handler;
pub mod health;
pub mod ingest;
pub mod orchestrator;

pub use generate::GenerateHandler;
pub use handler::{JobContext, JobHandler, JobResult, NoOpHandler};
pub use health::{health_snapshot, HealthSnapshot};
pub use ingest::IngestHandler;
pub use orchestrator::Orchestrator;
