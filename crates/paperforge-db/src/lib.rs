//! # paperforge-db
//!
//! Persistence layer for paperforge.
//!
//! This crate provides:
//! - SQLite connection pool management and schema setup
//! - Text segmentation into overlapping embedding windows
//! - A flat file-persisted vector index with exhaustive L2 search
//! - Row-aligned chunk metadata storage (JSON blobs keyed by vector slot)
//! - Document registry and job record repositories

pub mod documents;
pub mod index;
pub mod jobs;
pub mod metadata;
pub mod pool;
pub mod segment;
pub mod store;

pub use documents::SqliteDocumentStore;
pub use index::FlatVectorIndex;
pub use jobs::{InMemoryJobStore, SqliteJobStore};
pub use metadata::ChunkMetaRepository;
pub use pool::{create_pool, create_pool_with_config, PoolConfig};
pub use segment::{Segment, Segmenter};
pub use store::ChunkStore;
