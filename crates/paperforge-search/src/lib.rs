//! # paperforge-search
//!
//! Retrieval layer for paperforge: embeds queries, runs filtered
//! nearest-neighbor search over the chunk store, and gathers diverse
//! per-source context sets for question generation.

pub mod diverse;
pub mod retriever;

pub use diverse::gather_diverse;
pub use retriever::{Retriever, SearchFilter};
