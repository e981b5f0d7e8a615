//! # paperforge-inference
//!
//! Inference backends for paperforge.
//!
//! This crate provides:
//! - OpenRouter-compatible chat completions generation backend
//! - HTTP embedding backend (Ollama embed API)
//! - A fallback decorator substituting canned questions on provider failure
//! - A synchronous generation wrapper with an independent deadline
//! - A deterministic mock backend for tests

pub mod blocking;
pub mod config;
pub mod embedding;
pub mod fallback;
pub mod mock;
pub mod openrouter;

pub use blocking::generate_blocking;
pub use config::InferenceConfig;
pub use embedding::HttpEmbeddingBackend;
pub use fallback::{FallbackGeneration, FALLBACK_QUESTIONS};
pub use mock::MockInferenceBackend;
pub use openrouter::OpenRouterBackend;
