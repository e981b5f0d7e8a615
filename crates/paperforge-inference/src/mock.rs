//! Mock inference backend for deterministic testing.
//!
//! Implements both capability ports with no network: embeddings are a
//! deterministic hash of the input text (identical texts always embed
//! identically), and generation answers from configured substring
//! mappings with an optional failure switch for error-path tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use paperforge_core::{
    defaults, EmbeddingBackend, Error, GenerationBackend, GenerationOptions, Result,
};

/// One logged backend invocation.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub operation: String,
    pub input: String,
}

#[derive(Clone)]
struct MockConfig {
    dimension: usize,
    default_response: String,
    /// Responses keyed by a substring of the prompt; first match wins in
    /// insertion-independent (sorted) key order.
    responses: HashMap<String, String>,
    fail_embeds: bool,
    fail_generation: bool,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            dimension: defaults::EMBED_DIMENSION,
            default_response: "1. What is the key concept?".to_string(),
            responses: HashMap::new(),
            fail_embeds: false,
            fail_generation: false,
        }
    }
}

/// Mock backend implementing both inference ports.
#[derive(Clone, Default)]
pub struct MockInferenceBackend {
    config: Arc<MockConfig>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
}

impl MockInferenceBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the embedding dimension.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        Arc::make_mut(&mut self.config).dimension = dimension;
        self
    }

    /// Set the response returned when no mapping matches.
    pub fn with_default_response(mut self, response: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).default_response = response.into();
        self
    }

    /// Map prompts containing `needle` to a fixed response.
    pub fn with_response_for(
        mut self,
        needle: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        Arc::make_mut(&mut self.config)
            .responses
            .insert(needle.into(), response.into());
        self
    }

    /// Make every embed call fail with `ProviderUnavailable`.
    pub fn with_embedding_failure(mut self) -> Self {
        Arc::make_mut(&mut self.config).fail_embeds = true;
        self
    }

    /// Make every generation call fail with `ProviderError`.
    pub fn with_generation_failure(mut self) -> Self {
        Arc::make_mut(&mut self.config).fail_generation = true;
        self
    }

    /// All logged calls, for assertions.
    pub fn calls(&self) -> Vec<MockCall> {
        self.call_log.lock().unwrap().clone()
    }

    pub fn embed_call_count(&self) -> usize {
        self.count_op("embed")
    }

    pub fn generate_call_count(&self) -> usize {
        self.count_op("generate")
    }

    fn count_op(&self, op: &str) -> usize {
        self.call_log
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.operation == op)
            .count()
    }

    fn log_call(&self, operation: &str, input: &str) {
        self.call_log.lock().unwrap().push(MockCall {
            operation: operation.to_string(),
            input: input.to_string(),
        });
    }

    /// Deterministic pseudo-embedding: FNV-style rolling hash seeds each
    /// component, normalized into [-1, 1].
    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut hash: u64 = 0xcbf29ce484222325;
        for b in text.bytes() {
            hash ^= b as u64;
            hash = hash.wrapping_mul(0x100000001b3);
        }
        (0..self.config.dimension)
            .map(|i| {
                let h = hash.wrapping_add(i as u64).wrapping_mul(0x9e3779b97f4a7c15);
                ((h >> 33) as f32 / (u32::MAX >> 1) as f32) - 1.0
            })
            .collect()
    }
}

#[async_trait]
impl EmbeddingBackend for MockInferenceBackend {
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if self.config.fail_embeds {
            return Err(Error::ProviderUnavailable("mock embed failure".to_string()));
        }
        let mut out = Vec::new();
        for text in texts.iter().filter(|t| !t.trim().is_empty()) {
            self.log_call("embed", text);
            out.push(self.embed_one(text));
        }
        Ok(out)
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    fn model_name(&self) -> &str {
        "mock-embed"
    }
}

#[async_trait]
impl GenerationBackend for MockInferenceBackend {
    async fn generate(&self, prompt: &str, _opts: &GenerationOptions) -> Result<String> {
        self.log_call("generate", prompt);
        if self.config.fail_generation {
            return Err(Error::ProviderError("mock generation failure".to_string()));
        }

        let mut keys: Vec<&String> = self.config.responses.keys().collect();
        keys.sort();
        for key in keys {
            if prompt.contains(key.as_str()) {
                return Ok(self.config.responses[key].clone());
            }
        }
        Ok(self.config.default_response.clone())
    }

    fn model_name(&self) -> &str {
        "mock-gen"
    }
}
