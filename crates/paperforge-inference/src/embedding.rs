//! HTTP embedding backend (Ollama-compatible `/api/embed`).

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use paperforge_core::{EmbeddingBackend, Error, Result};

use crate::config::InferenceConfig;

/// Embedding backend speaking the Ollama embed API.
pub struct HttpEmbeddingBackend {
    client: Client,
    base_url: String,
    model: String,
    dimension: usize,
    timeout: Duration,
}

impl HttpEmbeddingBackend {
    pub fn new(config: &InferenceConfig) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| Error::Config(format!("http client: {}", e)))?;
        Ok(Self {
            client,
            base_url: config.embed_url.trim_end_matches('/').to_string(),
            model: config.embed_model.clone(),
            dimension: config.embed_dimension,
            timeout: config.embed_timeout,
        })
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[async_trait]
impl EmbeddingBackend for HttpEmbeddingBackend {
    #[instrument(skip(self, texts), fields(subsystem = "inference", component = "embedding", op = "embed_texts", model = %self.model, input_count = texts.len()))]
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        // Blank inputs embed to garbage on most models; drop them up front.
        let inputs: Vec<String> = texts
            .iter()
            .filter(|t| !t.trim().is_empty())
            .cloned()
            .collect();
        if inputs.is_empty() {
            return Ok(vec![]);
        }

        let start = Instant::now();
        let request = EmbedRequest {
            model: &self.model,
            input: &inputs,
        };

        let response = self
            .client
            .post(format!("{}/api/embed", self.base_url))
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Timeout(self.timeout)
                } else {
                    Error::ProviderUnavailable(format!("embedding server: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::ProviderError(format!(
                "embedding server returned {}: {}",
                status, body
            )));
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::ProviderError(format!("malformed embed response: {}", e)))?;

        if parsed.embeddings.len() != inputs.len() {
            return Err(Error::ProviderError(format!(
                "embedding count mismatch: sent {}, got {}",
                inputs.len(),
                parsed.embeddings.len()
            )));
        }
        for v in &parsed.embeddings {
            if v.len() != self.dimension {
                return Err(Error::ProviderError(format!(
                    "embedding dimension {}, expected {}",
                    v.len(),
                    self.dimension
                )));
            }
        }

        debug!(
            result_count = parsed.embeddings.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Embedded texts"
        );
        Ok(parsed.embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
