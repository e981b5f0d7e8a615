//! OpenRouter generation backend.
//!
//! Speaks the OpenAI-compatible chat completions API. Any provider
//! reachable through an OpenRouter-style endpoint works by pointing the
//! base URL at it.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use paperforge_core::{Error, GenerationBackend, GenerationOptions, Result};

use crate::config::InferenceConfig;

/// OpenRouter chat completions backend.
#[derive(Debug)]
pub struct OpenRouterBackend {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenRouterBackend {
    /// Build from configuration. Fails when no API key is configured;
    /// callers without a key should wrap the mock or rely on the fallback
    /// decorator instead.
    pub fn new(config: &InferenceConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| Error::Config("OPENROUTER_API_KEY is not set".to_string()))?;

        let client = Client::builder()
            .build()
            .map_err(|e| Error::Config(format!("http client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.openrouter_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.gen_model.clone(),
        })
    }

    fn map_send_error(e: reqwest::Error, timeout: Duration) -> Error {
        if e.is_timeout() {
            Error::Timeout(timeout)
        } else if e.is_connect() {
            Error::ProviderUnavailable(e.to_string())
        } else {
            Error::ProviderError(e.to_string())
        }
    }
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[async_trait]
impl GenerationBackend for OpenRouterBackend {
    #[instrument(skip(self, prompt), fields(subsystem = "inference", component = "openrouter", op = "generate", model = %self.model, prompt_len = prompt.len()))]
    async fn generate(&self, prompt: &str, opts: &GenerationOptions) -> Result<String> {
        let start = Instant::now();

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: opts.max_tokens,
            temperature: opts.temperature,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(opts.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| Self::map_send_error(e, opts.timeout))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(
                status = status.as_u16(),
                duration_ms = start.elapsed().as_millis() as u64,
                "Provider returned error status"
            );
            return Err(Error::ProviderError(format!(
                "provider returned {}: {}",
                status, body
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::ProviderError(format!("malformed response: {}", e)))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        if content.trim().is_empty() {
            return Err(Error::EmptyResponse);
        }

        debug!(
            response_len = content.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Generation complete"
        );
        Ok(content)
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn health_check(&self) -> Result<bool> {
        let response = self
            .client
            .get(format!("{}/models", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(Duration::from_secs(10))
            .send()
            .await;
        match response {
            Ok(r) => Ok(r.status().is_success()),
            Err(_) => Ok(false),
        }
    }
}
