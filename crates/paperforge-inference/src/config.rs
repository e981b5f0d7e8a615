//! Inference configuration from the environment.
//!
//! All knobs come from `PAPERFORGE_*` environment variables with defaults
//! from [`paperforge_core::defaults`]. A `.env` file in the working
//! directory is honored via dotenvy.

use std::time::Duration;

use tracing::{debug, warn};

use paperforge_core::defaults;

/// Default URL of the embedding server (Ollama-compatible).
pub const DEFAULT_EMBED_URL: &str = "http://localhost:11434";

/// Configuration for the inference backends.
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    /// OpenRouter-compatible chat completions base URL.
    pub openrouter_url: String,
    /// API key for the generation provider. Absent means generation will
    /// run on the fallback path only.
    pub api_key: Option<String>,
    /// Generation model identifier.
    pub gen_model: String,
    /// Generation request timeout.
    pub gen_timeout: Duration,
    /// Embedding server base URL.
    pub embed_url: String,
    /// Embedding model identifier.
    pub embed_model: String,
    /// Expected embedding dimension.
    pub embed_dimension: usize,
    /// Embedding request timeout.
    pub embed_timeout: Duration,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            openrouter_url: defaults::OPENROUTER_URL.to_string(),
            api_key: None,
            gen_model: defaults::GEN_MODEL.to_string(),
            gen_timeout: Duration::from_secs(defaults::GEN_TIMEOUT_SECS),
            embed_url: DEFAULT_EMBED_URL.to_string(),
            embed_model: defaults::EMBED_MODEL.to_string(),
            embed_dimension: defaults::EMBED_DIMENSION,
            embed_timeout: Duration::from_secs(defaults::EMBED_TIMEOUT_SECS),
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env_var(name).and_then(|v| v.parse().ok()).unwrap_or(default)
}

impl InferenceConfig {
    /// Load configuration from environment variables, reading a `.env`
    /// file first when present.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        let defaults = Self::default();
        let api_key = env_var("OPENROUTER_API_KEY");
        if api_key.is_none() {
            warn!(
                subsystem = "inference",
                component = "config",
                "OPENROUTER_API_KEY not set, generation will use the fallback paper"
            );
        }

        let config = Self {
            openrouter_url: env_var("PAPERFORGE_OPENROUTER_URL")
                .unwrap_or(defaults.openrouter_url),
            api_key,
            gen_model: env_var("PAPERFORGE_GEN_MODEL").unwrap_or(defaults.gen_model),
            gen_timeout: Duration::from_secs(env_parse(
                "PAPERFORGE_GEN_TIMEOUT_SECS",
                defaults.gen_timeout.as_secs(),
            )),
            embed_url: env_var("PAPERFORGE_EMBED_URL").unwrap_or(defaults.embed_url),
            embed_model: env_var("PAPERFORGE_EMBED_MODEL").unwrap_or(defaults.embed_model),
            embed_dimension: env_parse("PAPERFORGE_EMBED_DIM", defaults.embed_dimension),
            embed_timeout: Duration::from_secs(env_parse(
                "PAPERFORGE_EMBED_TIMEOUT_SECS",
                defaults.embed_timeout.as_secs(),
            )),
        };

        debug!(
            subsystem = "inference",
            component = "config",
            gen_model = %config.gen_model,
            embed_model = %config.embed_model,
            embed_dimension = config.embed_dimension,
            "Loaded inference configuration"
        );
        config
    }
}
