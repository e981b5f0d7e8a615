//! Fallback decorator for generation backends.
//!
//! Wraps any [`GenerationBackend`] and substitutes a canned, structurally
//! valid response when the inner backend fails. This keeps the paper
//! pipeline demonstrable with no provider configured and degrades a flaky
//! provider into a usable (if generic) paper instead of a dead job.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use paperforge_core::{GenerationBackend, GenerationOptions, Result};

/// Canned question list returned when the real provider fails. Twenty
/// numbered items so the downstream parser and template fill cleanly.
pub const FALLBACK_QUESTIONS: &str = "\
1. Define the central concept of this chapter and explain its significance.
2. Describe the key properties that characterize the main subject studied here.
3. Explain one practical application of the principles covered in this material.
4. Outline the standard procedure used to analyze problems in this area.
5. Classify the major types or categories discussed and give one example of each.
6. Compare and contrast the two most important approaches presented in the text.
7. State the fundamental assumptions underlying the primary model described.
8. Explain how the main process unfolds, naming each stage in order.
9. Discuss the limitations of the principal method covered in this chapter.
10. Give a worked example illustrating the core technique introduced here.
11. Define the key terms introduced in this section and relate them to one another.
12. Describe the historical development of the central idea in this material.
13. Explain the causes and effects of the main phenomenon under study.
14. Summarize the evidence supporting the principal theory discussed.
15. Describe how the central concept applies in a real-world scenario.
16. Explain the relationship between the two main quantities analyzed in the text.
17. Outline the advantages and disadvantages of the standard approach described.
18. State and explain the most important rule or law presented in this chapter.
19. Describe an experiment or observation that demonstrates the key principle.
20. Discuss how the material in this chapter connects to the wider subject.";

/// Decorator returning [`FALLBACK_QUESTIONS`] when the inner backend
/// fails.
pub struct FallbackGeneration {
    inner: Arc<dyn GenerationBackend>,
}

impl FallbackGeneration {
    pub fn new(inner: Arc<dyn GenerationBackend>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl GenerationBackend for FallbackGeneration {
    async fn generate(&self, prompt: &str, opts: &GenerationOptions) -> Result<String> {
        match self.inner.generate(prompt, opts).await {
            Ok(text) => Ok(text),
            Err(e) => {
                warn!(
                    subsystem = "inference",
                    component = "fallback",
                    model = self.inner.model_name(),
                    error_msg = %e,
                    "Generation failed, substituting fallback questions"
                );
                Ok(FALLBACK_QUESTIONS.to_string())
            }
        }
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    async fn health_check(&self) -> Result<bool> {
        self.inner.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockInferenceBackend;

    #[tokio::test]
    async fn test_passes_through_success() {
        let inner = Arc::new(MockInferenceBackend::new().with_default_response("1. Real question?"));
        let backend = FallbackGeneration::new(inner);
        let out = backend
            .generate("prompt", &GenerationOptions::default())
            .await
            .unwrap();
        assert_eq!(out, "1. Real question?");
    }

    #[tokio::test]
    async fn test_substitutes_canned_questions_on_failure() {
        let inner = Arc::new(MockInferenceBackend::new().with_generation_failure());
        let backend = FallbackGeneration::new(inner);
        let out = backend
            .generate("prompt", &GenerationOptions::default())
            .await
            .unwrap();
        assert_eq!(out, FALLBACK_QUESTIONS);
    }

    #[test]
    fn test_fallback_has_twenty_numbered_items() {
        let numbered = FALLBACK_QUESTIONS
            .lines()
            .filter(|l| {
                l.split('.').next().map(|n| n.trim().parse::<u32>().is_ok()) == Some(true)
            })
            .count();
        assert_eq!(numbered, 20);
    }
}
