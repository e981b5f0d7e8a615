//! Paper generation pipeline.
//!
//! Plans per-source question quotas, gathers diverse context for each
//! source in declared order, generates and parses questions, gates on
//! overall yield, and renders the survivors into the fixed paper
//! template. Per-source provider hiccups are logged and skipped; the job
//! only fails when the sample structure is missing, the yield gate
//! trips, or a non-skippable error surfaces.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{info, warn};

use paperforge_core::{
    defaults, Error, GenerateRequest, GenerationBackend, GenerationOptions, JobKind, Result,
    SourceUsage,
};
use paperforge_paper::{
    build_source_prompt, extract_questions, extract_sample_questions, plan_distribution,
    populate, validate, validate_prompt_length,
};
use paperforge_search::{gather_diverse, Retriever, SearchFilter};

use crate::handler::{JobContext, JobHandler, JobResult};

/// Probe used to pull structural chunks from the sample paper.
const STRUCTURE_QUERY: &str = "question paper format";

/// Structural chunks fetched from the sample document.
const STRUCTURE_K: usize = 10;

pub struct GenerateHandler {
    retriever: Arc<Retriever>,
    generator: Arc<dyn GenerationBackend>,
}

impl GenerateHandler {
    pub fn new(retriever: Arc<Retriever>, generator: Arc<dyn GenerationBackend>) -> Self {
        Self {
            retriever,
            generator,
        }
    }

    async fn run(&self, ctx: &JobContext, req: &GenerateRequest) -> Result<serde_json::Value> {
        let total = req.config.total_questions;

        ctx.report_progress(5, "Planning question distribution").await;
        let plan = plan_distribution(&req.sources, total)?;
        ctx.report_progress(defaults::PROGRESS_PLANNED, "Planned question distribution")
            .await;

        // The sample document anchors the paper's structure; without its
        // chunks the paper format cannot be trusted.
        let structure = self
            .retriever
            .search(
                STRUCTURE_QUERY,
                STRUCTURE_K,
                &SearchFilter::for_document(req.sample_document_id),
            )
            .await?;
        if structure.is_empty() {
            return Err(Error::NotFound(format!(
                "no structure chunks for sample document {}",
                req.sample_document_id
            )));
        }
        let sample_text: String = structure
            .iter()
            .map(|c| c.meta.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let sample_questions = extract_sample_questions(&sample_text);
        info!(
            subsystem = "jobs",
            component = "generate",
            chunk_count = structure.len(),
            sample_question_count = sample_questions.len(),
            "Analyzed sample paper structure"
        );
        ctx.report_progress(defaults::PROGRESS_STRUCTURE, "Analyzed sample structure")
            .await;

        let opts = GenerationOptions {
            max_tokens: defaults::GEN_MAX_TOKENS,
            temperature: defaults::GEN_TEMPERATURE,
            ..GenerationOptions::default()
        };

        let mut questions: Vec<String> = Vec::new();
        let mut sources_used: Vec<SourceUsage> = Vec::new();
        let mut recovered_total = 0usize;
        let mut synthesized_total = 0usize;

        for quota in &plan {
            let chunks = gather_diverse(
                &self.retriever,
                quota.document_id,
                &quota.focus_topics,
                quota.quota,
            )
            .await?;
            if chunks.is_empty() {
                warn!(
                    subsystem = "jobs",
                    component = "generate",
                    document_id = %quota.document_id,
                    chapter = %quota.chapter,
                    "No content found for source, skipping"
                );
                continue;
            }

            let prompt = build_source_prompt(
                &quota.chapter,
                &chunks,
                quota.quota,
                req.config.word_limit_min,
                req.config.word_limit_max,
                &quota.focus_topics,
                quota.difficulty,
                req.special_instructions.as_deref(),
            );
            if let Err(e) = validate_prompt_length(&prompt, opts.max_tokens) {
                warn!(
                    subsystem = "jobs",
                    component = "generate",
                    chapter = %quota.chapter,
                    error_msg = %e,
                    "Prompt over budget, skipping source"
                );
                continue;
            }

            let response = match self.generator.generate(&prompt, &opts).await {
                Ok(text) => text,
                Err(e) if e.is_source_skippable() => {
                    warn!(
                        subsystem = "jobs",
                        component = "generate",
                        chapter = %quota.chapter,
                        error_msg = %e,
                        "Generation failed for source, skipping"
                    );
                    continue;
                }
                Err(e) => return Err(e),
            };

            let extracted = extract_questions(&response, quota.quota);
            recovered_total += extracted.recovered;
            synthesized_total += extracted.synthesized;

            info!(
                subsystem = "jobs",
                component = "generate",
                chapter = %quota.chapter,
                quota = quota.quota,
                recovered = extracted.recovered,
                "Generated questions for source"
            );

            sources_used.push(SourceUsage {
                document_id: quota.document_id,
                chapter: quota.chapter.clone(),
                questions_generated: extracted.items.len(),
                weightage_applied: quota.weightage,
                topics_covered: quota.focus_topics.clone(),
            });
            questions.extend(extracted.items);
        }

        ctx.report_progress(defaults::PROGRESS_GENERATED, "Generated questions")
            .await;

        let need = (total as f64 * defaults::YIELD_THRESHOLD_RATIO).ceil() as usize;
        if questions.len() < need {
            return Err(Error::InsufficientYield {
                got: questions.len(),
                need,
            });
        }

        questions.truncate(total);
        ctx.report_progress(defaults::PROGRESS_TRIMMED, "Trimmed to requested total")
            .await;

        let paper = populate(&questions);
        let checks = validate(&paper);
        ctx.report_progress(defaults::PROGRESS_TEMPLATED, "Rendered paper template")
            .await;

        Ok(json!({
            "paper": paper,
            "format_checks": checks,
            "format_valid": checks.overall(),
            "total_questions": questions.len(),
            "total_marks": req.config.total_marks,
            "sources_used": sources_used,
            "questions_recovered": recovered_total,
            "questions_synthesized": synthesized_total,
        }))
    }
}

#[async_trait]
impl JobHandler for GenerateHandler {
    fn kind(&self) -> JobKind {
        JobKind::Generate
    }

    async fn execute(&self, ctx: &JobContext) -> JobResult {
        let req: GenerateRequest = match ctx.request() {
            Ok(req) => req,
            Err(e) => return JobResult::from_error(&e),
        };

        match self.run(ctx, &req).await {
            Ok(result) => JobResult::Success(Some(result)),
            Err(e) => JobResult::from_error(&e),
        }
    }
}
