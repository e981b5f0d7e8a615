//! # paperforge-paper
//!
//! Paper assembly for paperforge: planning how many questions each
//! weighted source contributes, building generation prompts, parsing raw
//! model responses back into question lists, and rendering them into the
//! fixed 80-mark paper template with format validation.

pub mod distribution;
pub mod parser;
pub mod prompt;
pub mod template;

pub use distribution::{plan_distribution, SourceQuota};
pub use parser::{extract_questions, ExtractedItems, ExtractionStrategy};
pub use prompt::{build_source_prompt, estimate_tokens, validate_prompt_length};
pub use template::{
    extract_sample_questions, generate_paper_code, populate, validate, FormatChecks,
    PAPER_TEMPLATE,
};
