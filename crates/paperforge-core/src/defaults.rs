//! Centralized default constants for the paperforge system.
//!
//! **This module is the single source of truth** for all shared default
//! values. Crates reference these constants instead of defining their own
//! magic numbers.

// =============================================================================
// SEGMENTATION
// =============================================================================

/// Target characters per chunk for text splitting.
pub const CHUNK_SIZE: usize = 1000;

/// Overlap characters between adjacent chunks for context preservation.
pub const CHUNK_OVERLAP: usize = 200;

/// A window is trimmed at its last sentence terminator only when the
/// terminator lies past this fraction of the window length.
pub const SENTENCE_TRIM_RATIO: f64 = 0.7;

// =============================================================================
// EMBEDDING
// =============================================================================

/// Default embedding model name (MiniLM-class sentence encoder).
pub const EMBED_MODEL: &str = "all-minilm";

/// Embedding vector dimension. Fixed for the lifetime of one vector store;
/// changing it invalidates the existing index.
pub const EMBED_DIMENSION: usize = 384;

/// Number of chunk texts embedded per provider call during ingestion.
pub const EMBED_BATCH_SIZE: usize = 32;

/// Default embedding request timeout in seconds.
pub const EMBED_TIMEOUT_SECS: u64 = 60;

// =============================================================================
// GENERATION
// =============================================================================

/// Default generation model slug (OpenRouter naming).
pub const GEN_MODEL: &str = "deepseek/deepseek-chat";

/// Default OpenRouter-compatible chat completions endpoint.
pub const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1";

/// Default maximum tokens per generation call.
pub const GEN_MAX_TOKENS: u32 = 4000;

/// Default sampling temperature. Low, for consistent formatting.
pub const GEN_TEMPERATURE: f32 = 0.3;

/// Default generation request timeout in seconds.
pub const GEN_TIMEOUT_SECS: u64 = 180;

/// Rough token estimate: characters per token.
pub const CHARS_PER_TOKEN: usize = 4;

/// A prompt must fit within this fraction of the token budget, leaving
/// room for the response.
pub const PROMPT_BUDGET_RATIO: f64 = 0.7;

// =============================================================================
// RETRIEVAL
// =============================================================================

/// Default number of results per similarity search.
pub const SEARCH_K: usize = 8;

/// Over-fetch multiplier to absorb post-filtering loss.
pub const SEARCH_OVERSAMPLE: usize = 3;

/// Results per probe query in diverse multi-query retrieval.
pub const DIVERSE_K_PER_QUERY: usize = 3;

/// Content-prefix length used as the deduplication key.
pub const DEDUP_PREFIX_LEN: usize = 100;

/// Chunks with cleaned text at or below this length are dropped from
/// diverse retrieval results.
pub const MIN_CHUNK_TEXT_LEN: usize = 50;

// =============================================================================
// PAPER ASSEMBLY
// =============================================================================

/// Question blocks in the paper template.
pub const TEMPLATE_BLOCKS: usize = 4;

/// Sub-question slots (a..e) per block.
pub const SLOTS_PER_BLOCK: usize = 5;

/// Total questions a paper must carry.
pub const TOTAL_QUESTIONS: usize = TEMPLATE_BLOCKS * SLOTS_PER_BLOCK;

/// Total marks of the paper.
pub const TOTAL_MARKS: u32 = 80;

/// Marks per sub-question.
pub const MARKS_PER_QUESTION: u32 = 5;

/// Answer word-limit range printed in the instructions.
pub const WORD_LIMIT_MIN: u32 = 75;
pub const WORD_LIMIT_MAX: u32 = 100;

/// An extraction strategy wins once it recovers this fraction of the
/// expected item count.
pub const PARSE_COVERAGE_RATIO: f64 = 0.75;

/// A generation job fails when fewer than this fraction of requested
/// questions were recovered across all sources.
pub const YIELD_THRESHOLD_RATIO: f64 = 0.8;

// =============================================================================
// JOBS
// =============================================================================

/// Progress milestones reported by the generation pipeline.
pub const PROGRESS_PLANNED: i32 = 15;
pub const PROGRESS_STRUCTURE: i32 = 25;
pub const PROGRESS_GENERATED: i32 = 70;
pub const PROGRESS_TRIMMED: i32 = 80;
pub const PROGRESS_TEMPLATED: i32 = 90;
