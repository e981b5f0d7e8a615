//! Prompt construction for question generation.
//!
//! Prompts carry a capped slice of retrieved chunk text plus strict output
//! format instructions, and are validated against a rough token budget
//! before being sent so an oversized context fails fast instead of being
//! silently truncated by the provider.

use paperforge_core::{defaults, Difficulty, Error, Result, ScoredChunk};

/// Chunks included in one prompt.
const MAX_PROMPT_CHUNKS: usize = 10;

/// Characters of each chunk quoted into the prompt.
const MAX_CHUNK_QUOTE: usize = 400;

/// Rough token estimate at ~4 characters per token.
pub fn estimate_tokens(text: &str) -> usize {
    text.len() / defaults::CHARS_PER_TOKEN
}

/// Reject prompts that would not leave room for the response within
/// `max_tokens`.
pub fn validate_prompt_length(prompt: &str, max_tokens: u32) -> Result<()> {
    let budget = (max_tokens as f64 * defaults::PROMPT_BUDGET_RATIO) as usize;
    let estimated = estimate_tokens(prompt);
    if estimated >= budget {
        return Err(Error::InvalidInput(format!(
            "prompt estimated at {} tokens exceeds budget of {}",
            estimated, budget
        )));
    }
    Ok(())
}

fn difficulty_phrase(difficulty: Difficulty) -> &'static str {
    match difficulty {
        Difficulty::Easy => "straightforward recall and definition",
        Difficulty::Medium => "understanding and explanation",
        Difficulty::Hard => "analysis, comparison, and application",
    }
}

/// Build the per-source question generation prompt.
pub fn build_source_prompt(
    chapter: &str,
    chunks: &[ScoredChunk],
    needed: usize,
    word_min: u32,
    word_max: u32,
    focus_topics: &[String],
    difficulty: Difficulty,
    special_instructions: Option<&str>,
) -> String {
    let content_text: String = chunks
        .iter()
        .take(MAX_PROMPT_CHUNKS)
        .enumerate()
        .map(|(i, chunk)| {
            let quoted: String = chunk.meta.text.chars().take(MAX_CHUNK_QUOTE).collect();
            format!("Content {}: {}", i + 1, quoted)
        })
        .collect::<Vec<_>>()
        .join("\n");

    let focus_instruction = if focus_topics.is_empty() {
        String::new()
    } else {
        format!("- Focus on: {}\n", focus_topics.join(", "))
    };
    let special = special_instructions
        .filter(|s| !s.trim().is_empty())
        .map(|s| format!("- Special instructions: {}\n", s.trim()))
        .unwrap_or_default();

    format!(
        "Generate exactly {needed} university-level questions based on this textbook content.\n\
         \n\
         ### TEXTBOOK CONTENT - {chapter}:\n\
         {content_text}\n\
         \n\
         ### REQUIREMENTS:\n\
         - Generate exactly {needed} questions\n\
         - Each question answerable in {word_min}-{word_max} words\n\
         - Use academic language appropriate for university students\n\
         - Questions should test {emphasis}, not memorization\n\
         {focus_instruction}{special}\
         \n\
         ### OUTPUT FORMAT:\n\
         List {needed} questions numbered 1-{needed}, one per line.\n\
         Do NOT include explanations or answers.\n\
         \n\
         Generate the questions:",
        emphasis = difficulty_phrase(difficulty),
    )
}
