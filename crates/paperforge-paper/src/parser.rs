//! Extraction of individual questions from raw model responses.
//!
//! Models are asked for a plain numbered list, but responses drift:
//! lettered sub-parts, prose with embedded questions, extra chatter.
//! Strategies are tried in order of reliability and the first one that
//! recovers enough of the expected count wins; shortfalls are padded with
//! synthesized placeholders so downstream templating always has a full
//! set.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use paperforge_core::defaults;

static NUMBERED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\d+[.)]\s*(.+)$").unwrap());
static LETTERED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*[a-e]\)\s*(.+)$").unwrap());
static QUESTION_SENTENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([^.!?\n]{20,}?\?)").unwrap());

/// One way of pulling question items out of a raw response.
pub trait ExtractionStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn extract(&self, response: &str) -> Vec<String>;
}

/// `1. text` / `2) text` lines, the requested output format.
pub struct NumberedLines;

impl ExtractionStrategy for NumberedLines {
    fn name(&self) -> &'static str {
        "numbered_lines"
    }

    fn extract(&self, response: &str) -> Vec<String> {
        response
            .lines()
            .filter_map(|line| {
                NUMBERED
                    .captures(line)
                    .map(|c| c[1].trim().to_string())
                    .filter(|s| !s.is_empty())
            })
            .collect()
    }
}

/// `a) text` lines, the sample-paper sub-question format some models
/// imitate.
pub struct LetteredParts;

impl ExtractionStrategy for LetteredParts {
    fn name(&self) -> &'static str {
        "lettered_parts"
    }

    fn extract(&self, response: &str) -> Vec<String> {
        response
            .lines()
            .filter_map(|line| {
                LETTERED
                    .captures(line)
                    .map(|c| c[1].trim().to_string())
                    .filter(|s| !s.is_empty())
            })
            .collect()
    }
}

/// Last resort: any sentence of substance ending in a question mark.
pub struct QuestionSentences;

impl ExtractionStrategy for QuestionSentences {
    fn name(&self) -> &'static str {
        "question_sentences"
    }

    fn extract(&self, response: &str) -> Vec<String> {
        QUESTION_SENTENCE
            .captures_iter(response)
            .map(|c| c[1].trim().to_string())
            .collect()
    }
}

/// Outcome of question extraction, always `expected` items long.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedItems {
    pub items: Vec<String>,
    /// Items actually recovered from the response.
    pub recovered: usize,
    /// Placeholder items padded in to reach the expected count.
    pub synthesized: usize,
    /// Name of the winning strategy.
    pub strategy: &'static str,
}

/// Extract exactly `expected` questions from a raw response.
///
/// Strategies run in fixed order; the first to recover at least 75% of
/// `expected` wins. If none does, the richest result is used. Shortfall
/// slots become `"Generated question {n}"`.
pub fn extract_questions(response: &str, expected: usize) -> ExtractedItems {
    let strategies: [&dyn ExtractionStrategy; 3] =
        [&NumberedLines, &LetteredParts, &QuestionSentences];
    let threshold =
        ((expected as f64) * defaults::PARSE_COVERAGE_RATIO).ceil() as usize;

    let mut best: Vec<String> = Vec::new();
    let mut best_name: &'static str = strategies[0].name();

    for strategy in strategies {
        let items = strategy.extract(response);
        if items.len() >= threshold {
            best = items;
            best_name = strategy.name();
            break;
        }
        if items.len() > best.len() {
            best = items;
            best_name = strategy.name();
        }
    }

    best.truncate(expected);
    let recovered = best.len();
    let synthesized = expected - recovered;
    for n in recovered + 1..=expected {
        best.push(format!("Generated question {}", n));
    }

    debug!(
        subsystem = "paper",
        component = "parser",
        op = "extract",
        strategy = best_name,
        expected,
        recovered,
        synthesized,
        "Extracted questions"
    );

    ExtractedItems {
        items: best,
        recovered,
        synthesized,
        strategy: best_name,
    }
}
