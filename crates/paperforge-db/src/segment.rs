//! Text segmentation for embedding: cleaning plus overlapping windows with
//! sentence-boundary trimming.
//!
//! Raw page text is cleaned (control characters stripped, whitespace
//! collapsed, punctuation allow-listed) and then walked in windows of a
//! target character size. A window that would split mid-sentence is trimmed
//! back to its last sentence terminator, but only when that terminator lies
//! past 70% of the window, so terminator-free text never degenerates into
//! runaway tiny windows.

use once_cell::sync::Lazy;
use regex::Regex;

use paperforge_core::defaults;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static DISALLOWED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s.,?!;:\-()\[\]{}]").unwrap());

/// Configuration for the segmenter.
#[derive(Debug, Clone)]
pub struct Segmenter {
    /// Target characters per window.
    size: usize,
    /// Characters of overlap between consecutive windows.
    overlap: usize,
}

impl Default for Segmenter {
    fn default() -> Self {
        Self {
            size: defaults::CHUNK_SIZE,
            overlap: defaults::CHUNK_OVERLAP,
        }
    }
}

/// One yielded chunk of cleaned text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Cleaned, trimmed chunk text. Never empty.
    pub text: String,
    /// Sequence number over yielded chunks, zero-based.
    pub ordinal: i32,
    /// Start offset in the cleaned text, in characters. Strictly
    /// increasing across the yielded sequence.
    pub start: usize,
}

impl Segmenter {
    pub fn new(size: usize, overlap: usize) -> Self {
        Self {
            size: size.max(1),
            overlap,
        }
    }

    /// Normalize whitespace and strip characters outside the allow-listed
    /// punctuation set.
    pub fn clean(&self, raw: &str) -> String {
        let no_nul = raw.replace('\0', "");
        let collapsed = WHITESPACE.replace_all(&no_nul, " ");
        let cleaned = DISALLOWED.replace_all(&collapsed, "");
        cleaned.trim().to_string()
    }

    /// Split raw text into overlapping chunks.
    ///
    /// Texts shorter than the window size yield exactly one chunk; texts
    /// that are empty after cleaning yield none.
    pub fn segment(&self, raw: &str) -> Vec<Segment> {
        let cleaned = self.clean(raw);
        let chars: Vec<char> = cleaned.chars().collect();

        let mut out = Vec::new();
        let mut ordinal = 0i32;
        let mut start = 0usize;

        while start < chars.len() {
            let mut end = (start + self.size).min(chars.len());
            let at_text_end = end == chars.len();

            if !at_text_end {
                let window = &chars[start..end];
                if let Some(last_term) = window
                    .iter()
                    .rposition(|c| matches!(c, '.' | '!' | '?'))
                {
                    // Trim to the terminator only when it sits close enough
                    // to the window end.
                    if last_term as f64
                        > window.len() as f64 * defaults::SENTENCE_TRIM_RATIO
                    {
                        end = start + last_term + 1;
                    }
                }
            }

            let text: String = chars[start..end].iter().collect();
            let text = text.trim().to_string();
            if !text.is_empty() {
                out.push(Segment {
                    text,
                    ordinal,
                    start,
                });
                ordinal += 1;
            }

            if at_text_end {
                break;
            }

            // Advance by window length minus overlap; force advancement to
            // the window end when overlap would stall the cursor.
            let next = end.saturating_sub(self.overlap);
            start = if next <= start { end } else { next };
        }

        out
    }
}
