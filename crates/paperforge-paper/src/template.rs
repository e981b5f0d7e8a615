//! Positional paper template and format validation.
//!
//! The paper layout is a fixed 80-mark template: four main questions of
//! five 5-mark sub-questions each, reproduced byte-for-byte from the
//! institutional sample including its page-break marker and terminator
//! line. Questions fill slots in block/sub-slot enumeration order;
//! validation is a set of independent boolean predicates over the final
//! text and never mutates it.

use chrono::Utc;
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};

use paperforge_core::defaults;

/// The 80-mark paper layout. `{paper_code}` and `{Q<block>_<slot>}`
/// markers are replaced at populate time.
pub const PAPER_TEMPLATE: &str = "\
May 2024 - May 2024 - May 2024 - May 2024 - May 2024 - May 2024 - May 2024 - May 2024 - {paper_code}

Time : 3 Hours Marks : 80

Instructions :1. All Questions are Compulsory.2. Each Sub-question carry 5 marks.
3. Each Sub-question should be answered between 75 to 100 words. Write every questions
answer on separate page.
4. Question paper of 80 Marks, it will be converted in to your programme structure marks.

1. Solve any four sub-questions.
a) {Q1_A} 5
b) {Q1_B} 5
c) {Q1_C} 5
d) {Q1_D} 5
e) {Q1_E} 5

2. Solve any four sub-questions.
a) {Q2_A} 5
b) {Q2_B} 5
c) {Q2_C} 5
d) {Q2_D} 5
e) {Q2_E} 5

(P.T.O.)

3. Solve any four sub-questions.
a) {Q3_A} 5
b) {Q3_B} 5
c) {Q3_C} 5
d) {Q3_D} 5
e) {Q3_E} 5

4. Solve any four sub-questions.
a) {Q4_A} 5
b) {Q4_B} 5
c) {Q4_C} 5
d) {Q4_D} 5
e) {Q4_E} 5

sssssss";

static MARKS_80: Lazy<Regex> = Lazy::new(|| Regex::new(r"Marks\s*:\s*80").unwrap());
static TIME_3_HOURS: Lazy<Regex> = Lazy::new(|| Regex::new(r"Time\s*:\s*3\s*Hours").unwrap());
static MAIN_QUESTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\d+\.\s*Solve any four").unwrap());
static SUB_QUESTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^[a-e]\)").unwrap());
static INSTRUCTIONS: Lazy<Regex> = Lazy::new(|| Regex::new(r"Instructions\s*:").unwrap());
static PTO: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(P\.T\.O\.\)").unwrap());
static UNRESOLVED: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{[^}]+\}").unwrap());

/// Generate a paper code in the institutional style.
pub fn generate_paper_code() -> String {
    let mut rng = rand::thread_rng();
    let now = Utc::now();
    let suffix = format!(
        "T97/BMG{}/EE/{}",
        rng.gen_range(301..400),
        now.format("%Y%m%d")
    );
    format!(
        "MaKA{}-{} {} : 1{}",
        now.format("%y"),
        rng.gen_range(2000..3000),
        suffix,
        suffix
    )
}

/// Fill the template with questions in block/sub-slot enumeration order.
///
/// A short list is padded with `"Question {n} placeholder"`; extra items
/// past the slot count are ignored. The result never contains `{..}`
/// markers.
pub fn populate(questions: &[String]) -> String {
    let mut paper = PAPER_TEMPLATE.replace("{paper_code}", &generate_paper_code());

    for block in 1..=defaults::TEMPLATE_BLOCKS {
        for slot in 0..defaults::SLOTS_PER_BLOCK {
            let index = (block - 1) * defaults::SLOTS_PER_BLOCK + slot;
            let letter = (b'A' + slot as u8) as char;
            let marker = format!("{{Q{}_{}}}", block, letter);
            let text = questions
                .get(index)
                .map(|q| q.trim().to_string())
                .filter(|q| !q.is_empty())
                .unwrap_or_else(|| format!("Question {} placeholder", index + 1));
            paper = paper.replace(&marker, &text);
        }
    }

    paper
}

/// Independent format predicates over a finished paper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatChecks {
    pub has_marks_80: bool,
    pub has_time_3_hours: bool,
    pub has_4_main_questions: bool,
    pub has_20_sub_questions: bool,
    pub has_instructions: bool,
    pub has_pto: bool,
    pub has_proper_ending: bool,
    pub no_placeholders: bool,
}

impl FormatChecks {
    /// Conjunction of all predicates.
    pub fn overall(&self) -> bool {
        self.has_marks_80
            && self.has_time_3_hours
            && self.has_4_main_questions
            && self.has_20_sub_questions
            && self.has_instructions
            && self.has_pto
            && self.has_proper_ending
            && self.no_placeholders
    }
}

static SAMPLE_SUB_QUESTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[a-e]\)\s*(.+?)\s*5\s*$").unwrap());

/// Pull the existing sub-questions out of a sample paper's text, for
/// structure analysis. Very short matches are noise and dropped.
pub fn extract_sample_questions(sample_text: &str) -> Vec<String> {
    static WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
    SAMPLE_SUB_QUESTION
        .captures_iter(sample_text)
        .map(|c| WS.replace_all(c[1].trim(), " ").to_string())
        .filter(|q| q.len() > 10)
        .collect()
}

/// Run every format predicate against the paper text.
pub fn validate(paper: &str) -> FormatChecks {
    FormatChecks {
        has_marks_80: MARKS_80.is_match(paper),
        has_time_3_hours: TIME_3_HOURS.is_match(paper),
        has_4_main_questions: MAIN_QUESTION.find_iter(paper).count()
            == defaults::TEMPLATE_BLOCKS,
        has_20_sub_questions: SUB_QUESTION.find_iter(paper).count()
            == defaults::TOTAL_QUESTIONS,
        has_instructions: INSTRUCTIONS.is_match(paper),
        has_pto: PTO.is_match(paper),
        has_proper_ending: paper.contains("sssssss"),
        no_placeholders: !UNRESOLVED.is_match(paper),
    }
}
