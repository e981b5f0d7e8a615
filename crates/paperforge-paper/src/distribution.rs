//! Question quota planning across weighted sources.
//!
//! Percentages are normalized to a 100 base with integer truncation, then
//! converted to per-source quotas in declared order. The last source
//! absorbs the rounding remainder and every source gets at least one
//! question, so the realized total can exceed the requested total; the
//! pipeline truncates after generation.

use tracing::debug;
use uuid::Uuid;

use paperforge_core::{Difficulty, Error, Result, SourceWeightage};

/// Planned contribution of one source, in declared order.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceQuota {
    pub document_id: Uuid,
    pub chapter: String,
    /// Questions to request from this source. At least 1.
    pub quota: usize,
    /// Normalized percentage actually applied.
    pub weightage: u32,
    pub focus_topics: Vec<String>,
    pub difficulty: Difficulty,
}

/// Plan per-source question quotas for a paper of `total_questions`.
pub fn plan_distribution(
    sources: &[SourceWeightage],
    total_questions: usize,
) -> Result<Vec<SourceQuota>> {
    if sources.is_empty() {
        return Err(Error::InvalidInput("no sources given".to_string()));
    }
    if total_questions == 0 {
        return Err(Error::InvalidInput("total questions is zero".to_string()));
    }

    // Widened so absurd declared percentages cannot overflow.
    let sum: u64 = sources.iter().map(|s| u64::from(s.percentage)).sum();
    if sum == 0 {
        return Err(Error::InvalidInput(
            "source percentages sum to zero".to_string(),
        ));
    }

    // Normalize to a 100 base. Integer truncation matches the quota floor
    // below; the remainder lands on the last source either way. Each share
    // is at most 100 after division, so narrowing back is lossless.
    let normalized: Vec<u32> = if sum == 100 {
        sources.iter().map(|s| s.percentage).collect()
    } else {
        sources
            .iter()
            .map(|s| (u64::from(s.percentage) * 100 / sum) as u32)
            .collect()
    };

    let mut remaining = total_questions as i64;
    let mut out = Vec::with_capacity(sources.len());

    for (i, (source, pct)) in sources.iter().zip(&normalized).enumerate() {
        let count = if i == sources.len() - 1 {
            remaining
        } else {
            let c = (*pct as i64) * (total_questions as i64) / 100;
            remaining -= c;
            c
        };

        out.push(SourceQuota {
            document_id: source.document_id,
            chapter: source.chapter.clone(),
            quota: count.max(1) as usize,
            weightage: *pct,
            focus_topics: source.focus_topics.clone(),
            difficulty: source.difficulty,
        });
    }

    debug!(
        subsystem = "paper",
        component = "distribution",
        op = "plan",
        source_count = sources.len(),
        total_questions,
        planned = out.iter().map(|q| q.quota as i64).sum::<i64>(),
        "Planned question distribution"
    );
    Ok(out)
}
