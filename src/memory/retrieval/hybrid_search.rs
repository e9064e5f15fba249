//! Candidate merging for the hybrid query flow.
//!
//! Vector and keyword paths produce candidates on different scales. Keyword
//! hit counts are converted to the fraction of query terms matched, then both
//! lists are merged by document path keeping the stronger candidate.

use std::collections::HashMap;

use crate::memory::core::result::{RawSearchResult, SearchResult};

/// Convert keyword candidates into results scored by matched-term fraction.
///
/// A `term_count` of zero yields zero scores.
#[must_use]
#[allow(clippy::cast_precision_loss)] // Term counts are tiny.
pub fn keyword_results(raw: Vec<RawSearchResult>, term_count: usize) -> Vec<SearchResult> {
    let denominator = term_count as f64;
    raw.into_iter()
        .map(|candidate| {
            let score = if term_count == 0 {
                0.0
            } else {
                candidate.score / denominator
            };
            SearchResult::from_chunk(&candidate.chunk, score, candidate.distance)
        })
        .collect()
}

/// Merge candidate lists by path.
///
/// First-seen order is kept. When a path appears more than once the
/// higher-scoring entry replaces the earlier one in place; ties keep the
/// earlier entry.
#[must_use]
pub fn merge_by_path<I>(lists: I) -> Vec<SearchResult>
where
    I: IntoIterator<Item = Vec<SearchResult>>,
{
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut merged: Vec<SearchResult> = Vec::new();

    for result in lists.into_iter().flatten() {
        match slots.get(&result.path) {
            Some(&idx) => {
                if result.score > merged[idx].score {
                    merged[idx] = result;
                }
            }
            None => {
                slots.insert(result.path.clone(), merged.len());
                merged.push(result);
            }
        }
    }

    merged
}
