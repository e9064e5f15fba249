//! Final merge-and-sort stage for search results.
//!
//! Results are bucketed into three tiers by title overlap. Strong title
//! matches sort by overlap, medium ones promote durable content types, and the
//! rest fall back to the engine score alone.

use std::cmp::Ordering;

use tracing::debug;

use crate::memory::core::result::SearchResult;
use crate::memory::retrieval::title_overlap::overlap_for_sort;

/// Lower bound of the top tier. `3/5 * 3/9` evaluates to `0.1999..` and must land here.
pub const TIER_HIGH: f64 = 0.199;

/// Lower bound of the middle tier.
pub const TIER_MID: f64 = 0.10;

/// Directory names marking raw experiment output.
pub const NOISE_PATH_MARKERS: &[&str] = &["raw-output", "raw-outputs", "raw_output", "raw_outputs"];

#[derive(Debug)]
struct Scored {
    overlap: f64,
    result: SearchResult,
}

impl Scored {
    fn tier(&self) -> u8 {
        if self.overlap >= TIER_HIGH {
            0
        } else if self.overlap >= TIER_MID {
            1
        } else {
            2
        }
    }
}

/// Reorder results by title overlap, content type, and engine score.
///
/// Returns the input unchanged when either argument is empty.
#[must_use]
pub fn rank_search_results<S: AsRef<str>>(
    results: Vec<SearchResult>,
    query_terms: &[S],
) -> Vec<SearchResult> {
    if results.is_empty() || query_terms.is_empty() {
        return results;
    }

    let scored: Vec<Scored> = results
        .into_iter()
        .map(|result| Scored {
            overlap: overlap_for_sort(query_terms, &result.title, &result.path),
            result,
        })
        .collect();

    let scored = drop_noise(scored);
    let mut scored = collapse_near_duplicates(scored);
    insertion_sort_by(&mut scored, compare_scored);

    debug!(results = scored.len(), "ranked search results");
    scored.into_iter().map(|s| s.result).collect()
}

/// True if any directory segment of `path` is a raw-output marker.
#[must_use]
pub fn is_noise_path(path: &str) -> bool {
    path.split(['/', '\\']).any(|segment| {
        NOISE_PATH_MARKERS
            .iter()
            .any(|marker| segment.eq_ignore_ascii_case(marker))
    })
}

fn drop_noise(scored: Vec<Scored>) -> Vec<Scored> {
    if !scored.iter().any(|s| is_noise_path(&s.result.path)) {
        return scored;
    }
    if scored.iter().all(|s| is_noise_path(&s.result.path)) {
        return scored;
    }
    scored
        .into_iter()
        .filter(|s| !is_noise_path(&s.result.path))
        .collect()
}

/// Parent directory and lowercase extension-less filename.
fn dedup_key(path: &str) -> (&str, String) {
    let (parent, file) = path.rsplit_once(['/', '\\']).unwrap_or(("", path));
    let stem = file.rsplit_once('.').map_or(file, |(stem, _)| stem);
    (parent, stem.to_lowercase())
}

fn collapse_near_duplicates(scored: Vec<Scored>) -> Vec<Scored> {
    let keys: Vec<(&str, String)> = scored.iter().map(|s| dedup_key(&s.result.path)).collect();
    let mut removed = vec![false; scored.len()];

    for i in 0..scored.len() {
        if removed[i] {
            continue;
        }
        for j in (i + 1)..scored.len() {
            if removed[j] || keys[i].0 != keys[j].0 {
                continue;
            }
            let (a, b) = (&keys[i].1, &keys[j].1);
            let prefix_pair = a.starts_with(b.as_str()) || b.starts_with(a.as_str());
            if a.is_empty() || b.is_empty() || !prefix_pair {
                continue;
            }

            if prefers(&scored[j], &scored[i]) {
                removed[i] = true;
                break;
            }
            removed[j] = true;
        }
    }

    let collapsed = removed.iter().filter(|r| **r).count();
    if collapsed > 0 {
        debug!(collapsed, "collapsed near-duplicate results");
    }

    scored
        .into_iter()
        .zip(removed)
        .filter_map(|(s, gone)| (!gone).then_some(s))
        .collect()
}

/// True if `challenger` should replace `incumbent` among near-duplicates.
fn prefers(challenger: &Scored, incumbent: &Scored) -> bool {
    match challenger.overlap.total_cmp(&incumbent.overlap) {
        Ordering::Equal => challenger.result.score > incumbent.result.score,
        ord => ord == Ordering::Greater,
    }
}

fn compare_scored(a: &Scored, b: &Scored) -> Ordering {
    let (tier_a, tier_b) = (a.tier(), b.tier());
    if tier_a != tier_b {
        return tier_a.cmp(&tier_b);
    }

    match tier_a {
        0 => b.overlap.total_cmp(&a.overlap),
        1 => {
            let priority_a = a.result.content_type.is_priority();
            let priority_b = b.result.content_type.is_priority();
            priority_b
                .cmp(&priority_a)
                .then_with(|| b.result.score.total_cmp(&a.result.score))
        }
        _ => b.result.score.total_cmp(&a.result.score),
    }
}

/// Stable insertion sort; result sets are small.
fn insertion_sort_by<T>(items: &mut [T], cmp: impl Fn(&T, &T) -> Ordering) {
    for i in 1..items.len() {
        let mut j = i;
        while j > 0 && cmp(&items[j - 1], &items[j]) == Ordering::Greater {
            items.swap(j - 1, j);
            j -= 1;
        }
    }
}
