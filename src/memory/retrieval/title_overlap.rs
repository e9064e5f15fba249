//! Title and path overlap scoring.
//!
//! Detects when a query is *about* a note's title or filename regardless of
//! embedding distance. Matching runs a fixed cascade per query term: exact,
//! plural, singular, single edit, shared stem. Each title word can satisfy at
//! most one query term.

use std::collections::HashSet;

use crate::memory::retrieval::terms;

/// Minimum title-word length kept in the word set.
const MIN_TITLE_WORD_CHARS: usize = 2;

/// Single-edit matches need at least one side this long.
const EDIT_MIN_CHARS: usize = 7;

/// Both sides of a stem match need at least this many characters.
const STEM_MIN_CHARS: usize = 5;

/// Maximum length difference for a stem match.
const STEM_MAX_LEN_DELTA: usize = 3;

/// Titles with at most this many words are subject to the noise guard.
const NOISE_GUARD_MAX_WORDS: usize = 2;

/// Query coverage below this on tiny titles scores zero.
const NOISE_GUARD_MIN_COVERAGE: f64 = 0.3;

/// Title+path overlap must reach this before path matches count.
pub const PATH_OVERLAP_MIN: f64 = 0.25;

/// Weight applied to path-derived overlap.
pub const PATH_OVERLAP_WEIGHT: f64 = 0.5;

/// Bidirectional overlap between query terms and a note's title/path, in `[0, 1]`.
///
/// `score = (matched / query terms) * (matched / title words)`.
#[must_use]
#[allow(clippy::cast_precision_loss)] // Word counts are tiny.
pub fn title_overlap_score<S: AsRef<str>>(query_terms: &[S], title: &str, path: &str) -> f64 {
    let expanded = expand_terms(query_terms);
    if expanded.is_empty() {
        return 0.0;
    }

    let words = title_word_set(title, path);
    if words.is_empty() {
        return 0.0;
    }

    let mut consumed = vec![false; words.len()];
    let mut matched = 0_usize;
    for term in &expanded {
        if let Some(idx) = find_match(term, &words, &consumed) {
            consumed[idx] = true;
            matched += 1;
        }
    }

    if matched == 0 {
        return 0.0;
    }

    let matched = matched as f64;
    let coverage = matched / expanded.len() as f64;
    if words.len() <= NOISE_GUARD_MAX_WORDS && coverage < NOISE_GUARD_MIN_COVERAGE {
        return 0.0;
    }

    coverage * (matched / words.len() as f64)
}

/// Overlap used for sorting: title-only if positive, otherwise half-weight
/// title+path overlap when it reaches [`PATH_OVERLAP_MIN`].
#[must_use]
pub fn overlap_for_sort<S: AsRef<str>>(query_terms: &[S], title: &str, path: &str) -> f64 {
    let title_only = title_overlap_score(query_terms, title, "");
    if title_only > 0.0 {
        return title_only;
    }

    let with_path = title_overlap_score(query_terms, title, path);
    if with_path >= PATH_OVERLAP_MIN {
        with_path * PATH_OVERLAP_WEIGHT
    } else {
        0.0
    }
}

/// Lowercase the terms and split hyphenated ones into their parts.
fn expand_terms<S: AsRef<str>>(query_terms: &[S]) -> Vec<Vec<char>> {
    let mut expanded = Vec::new();
    for term in query_terms {
        let lower = term.as_ref().trim().to_lowercase();
        for part in lower.split('-') {
            if !part.is_empty() {
                expanded.push(part.chars().collect());
            }
        }
    }
    expanded
}

/// Unique lowercase words from the title plus every path segment.
fn title_word_set(title: &str, path: &str) -> Vec<Vec<char>> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    let mut push_text = |text: &str| {
        for token in terms::words(text) {
            for part in token.split('_') {
                if part.chars().count() < MIN_TITLE_WORD_CHARS {
                    continue;
                }
                let lower = part.to_lowercase();
                if seen.insert(lower.clone()) {
                    out.push(lower.chars().collect());
                }
            }
        }
    };

    push_text(title);
    for segment in path.split(['/', '\\']) {
        push_text(strip_extension(segment));
    }

    out
}

/// Drop a trailing `.ext` from a path segment.
fn strip_extension(segment: &str) -> &str {
    match segment.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && !ext.is_empty()
                && ext.len() <= 5
                && ext.chars().all(char::is_alphanumeric) =>
        {
            stem
        }
        _ => segment,
    }
}

/// Matchers in cascade order, each called as `(term, word)`.
const CASCADE: [fn(&[char], &[char]) -> bool; 5] = [
    |term, word| term == word,
    |term, word| is_plural_of(word, term),
    |term, word| is_plural_of(term, word),
    is_single_edit,
    shares_stem,
];

fn find_match(term: &[char], words: &[Vec<char>], consumed: &[bool]) -> Option<usize> {
    for matcher in CASCADE {
        let hit = words
            .iter()
            .enumerate()
            .position(|(idx, word)| !consumed[idx] && matcher(term, word));
        if hit.is_some() {
            return hit;
        }
    }
    None
}

/// `plural == singular + "s"`.
fn is_plural_of(plural: &[char], singular: &[char]) -> bool {
    plural.len() == singular.len() + 1
        && plural.last() == Some(&'s')
        && plural[..singular.len()] == *singular
}

/// Exactly one substitution, insertion, or deletion apart.
fn is_single_edit(a: &[char], b: &[char]) -> bool {
    if a.len().max(b.len()) < EDIT_MIN_CHARS {
        return false;
    }

    match a.len().abs_diff(b.len()) {
        0 => a.iter().zip(b).filter(|(x, y)| x != y).count() == 1,
        1 => {
            let (short, long) = if a.len() < b.len() { (a, b) } else { (b, a) };
            let prefix = common_prefix(short, long);
            short[prefix..] == long[prefix + 1..]
        }
        _ => false,
    }
}

/// Long shared prefix between two similarly sized words.
fn shares_stem(a: &[char], b: &[char]) -> bool {
    if a.len() < STEM_MIN_CHARS || b.len() < STEM_MIN_CHARS {
        return false;
    }
    if a.len().abs_diff(b.len()) > STEM_MAX_LEN_DELTA {
        return false;
    }

    let shorter = a.len().min(b.len());
    common_prefix(a, b) >= shorter - 1
}

fn common_prefix(a: &[char], b: &[char]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_single_exact_match_on_two_word_title() {
        let score = title_overlap_score(&["kubernetes"], "Kubernetes Hub", "");
        assert!(score > 0.40 && score < 0.60, "score was {score}");
    }

    #[test]
    fn test_disjoint_vocabulary_scores_zero() {
        let score = title_overlap_score(&["terraform", "infrastructure"], "Project Notes Hub", "");
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_plural_and_stem_matching() {
        assert!(title_overlap_score(&["project"], "Projects Hub", "") > 0.0);
        assert!(title_overlap_score(&["projects"], "Project Hub", "") > 0.0);
        assert!(title_overlap_score(&["invoicing"], "Invoice Automation", "") > 0.0);
    }

    #[test]
    fn test_single_edit_needs_long_words() {
        assert!(title_overlap_score(&["kubernets"], "Kubernetes Hub", "") > 0.0);
        assert_eq!(title_overlap_score(&["cats"], "Cart Hub", ""), 0.0);
        assert!(is_single_edit(&chars("deployment"), &chars("deploymint")));
        assert!(!is_single_edit(&chars("deployment"), &chars("deplymint")));
    }

    #[test]
    fn test_stem_guards() {
        assert!(shares_stem(&chars("invoicing"), &chars("invoice")));
        assert!(!shares_stem(&chars("plan"), &chars("plans")));
        assert!(!shares_stem(&chars("automation"), &chars("autom")));
    }

    #[test]
    fn test_words_are_consumed_once() {
        let score = title_overlap_score(&["guide", "guides"], "Guide Index", "");
        assert!((score - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_noise_guard_on_tiny_titles() {
        let terms = ["alpha", "beta", "gamma", "delta"];
        assert_eq!(title_overlap_score(&terms, "Alpha Notes", ""), 0.0);
        assert!(title_overlap_score(&terms, "Alpha Beta", "") > 0.0);
    }

    #[test]
    fn test_hyphenated_terms_split() {
        let score = title_overlap_score(&["power-query"], "Power Query", "");
        assert!((score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_path_segments_and_extension() {
        let score = title_overlap_score(&["roadmap"], "", "projects/q3_roadmap.md");
        // words: projects, q3, roadmap
        assert!((score - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_overlap_for_sort_prefers_title() {
        let title = overlap_for_sort(&["billing"], "Billing Runbook", "ops/other.md");
        assert!((title - 0.5).abs() < 1e-9);

        let path = overlap_for_sort(&["billing"], "Runbook", "billing.md");
        // title+path words: runbook, billing -> 0.5, half weight
        assert!((path - 0.25).abs() < 1e-9);

        let weak = overlap_for_sort(&["billing"], "Runbook Index Page", "ops/billing.md");
        assert_eq!(weak, 0.0);
    }
}
