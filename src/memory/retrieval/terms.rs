//! Query tokenization shared by the search and ranking paths.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

#[allow(clippy::expect_used)] // Literal pattern, validated by tests.
static WORD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").expect("valid word regex"));

static STOPWORDS: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| STOPWORD_LIST.iter().copied().collect());

static SHORT_WHITELIST: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| SHORT_TERMS.iter().copied().collect());

/// Minimum length for a term outside the short whitelist.
pub const MIN_TERM_CHARS: usize = 3;

const SHORT_TERMS: &[&str] = &[
    "ai", "ml", "os", "ux", "ui", "db", "ci", "cd", "qa", "pr", "io", "js", "ts", "3d", "ar", "vr",
    "v1", "v2", "v3", "v4", "v5",
];

const STOPWORD_LIST: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "aren", "as", "at", "be", "because", "been", "before", "being", "below", "between",
    "both", "but", "by", "can", "cannot", "could", "couldn", "did", "didn", "do", "does", "doesn",
    "doing", "don", "down", "during", "each", "either", "else", "ever", "every", "few", "for",
    "from", "further", "get", "gets", "got", "had", "hadn", "has", "hasn", "have", "haven",
    "having", "he", "her", "here", "hers", "herself", "him", "himself", "his", "how", "however",
    "i", "if", "in", "into", "is", "isn", "it", "its", "itself", "just", "let", "like", "ll",
    "may", "me", "might", "more", "most", "much", "must", "mustn", "my", "myself", "need",
    "needs", "neither", "no", "nor", "not", "now", "of", "off", "on", "once", "only", "or",
    "other", "ought", "our", "ours", "ourselves", "out", "over", "own", "please", "re", "same",
    "shall", "shan", "she", "should", "shouldn", "so", "some", "such", "than", "that", "the",
    "their", "theirs", "them", "themselves", "then", "there", "these", "they", "this", "those",
    "through", "to", "too", "under", "until", "up", "upon", "us", "use", "used", "using", "ve",
    "very", "want", "was", "wasn", "we", "were", "weren", "what", "whatever", "when", "where",
    "whether", "which", "while", "who", "whom", "whose", "why", "will", "with", "within",
    "without", "won", "would", "wouldn", "yet", "you", "your", "yours", "yourself", "yourselves",
];

/// True if `word` (any casing) is a stop word.
#[must_use]
pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(word.to_lowercase().as_str())
}

/// True if a token carries enough signal to be used as a term.
#[must_use]
pub fn is_meaningful(word: &str) -> bool {
    let lower = word.to_lowercase();
    if STOPWORDS.contains(lower.as_str()) {
        return false;
    }
    lower.chars().count() >= MIN_TERM_CHARS || SHORT_WHITELIST.contains(lower.as_str())
}

/// Split text into word-character tokens.
pub fn words(text: &str) -> impl Iterator<Item = &str> {
    WORD_RE.find_iter(text).map(|m| m.as_str())
}

/// Lowercased, stopword-filtered, deduplicated search terms.
#[must_use]
pub fn search_terms(query: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut terms = Vec::new();
    for word in words(query) {
        if !is_meaningful(word) {
            continue;
        }
        let lower = word.to_lowercase();
        if seen.insert(lower.clone()) {
            terms.push(lower);
        }
    }
    terms
}

/// Query words used for title matching.
///
/// Keeps the first-seen original casing and order; deduplicates
/// case-insensitively.
#[must_use]
pub fn query_words_for_title_match(query: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut terms = Vec::new();
    for word in words(query) {
        if !is_meaningful(word) {
            continue;
        }
        if seen.insert(word.to_lowercase()) {
            terms.push(word.to_string());
        }
    }
    terms
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_words_preserve_case_and_order() {
        let terms = query_words_for_title_match("How do I use Power Query with SharePoint and power");
        assert_eq!(terms, vec!["Power", "Query", "SharePoint"]);
    }

    #[test]
    fn test_short_whitelist() {
        let terms = query_words_for_title_match("AI in the OS v2 at go");
        assert_eq!(terms, vec!["AI", "OS", "v2"]);
    }

    #[test]
    fn test_search_terms_lowercase() {
        let terms = search_terms("Kubernetes kubernetes HUB-notes, the of");
        assert_eq!(terms, vec!["kubernetes", "hub", "notes"]);
    }

    #[test]
    fn test_empty_query() {
        assert!(search_terms("").is_empty());
        assert!(query_words_for_title_match("the and of").is_empty());
    }

    #[test]
    fn test_stopword_lookup() {
        assert!(is_stopword("The"));
        assert!(!is_stopword("terraform"));
    }
}
