//! Search inputs and outputs.

use serde::{Deserialize, Serialize};

use crate::memory::core::kinds::ContentType;
use crate::memory::core::note::NoteChunk;
use crate::memory::scoring::rounding::{round1, round3};

/// Default number of results when the caller asks for none.
pub const DEFAULT_TOP_K: usize = 10;

/// Upper bound on results per call.
pub const MAX_TOP_K: usize = 100;

/// Maximum snippet size in characters.
pub const SNIPPET_CHARS: usize = 500;

/// Search options for the vector path.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SearchOptions {
    /// Requested result count; `0` means the default.
    pub top_k: usize,
    /// Exact domain filter (case-insensitive).
    pub domain: Option<String>,
    /// Exact workstream filter (case-insensitive).
    pub workstream: Option<String>,
    /// Tag filter; a note matches when it carries any of these tags.
    pub tags: Vec<String>,
}

impl SearchOptions {
    /// Options requesting `top_k` results with no filters.
    #[must_use]
    pub fn with_top_k(top_k: usize) -> Self {
        Self {
            top_k,
            ..Self::default()
        }
    }

    /// Effective result count: defaults when non-positive, clamped to [`MAX_TOP_K`].
    #[must_use]
    pub const fn effective_top_k(&self) -> usize {
        if self.top_k == 0 {
            DEFAULT_TOP_K
        } else if self.top_k > MAX_TOP_K {
            MAX_TOP_K
        } else {
            self.top_k
        }
    }

    /// True when any domain, workstream or tag filter is set.
    #[must_use]
    pub fn has_filters(&self) -> bool {
        self.domain.is_some() || self.workstream.is_some() || !self.tags.is_empty()
    }

    /// True if the chunk passes every configured filter.
    #[must_use]
    pub fn matches(&self, chunk: &NoteChunk) -> bool {
        if let Some(domain) = &self.domain
            && !eq_fold(domain, &chunk.domain)
        {
            return false;
        }

        if let Some(workstream) = &self.workstream
            && !eq_fold(workstream, &chunk.workstream)
        {
            return false;
        }

        if !self.tags.is_empty() {
            let any = self
                .tags
                .iter()
                .any(|wanted| chunk.tags.iter().any(|tag| eq_fold(tag, wanted)));
            if !any {
                return false;
            }
        }

        true
    }
}

/// Normalized, caller-facing search result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Document path.
    pub path: String,
    /// Document title.
    pub title: String,
    /// Heading of the matched chunk.
    pub chunk_heading: String,
    /// Score in `[0, 1]`, higher is better, three decimals.
    pub score: f64,
    /// Raw engine distance, one decimal, diagnostics only.
    pub distance: f64,
    /// Leading text of the matched chunk.
    pub snippet: String,
    /// Knowledge domain.
    pub domain: String,
    /// Workstream.
    pub workstream: String,
    /// Tags.
    pub tags: Vec<String>,
    /// Content type.
    pub content_type: ContentType,
    /// Stored confidence.
    pub confidence: f64,
}

impl SearchResult {
    /// Build a result from a chunk, rounding score and distance.
    #[must_use]
    pub fn from_chunk(chunk: &NoteChunk, score: f64, distance: f64) -> Self {
        Self {
            path: chunk.path.clone(),
            title: chunk.title.clone(),
            chunk_heading: chunk.heading.clone(),
            score: round3(score.clamp(0.0, 1.0)),
            distance: round1(distance),
            snippet: snippet(&chunk.text, SNIPPET_CHARS),
            domain: chunk.domain.clone(),
            workstream: chunk.workstream.clone(),
            tags: chunk.tags.clone(),
            content_type: chunk.content_type,
            confidence: chunk.confidence,
        }
    }
}

/// Unnormalized candidate carrying the engine's original score.
///
/// For vector candidates `score` is unused and `distance` is the raw chunk
/// distance; for keyword candidates `score` counts matched terms.
#[derive(Clone, Debug, PartialEq)]
pub struct RawSearchResult {
    /// Matched chunk (the document's best chunk for keyword paths).
    pub chunk: NoteChunk,
    /// Engine score before normalization.
    pub score: f64,
    /// Engine distance before normalization.
    pub distance: f64,
    /// Leading text of the matched chunk.
    pub snippet: String,
}

impl RawSearchResult {
    /// Wrap a chunk with its raw score and distance.
    #[must_use]
    pub fn new(chunk: NoteChunk, score: f64, distance: f64) -> Self {
        let snippet = snippet(&chunk.text, SNIPPET_CHARS);
        Self {
            chunk,
            score,
            distance,
            snippet,
        }
    }

    /// Document path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.chunk.path
    }
}

/// Case-insensitive equality under Unicode lowercasing.
fn eq_fold(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

/// Take at most `max_chars` characters of `text`.
#[must_use]
pub fn snippet(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_top_k() {
        assert_eq!(SearchOptions::with_top_k(0).effective_top_k(), 10);
        assert_eq!(SearchOptions::with_top_k(7).effective_top_k(), 7);
        assert_eq!(SearchOptions::with_top_k(500).effective_top_k(), 100);
    }

    #[test]
    fn test_filters() {
        let chunk = NoteChunk::new("a.md", 0, "A")
            .with_scope("Infra", "Platform")
            .with_tags(["k8s", "ops"]);

        let mut options = SearchOptions::with_top_k(5);
        assert!(options.matches(&chunk));

        options.domain = Some("infra".to_string());
        options.workstream = Some("PLATFORM".to_string());
        assert!(options.matches(&chunk));

        options.tags = vec!["billing".to_string(), "ops".to_string()];
        assert!(options.matches(&chunk));

        options.tags = vec!["billing".to_string()];
        assert!(!options.matches(&chunk));

        options.tags.clear();
        options.domain = Some("finance".to_string());
        assert!(!options.matches(&chunk));
    }

    #[test]
    fn test_filters_fold_non_ascii_case() {
        let chunk = NoteChunk::new("a.md", 0, "A")
            .with_scope("Öffentlich", "ÉTUDES")
            .with_tags(["Überblick"]);

        let mut options = SearchOptions::with_top_k(5);
        assert!(!options.has_filters());
        options.domain = Some("öffentlich".to_string());
        options.workstream = Some("études".to_string());
        options.tags = vec!["ÜBERBLICK".to_string()];
        assert!(options.has_filters());
        assert!(options.matches(&chunk));

        options.domain = Some("offentlich".to_string());
        assert!(!options.matches(&chunk));
    }

    #[test]
    fn test_snippet_is_char_bounded() {
        let text = "é".repeat(600);
        let cut = snippet(&text, SNIPPET_CHARS);
        assert_eq!(cut.chars().count(), 500);
        assert_eq!(snippet("short", 500), "short");
    }

    #[test]
    fn test_from_chunk_rounds() {
        let chunk = NoteChunk::new("a.md", 2, "A").with_heading("Setup");
        let result = SearchResult::from_chunk(&chunk, 0.123_456, 12.345);
        assert!((result.score - 0.123).abs() < 1e-9);
        assert!((result.distance - 12.3).abs() < 1e-9);
        assert_eq!(result.chunk_heading, "Setup");
    }
}
