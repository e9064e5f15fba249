//! Recall engine orchestration.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::memory::core::config::{CompositeWeights, RecallConfig};
use crate::memory::core::errors::{RecallError, RecallResult};
use crate::memory::core::result::{MAX_TOP_K, RawSearchResult, SearchOptions, SearchResult};
use crate::memory::maintenance::confidence_refresh::{RefreshStats, refresh_confidence_now};
use crate::memory::retrieval::hybrid_search::{keyword_results, merge_by_path};
use crate::memory::retrieval::keyword_search::{
    content_term_search, full_text_search, keyword_search, keyword_search_title_match,
};
use crate::memory::retrieval::ranking::rank_search_results;
use crate::memory::retrieval::terms::{query_words_for_title_match, search_terms};
use crate::memory::retrieval::vector_search::{OVERFETCH_FACTOR, vector_search, vector_search_raw};
use crate::memory::scoring::confidence::composite_score_at;
use crate::memory::storage::note_store::SqliteNoteStore;
use crate::memory::storage::report::IndexReport;

/// Hybrid retrieval over an indexed note collection.
///
/// The engine only reads from the store during searches; access counts and
/// confidence updates go through the store's own write path.
pub struct RecallEngine {
    config: RecallConfig,
    store: Arc<SqliteNoteStore>,
}

impl RecallEngine {
    /// Create an engine over an existing store.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or its embedding
    /// dimensions disagree with the store.
    pub fn new(config: RecallConfig, store: Arc<SqliteNoteStore>) -> RecallResult<Self> {
        config.validate()?;
        if config.storage.embedding_dims != store.dims() {
            return Err(RecallError::InvalidConfig(format!(
                "storage.embedding_dims is {} but the index holds {}-dimensional vectors",
                config.storage.embedding_dims,
                store.dims()
            )));
        }
        Ok(Self { config, store })
    }

    /// Open the configured `SQLite` store and build an engine over it.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the store cannot be opened.
    pub fn from_config(config: RecallConfig) -> RecallResult<Self> {
        config.validate()?;
        let store = Arc::new(SqliteNoteStore::open(&config.storage)?);
        info!(path = %config.storage.sqlite_path.display(), "recall engine ready");
        Self::new(config, store)
    }

    /// Engine configuration.
    #[must_use]
    pub const fn config(&self) -> &RecallConfig {
        &self.config
    }

    /// Underlying note store.
    #[must_use]
    pub fn store(&self) -> &SqliteNoteStore {
        &self.store
    }

    /// Run the full query flow: vector and keyword candidates, merged by
    /// path and reordered by title overlap.
    ///
    /// `embedding` is the query embedding when the caller has one; without
    /// it only the keyword paths run. An empty query returns no results.
    ///
    /// # Errors
    /// Returns an error if a store query fails or the embedding has the wrong width.
    pub fn search(
        &self,
        query: &str,
        embedding: Option<&[f32]>,
        options: &SearchOptions,
    ) -> RecallResult<Vec<SearchResult>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let top_k = self.top_k_for(options);
        let options = SearchOptions {
            top_k,
            ..options.clone()
        };
        let terms = search_terms(query);
        let title_terms = query_words_for_title_match(query);

        let vector = match embedding {
            Some(vector) => vector_search(&self.store, vector, &options)?,
            None => Vec::new(),
        };

        // Filters run after the SQL limit, so leave room for rejected candidates.
        let keyword_limit = if options.has_filters() {
            top_k * OVERFETCH_FACTOR
        } else {
            top_k
        };
        let keyword_raw: Vec<RawSearchResult> = self
            .keyword_candidates(&terms, vector.is_empty(), keyword_limit)?
            .into_iter()
            .filter(|candidate| options.matches(&candidate.chunk))
            .collect();
        let keyword = keyword_results(keyword_raw, terms.len());

        debug!(
            vector = vector.len(),
            keyword = keyword.len(),
            terms = terms.len(),
            "collected candidates"
        );

        let merged = merge_by_path([vector, keyword]);
        let mut ranked = rank_search_results(merged, &title_terms);
        ranked.truncate(top_k);
        Ok(ranked)
    }

    /// Ranked full-text search, scores scaled so the best match is `1.0`.
    ///
    /// # Errors
    /// Returns an error if the store query fails.
    pub fn search_full_text(&self, query: &str, limit: usize) -> RecallResult<Vec<SearchResult>> {
        let terms = search_terms(query);
        let limit = if limit == 0 {
            self.config.retrieval.top_k
        } else {
            limit.min(MAX_TOP_K)
        };
        let raw = full_text_search(&self.store, &terms, limit)?;

        let best = raw.iter().map(|r| r.score).fold(0.0_f64, f64::max);
        let results = raw
            .iter()
            .map(|candidate| {
                let score = if best > 0.0 { candidate.score / best } else { 0.0 };
                SearchResult::from_chunk(&candidate.chunk, score, candidate.distance)
            })
            .collect();
        Ok(results)
    }

    /// Vector candidates re-scored by semantic similarity, recency and
    /// stored confidence, best chunk per document, best first.
    ///
    /// Distances map to similarity as `1 / (1 + distance)`. A `fetch_k` of
    /// zero fetches the configured result count times the over-fetch factor.
    /// Without explicit `weights` the configured composite weights apply.
    ///
    /// # Errors
    /// Returns an error if the store query fails or the embedding has the wrong width.
    pub fn search_composite(
        &self,
        embedding: &[f32],
        fetch_k: usize,
        weights: Option<&CompositeWeights>,
    ) -> RecallResult<Vec<SearchResult>> {
        let weights = weights.unwrap_or(&self.config.composite);
        let fetch_k = if fetch_k == 0 {
            self.config.retrieval.top_k * OVERFETCH_FACTOR
        } else {
            fetch_k
        };
        let raw = vector_search_raw(&self.store, embedding, fetch_k)?;
        let now = Utc::now().timestamp();

        let mut seen = HashSet::new();
        let mut results: Vec<SearchResult> = raw
            .into_iter()
            .filter(|candidate| seen.insert(candidate.chunk.path.clone()))
            .map(|candidate| {
                let chunk = &candidate.chunk;
                let semantic = 1.0 / (1.0 + candidate.distance.max(0.0));
                let score = composite_score_at(
                    semantic,
                    chunk.modified_epoch,
                    chunk.confidence,
                    chunk.content_type,
                    weights,
                    now,
                );
                SearchResult::from_chunk(chunk, score, candidate.distance)
            })
            .collect();

        results.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.path.cmp(&b.path)));
        debug!(results = results.len(), "composite search");
        Ok(results)
    }

    /// Record that a document was retrieved.
    ///
    /// # Errors
    /// Returns an error if the store update fails.
    pub fn record_access(&self, path: &str) -> RecallResult<usize> {
        self.store.record_access(path)
    }

    /// Recompute stored confidence for every document.
    ///
    /// # Errors
    /// Returns an error if the store cannot be read or written.
    pub fn refresh_confidence(&self) -> RecallResult<RefreshStats> {
        refresh_confidence_now(&self.store)
    }

    /// Summarize the index contents.
    ///
    /// # Errors
    /// Returns an error if the store query fails.
    pub fn index_report(&self) -> RecallResult<IndexReport> {
        self.store.index_report()
    }

    fn top_k_for(&self, options: &SearchOptions) -> usize {
        if options.top_k == 0 {
            self.config.retrieval.top_k
        } else {
            options.top_k.min(MAX_TOP_K)
        }
    }

    fn keyword_candidates(
        &self,
        terms: &[String],
        vector_empty: bool,
        limit: usize,
    ) -> RecallResult<Vec<RawSearchResult>> {
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let retrieval = &self.config.retrieval;
        let weak = terms
            .iter()
            .all(|term| term.chars().count() <= retrieval.weak_term_max_chars);
        if vector_empty && weak {
            let min_matches = retrieval.title_fallback_min_matches.min(terms.len());
            debug!(min_matches, "weak terms, falling back to title match");
            return keyword_search_title_match(&self.store, terms, min_matches, limit);
        }

        let mut raw = keyword_search(&self.store, terms, limit)?;
        if raw.len() < limit && terms.len() >= retrieval.content_min_terms {
            let extra = content_term_search(&self.store, terms, retrieval.content_min_terms, limit)?;
            debug!(extra = extra.len(), "supplemented with cross-chunk content matches");
            raw.extend(extra);
        }
        Ok(raw)
    }
}
