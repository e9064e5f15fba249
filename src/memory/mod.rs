//! Hybrid recall over an agent's note collection.
//!
//! Organized into:
//! - `core`: Configuration, errors, content types, note chunks, and result types
//! - `scoring`: Recency decay, confidence, and composite scores
//! - `storage`: `SQLite` note index with sqlite-vec and optional FTS5
//! - `retrieval`: Vector, keyword, and full-text search plus title-overlap ranking
//! - `maintenance`: Confidence refresh
//! - `engine`: End-to-end query flow
//! - `telemetry`: Tracing setup

pub mod core;
pub mod engine;
pub mod maintenance;
pub mod retrieval;
pub mod scoring;
pub mod storage;
pub mod telemetry;

// Re-export commonly used types for convenience
pub use self::core::{
    CompositeWeights, ContentType, NoteChunk, RawSearchResult, RecallConfig, RecallError,
    RecallResult, RetrievalConfig, SearchOptions, SearchResult, StorageConfig,
};
pub use engine::RecallEngine;
pub use maintenance::{RefreshStats, refresh_confidence};
pub use retrieval::{
    content_term_search, full_text_search, keyword_search, keyword_search_title_match,
    query_words_for_title_match, rank_search_results, title_overlap_score, vector_search,
    vector_search_raw,
};
pub use scoring::{composite_score, compute_confidence, compute_recency_score};
pub use storage::{IndexReport, IndexStats, SqliteNoteStore, init_sqlite_vec_extension};
pub use telemetry::init_tracing;
