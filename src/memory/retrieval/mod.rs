//! Search paths, title overlap, and final ranking.

pub mod hybrid_search;
pub mod keyword_search;
pub mod ranking;
pub mod terms;
pub mod title_overlap;
pub mod vector_search;

pub use hybrid_search::{keyword_results, merge_by_path};
pub use keyword_search::{
    content_term_search, full_text_search, keyword_search, keyword_search_title_match,
};
pub use ranking::{is_noise_path, rank_search_results};
pub use terms::{query_words_for_title_match, search_terms};
pub use title_overlap::{overlap_for_sort, title_overlap_score};
pub use vector_search::{OVERFETCH_FACTOR, vector_search, vector_search_raw};
