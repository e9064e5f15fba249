//! Index health report.

use std::collections::BTreeMap;

use serde::Serialize;

/// Outcome of inspecting the note index.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IndexReport {
    /// The index holds no chunks.
    NoData,
    /// Statistics for a populated index.
    Report(IndexStats),
}

impl IndexReport {
    /// Statistics, if any data exists.
    #[must_use]
    pub const fn stats(&self) -> Option<&IndexStats> {
        match self {
            Self::NoData => None,
            Self::Report(stats) => Some(stats),
        }
    }
}

/// Counts and time span of the indexed corpus.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    /// Distinct document paths.
    pub documents: u64,
    /// Total chunk rows.
    pub chunks: u64,
    /// Chunks with an embedding.
    pub vectors: u64,
    /// Root-chunk counts per content type.
    pub by_content_type: BTreeMap<String, u64>,
    /// Oldest modification time (epoch seconds).
    pub oldest_modified: i64,
    /// Newest modification time (epoch seconds).
    pub newest_modified: i64,
    /// Whether the FTS5 index is maintained.
    pub full_text: bool,
}
