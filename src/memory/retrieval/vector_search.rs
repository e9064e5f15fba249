//! Nearest-neighbour search over chunk embeddings.

use std::collections::HashSet;

use rusqlite::params;
use tracing::debug;

use crate::memory::core::errors::RecallResult;
use crate::memory::core::note::NoteChunk;
use crate::memory::core::result::{RawSearchResult, SearchOptions, SearchResult};
use crate::memory::storage::note_store::{
    NOTE_COLUMN_COUNT, NOTE_COLUMNS, SqliteNoteStore, chunk_from_row,
};

/// Chunks fetched per requested result, leaving room for filtering and
/// per-path deduplication.
pub const OVERFETCH_FACTOR: usize = 5;

/// Upper bound sqlite-vec accepts for `k`.
const MAX_KNN: usize = 4096;

/// Vector search returning at most one normalized result per document.
///
/// Distances are min/max normalized over the kept results so the closest
/// result scores `1.0`. An index with no vectors yields an empty list.
///
/// # Errors
/// Returns an error if the query vector width differs from the index or the
/// query fails.
pub fn vector_search(
    store: &SqliteNoteStore,
    query_vector: &[f32],
    options: &SearchOptions,
) -> RecallResult<Vec<SearchResult>> {
    let top_k = options.effective_top_k();
    let hits = nearest_chunks(store, query_vector, top_k * OVERFETCH_FACTOR)?;
    let fetched = hits.len();

    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(top_k);
    for (chunk, distance) in hits {
        if kept.len() == top_k {
            break;
        }
        if !options.matches(&chunk) || !seen.insert(chunk.path.clone()) {
            continue;
        }
        kept.push((chunk, distance));
    }

    debug!(fetched, kept = kept.len(), top_k, "vector search");
    Ok(normalize(&kept))
}

/// Raw vector candidates: no filtering, no deduplication, no normalization.
///
/// # Errors
/// Returns an error if the query vector width differs from the index or the
/// query fails.
pub fn vector_search_raw(
    store: &SqliteNoteStore,
    query_vector: &[f32],
    fetch_k: usize,
) -> RecallResult<Vec<RawSearchResult>> {
    let hits = nearest_chunks(store, query_vector, fetch_k)?;
    Ok(hits
        .into_iter()
        .map(|(chunk, distance)| RawSearchResult::new(chunk, 0.0, distance))
        .collect())
}

fn normalize(kept: &[(NoteChunk, f64)]) -> Vec<SearchResult> {
    let Some(min) = kept.iter().map(|(_, d)| *d).reduce(f64::min) else {
        return Vec::new();
    };
    let max = kept.iter().map(|(_, d)| *d).fold(min, f64::max);
    let range = if max - min > 0.0 { max - min } else { 1.0 };

    kept.iter()
        .map(|(chunk, distance)| {
            SearchResult::from_chunk(chunk, 1.0 - (distance - min) / range, *distance)
        })
        .collect()
}

/// Chunks ordered by ascending distance.
fn nearest_chunks(
    store: &SqliteNoteStore,
    query_vector: &[f32],
    fetch_k: usize,
) -> RecallResult<Vec<(NoteChunk, f64)>> {
    store.check_dims(query_vector)?;
    let k = fetch_k.min(MAX_KNN);
    if k == 0 {
        return Ok(Vec::new());
    }

    let vector = serde_json::to_string(query_vector)?;
    let k = i64::try_from(k).unwrap_or(i64::MAX);

    store.read(|conn| {
        let mut stmt = conn.prepare(&format!(
            "WITH knn AS (
                 SELECT rowid, distance FROM note_vectors
                 WHERE embedding MATCH ?1 AND k = ?2
             )
             SELECT {NOTE_COLUMNS}, knn.distance
             FROM knn JOIN notes n ON n.id = knn.rowid
             ORDER BY knn.distance ASC, n.path ASC, n.chunk_index ASC"
        ))?;
        let rows = stmt.query_map(params![vector, k], |row| {
            Ok((chunk_from_row(row, 0)?, row.get::<_, f64>(NOTE_COLUMN_COUNT)?))
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::core::errors::RecallError;

    fn seeded() -> SqliteNoteStore {
        let store = SqliteNoteStore::open_in_memory(3, false).expect("store");
        let docs: [(&str, u32, &str, [f32; 3]); 5] = [
            ("infra/k8s.md", 0, "infra", [1.0, 0.0, 0.0]),
            ("infra/k8s.md", 1, "infra", [0.9, 0.1, 0.0]),
            ("infra/helm.md", 0, "infra", [0.7, 0.3, 0.0]),
            ("finance/budget.md", 0, "finance", [0.0, 1.0, 0.0]),
            ("finance/tax.md", 0, "finance", [0.0, 0.0, 1.0]),
        ];
        for (path, idx, domain, vector) in docs {
            let chunk = NoteChunk::new(path, idx, path)
                .with_text(format!("{path} body"))
                .with_scope(domain, "core");
            store.upsert_chunk(&chunk, Some(&vector[..])).expect("upsert");
        }
        store
    }

    #[test]
    fn test_one_result_per_path_normalized() {
        let store = seeded();
        let options = SearchOptions::with_top_k(10);
        let results = vector_search(&store, &[1.0, 0.0, 0.0], &options).expect("search");
        assert_eq!(results.len(), 4);
        assert_eq!(results[0].path, "infra/k8s.md");
        assert!((results[0].score - 1.0).abs() < 1e-9);
        assert!(results.last().is_some_and(|r| r.score.abs() < 1e-9));

        let mut paths: Vec<&str> = results.iter().map(|r| r.path.as_str()).collect();
        paths.dedup();
        assert_eq!(paths.len(), results.len());
    }

    #[test]
    fn test_top_k_defaults() {
        let store = seeded();
        let zero =
            vector_search(&store, &[1.0, 0.0, 0.0], &SearchOptions::with_top_k(0)).expect("search");
        assert_eq!(zero.len(), 4);

        let one =
            vector_search(&store, &[1.0, 0.0, 0.0], &SearchOptions::with_top_k(1)).expect("search");
        assert_eq!(one.len(), 1);
        assert!((one[0].score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_top_k_clamps_to_result_cap() {
        let store = SqliteNoteStore::open_in_memory(3, false).expect("store");
        for i in 0..120_u16 {
            let path = format!("bulk/{i:03}.md");
            let vector = [1.0, f32::from(i) / 120.0, 0.0];
            store
                .upsert_chunk(&NoteChunk::new(path.as_str(), 0, path.as_str()), Some(&vector[..]))
                .expect("upsert");
        }

        let options = SearchOptions::with_top_k(500);
        let results = vector_search(&store, &[1.0, 0.0, 0.0], &options).expect("search");
        assert_eq!(results.len(), 100);
        assert_eq!(results[0].path, "bulk/000.md");
        assert_eq!(results[99].path, "bulk/099.md");
    }

    #[test]
    fn test_domain_filter() {
        let store = seeded();
        let mut options = SearchOptions::with_top_k(10);
        options.domain = Some("Finance".to_string());
        let results = vector_search(&store, &[1.0, 0.0, 0.0], &options).expect("search");
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.domain == "finance"));
    }

    #[test]
    fn test_empty_index() {
        let store = SqliteNoteStore::open_in_memory(3, false).expect("store");
        let results =
            vector_search(&store, &[1.0, 0.0, 0.0], &SearchOptions::default()).expect("search");
        assert!(results.is_empty());
    }

    #[test]
    fn test_dimension_mismatch() {
        let store = seeded();
        let err = vector_search(&store, &[1.0, 0.0], &SearchOptions::default()).unwrap_err();
        assert!(matches!(err, RecallError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_raw_keeps_every_chunk() {
        let store = seeded();
        let raw = vector_search_raw(&store, &[1.0, 0.0, 0.0], 10).expect("raw");
        assert_eq!(raw.len(), 5);
        assert_eq!(raw[0].path(), "infra/k8s.md");
        assert!(raw.windows(2).all(|w| w[0].distance <= w[1].distance));
        assert!(vector_search_raw(&store, &[1.0, 0.0, 0.0], 0).expect("raw").is_empty());
    }
}
