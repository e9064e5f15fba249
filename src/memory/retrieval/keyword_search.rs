//! Term-matching search paths over document text, titles, and paths.
//!
//! All three paths score a document by how many distinct query terms it
//! contains and break ties by recency. Matching is case-insensitive substring
//! matching on the `notes` table, with Unicode case folding on both sides.

use std::collections::HashSet;

use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, params_from_iter};
use tracing::debug;

use crate::memory::core::errors::RecallResult;
use crate::memory::core::note::NoteChunk;
use crate::memory::core::result::RawSearchResult;
use crate::memory::storage::note_store::{
    FOLD_CASE_FN, NOTE_COLUMN_COUNT, NOTE_COLUMNS, SqliteNoteStore, chunk_from_row,
};

/// Rows fetched per requested document on the FTS5 path.
const FTS_FANOUT: usize = 4;

/// Documents whose root chunk contains at least one term.
///
/// Each result carries the document's best-matching chunk for the snippet and
/// `score` set to the number of matched terms.
///
/// # Errors
/// Returns an error if the query fails.
pub fn keyword_search<S: AsRef<str>>(
    store: &SqliteNoteStore,
    terms: &[S],
    limit: usize,
) -> RecallResult<Vec<RawSearchResult>> {
    let patterns = like_patterns(terms);
    if patterns.is_empty() || limit == 0 {
        return Ok(Vec::new());
    }

    let hits = hit_expression(patterns.len(), &["n.title", "n.text"]);
    let sql = format!(
        "SELECT {NOTE_COLUMNS}, {hits} FROM notes n
         WHERE n.chunk_index = 0 AND ({hits}) > 0
         ORDER BY {hits} DESC, n.modified DESC, n.path ASC
         LIMIT ?{}",
        patterns.len() + 1
    );

    store.read(|conn| {
        let roots = scored_chunks(conn, &sql, &patterns, limit)?;
        let results = with_best_chunks(conn, roots, &patterns)?;
        debug!(terms = patterns.len(), results = results.len(), "keyword search");
        Ok(results)
    })
}

/// Documents whose title or path contains at least `min_matches` terms.
///
/// Used when the query terms are too short for a reliable content match.
///
/// # Errors
/// Returns an error if the query fails.
pub fn keyword_search_title_match<S: AsRef<str>>(
    store: &SqliteNoteStore,
    terms: &[S],
    min_matches: usize,
    limit: usize,
) -> RecallResult<Vec<RawSearchResult>> {
    let patterns = like_patterns(terms);
    let min_matches = min_matches.max(1);
    if patterns.is_empty() || limit == 0 || min_matches > patterns.len() {
        return Ok(Vec::new());
    }

    let hits = hit_expression(patterns.len(), &["n.title", "n.path"]);
    let sql = format!(
        "SELECT {NOTE_COLUMNS}, {hits} FROM notes n
         WHERE n.chunk_index = 0 AND ({hits}) >= {min_matches}
         ORDER BY {hits} DESC, n.modified DESC, n.path ASC
         LIMIT ?{}",
        patterns.len() + 1
    );

    store.read(|conn| {
        let roots = scored_chunks(conn, &sql, &patterns, limit)?;
        debug!(terms = patterns.len(), results = roots.len(), "title match search");
        Ok(roots
            .into_iter()
            .map(|(chunk, hits)| RawSearchResult::new(chunk, hits, 0.0))
            .collect())
    })
}

/// Documents whose chunks, taken together, contain at least `min_terms` terms.
///
/// Catches documents where the terms are spread over several sections.
///
/// # Errors
/// Returns an error if the query fails.
pub fn content_term_search<S: AsRef<str>>(
    store: &SqliteNoteStore,
    terms: &[S],
    min_terms: usize,
    limit: usize,
) -> RecallResult<Vec<RawSearchResult>> {
    let patterns = like_patterns(terms);
    let min_terms = min_terms.max(1);
    if patterns.is_empty() || limit == 0 || min_terms > patterns.len() {
        return Ok(Vec::new());
    }

    let per_term = (1..=patterns.len())
        .map(|i| {
            let any_column = ["n.title", "n.heading", "n.text"]
                .iter()
                .map(|column| folded_like(column, i))
                .collect::<Vec<_>>()
                .join(" OR ");
            format!("MAX(CASE WHEN {any_column} THEN 1 ELSE 0 END)")
        })
        .collect::<Vec<_>>()
        .join(" + ");
    let sql = format!(
        "SELECT n.path, {per_term} AS hits, MAX(n.modified) AS newest FROM notes n
         GROUP BY n.path
         HAVING hits >= {min_terms}
         ORDER BY hits DESC, newest DESC, n.path ASC
         LIMIT ?{}",
        patterns.len() + 1
    );

    store.read(|conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(bind_values(&patterns, limit)), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, u32>(1)?))
        })?;
        let docs = rows.collect::<Result<Vec<_>, _>>()?;

        let mut roots = Vec::with_capacity(docs.len());
        for (path, hits) in docs {
            if let Some(chunk) = first_chunk(conn, &path)? {
                roots.push((chunk, f64::from(hits)));
            }
        }
        let results = with_best_chunks(conn, roots, &patterns)?;
        debug!(terms = patterns.len(), results = results.len(), "content term search");
        Ok(results)
    })
}

/// Ranked FTS5 search, one result per document.
///
/// Falls back to [`keyword_search`] when the store has no FTS5 index. Scores
/// are negated BM25 ranks, so higher is better.
///
/// # Errors
/// Returns an error if the query fails.
pub fn full_text_search<S: AsRef<str>>(
    store: &SqliteNoteStore,
    terms: &[S],
    limit: usize,
) -> RecallResult<Vec<RawSearchResult>> {
    if !store.has_full_text() {
        return keyword_search(store, terms, limit);
    }

    let query = fts_query(terms);
    if query.is_empty() || limit == 0 {
        return Ok(Vec::new());
    }
    let fetch = i64::try_from(limit.saturating_mul(FTS_FANOUT)).unwrap_or(i64::MAX);

    store.read(|conn| {
        let mut stmt = conn.prepare(&format!(
            "SELECT {NOTE_COLUMNS}, bm25(notes_fts) AS rank
             FROM notes_fts JOIN notes n ON n.id = notes_fts.rowid
             WHERE notes_fts MATCH ?1
             ORDER BY rank ASC, n.path ASC, n.chunk_index ASC
             LIMIT ?2"
        ))?;
        let rows = stmt.query_map(rusqlite::params![query, fetch], |row| {
            Ok((chunk_from_row(row, 0)?, row.get::<_, f64>(NOTE_COLUMN_COUNT)?))
        })?;

        let mut seen = HashSet::new();
        let mut results = Vec::new();
        for row in rows {
            let (chunk, rank) = row?;
            if seen.insert(chunk.path.clone()) {
                results.push(RawSearchResult::new(chunk, -rank, 0.0));
            }
            if results.len() == limit {
                break;
            }
        }
        debug!(results = results.len(), "full-text search");
        Ok(results)
    })
}

/// Escape `%`, `_` and `\` and wrap the term for a `LIKE` substring match.
#[must_use]
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn like_patterns<S: AsRef<str>>(terms: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    terms
        .iter()
        .map(|term| term.as_ref().trim().to_lowercase())
        .filter(|term| !term.is_empty() && seen.insert(term.clone()))
        .map(|term| like_pattern(&term))
        .collect()
}

/// Quote every term and OR them together.
fn fts_query<S: AsRef<str>>(terms: &[S]) -> String {
    terms
        .iter()
        .map(|term| term.as_ref().trim())
        .filter(|term| !term.is_empty())
        .map(|term| format!("\"{}\"", term.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(" OR ")
}

/// `column` case-folded and matched against the lowercased pattern `?param`.
fn folded_like(column: &str, param: usize) -> String {
    format!("{FOLD_CASE_FN}({column}) LIKE ?{param} ESCAPE '\\'")
}

/// Sum of per-term 0/1 hits across `columns`, binding patterns as `?1..?n`.
fn hit_expression(term_count: usize, columns: &[&str]) -> String {
    (1..=term_count)
        .map(|i| {
            let any_column = columns
                .iter()
                .map(|column| folded_like(column, i))
                .collect::<Vec<_>>()
                .join(" OR ");
            format!("(CASE WHEN {any_column} THEN 1 ELSE 0 END)")
        })
        .collect::<Vec<_>>()
        .join(" + ")
}

fn bind_values(patterns: &[String], limit: usize) -> Vec<Value> {
    patterns
        .iter()
        .cloned()
        .map(Value::Text)
        .chain(std::iter::once(Value::Integer(
            i64::try_from(limit).unwrap_or(i64::MAX),
        )))
        .collect()
}

/// Run a query selecting [`NOTE_COLUMNS`] plus a hit count.
fn scored_chunks(
    conn: &Connection,
    sql: &str,
    patterns: &[String],
    limit: usize,
) -> RecallResult<Vec<(NoteChunk, f64)>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params_from_iter(bind_values(patterns, limit)), |row| {
        Ok((
            chunk_from_row(row, 0)?,
            f64::from(row.get::<_, u32>(NOTE_COLUMN_COUNT)?),
        ))
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

fn first_chunk(conn: &Connection, path: &str) -> RecallResult<Option<NoteChunk>> {
    let chunk = conn
        .query_row(
            &format!(
                "SELECT {NOTE_COLUMNS} FROM notes n WHERE n.path = ?1
                 ORDER BY n.chunk_index ASC LIMIT 1"
            ),
            [path],
            |row| chunk_from_row(row, 0),
        )
        .optional()?;
    Ok(chunk)
}

/// Swap each document's root chunk for its best-matching section, if any.
fn with_best_chunks(
    conn: &Connection,
    roots: Vec<(NoteChunk, f64)>,
    patterns: &[String],
) -> RecallResult<Vec<RawSearchResult>> {
    let hits = hit_expression(patterns.len(), &["n.heading", "n.text"]);
    let path_param = patterns.len() + 1;
    let sql = format!(
        "SELECT {NOTE_COLUMNS}, {hits} AS hits FROM notes n
         WHERE n.path = ?{path_param} AND n.chunk_index > 0
         ORDER BY hits DESC, n.chunk_index ASC
         LIMIT 1"
    );
    let mut stmt = conn.prepare(&sql)?;

    let mut results = Vec::with_capacity(roots.len());
    for (root, score) in roots {
        let params = patterns
            .iter()
            .cloned()
            .map(Value::Text)
            .chain(std::iter::once(Value::Text(root.path.clone())));
        let best = stmt
            .query_row(params_from_iter(params), |row| {
                Ok((chunk_from_row(row, 0)?, row.get::<_, i64>(NOTE_COLUMN_COUNT)?))
            })
            .optional()?;

        let chunk = match best {
            Some((section, section_hits)) if section_hits > 0 => section,
            _ => root,
        };
        results.push(RawSearchResult::new(chunk, score, 0.0));
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::core::kinds::ContentType;

    fn seeded(full_text: bool) -> SqliteNoteStore {
        let store = SqliteNoteStore::open_in_memory(3, full_text).expect("store");
        let chunks = [
            NoteChunk::new("guides/power-query.md", 0, "Power Query Guide")
                .with_text("Power Query connects Excel to SharePoint lists.")
                .with_modified(200),
            NoteChunk::new("guides/power-query.md", 1, "Power Query Guide")
                .with_heading("SharePoint")
                .with_text("Use the SharePoint folder connector.")
                .with_modified(200),
            NoteChunk::new("notes/excel.md", 0, "Excel Tips")
                .with_text("Pivot tables and Power Pivot.")
                .with_modified(300),
            NoteChunk::new("notes/sharepoint.md", 0, "SharePoint Admin")
                .with_text("Site collections.")
                .with_content_type(ContentType::Hub)
                .with_modified(100),
            NoteChunk::new("notes/split.md", 0, "Split")
                .with_text("")
                .with_modified(50),
            NoteChunk::new("notes/split.md", 1, "Split")
                .with_text("mentions kubernetes here")
                .with_modified(50),
            NoteChunk::new("notes/split.md", 2, "Split")
                .with_text("and terraform there")
                .with_modified(50),
            NoteChunk::new("notes/100%_done.md", 0, "Done list")
                .with_text("progress at 100%")
                .with_modified(10),
        ];
        for chunk in &chunks {
            store.upsert_chunk(chunk, None).expect("upsert");
        }
        store
    }

    #[test]
    fn test_keyword_scores_by_matched_terms() {
        let store = seeded(false);
        let results = keyword_search(&store, &["power", "sharepoint"], 10).expect("search");
        assert_eq!(results[0].path(), "guides/power-query.md");
        assert!((results[0].score - 2.0).abs() < f64::EPSILON);
        // Best chunk supplies the snippet.
        assert_eq!(results[0].chunk.chunk_index, 1);

        // Single-term ties break by recency.
        let rest: Vec<&str> = results[1..].iter().map(RawSearchResult::path).collect();
        assert_eq!(rest, vec!["notes/excel.md", "notes/sharepoint.md"]);
    }

    #[test]
    fn test_keyword_empty_inputs() {
        let store = seeded(false);
        let none: [&str; 0] = [];
        assert!(keyword_search(&store, &none, 10).expect("search").is_empty());
        assert!(keyword_search(&store, &["power"], 0).expect("search").is_empty());
    }

    #[test]
    fn test_like_wildcards_are_literal() {
        let store = seeded(false);
        assert_eq!(like_pattern("100%_x"), "%100\\%\\_x%");
        let results = keyword_search(&store, &["100%"], 10).expect("search");
        let paths: Vec<&str> = results.iter().map(RawSearchResult::path).collect();
        assert_eq!(paths, vec!["notes/100%_done.md"]);
    }

    #[test]
    fn test_title_match_requires_min_matches() {
        let store = seeded(false);
        let results =
            keyword_search_title_match(&store, &["power", "query", "ai"], 2, 10).expect("search");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].path(), "guides/power-query.md");

        let strict = keyword_search_title_match(&store, &["power"], 2, 10).expect("search");
        assert!(strict.is_empty());
    }

    #[test]
    fn test_content_terms_span_chunks() {
        let store = seeded(false);
        let results =
            content_term_search(&store, &["kubernetes", "terraform"], 2, 10).expect("search");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].path(), "notes/split.md");
        assert!((results[0].score - 2.0).abs() < f64::EPSILON);

        let root_only = keyword_search(&store, &["kubernetes", "terraform"], 10).expect("search");
        assert!(root_only.is_empty());
    }

    #[test]
    fn test_matching_folds_non_ascii_case() {
        let store = seeded(false);
        store
            .upsert_chunk(
                &NoteChunk::new("de/überblick.md", 0, "Überblick Planung")
                    .with_text("Éclair ÄNDERUNGEN")
                    .with_modified(400),
                None,
            )
            .expect("upsert");
        store
            .upsert_chunk(
                &NoteChunk::new("de/überblick.md", 1, "Überblick Planung")
                    .with_heading("STRAßE")
                    .with_text("ÖFFNUNGSZEITEN"),
                None,
            )
            .expect("upsert");

        let title = keyword_search(&store, &["überblick"], 10).expect("search");
        assert_eq!(title.len(), 1);
        assert_eq!(title[0].path(), "de/überblick.md");

        let body = keyword_search(&store, &["änderungen"], 10).expect("search");
        assert_eq!(body.len(), 1);
        assert_eq!(body[0].chunk.chunk_index, 0);

        let title_match =
            keyword_search_title_match(&store, &["Überblick", "planung"], 2, 10).expect("search");
        assert_eq!(title_match.len(), 1);
        assert!((title_match[0].score - 2.0).abs() < f64::EPSILON);

        let spread =
            content_term_search(&store, &["éclair", "öffnungszeiten"], 2, 10).expect("search");
        assert_eq!(spread.len(), 1);
        assert_eq!(spread[0].chunk.heading, "STRAßE");
    }

    #[test]
    fn test_full_text_ranks_and_dedups() {
        let store = seeded(true);
        let results = full_text_search(&store, &["sharepoint"], 10).expect("search");
        let paths: Vec<&str> = results.iter().map(RawSearchResult::path).collect();
        assert!(paths.contains(&"guides/power-query.md"));
        assert!(paths.contains(&"notes/sharepoint.md"));
        let unique: HashSet<&str> = paths.iter().copied().collect();
        assert_eq!(unique.len(), paths.len());
    }

    #[test]
    fn test_full_text_falls_back_without_fts() {
        let store = seeded(false);
        let results = full_text_search(&store, &["pivot"], 10).expect("search");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].path(), "notes/excel.md");
    }
}
