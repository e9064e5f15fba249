//! `SQLite` note index: chunk rows, a sqlite-vec table, and an optional FTS5 table.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use rusqlite::functions::FunctionFlags;
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::{debug, info, warn};

use crate::memory::core::config::StorageConfig;
use crate::memory::core::errors::{RecallError, RecallResult};
use crate::memory::core::kinds::ContentType;
use crate::memory::core::note::NoteChunk;
use crate::memory::scoring::rounding::{clamp_unit, round3};
use crate::memory::storage::report::{IndexReport, IndexStats};
use crate::memory::storage::sqlite_vec_loader::{init_sqlite_vec_extension, sqlite_vec_version};

/// Columns decoded by [`chunk_from_row`], in order, aliased as `n`.
pub const NOTE_COLUMNS: &str = "n.path, n.chunk_index, n.title, n.heading, n.text, n.tags, \
     n.domain, n.workstream, n.content_type, n.modified, n.content_hash, n.confidence, \
     n.access_count, n.review_date";

/// Number of columns in [`NOTE_COLUMNS`].
pub const NOTE_COLUMN_COUNT: usize = 14;

/// SQL scalar function lowercasing its argument with full Unicode rules.
pub const FOLD_CASE_FN: &str = "fold_case";

const NOTES_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS notes (
        id INTEGER PRIMARY KEY,
        path TEXT NOT NULL,
        chunk_index INTEGER NOT NULL,
        title TEXT NOT NULL DEFAULT '',
        heading TEXT NOT NULL DEFAULT '',
        text TEXT NOT NULL DEFAULT '',
        tags TEXT NOT NULL DEFAULT '[]',
        domain TEXT NOT NULL DEFAULT '',
        workstream TEXT NOT NULL DEFAULT '',
        content_type TEXT NOT NULL DEFAULT 'note',
        modified INTEGER NOT NULL DEFAULT 0,
        content_hash TEXT NOT NULL DEFAULT '',
        confidence REAL NOT NULL DEFAULT 0.5,
        access_count INTEGER NOT NULL DEFAULT 0,
        review_date TEXT,
        UNIQUE (path, chunk_index)
    );
    CREATE INDEX IF NOT EXISTS idx_notes_path ON notes (path);
    CREATE INDEX IF NOT EXISTS idx_notes_modified ON notes (modified);
";

const FTS_SCHEMA: &str =
    "CREATE VIRTUAL TABLE IF NOT EXISTS notes_fts USING fts5(title, text, tokenize = 'unicode61')";

/// SQLite-backed note index.
///
/// The connection sits behind a mutex; every query runs inside [`Self::read`]
/// or one of the write helpers.
pub struct SqliteNoteStore {
    conn: Mutex<Connection>,
    dims: usize,
    full_text: bool,
}

impl SqliteNoteStore {
    /// Open (or create) the index described by `config`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened, sqlite-vec is
    /// missing, or the schema cannot be created.
    pub fn open(config: &StorageConfig) -> RecallResult<Self> {
        init_sqlite_vec_extension();
        let conn = Connection::open(&config.sqlite_path)?;
        debug!(path = %config.sqlite_path.display(), "opened sqlite database");
        Self::init(conn, config.embedding_dims, config.full_text_index)
    }

    /// Open a private in-memory index.
    ///
    /// # Errors
    /// Returns an error if sqlite-vec is missing or the schema cannot be created.
    pub fn open_in_memory(dims: usize, full_text: bool) -> RecallResult<Self> {
        init_sqlite_vec_extension();
        let conn = Connection::open_in_memory()?;
        Self::init(conn, dims, full_text)
    }

    fn init(conn: Connection, dims: usize, full_text: bool) -> RecallResult<Self> {
        if dims == 0 {
            return Err(RecallError::InvalidConfig(
                "embedding dimensions must be > 0".to_string(),
            ));
        }

        let version = sqlite_vec_version(&conn)?;
        register_fold_case(&conn)?;
        conn.execute_batch(NOTES_SCHEMA)?;
        conn.execute_batch(&format!(
            "CREATE VIRTUAL TABLE IF NOT EXISTS note_vectors USING vec0(embedding float[{dims}])"
        ))?;

        let full_text = full_text
            && match conn.execute_batch(FTS_SCHEMA) {
                Ok(()) => true,
                Err(err) => {
                    warn!(error = %err, "fts5 unavailable, keyword search uses substring matching");
                    false
                }
            };

        info!(vec_version = %version, dims, full_text, "note store ready");
        Ok(Self {
            conn: Mutex::new(conn),
            dims,
            full_text,
        })
    }

    /// Embedding dimensions of the vector table.
    #[must_use]
    pub const fn dims(&self) -> usize {
        self.dims
    }

    /// True when the FTS5 index is maintained.
    #[must_use]
    pub const fn has_full_text(&self) -> bool {
        self.full_text
    }

    /// Reject a query or stored vector of the wrong width.
    ///
    /// # Errors
    /// Returns [`RecallError::DimensionMismatch`] on a width mismatch.
    pub fn check_dims(&self, vector: &[f32]) -> RecallResult<()> {
        if vector.len() == self.dims {
            Ok(())
        } else {
            Err(RecallError::DimensionMismatch {
                expected: self.dims,
                actual: vector.len(),
            })
        }
    }

    /// Run a read-only closure against the connection.
    ///
    /// # Errors
    /// Propagates the closure's error, or [`RecallError::LockPoisoned`].
    pub fn read<T>(&self, f: impl FnOnce(&Connection) -> RecallResult<T>) -> RecallResult<T> {
        let conn = self.lock()?;
        f(&conn)
    }

    fn lock(&self) -> RecallResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| {
            warn!("note store mutex poisoned");
            RecallError::LockPoisoned
        })
    }

    /// Insert or replace a chunk and, optionally, its embedding.
    ///
    /// Passing `None` removes any stored embedding for the chunk.
    ///
    /// # Errors
    /// Returns an error if the chunk is invalid, the embedding has the wrong
    /// width, or the write fails.
    pub fn upsert_chunk(&self, chunk: &NoteChunk, embedding: Option<&[f32]>) -> RecallResult<()> {
        chunk.validate()?;
        if let Some(vector) = embedding {
            self.check_dims(vector)?;
        }

        let tags = serde_json::to_string(&chunk.tags)?;
        let vector = embedding.map(serde_json::to_string).transpose()?;
        let access_count = i64::try_from(chunk.access_count).unwrap_or(i64::MAX);

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO notes (path, chunk_index, title, heading, text, tags, domain, workstream,
                                content_type, modified, content_hash, confidence, access_count,
                                review_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
             ON CONFLICT (path, chunk_index) DO UPDATE SET
                title = excluded.title,
                heading = excluded.heading,
                text = excluded.text,
                tags = excluded.tags,
                domain = excluded.domain,
                workstream = excluded.workstream,
                content_type = excluded.content_type,
                modified = excluded.modified,
                content_hash = excluded.content_hash,
                confidence = excluded.confidence,
                access_count = excluded.access_count,
                review_date = excluded.review_date",
            params![
                chunk.path,
                chunk.chunk_index,
                chunk.title,
                chunk.heading,
                chunk.text,
                tags,
                chunk.domain,
                chunk.workstream,
                chunk.content_type.as_str(),
                chunk.modified_epoch,
                chunk.content_hash,
                chunk.confidence,
                access_count,
                chunk.review_date,
            ],
        )?;

        let id: i64 = tx.query_row(
            "SELECT id FROM notes WHERE path = ?1 AND chunk_index = ?2",
            params![chunk.path, chunk.chunk_index],
            |row| row.get(0),
        )?;

        tx.execute("DELETE FROM note_vectors WHERE rowid = ?1", [id])?;
        if let Some(vector) = vector {
            tx.execute(
                "INSERT INTO note_vectors (rowid, embedding) VALUES (?1, ?2)",
                params![id, vector],
            )?;
        }

        if self.full_text {
            tx.execute("DELETE FROM notes_fts WHERE rowid = ?1", [id])?;
            tx.execute(
                "INSERT INTO notes_fts (rowid, title, text) VALUES (?1, ?2, ?3)",
                params![id, chunk.title, chunk.text],
            )?;
        }

        tx.commit()?;
        debug!(path = %chunk.path, chunk = chunk.chunk_index, "upserted chunk");
        Ok(())
    }

    /// Remove every chunk of a document. Returns the number of rows removed.
    ///
    /// # Errors
    /// Returns an error if the delete fails.
    pub fn delete_document(&self, path: &str) -> RecallResult<usize> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM note_vectors WHERE rowid IN (SELECT id FROM notes WHERE path = ?1)",
            [path],
        )?;
        if self.full_text {
            tx.execute(
                "DELETE FROM notes_fts WHERE rowid IN (SELECT id FROM notes WHERE path = ?1)",
                [path],
            )?;
        }
        let removed = tx.execute("DELETE FROM notes WHERE path = ?1", [path])?;
        tx.commit()?;
        Ok(removed)
    }

    /// Increment the access counter of every chunk of `path`.
    ///
    /// Returns the number of chunks touched; `0` for an unknown path.
    ///
    /// # Errors
    /// Returns an error if the update fails.
    pub fn record_access(&self, path: &str) -> RecallResult<usize> {
        let conn = self.lock()?;
        let touched = conn.execute(
            "UPDATE notes SET access_count = access_count + 1 WHERE path = ?1",
            [path],
        )?;
        Ok(touched)
    }

    /// Store a new confidence for every chunk of `path`.
    ///
    /// # Errors
    /// Returns an error if the update fails.
    pub fn set_confidence(&self, path: &str, confidence: f64) -> RecallResult<usize> {
        let value = round3(clamp_unit(confidence));
        let conn = self.lock()?;
        let touched = conn.execute(
            "UPDATE notes SET confidence = ?1 WHERE path = ?2",
            params![value, path],
        )?;
        Ok(touched)
    }

    /// Root chunks of every document, ordered by path.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn root_chunks(&self) -> RecallResult<Vec<NoteChunk>> {
        self.read(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {NOTE_COLUMNS} FROM notes n WHERE n.chunk_index = 0 ORDER BY n.path"
            ))?;
            let rows = stmt.query_map([], |row| chunk_from_row(row, 0))?;
            Ok(rows.collect::<Result<Vec<_>, _>>()?)
        })
    }

    /// Load one chunk by path and index.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn get_chunk(&self, path: &str, chunk_index: u32) -> RecallResult<Option<NoteChunk>> {
        self.read(|conn| {
            let chunk = conn
                .query_row(
                    &format!(
                        "SELECT {NOTE_COLUMNS} FROM notes n
                         WHERE n.path = ?1 AND n.chunk_index = ?2"
                    ),
                    params![path, chunk_index],
                    |row| chunk_from_row(row, 0),
                )
                .optional()?;
            Ok(chunk)
        })
    }

    /// Summarize the index contents.
    ///
    /// # Errors
    /// Returns an error if any count query fails.
    pub fn index_report(&self) -> RecallResult<IndexReport> {
        let full_text = self.full_text;
        self.read(|conn| {
            let (chunks, documents, oldest, newest): (i64, i64, Option<i64>, Option<i64>) = conn
                .query_row(
                    "SELECT COUNT(*), COUNT(DISTINCT path), MIN(modified), MAX(modified) FROM notes",
                    [],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
                )?;
            if chunks == 0 {
                return Ok(IndexReport::NoData);
            }

            let vectors: i64 =
                conn.query_row("SELECT COUNT(*) FROM note_vectors", [], |row| row.get(0))?;

            let mut stmt = conn.prepare(
                "SELECT content_type, COUNT(*) FROM notes
                 WHERE chunk_index = 0 GROUP BY content_type",
            )?;
            let mut by_content_type = BTreeMap::new();
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?;
            for row in rows {
                let (kind, count) = row?;
                let kind = ContentType::parse_lossy(&kind).as_str().to_string();
                *by_content_type.entry(kind).or_insert(0) += count.unsigned_abs();
            }

            Ok(IndexReport::Report(IndexStats {
                documents: documents.unsigned_abs(),
                chunks: chunks.unsigned_abs(),
                vectors: vectors.unsigned_abs(),
                by_content_type,
                oldest_modified: oldest.unwrap_or_default(),
                newest_modified: newest.unwrap_or_default(),
                full_text,
            }))
        })
    }
}

/// Register `fold_case(text)`, a Unicode-aware lowercase.
///
/// The built-in `LIKE` only folds ASCII letters; keyword queries compare
/// `fold_case(column)` against lowercased patterns instead.
fn register_fold_case(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        FOLD_CASE_FN,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text = ctx.get::<Option<String>>(0)?;
            Ok(text.map(|text| text.to_lowercase()))
        },
    )
}

/// Decode a [`NoteChunk`] from [`NOTE_COLUMNS`] starting at `offset`.
///
/// # Errors
/// Returns a conversion error for malformed tags or a negative chunk index.
pub fn chunk_from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<NoteChunk> {
    let tags_idx = offset + 5;
    let tags_json: String = row.get(tags_idx)?;
    let tags: Vec<String> = serde_json::from_str(&tags_json).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(tags_idx, Type::Text, Box::new(err))
    })?;

    let index_idx = offset + 1;
    let chunk_index: i64 = row.get(index_idx)?;
    let chunk_index = u32::try_from(chunk_index).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(index_idx, Type::Integer, Box::new(err))
    })?;

    let content_type: String = row.get(offset + 8)?;
    let access_count: i64 = row.get(offset + 12)?;

    Ok(NoteChunk {
        path: row.get(offset)?,
        chunk_index,
        title: row.get(offset + 2)?,
        heading: row.get(offset + 3)?,
        text: row.get(offset + 4)?,
        tags,
        domain: row.get(offset + 6)?,
        workstream: row.get(offset + 7)?,
        content_type: ContentType::parse_lossy(&content_type),
        modified_epoch: row.get(offset + 9)?,
        content_hash: row.get(offset + 10)?,
        confidence: row.get(offset + 11)?,
        access_count: u64::try_from(access_count).unwrap_or(0),
        review_date: row.get(offset + 13)?,
    })
}
