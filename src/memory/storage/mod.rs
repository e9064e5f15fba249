//! Persistent storage for indexed notes.

pub mod note_store;
pub mod report;
pub mod sqlite_vec_loader;

pub use note_store::{NOTE_COLUMNS, NOTE_COLUMN_COUNT, SqliteNoteStore, chunk_from_row};
pub use report::{IndexReport, IndexStats};
pub use sqlite_vec_loader::{init_sqlite_vec_extension, sqlite_vec_version};
