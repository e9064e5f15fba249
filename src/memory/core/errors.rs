//! Error types for the recall engine.

use thiserror::Error;

/// Recall engine error type.
#[derive(Debug, Error)]
pub enum RecallError {
    /// Invalid configuration or unsupported values.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// A note chunk that cannot be stored or decoded.
    #[error("invalid note: {0}")]
    InvalidNote(String),
    /// `SQLite` storage error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Serialization error (query vectors, tags, config files).
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Required `SQLite` extension not available.
    #[error("sqlite-vec extension is not available; load it before opening the note store")]
    SqliteVecUnavailable,
    /// Embedding width does not match the vector index.
    #[error("embedding has {actual} dimensions, index expects {expected}")]
    DimensionMismatch {
        /// Dimensions declared by the index.
        expected: usize,
        /// Dimensions of the rejected vector.
        actual: usize,
    },
    /// The store lock was poisoned by a panicking writer.
    #[error("note store lock poisoned")]
    LockPoisoned,
}

/// Convenience result alias for recall operations.
pub type RecallResult<T> = Result<T, RecallError>;
