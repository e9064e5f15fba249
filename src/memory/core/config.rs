//! Configuration for the recall engine.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::memory::core::errors::{RecallError, RecallResult};
use crate::memory::core::result::MAX_TOP_K;

/// Environment variable naming a JSON config file.
pub const CONFIG_ENV: &str = "NOTES_RECALL_CONFIG";

/// Environment variable overriding the database path.
pub const DB_ENV: &str = "NOTES_RECALL_DB";

/// Top-level configuration for the recall engine.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecallConfig {
    /// Storage settings.
    pub storage: StorageConfig,
    /// Retrieval settings.
    pub retrieval: RetrievalConfig,
    /// Weights for composite scoring.
    pub composite: CompositeWeights,
}

impl RecallConfig {
    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any values are out of range or invalid.
    pub fn validate(&self) -> RecallResult<()> {
        if self.storage.embedding_dims == 0 {
            return Err(RecallError::InvalidConfig(
                "storage.embedding_dims must be > 0".to_string(),
            ));
        }

        if self.retrieval.top_k == 0 || self.retrieval.top_k > MAX_TOP_K {
            return Err(RecallError::InvalidConfig(format!(
                "retrieval.top_k must be in 1..={MAX_TOP_K}"
            )));
        }

        if self.retrieval.title_fallback_min_matches == 0 {
            return Err(RecallError::InvalidConfig(
                "retrieval.title_fallback_min_matches must be > 0".to_string(),
            ));
        }

        if self.retrieval.content_min_terms == 0 {
            return Err(RecallError::InvalidConfig(
                "retrieval.content_min_terms must be > 0".to_string(),
            ));
        }

        for (name, weight) in [
            ("relevance", self.composite.relevance),
            ("recency", self.composite.recency),
            ("confidence", self.composite.confidence),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(RecallError::InvalidConfig(format!(
                    "composite.{name} must be a finite, non-negative weight"
                )));
            }
        }

        Ok(())
    }

    /// Load and validate a JSON config file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn from_file(path: impl AsRef<Path>) -> RecallResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `NOTES_RECALL_CONFIG` (if set) and apply `NOTES_RECALL_DB`.
    ///
    /// # Errors
    /// Returns an error if the referenced file is invalid.
    pub fn from_env() -> RecallResult<Self> {
        let mut config = match std::env::var(CONFIG_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::from_file(path.trim())?,
            _ => Self::default(),
        };

        if let Ok(db) = std::env::var(DB_ENV)
            && !db.trim().is_empty()
        {
            config.storage.sqlite_path = PathBuf::from(db.trim());
        }

        config.validate()?;
        Ok(config)
    }
}

/// Storage configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// `SQLite` database path.
    pub sqlite_path: PathBuf,
    /// Embedding dimensions of the vector index.
    pub embedding_dims: usize,
    /// Whether to maintain an FTS5 index alongside the notes table.
    pub full_text_index: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            sqlite_path: PathBuf::from("notes.sqlite"),
            embedding_dims: 768,
            full_text_index: true,
        }
    }
}

/// Retrieval settings for the end-to-end query flow.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of results returned when the caller does not ask for a count.
    pub top_k: usize,
    /// Minimum title/path hits for the weak-term fallback.
    pub title_fallback_min_matches: usize,
    /// Minimum distinct terms for the cross-chunk content search.
    pub content_min_terms: usize,
    /// Terms at or under this length count as weak signal.
    pub weak_term_max_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 10,
            title_fallback_min_matches: 2,
            content_min_terms: 2,
            weak_term_max_chars: 4,
        }
    }
}

/// Weights for [`composite_score`](crate::memory::scoring::confidence::composite_score).
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositeWeights {
    /// Semantic similarity weight.
    pub relevance: f64,
    /// Recency weight.
    pub recency: f64,
    /// Stored confidence weight.
    pub confidence: f64,
}

impl Default for CompositeWeights {
    fn default() -> Self {
        Self {
            relevance: 0.6,
            recency: 0.2,
            confidence: 0.2,
        }
    }
}

impl CompositeWeights {
    /// Build weights from explicit values.
    #[must_use]
    pub const fn new(relevance: f64, recency: f64, confidence: f64) -> Self {
        Self {
            relevance,
            recency,
            confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(RecallConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_invalid_values() {
        let mut config = RecallConfig::default();
        config.storage.embedding_dims = 0;
        assert!(config.validate().is_err());

        let mut config = RecallConfig::default();
        config.retrieval.top_k = 101;
        assert!(config.validate().is_err());

        let mut config = RecallConfig::default();
        config.composite.recency = -0.1;
        assert!(config.validate().is_err());

        let mut config = RecallConfig::default();
        config.composite.confidence = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: RecallConfig =
            serde_json::from_str(r#"{"storage": {"embedding_dims": 384}}"#).unwrap();
        assert_eq!(config.storage.embedding_dims, 384);
        assert!(config.storage.full_text_index);
        assert_eq!(config.retrieval.top_k, 10);
        assert!((config.composite.relevance - 0.6).abs() < f64::EPSILON);
    }
}
