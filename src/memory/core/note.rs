//! Persisted note chunk model.

use serde::{Deserialize, Serialize};

use crate::memory::core::errors::{RecallError, RecallResult};
use crate::memory::core::kinds::ContentType;

/// One physical chunk of a logical note.
///
/// Several chunks share a `path`; chunk `0` is the root chunk holding the full
/// document and is the only one consulted for path-level policy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NoteChunk {
    /// Logical document identifier (not unique across chunks).
    pub path: String,
    /// Position of the chunk within the document, `0` for the root chunk.
    pub chunk_index: u32,
    /// Document title.
    pub title: String,
    /// Heading the chunk falls under.
    pub heading: String,
    /// Chunk text.
    pub text: String,
    /// Free-form tags.
    pub tags: Vec<String>,
    /// Knowledge domain.
    pub domain: String,
    /// Workstream the note belongs to.
    pub workstream: String,
    /// Semantic category.
    pub content_type: ContentType,
    /// Last modification time, seconds since the Unix epoch.
    pub modified_epoch: i64,
    /// Hash of the document content.
    pub content_hash: String,
    /// Stored confidence in `[0, 1]`.
    pub confidence: f64,
    /// Number of times the note was retrieved.
    pub access_count: u64,
    /// Explicit review/maintenance date, if any.
    pub review_date: Option<String>,
}

impl NoteChunk {
    /// Create a chunk with neutral metadata.
    #[must_use]
    pub fn new(path: impl Into<String>, chunk_index: u32, title: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            chunk_index,
            title: title.into(),
            heading: String::new(),
            text: String::new(),
            tags: Vec::new(),
            domain: String::new(),
            workstream: String::new(),
            content_type: ContentType::Note,
            modified_epoch: 0,
            content_hash: String::new(),
            confidence: ContentType::Note.baseline_confidence(),
            access_count: 0,
            review_date: None,
        }
    }

    /// Set the chunk text.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set the heading.
    #[must_use]
    pub fn with_heading(mut self, heading: impl Into<String>) -> Self {
        self.heading = heading.into();
        self
    }

    /// Set the content type.
    #[must_use]
    pub const fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    /// Set the modification time.
    #[must_use]
    pub const fn with_modified(mut self, modified_epoch: i64) -> Self {
        self.modified_epoch = modified_epoch;
        self
    }

    /// Set tags.
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Set domain and workstream.
    #[must_use]
    pub fn with_scope(mut self, domain: impl Into<String>, workstream: impl Into<String>) -> Self {
        self.domain = domain.into();
        self.workstream = workstream.into();
        self
    }

    /// True for the root (full-document) chunk.
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.chunk_index == 0
    }

    /// Validate the chunk before it is written.
    ///
    /// # Errors
    /// Returns an error if the path is empty or the confidence is out of range.
    pub fn validate(&self) -> RecallResult<()> {
        if self.path.trim().is_empty() {
            return Err(RecallError::InvalidNote("path is empty".to_string()));
        }

        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return Err(RecallError::InvalidNote(format!(
                "confidence {} for {} must be in 0..=1",
                self.confidence, self.path
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_and_root() {
        let chunk = NoteChunk::new("notes/a.md", 0, "A")
            .with_text("body")
            .with_tags(["x", "y"])
            .with_content_type(ContentType::Hub);
        assert!(chunk.is_root());
        assert_eq!(chunk.tags, vec!["x".to_string(), "y".to_string()]);
        assert!(chunk.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let empty = NoteChunk::new("  ", 0, "A");
        assert!(empty.validate().is_err());

        let mut out_of_range = NoteChunk::new("a.md", 1, "A");
        out_of_range.confidence = 1.5;
        assert!(out_of_range.validate().is_err());
    }
}
