//! Core recall types: configuration, errors, notes, and results.

pub mod config;
pub mod errors;
pub mod kinds;
pub mod note;
pub mod result;

pub use config::{CompositeWeights, RecallConfig, RetrievalConfig, StorageConfig};
pub use errors::{RecallError, RecallResult};
pub use kinds::{ContentType, ContentTypeParseError};
pub use note::NoteChunk;
pub use result::{RawSearchResult, SearchOptions, SearchResult};
