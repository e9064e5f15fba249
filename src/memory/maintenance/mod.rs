//! Maintenance passes over the note index.

pub mod confidence_refresh;

pub use confidence_refresh::{RefreshStats, refresh_confidence, refresh_confidence_now};
