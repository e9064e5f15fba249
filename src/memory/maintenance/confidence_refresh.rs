//! Periodic confidence refresh.
//!
//! Recomputes each document's confidence from its content type, age, access
//! count and review date, and writes back the values that moved.

use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info};

use crate::memory::core::errors::RecallResult;
use crate::memory::scoring::confidence::confidence_at;
use crate::memory::storage::note_store::SqliteNoteStore;

/// Smallest change worth writing back.
const UPDATE_EPSILON: f64 = 0.0005;

/// Statistics from a refresh pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshStats {
    /// Documents examined.
    pub examined: usize,
    /// Documents whose confidence was rewritten.
    pub updated: usize,
    /// Pass duration in milliseconds.
    pub duration_ms: u64,
}

/// Refresh confidence relative to the current time.
///
/// # Errors
/// Returns an error if the store cannot be read or written.
pub fn refresh_confidence_now(store: &SqliteNoteStore) -> RecallResult<RefreshStats> {
    refresh_confidence(store, Utc::now().timestamp())
}

/// Refresh confidence for every document relative to `now_epoch`.
///
/// # Errors
/// Returns an error if the store cannot be read or written.
pub fn refresh_confidence(store: &SqliteNoteStore, now_epoch: i64) -> RecallResult<RefreshStats> {
    let start = Instant::now();
    let roots = store.root_chunks()?;
    let mut stats = RefreshStats {
        examined: roots.len(),
        ..RefreshStats::default()
    };

    for root in &roots {
        let fresh = confidence_at(
            root.content_type,
            root.modified_epoch,
            root.access_count,
            root.review_date.is_some(),
            now_epoch,
        );
        if (fresh - root.confidence).abs() > UPDATE_EPSILON {
            debug!(path = %root.path, old = root.confidence, new = fresh, "confidence changed");
            store.set_confidence(&root.path, fresh)?;
            stats.updated += 1;
        }
    }

    stats.duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
    info!(
        examined = stats.examined,
        updated = stats.updated,
        duration_ms = stats.duration_ms,
        "confidence refresh complete"
    );
    Ok(stats)
}
