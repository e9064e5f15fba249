//! Confidence, recency, and composite scoring.

pub mod confidence;
pub mod rounding;

pub use confidence::{
    access_boost, composite_score, composite_score_at, compute_confidence, compute_recency_score,
    confidence_at, recency_score_at,
};
pub use rounding::{clamp_unit, round1, round3};
