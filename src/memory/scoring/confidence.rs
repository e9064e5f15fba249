//! Recency decay and confidence scoring.
//!
//! Durable content types (decisions, hubs) keep full recency forever; the
//! rest decay exponentially with a per-type half-life. Confidence blends a
//! per-type baseline, recency, access frequency and an explicit review date.

use chrono::Utc;

use crate::memory::core::config::CompositeWeights;
use crate::memory::core::kinds::ContentType;
use crate::memory::scoring::rounding::{clamp_unit, round3};

const SECONDS_PER_DAY: f64 = 86_400.0;

const BASELINE_WEIGHT: f64 = 0.5;
const RECENCY_WEIGHT: f64 = 0.35;
const MAX_ACCESS_BOOST: f64 = 0.15;
const REVIEW_BOOST: f64 = 0.05;

/// Recency score in `[0, 1]` relative to the current time.
#[must_use]
pub fn compute_recency_score(modified_epoch: i64, content_type: ContentType) -> f64 {
    recency_score_at(modified_epoch, content_type, Utc::now().timestamp())
}

/// Recency score in `[0, 1]` relative to `now_epoch`.
///
/// Future timestamps (clock skew) score `1.0`.
#[must_use]
#[allow(clippy::cast_precision_loss)] // Epoch deltas fit comfortably in f64.
pub fn recency_score_at(modified_epoch: i64, content_type: ContentType, now_epoch: i64) -> f64 {
    let Some(half_life) = content_type.half_life_days() else {
        return 1.0;
    };

    let age_seconds = now_epoch.saturating_sub(modified_epoch);
    if age_seconds <= 0 {
        return 1.0;
    }

    let age_days = age_seconds as f64 / SECONDS_PER_DAY;
    clamp_unit(0.5_f64.powf(age_days / half_life))
}

/// Confidence in `[0, 1]`, three decimals, relative to the current time.
#[must_use]
pub fn compute_confidence(
    content_type: ContentType,
    modified_epoch: i64,
    access_count: u64,
    has_review_date: bool,
) -> f64 {
    confidence_at(
        content_type,
        modified_epoch,
        access_count,
        has_review_date,
        Utc::now().timestamp(),
    )
}

/// Confidence in `[0, 1]`, three decimals, relative to `now_epoch`.
#[must_use]
pub fn confidence_at(
    content_type: ContentType,
    modified_epoch: i64,
    access_count: u64,
    has_review_date: bool,
    now_epoch: i64,
) -> f64 {
    let baseline = content_type.baseline_confidence();
    let recency = recency_score_at(modified_epoch, content_type, now_epoch);
    let review = if has_review_date { REVIEW_BOOST } else { 0.0 };

    let score = BASELINE_WEIGHT.mul_add(
        baseline,
        RECENCY_WEIGHT.mul_add(recency, access_boost(access_count) + review),
    );
    round3(clamp_unit(score))
}

/// Logarithmic access-frequency boost, capped at `0.15`.
#[must_use]
#[allow(clippy::cast_precision_loss)] // Access counts far below 2^52.
pub fn access_boost(access_count: u64) -> f64 {
    let raw = ((access_count as f64) + 1.0).log2() / 10.0;
    raw.min(MAX_ACCESS_BOOST)
}

/// Blend a semantic score with recency and stored confidence.
///
/// Inputs are clamped into `[0, 1]`; negative or non-finite weights count as
/// zero. The result is clamped and rounded to three decimals.
#[must_use]
pub fn composite_score(
    semantic_score: f64,
    modified_epoch: i64,
    confidence: f64,
    content_type: ContentType,
    weights: &CompositeWeights,
) -> f64 {
    composite_score_at(
        semantic_score,
        modified_epoch,
        confidence,
        content_type,
        weights,
        Utc::now().timestamp(),
    )
}

/// [`composite_score`] relative to `now_epoch`.
#[must_use]
pub fn composite_score_at(
    semantic_score: f64,
    modified_epoch: i64,
    confidence: f64,
    content_type: ContentType,
    weights: &CompositeWeights,
    now_epoch: i64,
) -> f64 {
    let relevance_weight = sanitize_weight(weights.relevance);
    let recency_weight = sanitize_weight(weights.recency);
    let confidence_weight = sanitize_weight(weights.confidence);

    let recency = recency_score_at(modified_epoch, content_type, now_epoch);
    let score = relevance_weight.mul_add(
        clamp_unit(semantic_score),
        recency_weight.mul_add(recency, confidence_weight * clamp_unit(confidence)),
    );
    round3(clamp_unit(score))
}

fn sanitize_weight(weight: f64) -> f64 {
    if weight.is_finite() && weight > 0.0 {
        weight
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_760_000_000;
    const DAY: i64 = 86_400;

    #[test]
    fn test_permanent_types_never_decay() {
        for kind in [ContentType::Decision, ContentType::Hub] {
            for years in [0, 1, 3, 10] {
                let modified = NOW - years * 365 * DAY;
                assert_eq!(recency_score_at(modified, kind, NOW), 1.0);
            }
        }
    }

    #[test]
    fn test_future_timestamps_score_one() {
        for kind in ContentType::ALL {
            assert_eq!(recency_score_at(NOW + 5 * DAY, *kind, NOW), 1.0);
            assert_eq!(recency_score_at(NOW, *kind, NOW), 1.0);
        }
        assert_eq!(compute_recency_score(i64::MAX, ContentType::Progress), 1.0);
    }

    #[test]
    fn test_half_lives() {
        let research = recency_score_at(NOW - 90 * DAY, ContentType::Research, NOW);
        assert!((research - 0.5).abs() < 1e-9);

        let note = recency_score_at(NOW - 60 * DAY, ContentType::Note, NOW);
        assert!((note - 0.5).abs() < 1e-9);

        let progress = recency_score_at(NOW - 60 * DAY, ContentType::Progress, NOW);
        assert!((progress - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_monotonic_in_access() {
        let modified = NOW - 400 * DAY;
        let mut previous = 0.0;
        for count in [0_u64, 1, 3, 10, 100, 1_000, 10_000] {
            let value = confidence_at(ContentType::Research, modified, count, false, NOW);
            assert!(value >= previous);
            assert!(value <= 1.0);
            previous = value;
        }

        let none = confidence_at(ContentType::Note, modified, 0, false, NOW);
        let many = confidence_at(ContentType::Note, modified, 10_000, false, NOW);
        assert!(many - none <= 0.15 + 1e-9);
    }

    #[test]
    fn test_access_boost_shrinks() {
        let first = access_boost(1) - access_boost(0);
        let later = access_boost(4) - access_boost(3);
        assert!(later < first);
        assert!((access_boost(1_000_000) - 0.15).abs() < f64::EPSILON);
        assert_eq!(access_boost(0), 0.0);
    }

    #[test]
    fn test_confidence_values() {
        // 0.5 * 0.9 + 0.35 * 1.0 + 0 + 0.05
        let decision = confidence_at(ContentType::Decision, NOW - 900 * DAY, 0, true, NOW);
        assert!((decision - 0.85).abs() < 1e-9);

        let maxed = confidence_at(ContentType::Decision, NOW, u64::MAX, true, NOW);
        assert!(maxed <= 1.0);
    }

    #[test]
    fn test_composite_bounds() {
        let zero = CompositeWeights::new(0.0, 0.0, 0.0);
        assert_eq!(
            composite_score_at(1.0, NOW, 1.0, ContentType::Hub, &zero, NOW),
            0.0
        );

        let ones = CompositeWeights::new(1.0, 1.0, 1.0);
        assert_eq!(
            composite_score_at(1.0, NOW, 1.0, ContentType::Hub, &ones, NOW),
            1.0
        );
    }

    #[test]
    fn test_composite_absorbs_bad_inputs() {
        let weights = CompositeWeights::new(-1.0, f64::NAN, 0.5);
        let score = composite_score_at(f64::NAN, NOW, 2.0, ContentType::Note, &weights, NOW);
        assert!((score - 0.5).abs() < 1e-9);
    }
}
