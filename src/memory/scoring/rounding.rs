//! Fixed-precision rounding for reported scores.

/// Round to three decimals; non-finite input maps to `0.0`.
#[must_use]
pub fn round3(value: f64) -> f64 {
    round_to(value, 1000.0)
}

/// Round to one decimal; non-finite input maps to `0.0`.
#[must_use]
pub fn round1(value: f64) -> f64 {
    round_to(value, 10.0)
}

/// Clamp into `[0, 1]`; non-finite input maps to `0.0`.
#[must_use]
pub fn clamp_unit(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

fn round_to(value: f64, scale: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    (value * scale).round() / scale
}
