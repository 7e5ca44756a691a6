//! Zero-division guards shared by every derived ratio in the engine.
//!
//! A ratio that cannot be computed is `None`, never `0.0` or an infinity.

/// `numerator / denominator`; undefined for a zero denominator or non-finite result.
pub fn safe_ratio(numerator: f64, denominator: f64) -> Option<f64> {
    if denominator == 0.0 {
        return None;
    }
    let value = numerator / denominator;
    if value.is_finite() {
        Some(value)
    } else {
        None
    }
}

/// `numerator / denominator * 100`
pub fn percent_of(numerator: f64, denominator: f64) -> Option<f64> {
    safe_ratio(numerator, denominator).map(|r| r * 100.0)
}

/// `(treated - baseline) / baseline * 100`
pub fn lift_percent(treated: f64, baseline: f64) -> Option<f64> {
    percent_of(treated - baseline, baseline)
}

/// `|actual - predicted| / actual * 100`, defined only for positive actuals.
pub fn percentage_error(actual: f64, predicted: f64) -> Option<f64> {
    if actual > 0.0 {
        percent_of((actual - predicted).abs(), actual)
    } else {
        None
    }
}

/// Arithmetic mean; undefined for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    safe_ratio(values.iter().sum(), values.len() as f64)
}
