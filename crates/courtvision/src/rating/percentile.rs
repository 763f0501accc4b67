// Percentile rank of a value within a reference distribution.

/// Percentile used whenever there is nothing to compare against.
pub const NEUTRAL_PERCENTILE: f64 = 0.5;

/// Fraction of `distribution` values less than or equal to `value`.
///
/// An empty distribution yields [`NEUTRAL_PERCENTILE`] so that missing league
/// data degrades to "average" instead of failing. The result is always in
/// `[0, 1]`.
pub fn percentile(value: f64, distribution: &[f64]) -> f64 {
    if distribution.is_empty() {
        return NEUTRAL_PERCENTILE;
    }
    let at_or_below = distribution.iter().filter(|&&d| d <= value).count();
    at_or_below as f64 / distribution.len() as f64
}

/// Percentile for stats where a lower value is better (e.g. defensive rating).
pub fn inverted_percentile(value: f64, distribution: &[f64]) -> f64 {
    1.0 - percentile(value, distribution)
}
