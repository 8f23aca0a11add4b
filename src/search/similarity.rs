//! Distance-to-similarity normalization.

/// Convert a raw distance into a bounded similarity score.
///
/// Distances follow the upstream convention of lower-is-closer, so
/// `1 / (1 + |d|)` maps a zero distance to exactly `1.0` and decreases
/// monotonically with `|d|`. An absent or non-finite distance degrades to
/// `0.0`; this function never fails.
pub fn normalize_similarity(distance: Option<f64>) -> f64 {
    match distance {
        Some(d) if d.is_finite() => 1.0 / (1.0 + d.abs()),
        _ => 0.0,
    }
}
