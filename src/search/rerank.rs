//! Color-affinity re-ranking.

/// Penalty applied when a candidate's dominant color contradicts the
/// caller's hint.
pub const COLOR_MISMATCH_PENALTY: f64 = 0.8;

/// Apply the color-affinity bias to a similarity score.
///
/// The score is multiplied by [`COLOR_MISMATCH_PENALTY`] only when both a
/// dominant color and a hint are present and differ case-insensitively.
/// Each candidate is adjusted from its own fields alone, so the result is
/// independent of candidate order.
pub fn apply_color_bias(similarity: f64, dominant_color: Option<&str>, hint: Option<&str>) -> f64 {
    match (dominant_color, hint) {
        (Some(color), Some(hint)) if color.to_lowercase() != hint.to_lowercase() => {
            similarity * COLOR_MISMATCH_PENALTY
        }
        _ => similarity,
    }
}
