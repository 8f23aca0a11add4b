//! Query validation: vector well-formedness and neighbor-count clamping.
//!
//! Everything here is a pure function of the input; validation failures
//! short-circuit a query before any upstream call is made.

use serde_json::Value;

/// Rejection reasons for a malformed query payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing 'feature_vector' in request body")]
    MissingVector,

    #[error("'feature_vector' must be a flat list of numbers")]
    NotANumberList,

    #[error("'feature_vector' must have length {expected}, got {actual}")]
    WrongLength { expected: usize, actual: usize },
}

/// Check the raw `feature_vector` value and convert it to a dense vector.
pub fn parse_feature_vector(
    value: Option<&Value>,
    expected_dimensions: usize,
) -> Result<Vec<f32>, ValidationError> {
    let value = match value {
        None | Some(Value::Null) => return Err(ValidationError::MissingVector),
        Some(value) => value,
    };

    let items = value.as_array().ok_or(ValidationError::NotANumberList)?;
    let vector = items
        .iter()
        .map(|item| item.as_f64().map(|n| n as f32))
        .collect::<Option<Vec<f32>>>()
        .ok_or(ValidationError::NotANumberList)?;

    if vector.len() != expected_dimensions {
        return Err(ValidationError::WrongLength {
            expected: expected_dimensions,
            actual: vector.len(),
        });
    }

    Ok(vector)
}

/// Clamp the requested neighbor count into `[1, max]`.
///
/// Out-of-range counts are never an error; an absent count falls back to
/// the configured default.
pub fn clamp_neighbor_count(requested: Option<i64>, default: u32, max: u32) -> u32 {
    let requested = requested.unwrap_or(i64::from(default));
    requested.clamp(1, i64::from(max.max(1))) as u32
}

/// In-place L2 normalization of the query vector.
///
/// Zero and degenerate vectors are left unchanged.
pub fn l2_normalize_in_place(v: &mut [f32]) {
    let norm_sq: f32 = v.iter().map(|x| x * x).sum();
    if norm_sq > 0.0 && norm_sq.is_finite() {
        let inv_norm = norm_sq.sqrt().recip();
        for x in v.iter_mut() {
            *x *= inv_norm;
        }
    }
}
