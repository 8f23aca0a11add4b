//! Wire and domain types for the similarity search pipeline.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Effective per-query options after validation and clamping.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Neighbor count after clamping into `[1, max_neighbors]`.
    pub neighbor_count: u32,

    /// Optional free-text color hint used for re-ranking.
    pub color_hint: Option<String>,

    /// Whether to ask the index for full datapoint records.
    pub return_full_datapoint: bool,

    /// Whether the query vector was L2-normalized before the upstream call.
    pub normalize: bool,
}

/// One unprocessed neighbor record as returned by the index backend.
///
/// The metadata map has no fixed schema: values may be strings, numbers,
/// nested objects, or byte arrays, and most keys are frequently missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawCandidate {
    /// Opaque datapoint identifier. Candidates without one are dropped
    /// before scoring.
    pub id: Option<String>,

    /// Raw distance, lower-is-closer by upstream convention.
    pub distance: Option<f64>,

    /// Per-item metadata exactly as the backend returned it.
    pub metadata: Map<String, Value>,
}

/// Dominant color attached to a candidate, if the catalog recorded one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColorInfo {
    pub dominant_color: Option<String>,
    pub color_confidence: Option<f64>,
}

/// Canonical view of a candidate's raw metadata.
///
/// Every field is optional; extraction is best-effort and never fails the
/// candidate. Keys that were not promoted to a canonical field are kept
/// verbatim in `extra`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedMetadata {
    pub filename: Option<String>,
    pub gcs_uri: Option<String>,
    pub image_url: Option<String>,
    pub product_id: Option<String>,
    pub color_info: Option<ColorInfo>,
    pub extra: Map<String, Value>,
}

/// Metadata object as serialized inside a result entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateMetadata {
    pub filename: Option<String>,
    pub gcs_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One scored, re-ranked result entry.
///
/// `score` and `similarity_score` repeat `similarity` on the wire; older
/// consumers read one of the aliases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub id: String,
    pub distance: Option<f64>,
    pub similarity: f64,
    pub score: f64,
    pub similarity_score: f64,
    pub color_info: Option<ColorInfo>,
    pub metadata: CandidateMetadata,
    pub image_url: Option<String>,
}

impl ScoredCandidate {
    /// Build a result entry from a scored candidate and its extracted
    /// metadata.
    pub fn from_parts(
        id: String,
        distance: Option<f64>,
        similarity: f64,
        meta: NormalizedMetadata,
    ) -> Self {
        Self {
            id,
            distance,
            similarity,
            score: similarity,
            similarity_score: similarity,
            color_info: meta.color_info,
            metadata: CandidateMetadata {
                filename: meta.filename,
                gcs_uri: meta.gcs_uri,
                product_id: meta.product_id,
                extra: meta.extra,
            },
            image_url: meta.image_url,
        }
    }
}

/// Final response envelope for one query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<ScoredCandidate>,
    #[serde(rename = "topK")]
    pub top_k: usize,
    pub source: String,
    #[serde(rename = "requestId")]
    pub request_id: String,
    pub timestamp: String,
    #[serde(rename = "resultsBeforeFilter")]
    pub results_before_filter: usize,
    #[serde(rename = "resultsAfterFilter")]
    pub results_after_filter: usize,
}
