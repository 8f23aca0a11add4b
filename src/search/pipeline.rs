//! Single-pass post-processing of raw neighbors into a ranked result set.
//!
//! The pipeline is a pure, stateless transform executed once per query:
//! drop id-less candidates, score and extract each remaining one
//! independently, apply the color bias, filter by threshold, and sort.
//! A malformed candidate degrades on its own and can never fail the batch.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::search::metadata::extract_metadata;
use crate::search::rerank::apply_color_bias;
use crate::search::similarity::normalize_similarity;
use crate::search::types::{QueryOptions, RawCandidate, ScoredCandidate, SearchResponse};

/// Tunables that survive across queries.
#[derive(Debug, Clone, Default)]
pub struct PipelineSettings {
    /// Candidates scoring below this are dropped. Non-negative; `0.0`
    /// retains everything.
    pub similarity_threshold: f64,
}

/// Ranked results plus the audit counts for one query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineOutcome {
    pub results: Vec<ScoredCandidate>,
    pub before_filter: usize,
    pub after_filter: usize,
}

/// Run the post-processing pipeline over one batch of raw candidates.
///
/// `before_filter` counts the candidates that reached scoring, i.e. those
/// with a resolvable id. Ties in the final ordering keep the upstream
/// return order (the sort is stable).
pub fn run(
    candidates: Vec<RawCandidate>,
    options: &QueryOptions,
    settings: &PipelineSettings,
) -> PipelineOutcome {
    let mut results = Vec::with_capacity(candidates.len());
    let mut before_filter = 0usize;

    for candidate in candidates {
        let Some(id) = candidate.id else {
            tracing::debug!("dropping neighbor without a datapoint id");
            continue;
        };
        before_filter += 1;

        let similarity = normalize_similarity(candidate.distance);
        let meta = extract_metadata(&candidate.metadata);
        let similarity = apply_color_bias(
            similarity,
            meta.color_info
                .as_ref()
                .and_then(|c| c.dominant_color.as_deref()),
            options.color_hint.as_deref(),
        );

        if similarity < settings.similarity_threshold {
            continue;
        }

        results.push(ScoredCandidate::from_parts(
            id,
            candidate.distance,
            similarity,
            meta,
        ));
    }

    let after_filter = results.len();
    // Stable: equal scores keep the upstream order.
    results.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));

    PipelineOutcome {
        results,
        before_filter,
        after_filter,
    }
}

/// Package a pipeline outcome into the response envelope.
pub fn assemble(
    outcome: PipelineOutcome,
    source: &str,
    request_id: &str,
    captured_at: DateTime<Utc>,
) -> SearchResponse {
    let top_k = outcome.results.len();
    SearchResponse {
        results: outcome.results,
        top_k,
        source: source.to_string(),
        request_id: request_id.to_string(),
        timestamp: captured_at.to_rfc3339_opts(SecondsFormat::Micros, true),
        results_before_filter: outcome.before_filter,
        results_after_filter: outcome.after_filter,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map, Value};

    fn candidate(id: &str, distance: f64, metadata: Value) -> RawCandidate {
        RawCandidate {
            id: Some(id.to_string()),
            distance: Some(distance),
            metadata: metadata.as_object().cloned().unwrap_or_default(),
        }
    }

    /// Distance that normalizes to the given similarity.
    fn distance_for(similarity: f64) -> f64 {
        (1.0 - similarity) / similarity
    }

    fn options_with_hint(hint: Option<&str>) -> QueryOptions {
        QueryOptions {
            neighbor_count: 10,
            color_hint: hint.map(str::to_string),
            return_full_datapoint: true,
            normalize: false,
        }
    }

    #[test]
    fn threshold_filters_and_sorts_descending() {
        let candidates = vec![
            candidate("a", distance_for(0.9), json!({})),
            candidate("b", distance_for(0.4), json!({})),
            candidate("c", distance_for(0.6), json!({})),
        ];

        let outcome = run(
            candidates,
            &options_with_hint(None),
            &PipelineSettings {
                similarity_threshold: 0.5,
            },
        );

        assert_eq!(outcome.before_filter, 3);
        assert_eq!(outcome.after_filter, 2);
        let ids: Vec<&str> = outcome.results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert!(outcome.results[0].similarity > outcome.results[1].similarity);
    }

    #[test]
    fn candidates_without_id_are_dropped_before_counting() {
        let candidates = vec![
            RawCandidate {
                id: None,
                distance: Some(0.0),
                metadata: Map::new(),
            },
            candidate("kept", 0.5, json!({})),
        ];

        let outcome = run(
            candidates,
            &options_with_hint(None),
            &PipelineSettings::default(),
        );
        assert_eq!(outcome.before_filter, 1);
        assert_eq!(outcome.after_filter, 1);
        assert_eq!(outcome.results[0].id, "kept");
    }

    #[test]
    fn equal_scores_keep_upstream_order() {
        let candidates = vec![
            candidate("first", 0.3, json!({})),
            candidate("second", 0.3, json!({})),
            candidate("third", 0.3, json!({})),
        ];

        let outcome = run(
            candidates,
            &options_with_hint(None),
            &PipelineSettings::default(),
        );
        let ids: Vec<&str> = outcome.results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[test]
    fn color_mismatch_reranks_below_matching_candidates() {
        // Spec scenario: distances [0.1, 0.2, 0.9], colors [black, white, black],
        // hint "black".
        let candidates = vec![
            candidate("c1", 0.1, json!({"color": "black"})),
            candidate("c2", 0.2, json!({"color": "white"})),
            candidate("c3", 0.9, json!({"color": "black"})),
        ];

        let outcome = run(
            candidates,
            &options_with_hint(Some("black")),
            &PipelineSettings::default(),
        );

        assert_eq!(outcome.before_filter, 3);
        assert_eq!(outcome.after_filter, 3);
        let ids: Vec<&str> = outcome.results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2", "c3"]);
        assert!((outcome.results[0].similarity - 0.909).abs() < 1e-3);
        assert!((outcome.results[1].similarity - 0.667).abs() < 1e-3);
        assert!((outcome.results[2].similarity - 0.526).abs() < 1e-3);
    }

    #[test]
    fn pipeline_is_deterministic() {
        let candidates = vec![
            candidate("a", 0.2, json!({"color": "red", "gcs_uri": "gs://b/a.jpg"})),
            candidate("b", 0.4, json!({"color": "blue"})),
        ];

        let options = options_with_hint(Some("red"));
        let settings = PipelineSettings::default();
        let first = run(candidates.clone(), &options, &settings);
        let second = run(candidates, &options, &settings);
        assert_eq!(first, second);
    }

    #[test]
    fn assemble_tags_envelope_with_correlation_metadata() {
        let outcome = run(
            vec![candidate("a", 0.0, json!({}))],
            &options_with_hint(None),
            &PipelineSettings::default(),
        );
        let captured_at = Utc::now();
        let response = assemble(outcome, "vertex", "req-123", captured_at);

        assert_eq!(response.top_k, 1);
        assert_eq!(response.source, "vertex");
        assert_eq!(response.request_id, "req-123");
        assert_eq!(response.results_before_filter, 1);
        assert_eq!(response.results_after_filter, 1);
        assert!(response.timestamp.ends_with('Z'));
    }

    #[test]
    fn zero_threshold_retains_unknown_distance_candidates() {
        let candidates = vec![RawCandidate {
            id: Some("no-distance".to_string()),
            distance: None,
            metadata: Map::new(),
        }];

        let outcome = run(
            candidates,
            &options_with_hint(None),
            &PipelineSettings::default(),
        );
        assert_eq!(outcome.after_filter, 1);
        assert_eq!(outcome.results[0].similarity, 0.0);
        assert_eq!(outcome.results[0].distance, None);
    }
}
