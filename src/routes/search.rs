//! The similarity query endpoint.
//!
//! One query runs validation, a single upstream call, and the
//! post-processing pipeline, all under a correlation id that is generated
//! up front and attached to every response, success or error.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use crate::error::{ServerError, ServerResult};
use crate::middleware::RequestId;
use crate::search::pipeline::{self, PipelineSettings};
use crate::search::types::{QueryOptions, SearchResponse};
use crate::search::validate;
use crate::state::AppState;

/// Similarity query request body.
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    /// Query embedding; kept as raw JSON so validation can distinguish
    /// a missing vector from a malformed one.
    #[serde(default)]
    pub feature_vector: Option<Value>,

    /// Requested neighbor count; clamped, never rejected.
    #[serde(default)]
    pub neighbor_count: Option<i64>,

    /// Optional color hint for re-ranking.
    #[serde(default)]
    pub color: Option<String>,

    /// L2-normalize the vector before querying the index.
    #[serde(default)]
    pub normalize: bool,
}

/// POST /api/v1/search (also served at POST / for legacy callers).
///
/// The correlation id comes from the request-id middleware, which runs on
/// every route.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::warn!(request_id = %request_id, error = %rejection, "rejecting non-JSON body");
            return ServerError::BadRequest("Request body must be JSON".to_string())
                .into_response_with_id(&request_id);
        }
    };

    match run_query(&state, request, &request_id).await {
        Ok(response) => Json(response).into_response(),
        Err(err) => {
            tracing::error!(request_id = %request_id, error = %err, "search request failed");
            err.into_response_with_id(&request_id)
        }
    }
}

async fn run_query(
    state: &AppState,
    request: SearchRequest,
    request_id: &str,
) -> ServerResult<SearchResponse> {
    let config = &state.config;

    let mut vector =
        validate::parse_feature_vector(request.feature_vector.as_ref(), config.expected_dimensions)?;
    if request.normalize {
        validate::l2_normalize_in_place(&mut vector);
    }

    let options = QueryOptions {
        neighbor_count: validate::clamp_neighbor_count(
            request.neighbor_count,
            config.default_neighbor_count,
            config.max_neighbors,
        ),
        color_hint: request.color,
        return_full_datapoint: config.return_full_datapoint,
        normalize: request.normalize,
    };

    tracing::info!(
        request_id = %request_id,
        dimensions = vector.len(),
        neighbor_count = options.neighbor_count,
        color_hint = options.color_hint.as_deref().unwrap_or("-"),
        "running vector search"
    );

    let candidates = state
        .search
        .find_neighbors(&vector, options.neighbor_count, options.return_full_datapoint)
        .await?;

    tracing::info!(
        request_id = %request_id,
        received = candidates.len(),
        "index query completed"
    );

    let outcome = pipeline::run(
        candidates,
        &options,
        &PipelineSettings {
            similarity_threshold: config.similarity_threshold,
        },
    );

    Ok(pipeline::assemble(
        outcome,
        state.search.source(),
        request_id,
        Utc::now(),
    ))
}
