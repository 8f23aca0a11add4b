//! Adapter over the external nearest-neighbor index service.
//!
//! The pipeline only depends on the [`NeighborSearch`] trait; the
//! [`VertexMatchClient`] implementation speaks the Vertex AI
//! `findNeighbors` REST protocol. The client is built once at startup and
//! shared read-only across all queries. A failed call is never retried:
//! one failed call is one failed query.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};

use crate::config::AppConfig;
use crate::search::types::RawCandidate;

/// Failures surfaced by an index backend.
#[derive(Debug, thiserror::Error)]
pub enum SearchBackendError {
    #[error("index backend denied the request: {0}")]
    PermissionDenied(String),

    #[error("index backend returned an error: {0}")]
    Upstream(String),

    #[error("index backend unreachable: {0}")]
    Transport(#[from] reqwest::Error),
}

/// The one capability the pipeline needs from an index backend.
#[async_trait]
pub trait NeighborSearch: Send + Sync {
    /// Return raw candidates for the query vector, in backend ranking order.
    async fn find_neighbors(
        &self,
        vector: &[f32],
        neighbor_count: u32,
        return_full_datapoint: bool,
    ) -> Result<Vec<RawCandidate>, SearchBackendError>;

    /// Short tag identifying the backend in responses.
    fn source(&self) -> &str;
}

/// REST client for a deployed Vertex AI Vector Search index.
pub struct VertexMatchClient {
    http: reqwest::Client,
    url: String,
    deployed_index_id: String,
    auth_token: Option<String>,
}

impl VertexMatchClient {
    /// Build the client once at startup. Fails fast on bad configuration
    /// instead of failing lazily on the first query.
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.upstream_timeout_secs))
            .connect_timeout(Duration::from_secs(5))
            .build()?;

        let url = format!(
            "https://{}/v1/{}:findNeighbors",
            config.api_endpoint, config.index_endpoint
        );

        Ok(Self {
            http,
            url,
            deployed_index_id: config.deployed_index_id.clone(),
            auth_token: config.auth_token.clone(),
        })
    }
}

#[async_trait]
impl NeighborSearch for VertexMatchClient {
    async fn find_neighbors(
        &self,
        vector: &[f32],
        neighbor_count: u32,
        return_full_datapoint: bool,
    ) -> Result<Vec<RawCandidate>, SearchBackendError> {
        let body = json!({
            "deployedIndexId": self.deployed_index_id,
            "queries": [{
                "datapoint": { "featureVector": vector },
                "neighborCount": neighbor_count,
            }],
            "returnFullDatapoint": return_full_datapoint,
        });

        let mut request = self.http.post(&self.url).json(&body);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::FORBIDDEN || status == StatusCode::UNAUTHORIZED {
            let detail = response.text().await.unwrap_or_default();
            return Err(SearchBackendError::PermissionDenied(format!(
                "{status}: {detail}"
            )));
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(SearchBackendError::Upstream(format!(
                "unexpected status {status}: {detail}"
            )));
        }

        let payload: Value = response.json().await?;
        Ok(parse_neighbors(&payload))
    }

    fn source(&self) -> &str {
        "vertex"
    }
}

/// Pull the first query's neighbor list out of a `findNeighbors` response.
///
/// An empty or oddly shaped response yields an empty candidate list, not
/// an error; partial per-neighbor data is kept as-is for the pipeline to
/// degrade gracefully.
fn parse_neighbors(payload: &Value) -> Vec<RawCandidate> {
    let neighbors = payload
        .get("nearestNeighbors")
        .and_then(Value::as_array)
        .and_then(|groups| groups.first())
        .and_then(|group| group.get("neighbors"))
        .and_then(Value::as_array);

    let Some(neighbors) = neighbors else {
        tracing::warn!("index response contained no nearestNeighbors group");
        return Vec::new();
    };

    neighbors.iter().map(parse_neighbor).collect()
}

fn parse_neighbor(raw: &Value) -> RawCandidate {
    let datapoint = raw.get("datapoint");

    let id = datapoint
        .and_then(|dp| dp.get("datapointId"))
        .or_else(|| raw.get("datapointId"))
        .or_else(|| raw.get("id"))
        .and_then(Value::as_str)
        .map(str::to_string);

    let distance = raw.get("distance").and_then(Value::as_f64);

    let metadata = datapoint
        .and_then(|dp| dp.get("embeddingMetadata").or_else(|| dp.get("metadata")))
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    RawCandidate {
        id,
        distance,
        metadata,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_datapoint_response() {
        let payload = json!({
            "nearestNeighbors": [{
                "id": "0",
                "neighbors": [
                    {
                        "distance": 0.12,
                        "datapoint": {
                            "datapointId": "item-1",
                            "embeddingMetadata": {"color": "black", "gcs_uri": "gs://b/1.jpg"}
                        }
                    },
                    {
                        "distance": 0.3,
                        "datapoint": {"datapointId": "item-2"}
                    }
                ]
            }]
        });

        let candidates = parse_neighbors(&payload);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].id.as_deref(), Some("item-1"));
        assert_eq!(candidates[0].distance, Some(0.12));
        assert_eq!(
            candidates[0].metadata.get("color"),
            Some(&json!("black"))
        );
        assert_eq!(candidates[1].id.as_deref(), Some("item-2"));
        assert!(candidates[1].metadata.is_empty());
    }

    #[test]
    fn falls_back_to_top_level_id_fields() {
        let payload = json!({
            "nearestNeighbors": [{
                "neighbors": [
                    {"datapointId": "flat-id", "distance": 0.5},
                    {"id": "legacy-id"}
                ]
            }]
        });

        let candidates = parse_neighbors(&payload);
        assert_eq!(candidates[0].id.as_deref(), Some("flat-id"));
        assert_eq!(candidates[1].id.as_deref(), Some("legacy-id"));
        assert_eq!(candidates[1].distance, None);
    }

    #[test]
    fn missing_neighbor_group_yields_empty_list() {
        assert!(parse_neighbors(&json!({})).is_empty());
        assert!(parse_neighbors(&json!({"nearestNeighbors": []})).is_empty());
    }

    #[test]
    fn neighbor_without_id_is_kept_for_pipeline_to_drop() {
        let payload = json!({
            "nearestNeighbors": [{"neighbors": [{"distance": 0.1}]}]
        });

        let candidates = parse_neighbors(&payload);
        assert_eq!(candidates.len(), 1);
        assert!(candidates[0].id.is_none());
    }
}
