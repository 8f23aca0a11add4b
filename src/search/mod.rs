//! Similarity search pipeline: validation, the upstream index client, and
//! the per-query post-processing that turns raw neighbors into a ranked
//! result set.

pub mod client;
pub mod metadata;
pub mod pipeline;
pub mod rerank;
pub mod similarity;
pub mod types;
pub mod validate;

pub use client::{NeighborSearch, SearchBackendError, VertexMatchClient};
pub use pipeline::{PipelineOutcome, PipelineSettings};
pub use types::{
    CandidateMetadata, ColorInfo, NormalizedMetadata, QueryOptions, RawCandidate, ScoredCandidate,
    SearchResponse,
};
pub use validate::ValidationError;
