use std::sync::Arc;

use crate::config::AppConfig;
use crate::search::client::{NeighborSearch, VertexMatchClient};

/// Shared application state
///
/// The index client is the only process-wide shared resource: built once
/// here, immutable afterwards, and holding no per-query state.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration
    pub config: Arc<AppConfig>,

    /// Index backend handle (shared across requests)
    pub search: Arc<dyn NeighborSearch>,
}

impl AppState {
    /// Create state with the real index backend. Fails fast on bad
    /// configuration.
    pub fn new(config: AppConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let search = Arc::new(VertexMatchClient::new(&config)?);
        Ok(Self {
            config: Arc::new(config),
            search,
        })
    }

    /// Create state around an explicit backend; used by tests and any
    /// embedding callers.
    pub fn with_client(config: AppConfig, search: Arc<dyn NeighborSearch>) -> Self {
        Self {
            config: Arc::new(config),
            search,
        }
    }
}
