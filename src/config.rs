use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Application configuration, assembled once at startup.
///
/// Values come from an optional `simproxy.*` config file overridden by
/// `SIMPROXY_*` environment variables. Missing required upstream identity
/// fails process startup rather than the first query.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server bind address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Enable permissive CORS (the browser callers are on other origins)
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Log level / env-filter directive
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Hostname of the index backend's regional API endpoint
    #[serde(default = "default_api_endpoint")]
    pub api_endpoint: String,

    /// Full resource name of the index endpoint (required)
    #[serde(default)]
    pub index_endpoint: String,

    /// Deployed index id on that endpoint (required)
    #[serde(default)]
    pub deployed_index_id: String,

    /// Bearer token for the backend call, if the environment does not
    /// provide ambient credentials
    #[serde(default)]
    pub auth_token: Option<String>,

    /// Bound on the upstream call so a hung backend cannot hold a request
    #[serde(default = "default_upstream_timeout_secs")]
    pub upstream_timeout_secs: u64,

    /// Expected query vector dimension
    #[serde(default = "default_expected_dimensions")]
    pub expected_dimensions: usize,

    /// Hard cap on the per-query neighbor count
    #[serde(default = "default_max_neighbors")]
    pub max_neighbors: u32,

    /// Neighbor count used when the request does not specify one
    #[serde(default = "default_neighbor_count")]
    pub default_neighbor_count: u32,

    /// Candidates scoring below this are filtered out
    #[serde(default)]
    pub similarity_threshold: f64,

    /// Ask the backend for full datapoint records (metadata included)
    #[serde(default = "default_true")]
    pub return_full_datapoint: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            enable_cors: default_true(),
            log_level: default_log_level(),
            api_endpoint: default_api_endpoint(),
            index_endpoint: String::new(),
            deployed_index_id: String::new(),
            auth_token: None,
            upstream_timeout_secs: default_upstream_timeout_secs(),
            expected_dimensions: default_expected_dimensions(),
            max_neighbors: default_max_neighbors(),
            default_neighbor_count: default_neighbor_count(),
            similarity_threshold: 0.0,
            return_full_datapoint: default_true(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the optional config file and environment.
    pub fn load() -> anyhow::Result<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("simproxy").required(false))
            .add_source(config::Environment::with_prefix("SIMPROXY").separator("__"));

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot serve a single query.
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            !self.index_endpoint.trim().is_empty(),
            "index_endpoint is required (SIMPROXY_INDEX_ENDPOINT)"
        );
        anyhow::ensure!(
            !self.deployed_index_id.trim().is_empty(),
            "deployed_index_id is required (SIMPROXY_DEPLOYED_INDEX_ID)"
        );
        anyhow::ensure!(
            self.expected_dimensions > 0,
            "expected_dimensions must be positive"
        );
        anyhow::ensure!(self.max_neighbors >= 1, "max_neighbors must be at least 1");
        anyhow::ensure!(
            self.default_neighbor_count >= 1,
            "default_neighbor_count must be at least 1"
        );
        anyhow::ensure!(
            self.similarity_threshold >= 0.0 && self.similarity_threshold.is_finite(),
            "similarity_threshold must be a non-negative number"
        );
        Ok(())
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.bind_addr, self.port);
        Ok(addr_str.parse()?)
    }

    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_api_endpoint() -> String {
    "us-east1-aiplatform.googleapis.com".to_string()
}

fn default_upstream_timeout_secs() -> u64 {
    10
}

fn default_expected_dimensions() -> usize {
    1408
}

fn default_max_neighbors() -> u32 {
    20
}

fn default_neighbor_count() -> u32 {
    10
}
