//! simproxy - similarity search proxy for a managed vector index
//!
//! This crate exposes nearest-neighbor product search over HTTP. The
//! actual vector search is delegated to an external managed index; the
//! value here is the post-processing pipeline that runs once per query:
//!
//! - **Validation**: vector well-formedness and neighbor-count clamping
//! - **Similarity normalization**: raw distances become bounded `[0, 1]` scores
//! - **Metadata extraction**: canonical fields out of loosely-typed records
//! - **Re-ranking**: a color-affinity penalty from the caller's hint
//! - **Filtering and assembly**: threshold, stable descending sort, and an
//!   auditable response envelope with counts and a correlation id
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use simproxy::AppConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AppConfig::load()?;
//!     simproxy::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! - `GET /` - API information
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe
//! - `POST /api/v1/search` - Similarity query (also served at `POST /`)

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod search;
pub mod server;
pub mod state;

pub use config::AppConfig;
pub use error::{ServerError, ServerResult};
pub use server::{router, start_server};
pub use state::AppState;
