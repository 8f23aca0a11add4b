use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use uuid::Uuid;

use crate::search::client::SearchBackendError;
use crate::search::validate::ValidationError;

pub type ServerResult<T> = Result<T, ServerError>;

/// Server error types
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Permission denied by the vector index backend")]
    UpstreamPermission(String),

    #[error("{message}")]
    Upstream { message: String, detail: String },

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found")]
    NotFound,
}

impl ServerError {
    /// Get HTTP status code for this error
    fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Validation(_) | ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::UpstreamPermission(_) => StatusCode::FORBIDDEN,
            ServerError::NotFound => StatusCode::NOT_FOUND,
            ServerError::Upstream { .. } | ServerError::Internal(_) | ServerError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to show to callers.
    fn public_message(&self) -> String {
        match self {
            ServerError::Validation(err) => err.to_string(),
            ServerError::BadRequest(msg) => msg.clone(),
            ServerError::UpstreamPermission(_) => {
                "Permission denied by the vector index backend. Verify IAM bindings for the \
                 service account."
                    .to_string()
            }
            ServerError::Upstream { message, .. } => message.clone(),
            ServerError::Internal(_) => "Internal server error".to_string(),
            ServerError::Config(msg) => format!("Configuration error: {msg}"),
            ServerError::NotFound => "Not found".to_string(),
        }
    }

    /// Extra detail exposed alongside 5xx responses. Kept to the error's
    /// display string; full chains go to the log under the request id.
    fn detail(&self) -> Option<String> {
        match self {
            ServerError::Upstream { detail, .. } => Some(detail.clone()),
            ServerError::Internal(msg) => Some(msg.clone()),
            _ => None,
        }
    }

    /// Build the error response carrying the query's correlation id.
    pub fn into_response_with_id(self, request_id: &str) -> Response {
        let status = self.status_code();
        let mut body = json!({
            "error": self.public_message(),
            "requestId": request_id,
        });
        if let Some(detail) = self.detail() {
            body["detail"] = json!(detail);
        }
        (status, Json(body)).into_response()
    }
}

impl From<SearchBackendError> for ServerError {
    fn from(err: SearchBackendError) -> Self {
        match err {
            SearchBackendError::PermissionDenied(detail) => ServerError::UpstreamPermission(detail),
            SearchBackendError::Upstream(detail) => ServerError::Upstream {
                message: "Vector index query failed".to_string(),
                detail,
            },
            SearchBackendError::Transport(err) => ServerError::Upstream {
                message: "Vector index backend unreachable".to_string(),
                detail: err.to_string(),
            },
        }
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        ServerError::Internal(err.to_string())
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        // Fallback path without a handler-generated id; every response
        // still carries a correlation id.
        let request_id = Uuid::new_v4().to_string();
        self.into_response_with_id(&request_id)
    }
}
