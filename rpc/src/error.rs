//! RPC error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("missing action")]
    MissingAction,

    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("metrics error: {0}")]
    Metrics(String),

    #[error("server error: {0}")]
    Server(String),
}

impl RpcError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingAction | Self::UnknownAction(_) | Self::InvalidRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Metrics(_) | Self::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<powrace_coordinator::CoordinatorError> for RpcError {
    fn from(e: powrace_coordinator::CoordinatorError) -> Self {
        RpcError::Metrics(e.to_string())
    }
}

impl IntoResponse for RpcError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
