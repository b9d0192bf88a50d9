//! Request-boundary errors and their client-visible rendering.
//!
//! Every handler returns `Result<_, ApiError>`; nothing raised while serving
//! a request escapes past this point or stops the process.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::error::AdapterError;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or incomplete payload.
    #[error("{0}")]
    Validation(String),

    /// The classifier could not produce a prediction.
    #[error("{0}")]
    Adapter(#[from] AdapterError),

    #[error("request timed out")]
    Timeout,

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Adapter(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation",
            ApiError::Adapter(_) => "classifier",
            ApiError::Timeout => "timeout",
            ApiError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({ "error": self.code(), "message": self.to_string() });
        (self.status(), Json(body)).into_response()
    }
}
