//! Request-level error taxonomy.
//!
//! Everything a route handler can fail with maps onto one of three cases:
//! missing request data, a rejected webhook signature, or a failed store
//! operation. Reporting failures never appear here — the reporter logs and
//! swallows its own errors.

use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Required request data is missing or malformed — answered with 400.
    #[error("{0}")]
    Validation(String),
    /// Webhook authenticity check failed — answered with 400, no store mutation.
    #[error("{0}")]
    Signature(String),
    /// A relational-store operation failed — answered with 500.
    #[error("{0}")]
    Store(String),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn signature(msg: impl Into<String>) -> Self {
        Self::Signature(msg.into())
    }

    pub fn store(err: anyhow::Error) -> Self {
        Self::Store(format!("{err:#}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_) | ApiError::Signature(_) => StatusCode::BAD_REQUEST,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
