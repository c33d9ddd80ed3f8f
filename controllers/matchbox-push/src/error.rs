//! Service-specific error types.
//!
//! Maps push failures onto HTTP responses for the cases that can be decided
//! before the progress stream starts.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use matchbox_push::{ConfigError, PushError};
use thiserror::Error;

/// Errors that can occur in the push service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// Image Factory client could not be built
    #[error("Image Factory error: {0}")]
    ImageFactory(#[from] image_factory_client::ImageFactoryError),

    /// Push failed
    #[error("Push failed: {0}")]
    Push(#[from] PushError),

    /// The push task panicked or was cancelled
    #[error("Push task failed: {0}")]
    Task(String),
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServiceError::Push(PushError::Disabled) => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::Push(PushError::Unauthorized(_)) => StatusCode::FORBIDDEN,
            ServiceError::Push(PushError::InvalidRequest(_)) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
