//! Image Factory client errors

use thiserror::Error;

/// Errors that can occur when interacting with the Image Factory API
#[derive(Debug, Error)]
pub enum ImageFactoryError {
    /// HTTP request/response error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Image Factory returned a non-success status
    #[error("Image Factory API error: {status} - {body}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body, kept for diagnostics
        body: String,
    },

    /// JSON deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML serialization error (schematic documents are posted as YAML)
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The response was well-formed but not usable
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}
