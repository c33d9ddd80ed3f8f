//! ImageFactoryClient trait for mocking
//!
//! This trait abstracts the ImageFactoryClient to enable mocking in unit tests.
//! The concrete ImageFactoryClient implements this trait, and tests can use mock implementations.

use crate::error::ImageFactoryError;
use crate::models::Schematic;

/// Trait for Image Factory API client operations
///
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait ImageFactoryClientTrait: Send + Sync {
    /// Get the base URL
    fn base_url(&self) -> &str;

    /// Create (or look up) a schematic and return its content-derived ID
    async fn create_schematic(&self, schematic: &Schematic) -> Result<String, ImageFactoryError>;
}
