//! Mock ImageFactoryClient for unit testing
//!
//! This module provides a mock implementation of ImageFactoryClientTrait that can be used
//! in unit tests without requiring network access to an Image Factory.

use crate::error::ImageFactoryError;
use crate::factory_trait::ImageFactoryClientTrait;
use crate::models::Schematic;
use std::sync::{Arc, Mutex};

/// Mock ImageFactoryClient for testing
///
/// Returns a fixed schematic ID (or a configured failure) and records every
/// schematic it was asked to create.
#[derive(Debug, Clone)]
pub struct MockImageFactoryClient {
    base_url: String,
    schematic_id: String,
    failure: Option<(u16, String)>,
    created: Arc<Mutex<Vec<Schematic>>>,
}

impl MockImageFactoryClient {
    /// Create a new mock client that answers every request with `schematic_id`
    pub fn new(base_url: impl Into<String>, schematic_id: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            schematic_id: schematic_id.into(),
            failure: None,
            created: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Make every `create_schematic` call fail with the given API status and body
    #[must_use]
    pub fn failing(mut self, status: u16, body: impl Into<String>) -> Self {
        self.failure = Some((status, body.into()));
        self
    }

    /// Schematics received so far (for assertions)
    pub fn created(&self) -> Vec<Schematic> {
        self.created.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ImageFactoryClientTrait for MockImageFactoryClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn create_schematic(&self, schematic: &Schematic) -> Result<String, ImageFactoryError> {
        self.created.lock().unwrap().push(schematic.clone());
        match &self.failure {
            Some((status, body)) => Err(ImageFactoryError::Api {
                status: *status,
                body: body.clone(),
            }),
            None => Ok(self.schematic_id.clone()),
        }
    }
}
