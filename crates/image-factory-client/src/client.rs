//! Image Factory API client
//!
//! Implements the subset of the Talos Image Factory REST API needed for PXE
//! provisioning: schematic creation (`POST /schematics`) and the URL layout of
//! boot artifacts (`/image/<schematic>/v<version>/<artifact>`).

use crate::error::ImageFactoryError;
use crate::models::{Arch, BootArtifact, Schematic, SchematicResponse};
use crate::factory_trait::ImageFactoryClientTrait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Public Image Factory endpoint used when no base URL is configured
pub const DEFAULT_BASE_URL: &str = "https://factory.talos.dev";

/// Image Factory API client
#[derive(Debug, Clone)]
pub struct ImageFactoryClient {
    client: Client,
    base_url: String,
}

impl ImageFactoryClient {
    /// Create a new Image Factory client
    ///
    /// # Arguments
    /// * `base_url` - Factory base URL (e.g., "https://factory.talos.dev")
    pub fn new(base_url: String) -> Result<Self, ImageFactoryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(ImageFactoryError::Http)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Create a schematic and return its ID
    ///
    /// The factory derives the ID from the document content, so posting the
    /// same schematic twice returns the same ID.
    ///
    /// # Returns
    /// * `Ok(String)` - The schematic ID
    /// * `Err(ImageFactoryError)` - If the request fails or the factory rejects the schematic
    pub async fn create_schematic(&self, schematic: &Schematic) -> Result<String, ImageFactoryError> {
        let url = format!("{}/schematics", self.base_url);
        let body = serde_yaml::to_string(schematic)?;
        debug!("POST {} ({} bytes)", url, body.len());

        let response = self.client
            .post(&url)
            .header("Content-Type", "application/yaml")
            .header("Accept", "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ImageFactoryError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let response_text = response.text().await?;
        let created: SchematicResponse = serde_json::from_str(&response_text)?;
        if created.id.is_empty() {
            return Err(ImageFactoryError::InvalidResponse(
                "schematic response carried an empty id".to_string(),
            ));
        }

        debug!("Schematic created: {}", created.id);
        Ok(created.id)
    }
}

#[async_trait::async_trait]
impl ImageFactoryClientTrait for ImageFactoryClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn create_schematic(&self, schematic: &Schematic) -> Result<String, ImageFactoryError> {
        ImageFactoryClient::create_schematic(self, schematic).await
    }
}

/// Build the download URL of a PXE boot artifact
///
/// `talos_version` is the bare semantic version; the `v` prefix is added here.
pub fn artifact_url(
    base_url: &str,
    schematic_id: &str,
    talos_version: &str,
    artifact: BootArtifact,
    arch: Arch,
) -> String {
    format!(
        "{}/image/{}/v{}/{}",
        base_url.trim_end_matches('/'),
        schematic_id,
        talos_version,
        artifact.file_name(arch)
    )
}
