//! Talos Image Factory Client
//!
//! A Rust client library for the Talos Image Factory REST API.
//! Creates schematics (content-addressed image customizations) and builds the
//! download URLs of the PXE boot artifacts produced for them.
//!
//! # Example
//!
//! ```no_run
//! use image_factory_client::{ImageFactoryClient, Schematic, DEFAULT_BASE_URL};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ImageFactoryClient::new(DEFAULT_BASE_URL.to_string())?;
//!
//! // An empty customization yields the vanilla schematic
//! let id = client.create_schematic(&Schematic::default()).await?;
//! println!("schematic: {}", id);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod models;
#[path = "trait.rs"]
pub mod factory_trait;
#[cfg(feature = "test-util")]
pub mod mock;

pub use client::{artifact_url, ImageFactoryClient, DEFAULT_BASE_URL};
pub use error::ImageFactoryError;
pub use models::*;
pub use factory_trait::ImageFactoryClientTrait;
#[cfg(feature = "test-util")]
pub use mock::MockImageFactoryClient;
