//! Matchbox Push Service
//!
//! Serves `POST /v1/matchbox/push`: creates a Talos schematic on the Image
//! Factory, mirrors its kernel and initramfs into the Matchbox assets
//! directory, writes controlplane and worker boot profiles, and repoints
//! existing groups at them. Progress is streamed back as NDJSON.

mod auth;
mod config;
mod error;
mod resolver;
mod server;

use crate::auth::TokenAuthorizer;
use crate::config::ServiceConfig;
use crate::error::ServiceError;
use crate::resolver::FactorySchematicResolver;
use anyhow::Context;
use image_factory_client::ImageFactoryClient;
use matchbox_push::{ArtifactFetcher, MatchboxPusher};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    info!("Starting Matchbox Push Service");

    let config = ServiceConfig::from_env().map_err(ServiceError::from)?;

    info!("Configuration:");
    info!("  Listen: {}", config.listen);
    info!("  Enabled: {}", config.matchbox.enabled);
    info!("  Update groups: {}", config.matchbox.update_groups);
    info!("  Assets: {}", config.matchbox.assets_path.display());
    info!("  Profiles: {}", config.matchbox.profiles_path.display());
    info!("  Groups: {}", config.matchbox.groups_path.display());
    info!("  Image Factory: {}", config.matchbox.image_factory_base_url);
    info!("  Operator tokens: {}", config.operator_tokens.len());
    info!(
        "  Siderolink API: {}",
        config.siderolink_api_url.as_deref().unwrap_or("not configured")
    );

    let factory = ImageFactoryClient::new(config.matchbox.image_factory_base_url.clone())
        .map_err(ServiceError::from)?;
    let resolver = FactorySchematicResolver::new(
        Arc::new(factory),
        config.base_kernel_args.clone(),
        config.siderolink_api_url.clone(),
    );
    let fetcher = ArtifactFetcher::new().context("failed to build artifact fetcher")?;
    let pusher = MatchboxPusher::new(
        config.matchbox.clone(),
        Arc::new(resolver),
        Arc::new(TokenAuthorizer::new(config.operator_tokens.clone())),
        fetcher,
    );

    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("failed to bind {}", config.listen))?;
    info!("Listening on {}", config.listen);

    axum::serve(listener, server::router(server::AppState::new(pusher)))
        .await
        .context("server error")?;

    Ok(())
}
