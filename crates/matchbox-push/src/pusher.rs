//! Push orchestration.
//!
//! Sequence for one push:
//! 1. Feature flag and authorization (no side effects on rejection)
//! 2. Schematic creation (10%) and base kernel args (20%)
//! 3. Kernel download (30% -> 50%), marked executable
//! 4. Initramfs download (50% -> 90%)
//! 5. Profiles for every role (90%)
//! 6. Optional best-effort group rewrite
//! 7. Completion event (100%)
//!
//! Any failure up to and including step 5 aborts the push without a
//! completion event. Step 6 never fails the push.

use crate::config::MatchboxConfig;
use crate::error::PushError;
use crate::fetcher::{ensure_dir, mark_executable, ArtifactFetcher, DownloadTarget};
use crate::group::{GroupOutcome, GroupRewriter};
use crate::kernel_args::KernelArgList;
use crate::profile::{ProfileWriter, WrittenProfile};
use crate::progress::{ProgressReporter, ProgressWindow};
use crate::schematic::{AuthDecision, Authorizer, Caller, PushRequest, SchematicRef, SchematicResolver};
use image_factory_client::{artifact_url, Arch, BootArtifact};
use std::sync::Arc;
use tracing::{info, warn};

const KERNEL_WINDOW: (u8, u8) = (30, 50);
const INITRAMFS_WINDOW: (u8, u8) = (50, 90);

/// Result of a successful push
#[derive(Debug)]
pub struct PushOutcome {
    pub schematic: SchematicRef,
    pub kernel_args: KernelArgList,
    pub profiles: Vec<WrittenProfile>,
    /// Empty when group updates are disabled or the groups directory was unreadable
    pub groups: Vec<GroupOutcome>,
}

/// Pushes schematics into Matchbox
pub struct MatchboxPusher {
    config: MatchboxConfig,
    resolver: Arc<dyn SchematicResolver>,
    authorizer: Arc<dyn Authorizer>,
    fetcher: ArtifactFetcher,
}

impl std::fmt::Debug for MatchboxPusher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchboxPusher")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl MatchboxPusher {
    /// Creates a new pusher
    pub fn new(
        config: MatchboxConfig,
        resolver: Arc<dyn SchematicResolver>,
        authorizer: Arc<dyn Authorizer>,
        fetcher: ArtifactFetcher,
    ) -> Self {
        Self {
            config,
            resolver,
            authorizer,
            fetcher,
        }
    }

    pub fn config(&self) -> &MatchboxConfig {
        &self.config
    }

    /// Feature flag and role check, with no side effects.
    ///
    /// [`push`](Self::push) runs this itself; callers that need to reject a
    /// request before opening a progress stream can call it first.
    pub async fn preflight(&self, caller: &Caller) -> Result<(), PushError> {
        if !self.config.enabled {
            return Err(PushError::Disabled);
        }
        match self.authorizer.authorize(caller).await {
            AuthDecision::Allow => Ok(()),
            AuthDecision::Deny(reason) => Err(PushError::Unauthorized(reason)),
        }
    }

    /// Run a full push, reporting progress to `progress`
    pub async fn push(
        &self,
        caller: &Caller,
        request: &PushRequest,
        progress: &ProgressReporter,
    ) -> Result<PushOutcome, PushError> {
        self.preflight(caller).await?;

        if request.talos_version.trim().is_empty() {
            return Err(PushError::InvalidRequest("talosVersion is required".to_string()));
        }

        progress.checkpoint("Creating schematic...", 10).await?;
        let schematic_id = self.resolver.create_schematic(request).await?;
        let schematic = SchematicRef::new(schematic_id, &request.talos_version)?;
        info!("Using schematic {} for Talos {}", schematic.id(), schematic.talos_version());

        progress.checkpoint("Downloading kernel and initramfs...", 20).await?;
        let base_args = self
            .resolver
            .base_kernel_args(request.siderolink_grpc_tunnel_mode, &request.join_token)
            .await?;
        let mut caller_args = base_args;
        caller_args.extend(request.extra_kernel_args.iter().cloned());

        progress.checkpoint("Downloading kernel...", 30).await?;
        ensure_dir(&self.config.assets_path)
            .await
            .map_err(|source| PushError::Fetch { artifact: "kernel", source })?;

        let kernel = self.download_target(&schematic, BootArtifact::Kernel, KERNEL_WINDOW)?;
        self.fetcher
            .fetch(&kernel, progress)
            .await
            .map_err(|source| PushError::Fetch { artifact: "kernel", source })?;
        mark_executable(&kernel.destination)
            .await
            .map_err(|source| PushError::Fetch { artifact: "kernel", source })?;
        info!("Downloaded kernel to {}", kernel.destination.display());

        progress.checkpoint("Downloading initramfs...", 50).await?;
        let initramfs = self.download_target(&schematic, BootArtifact::Initramfs, INITRAMFS_WINDOW)?;
        self.fetcher
            .fetch(&initramfs, progress)
            .await
            .map_err(|source| PushError::Fetch { artifact: "initramfs", source })?;
        info!("Downloaded initramfs to {}", initramfs.destination.display());

        progress.checkpoint("Creating Matchbox profiles...", 90).await?;
        let kernel_args = KernelArgList::for_pxe(&schematic.initramfs_file_name(), &caller_args);
        let writer = ProfileWriter::new(&self.config.profiles_path, &self.config.assets_http_prefix);
        let profiles = writer.write_all(&schematic, &kernel_args).await?;

        let groups = if self.config.update_groups {
            self.rewrite_groups(&schematic).await
        } else {
            Vec::new()
        };

        progress.complete("Successfully pushed to Matchbox").await?;
        info!(
            "Pushed schematic {} to matchbox ({} extra kernel args)",
            schematic.id(),
            caller_args.len()
        );

        Ok(PushOutcome {
            schematic,
            kernel_args,
            profiles,
            groups,
        })
    }

    fn download_target(
        &self,
        schematic: &SchematicRef,
        artifact: BootArtifact,
        (start, end): (u8, u8),
    ) -> Result<DownloadTarget, PushError> {
        let window = ProgressWindow::new(start, end)
            .ok_or_else(|| PushError::InvalidRequest(format!("invalid progress window {}-{}", start, end)))?;
        let file_name = match artifact {
            BootArtifact::Kernel => schematic.kernel_file_name(),
            BootArtifact::Initramfs => schematic.initramfs_file_name(),
        };

        Ok(DownloadTarget {
            url: artifact_url(
                &self.config.image_factory_base_url,
                schematic.id(),
                schematic.talos_version(),
                artifact,
                Arch::Amd64,
            ),
            destination: self.config.assets_path.join(file_name),
            window,
        })
    }

    async fn rewrite_groups(&self, schematic: &SchematicRef) -> Vec<GroupOutcome> {
        match GroupRewriter::new(&self.config.groups_path).rewrite(schematic).await {
            Ok(outcomes) => {
                let failed = outcomes.iter().filter(|o| o.is_failed()).count();
                if failed > 0 {
                    warn!("{} matchbox group(s) could not be updated", failed);
                }
                outcomes
            }
            Err(e) => {
                warn!("Failed to update matchbox groups: {}", e);
                Vec::new()
            }
        }
    }
}

