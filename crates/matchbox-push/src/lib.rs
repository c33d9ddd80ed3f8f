//! Push-to-Matchbox
//!
//! Provisions Talos nodes for PXE boot through a [Matchbox] data directory:
//! creates a schematic, downloads its kernel and initramfs from the Image
//! Factory, writes one boot profile per node role, and optionally repoints
//! existing groups at the new profiles.
//!
//! ```text
//! assets/talos/kernel-<schematic>            (0755)
//! assets/talos/initramfs-<schematic>.xz
//! profiles/talos-controlplane-<id8>.json
//! profiles/talos-worker-<id8>.json
//! groups/*.json                              (only `profile` rewritten)
//! ```
//!
//! [Matchbox]: https://matchbox.psdn.io
//!
//! # Example
//!
//! ```ignore
//! use matchbox_push::{MatchboxConfig, MatchboxPusher, ProgressReporter, ArtifactFetcher};
//!
//! let pusher = MatchboxPusher::new(MatchboxConfig::from_env()?, resolver, authorizer, ArtifactFetcher::new()?);
//! let (reporter, mut events) = ProgressReporter::channel(32);
//! tokio::spawn(async move {
//!     while let Some(event) = events.recv().await {
//!         println!("{:>3}% {}", event.percentage, event.message);
//!     }
//! });
//! pusher.push(&caller, &request, &reporter).await?;
//! ```

pub mod config;
pub mod error;
pub mod fetcher;
pub mod group;
pub mod kernel_args;
pub mod profile;
pub mod progress;
pub mod pusher;
pub mod schematic;

pub use config::MatchboxConfig;
pub use error::*;
pub use fetcher::{ArtifactFetcher, DownloadTarget};
pub use group::{GroupDocument, GroupOutcome, GroupRewriter, GroupUpdate, SkipReason};
pub use kernel_args::{KernelArgList, FIXED_KERNEL_ARGS};
pub use profile::{BootProfile, ProfileWriter, WrittenProfile};
pub use progress::{ProgressEvent, ProgressReporter, ProgressWindow, DEFAULT_PROGRESS_BUFFER};
pub use pusher::{MatchboxPusher, PushOutcome};
pub use schematic::*;
