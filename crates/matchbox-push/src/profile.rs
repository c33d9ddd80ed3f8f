//! Matchbox boot profiles.
//!
//! One profile per [`Role`] per push. The profile ID is derived from the role
//! and the schematic ID, so re-pushing a schematic overwrites the same files.

use crate::error::ProfileWriteError;
use crate::kernel_args::KernelArgList;
use crate::schematic::{Role, SchematicRef};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Matchbox profile document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootProfile {
    pub id: String,
    pub name: String,
    pub boot: BootSection,
}

/// `boot` section of a profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootSection {
    pub kernel: String,
    pub initrd: Vec<String>,
    pub args: KernelArgList,
}

/// `talos-<role>-<first 8 chars of schematic id>`
pub fn profile_id(role: Role, schematic: &SchematicRef) -> String {
    format!("talos-{}-{}", role.as_str(), schematic.short_id())
}

impl BootProfile {
    /// Render the profile for `role`.
    ///
    /// `assets_http_prefix` is where Matchbox serves the assets directory
    /// (`/assets/talos` by default).
    pub fn render(
        role: Role,
        schematic: &SchematicRef,
        kernel_args: KernelArgList,
        assets_http_prefix: &str,
    ) -> Self {
        let prefix = assets_http_prefix.trim_end_matches('/');
        Self {
            id: profile_id(role, schematic),
            name: format!(
                "Talos {} {} (schematic {})",
                role.title(),
                schematic.talos_version(),
                schematic.short_id()
            ),
            boot: BootSection {
                kernel: format!("{}/{}", prefix, schematic.kernel_file_name()),
                initrd: vec![format!("{}/{}", prefix, schematic.initramfs_file_name())],
                args: kernel_args,
            },
        }
    }

    /// `<profiles_dir>/<id>.json`
    pub fn path_in(&self, profiles_dir: &Path) -> PathBuf {
        profiles_dir.join(format!("{}.json", self.id))
    }
}

/// A profile that has been written to disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenProfile {
    pub role: Role,
    pub id: String,
    pub path: PathBuf,
}

/// Writes boot profiles into a Matchbox profiles directory
#[derive(Debug, Clone)]
pub struct ProfileWriter {
    profiles_dir: PathBuf,
    assets_http_prefix: String,
}

impl ProfileWriter {
    pub fn new(profiles_dir: impl Into<PathBuf>, assets_http_prefix: impl Into<String>) -> Self {
        Self {
            profiles_dir: profiles_dir.into(),
            assets_http_prefix: assets_http_prefix.into(),
        }
    }

    /// Create the profiles directory if needed
    pub async fn prepare(&self) -> Result<(), ProfileWriteError> {
        tokio::fs::create_dir_all(&self.profiles_dir)
            .await
            .map_err(|source| ProfileWriteError::CreateDir {
                path: self.profiles_dir.clone(),
                source,
            })
    }

    /// Render and write the profile for one role as indented JSON
    pub async fn write(
        &self,
        schematic: &SchematicRef,
        role: Role,
        kernel_args: KernelArgList,
    ) -> Result<WrittenProfile, ProfileWriteError> {
        let profile = BootProfile::render(role, schematic, kernel_args, &self.assets_http_prefix);
        let path = profile.path_in(&self.profiles_dir);
        let json = serde_json::to_vec_pretty(&profile)?;

        tokio::fs::write(&path, json)
            .await
            .map_err(|source| ProfileWriteError::Write {
                path: path.clone(),
                source,
            })?;

        info!("Created matchbox profile {} for role {} at {}", profile.id, role, path.display());

        Ok(WrittenProfile {
            role,
            id: profile.id,
            path,
        })
    }

    /// Write a profile for every role in [`Role::ALL`], stopping at the first failure.
    ///
    /// Profiles written before a failure stay on disk.
    pub async fn write_all(
        &self,
        schematic: &SchematicRef,
        kernel_args: &KernelArgList,
    ) -> Result<Vec<WrittenProfile>, ProfileWriteError> {
        self.prepare().await?;

        let mut written = Vec::with_capacity(Role::ALL.len());
        for role in Role::ALL {
            written.push(self.write(schematic, role, kernel_args.clone()).await?);
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn schematic() -> SchematicRef {
        SchematicRef::new("abcdef1234567890", "1.9.0").unwrap()
    }

    fn args(schematic: &SchematicRef) -> KernelArgList {
        KernelArgList::for_pxe(&schematic.initramfs_file_name(), &["console=ttyS0"])
    }

    #[test]
    fn test_render_profile() {
        let schematic = schematic();
        let profile = BootProfile::render(Role::ControlPlane, &schematic, args(&schematic), "/assets/talos/");

        assert_eq!(profile.id, "talos-controlplane-abcdef12");
        assert_eq!(profile.name, "Talos Controlplane 1.9.0 (schematic abcdef12)");
        assert_eq!(profile.boot.kernel, "/assets/talos/kernel-abcdef1234567890");
        assert_eq!(profile.boot.initrd, vec!["/assets/talos/initramfs-abcdef1234567890.xz"]);
        assert_eq!(profile.boot.args.as_slice()[0], "initrd=initramfs-abcdef1234567890.xz");
    }

    #[test]
    fn test_profile_json_shape() {
        let schematic = schematic();
        let profile = BootProfile::render(Role::Worker, &schematic, args(&schematic), "/assets/talos");
        let value = serde_json::to_value(&profile).unwrap();

        assert_eq!(value["id"], "talos-worker-abcdef12");
        assert_eq!(value["name"], "Talos Worker 1.9.0 (schematic abcdef12)");
        assert!(value["boot"]["args"].is_array());
        assert_eq!(value["boot"]["initrd"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_write_all_creates_one_file_per_role() {
        let dir = TempDir::new().unwrap();
        let profiles_dir = dir.path().join("profiles");
        let writer = ProfileWriter::new(&profiles_dir, "/assets/talos");
        let schematic = schematic();

        let written = writer.write_all(&schematic, &args(&schematic)).await.unwrap();

        let ids: Vec<&str> = written.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["talos-controlplane-abcdef12", "talos-worker-abcdef12"]);
        for profile in &written {
            let content = std::fs::read_to_string(&profile.path).unwrap();
            // Indented output
            assert!(content.contains("\n  \"boot\""));
            let parsed: BootProfile = serde_json::from_str(&content).unwrap();
            assert_eq!(parsed.id, profile.id);
        }
    }

    #[tokio::test]
    async fn test_rewrite_is_idempotent_by_name() {
        let dir = TempDir::new().unwrap();
        let writer = ProfileWriter::new(dir.path(), "/assets/talos");
        let schematic = schematic();

        let first = writer.write_all(&schematic, &args(&schematic)).await.unwrap();
        let first_doc: BootProfile =
            serde_json::from_str(&std::fs::read_to_string(&first[0].path).unwrap()).unwrap();

        let changed = KernelArgList::for_pxe(&schematic.initramfs_file_name(), &["console=ttyS1"]);
        let second = writer.write_all(&schematic, &changed).await.unwrap();
        let second_doc: BootProfile =
            serde_json::from_str(&std::fs::read_to_string(&second[0].path).unwrap()).unwrap();

        assert_eq!(first, second);
        assert_eq!(first_doc.id, second_doc.id);
        assert_eq!(first_doc.name, second_doc.name);
        assert_eq!(first_doc.boot.kernel, second_doc.boot.kernel);
        assert_eq!(first_doc.boot.initrd, second_doc.boot.initrd);
        assert_ne!(first_doc.boot.args, second_doc.boot.args);
    }

    #[tokio::test]
    async fn test_prepare_fails_when_path_is_a_file() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("profiles");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let writer = ProfileWriter::new(&blocker, "/assets/talos");
        let schematic = schematic();
        let err = writer.write_all(&schematic, &args(&schematic)).await.unwrap_err();
        assert!(matches!(err, ProfileWriteError::CreateDir { .. }));
    }
}
