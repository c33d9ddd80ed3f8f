//! Image Factory data models
//!
//! Typed shapes for the schematic document accepted by `POST /schematics`
//! and its response. Field names follow the factory's camelCase YAML.

use serde::{Deserialize, Serialize};

/// Schematic document describing a customized Talos image
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schematic {
    pub customization: Customization,
}

/// Image customization section of a schematic
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customization {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_kernel_args: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub meta: Vec<MetaValue>,

    #[serde(default, skip_serializing_if = "SystemExtensions::is_empty")]
    pub system_extensions: SystemExtensions,
}

/// Initial META partition value baked into the image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaValue {
    pub key: u8,
    pub value: String,
}

/// System extensions to include in the image
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemExtensions {
    #[serde(default)]
    pub official_extensions: Vec<String>,
}

impl SystemExtensions {
    /// Returns true when no extensions are requested
    pub fn is_empty(&self) -> bool {
        self.official_extensions.is_empty()
    }
}

/// Response from `POST /schematics`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchematicResponse {
    pub id: String,
}

/// Architecture of a boot artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Arch {
    #[default]
    Amd64,
    Arm64,
}

impl Arch {
    pub fn as_str(self) -> &'static str {
        match self {
            Arch::Amd64 => "amd64",
            Arch::Arm64 => "arm64",
        }
    }
}

/// PXE boot artifact kinds served under `/image/<id>/v<version>/`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootArtifact {
    Kernel,
    Initramfs,
}

impl BootArtifact {
    /// File name of the artifact on the factory (e.g. `initramfs-amd64.xz`)
    pub fn file_name(self, arch: Arch) -> String {
        match self {
            BootArtifact::Kernel => format!("kernel-{}", arch.as_str()),
            BootArtifact::Initramfs => format!("initramfs-{}.xz", arch.as_str()),
        }
    }
}
