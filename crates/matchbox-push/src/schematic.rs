//! Push request, schematic reference, and the collaborator seams.
//!
//! Schematic creation and caller authorization live outside this crate; the
//! pusher talks to them through [`SchematicResolver`] and [`Authorizer`].

use crate::error::SchematicError;
use serde::{Deserialize, Serialize};

/// Length of the schematic ID prefix used in profile IDs
pub const SHORT_ID_LEN: usize = 8;

/// Inbound push request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushRequest {
    #[serde(default)]
    pub extensions: Vec<String>,
    #[serde(default)]
    pub extra_kernel_args: Vec<String>,
    #[serde(default)]
    pub meta_values: Vec<MetaValue>,
    pub talos_version: String,
    #[serde(default)]
    pub media_id: String,
    #[serde(default)]
    pub secure_boot: bool,
    #[serde(default)]
    pub siderolink_grpc_tunnel_mode: bool,
    #[serde(default)]
    pub join_token: String,
}

/// META partition key/value requested for the schematic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaValue {
    pub key: u8,
    pub value: String,
}

/// A created schematic and the Talos version it is pushed for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchematicRef {
    id: String,
    talos_version: String,
}

impl SchematicRef {
    /// Validates the ID length and strips one leading `v` from the version.
    pub fn new(id: impl Into<String>, talos_version: &str) -> Result<Self, SchematicError> {
        let id = id.into();
        if !id.is_ascii() || id.len() < SHORT_ID_LEN {
            return Err(SchematicError::InvalidId(id));
        }
        Ok(Self {
            id,
            talos_version: talos_version
                .strip_prefix('v')
                .unwrap_or(talos_version)
                .to_string(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// First eight characters of the ID
    pub fn short_id(&self) -> &str {
        &self.id[..SHORT_ID_LEN]
    }

    /// Version without the `v` prefix (e.g. `1.9.0`)
    pub fn talos_version(&self) -> &str {
        &self.talos_version
    }

    /// `kernel-<id>`
    pub fn kernel_file_name(&self) -> String {
        format!("kernel-{}", self.id)
    }

    /// `initramfs-<id>.xz`
    pub fn initramfs_file_name(&self) -> String {
        format!("initramfs-{}.xz", self.id)
    }
}

/// Target node class of a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[serde(rename = "controlplane")]
    ControlPlane,
    Worker,
}

impl Role {
    /// Roles a profile is written for on every push, in write order
    pub const ALL: [Role; 2] = [Role::ControlPlane, Role::Worker];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::ControlPlane => "controlplane",
            Role::Worker => "worker",
        }
    }

    /// Title-cased label for display names
    pub fn title(self) -> &'static str {
        match self {
            Role::ControlPlane => "Controlplane",
            Role::Worker => "Worker",
        }
    }

    /// Guess a group's role from its file name.
    ///
    /// Case-insensitive match on `controlplane` or `control-plane`;
    /// anything else is treated as a worker.
    pub fn from_group_file_name(file_name: &str) -> Self {
        let lower = file_name.to_lowercase();
        if lower.contains("controlplane") || lower.contains("control-plane") {
            Role::ControlPlane
        } else {
            Role::Worker
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Creates or looks up schematics and the base kernel arguments nodes boot with
#[async_trait::async_trait]
pub trait SchematicResolver: Send + Sync {
    /// Create (or reuse) the schematic described by `request`; returns its ID
    async fn create_schematic(&self, request: &PushRequest) -> Result<String, SchematicError>;

    /// Kernel arguments every node needs to join, before caller extras
    async fn base_kernel_args(
        &self,
        tunnel_mode: bool,
        join_token: &str,
    ) -> Result<Vec<String>, SchematicError>;
}

/// Identity presented by the caller
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Caller {
    pub bearer_token: Option<String>,
}

/// Outcome of an authorization check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthDecision {
    Allow,
    Deny(String),
}

/// Decides whether a caller holds the operator role
#[async_trait::async_trait]
pub trait Authorizer: Send + Sync {
    async fn authorize(&self, caller: &Caller) -> AuthDecision;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schematic_ref_names() {
        let schematic = SchematicRef::new("abcdef1234567890", "1.9.0").unwrap();
        assert_eq!(schematic.short_id(), "abcdef12");
        assert_eq!(schematic.kernel_file_name(), "kernel-abcdef1234567890");
        assert_eq!(schematic.initramfs_file_name(), "initramfs-abcdef1234567890.xz");
    }

    #[test]
    fn test_schematic_ref_strips_v_prefix() {
        let schematic = SchematicRef::new("abcdef1234567890", "v1.9.0").unwrap();
        assert_eq!(schematic.talos_version(), "1.9.0");

        // Only a single prefix is removed
        let doubled = SchematicRef::new("abcdef1234567890", "vv1.9.0").unwrap();
        assert_eq!(doubled.talos_version(), "v1.9.0");
    }

    #[test]
    fn test_schematic_ref_rejects_short_id() {
        let err = SchematicRef::new("abc", "1.9.0").unwrap_err();
        assert!(matches!(err, SchematicError::InvalidId(id) if id == "abc"));
    }

    #[test]
    fn test_role_from_group_file_name() {
        assert_eq!(Role::from_group_file_name("controlplane-rack1.json"), Role::ControlPlane);
        assert_eq!(Role::from_group_file_name("Rack1-Control-Plane.json"), Role::ControlPlane);
        assert_eq!(Role::from_group_file_name("CONTROLPLANE.json"), Role::ControlPlane);
        assert_eq!(Role::from_group_file_name("worker-a.json"), Role::Worker);
        // Ambiguous names fall back to worker
        assert_eq!(Role::from_group_file_name("control_plane.json"), Role::Worker);
        assert_eq!(Role::from_group_file_name("default.json"), Role::Worker);
    }

    #[test]
    fn test_push_request_wire_names() {
        let request: PushRequest = serde_json::from_str(
            r#"{
                "talosVersion": "1.9.0",
                "extraKernelArgs": ["console=ttyS0"],
                "metaValues": [{"key": 10, "value": "rack-a"}],
                "siderolinkGrpcTunnelMode": true,
                "joinToken": "secret"
            }"#,
        )
        .unwrap();
        assert_eq!(request.talos_version, "1.9.0");
        assert_eq!(request.extra_kernel_args, vec!["console=ttyS0"]);
        assert_eq!(request.meta_values[0].key, 10);
        assert!(request.siderolink_grpc_tunnel_mode);
        assert!(request.extensions.is_empty());
        assert!(!request.secure_boot);
    }
}
