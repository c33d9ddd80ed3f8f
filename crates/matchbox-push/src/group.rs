//! Repointing existing Matchbox groups at freshly written profiles.
//!
//! Groups are never created or deleted here. Only the `profile` field of each
//! `*.json` document changes; every other field is carried through untouched.
//! A failure on one document never stops the others.

use crate::error::GroupUpdateError;
use crate::profile::profile_id;
use crate::schematic::{Role, SchematicRef};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Matchbox group document: the `profile` field plus everything else as-is
///
/// `profile` is kept as raw JSON so a malformed existing value is simply
/// overwritten rather than failing the parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<serde_json::Value>,
    #[serde(flatten)]
    pub rest: serde_json::Map<String, serde_json::Value>,
}

/// Why a directory entry was not considered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Directory,
    NotJson,
}

/// What happened to one directory entry
#[derive(Debug)]
pub enum GroupUpdate {
    Updated { role: Role, profile: String },
    Skipped(SkipReason),
    Failed(GroupUpdateError),
}

/// Per-entry result of a rewrite pass
#[derive(Debug)]
pub struct GroupOutcome {
    pub file_name: String,
    pub update: GroupUpdate,
}

impl GroupOutcome {
    pub fn is_updated(&self) -> bool {
        matches!(self.update, GroupUpdate::Updated { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.update, GroupUpdate::Failed(_))
    }
}

/// Rewrites group documents in a Matchbox groups directory
#[derive(Debug, Clone)]
pub struct GroupRewriter {
    groups_dir: PathBuf,
}

impl GroupRewriter {
    pub fn new(groups_dir: impl Into<PathBuf>) -> Self {
        Self {
            groups_dir: groups_dir.into(),
        }
    }

    /// Point every group at the profile for its inferred role.
    ///
    /// Only an unreadable groups directory is an error; per-document failures
    /// are logged and returned in the outcome list, in file name order.
    pub async fn rewrite(&self, schematic: &SchematicRef) -> Result<Vec<GroupOutcome>, GroupUpdateError> {
        let read_dir_err = |source| GroupUpdateError::ReadDir {
            path: self.groups_dir.clone(),
            source,
        };

        let mut entries = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.groups_dir).await.map_err(read_dir_err)?;
        while let Some(entry) = dir.next_entry().await.map_err(read_dir_err)? {
            entries.push(entry);
        }
        entries.sort_by_key(tokio::fs::DirEntry::file_name);

        let mut outcomes = Vec::with_capacity(entries.len());
        for entry in entries {
            let file_name = entry.file_name().to_string_lossy().into_owned();
            let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);

            let update = if is_dir {
                GroupUpdate::Skipped(SkipReason::Directory)
            } else if !file_name.ends_with(".json") {
                GroupUpdate::Skipped(SkipReason::NotJson)
            } else {
                let role = Role::from_group_file_name(&file_name);
                let profile = profile_id(role, schematic);
                match rewrite_document(&entry.path(), &profile).await {
                    Ok(()) => {
                        info!("Updated matchbox group {} to profile {}", file_name, profile);
                        GroupUpdate::Updated { role, profile }
                    }
                    Err(e) => {
                        warn!("Skipping matchbox group {}: {}", file_name, e);
                        GroupUpdate::Failed(e)
                    }
                }
            };

            outcomes.push(GroupOutcome { file_name, update });
        }

        Ok(outcomes)
    }
}

async fn rewrite_document(path: &Path, profile: &str) -> Result<(), GroupUpdateError> {
    let data = tokio::fs::read(path).await.map_err(GroupUpdateError::Read)?;
    let mut group: GroupDocument = serde_json::from_slice(&data).map_err(GroupUpdateError::Parse)?;

    group.profile = Some(serde_json::Value::String(profile.to_string()));

    let updated = serde_json::to_vec_pretty(&group).map_err(GroupUpdateError::Serialization)?;
    tokio::fs::write(path, updated).await.map_err(GroupUpdateError::Write)
}
