//! Push-to-Matchbox errors
//!
//! `PushError` is the caller-facing taxonomy. Every variant except the
//! group-level errors aborts the push; `GroupUpdateError` is only ever
//! reported per document inside a [`crate::group::GroupOutcome`].

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a push
#[derive(Debug, Error)]
pub enum PushError {
    /// Feature flag is off
    #[error("push-to-matchbox feature is disabled")]
    Disabled,

    /// Caller lacks the operator role
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Request failed validation before any side effect
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Schematic creation or base kernel argument lookup failed
    #[error("Schematic error: {0}")]
    Schematic(#[from] SchematicError),

    /// Downloading a boot artifact failed
    #[error("failed to download {artifact}: {source}")]
    Fetch {
        artifact: &'static str,
        #[source]
        source: FetchError,
    },

    /// Writing a boot profile failed
    #[error("Profile write error: {0}")]
    ProfileWrite(#[from] ProfileWriteError),

    /// The progress receiver went away at a checkpoint
    #[error("Progress stream closed: {0}")]
    ProgressClosed(#[from] ProgressError),
}

/// Upstream schematic failures
#[derive(Debug, Error)]
pub enum SchematicError {
    /// The schematic service failed
    #[error("failed to create schematic: {0}")]
    Upstream(String),

    /// Base kernel arguments could not be resolved
    #[error("failed to get base kernel args: {0}")]
    KernelArgs(String),

    /// The returned schematic ID cannot be used to name artifacts
    #[error("invalid schematic id {0:?}: expected at least 8 characters")]
    InvalidId(String),
}

/// Artifact download failures
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("failed to download from {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Non-2xx response; the body is kept for diagnostics
    #[error("download failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to create file {}: {source}", path.display())]
    CreateFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write to file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("download error: {0}")]
    Body(#[source] reqwest::Error),

    #[error("failed to chmod {}: {source}", path.display())]
    Permissions {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Boot profile write failures
#[derive(Debug, Error)]
pub enum ProfileWriteError {
    #[error("failed to create matchbox profiles directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to marshal profile: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to write profile file {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Per-document group update failures
#[derive(Debug, Error)]
pub enum GroupUpdateError {
    #[error("failed to read groups directory {}: {source}", path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read group file: {0}")]
    Read(#[source] std::io::Error),

    #[error("failed to unmarshal group: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("failed to marshal updated group: {0}")]
    Serialization(#[source] serde_json::Error),

    #[error("failed to write updated group: {0}")]
    Write(#[source] std::io::Error),
}

/// The progress receiver has been dropped
#[derive(Debug, Error)]
#[error("progress receiver dropped while sending {message:?} ({percentage}%)")]
pub struct ProgressError {
    pub message: String,
    pub percentage: u8,
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value {value:?} for {key}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required setting: {0}")]
    Missing(String),
}
