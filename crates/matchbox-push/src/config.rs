//! Push-to-Matchbox configuration.
//!
//! The whole push reads one immutable [`MatchboxConfig`] handed to the
//! pusher at construction; nothing below looks configuration up on its own.

use crate::error::ConfigError;
use image_factory_client::DEFAULT_BASE_URL;
use std::path::PathBuf;

/// Default Matchbox assets directory for Talos artifacts
pub const DEFAULT_ASSETS_PATH: &str = "/var/lib/matchbox/assets/talos";
/// Default Matchbox profiles directory
pub const DEFAULT_PROFILES_PATH: &str = "/var/lib/matchbox/profiles";
/// Default Matchbox groups directory
pub const DEFAULT_GROUPS_PATH: &str = "/var/lib/matchbox/groups";
/// Path under which Matchbox serves the assets directory over HTTP
pub const DEFAULT_ASSETS_HTTP_PREFIX: &str = "/assets/talos";

/// Configuration for pushing schematics to Matchbox
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchboxConfig {
    /// Feature flag; when false every push is rejected before any side effect
    pub enabled: bool,
    /// Repoint existing groups at the freshly written profiles
    pub update_groups: bool,
    pub assets_path: PathBuf,
    pub profiles_path: PathBuf,
    pub groups_path: PathBuf,
    /// Boot-server-relative prefix used for `boot.kernel` / `boot.initrd`
    pub assets_http_prefix: String,
    pub image_factory_base_url: String,
}

impl Default for MatchboxConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            update_groups: false,
            assets_path: PathBuf::from(DEFAULT_ASSETS_PATH),
            profiles_path: PathBuf::from(DEFAULT_PROFILES_PATH),
            groups_path: PathBuf::from(DEFAULT_GROUPS_PATH),
            assets_http_prefix: DEFAULT_ASSETS_HTTP_PREFIX.to_string(),
            image_factory_base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl MatchboxConfig {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Unset and empty values both fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        Ok(Self {
            enabled: match get("MATCHBOX_ENABLED") {
                Some(value) => parse_bool("MATCHBOX_ENABLED", &value)?,
                None => defaults.enabled,
            },
            update_groups: match get("MATCHBOX_UPDATE_GROUPS") {
                Some(value) => parse_bool("MATCHBOX_UPDATE_GROUPS", &value)?,
                None => defaults.update_groups,
            },
            assets_path: get("MATCHBOX_ASSETS_PATH").map_or(defaults.assets_path, PathBuf::from),
            profiles_path: get("MATCHBOX_PROFILES_PATH").map_or(defaults.profiles_path, PathBuf::from),
            groups_path: get("MATCHBOX_GROUPS_PATH").map_or(defaults.groups_path, PathBuf::from),
            assets_http_prefix: get("MATCHBOX_ASSETS_HTTP_PREFIX")
                .map(|prefix| prefix.trim_end_matches('/').to_string())
                .unwrap_or(defaults.assets_http_prefix),
            image_factory_base_url: get("IMAGE_FACTORY_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.image_factory_base_url),
        })
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: other.to_string(),
        }),
    }
}
