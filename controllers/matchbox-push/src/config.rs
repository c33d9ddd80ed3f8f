//! Service configuration.
//!
//! Wraps the library's [`MatchboxConfig`] with the settings only the HTTP
//! service needs: listen address, operator tokens and base kernel args.

use matchbox_push::{ConfigError, MatchboxConfig};
use std::net::SocketAddr;

const DEFAULT_LISTEN: &str = "0.0.0.0:8085";

/// Full service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub listen: SocketAddr,
    pub operator_tokens: Vec<String>,
    pub base_kernel_args: Vec<String>,
    /// Siderolink API endpoint nodes join through; adds `siderolink.api=` when set
    pub siderolink_api_url: Option<String>,
    pub matchbox: MatchboxConfig,
}

impl ServiceConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let listen_raw = get("MATCHBOX_PUSH_LISTEN").unwrap_or_else(|| DEFAULT_LISTEN.to_string());
        let listen = listen_raw.parse().map_err(|_| ConfigError::InvalidValue {
            key: "MATCHBOX_PUSH_LISTEN".to_string(),
            value: listen_raw.clone(),
        })?;

        let operator_tokens: Vec<String> = get("MATCHBOX_PUSH_OPERATOR_TOKENS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|token| !token.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();
        if operator_tokens.is_empty() {
            return Err(ConfigError::Missing("MATCHBOX_PUSH_OPERATOR_TOKENS".to_string()));
        }

        let base_kernel_args = get("MATCHBOX_PUSH_BASE_KERNEL_ARGS")
            .map(|raw| raw.split_whitespace().map(String::from).collect())
            .unwrap_or_default();

        Ok(Self {
            listen,
            operator_tokens,
            base_kernel_args,
            siderolink_api_url: get("MATCHBOX_PUSH_SIDEROLINK_API_URL"),
            matchbox: MatchboxConfig::from_lookup(&lookup)?,
        })
    }
}
