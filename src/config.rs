use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{
    monitors::DEFAULT_OFFLINE_THRESHOLD_SECS, storage::DEFAULT_RETENTION_CAP, util,
};

/// How the hub decides who pushed a batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityMode {
    /// The agent declares its name in every sample
    #[default]
    Name,

    /// The source IP address of the connection is the identity
    Address,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HubConfig {
    #[serde(default = "util::get_default_bind_addr")]
    pub bind_addr: SocketAddr,

    #[serde(default)]
    pub identity_mode: IdentityMode,

    /// Maximum samples kept per identity
    #[serde(default = "default_retention_cap")]
    pub retention_cap: usize,

    /// Maximum age of the last sample for an identity to be alive
    #[serde(default = "default_offline_threshold")]
    pub offline_threshold_secs: i64,

    #[serde(default = "default_cleanup_interval_hours")]
    pub cleanup_interval_hours: u64,

    /// Shared secret for the admin routes (compared to the `Authorization` header)
    pub auth_token: Option<String>,

    /// Log every received batch
    #[serde(default)]
    pub debug: bool,

    #[serde(default = "default_enable_cors")]
    pub enable_cors: bool,

    /// Identities admitted at startup
    #[serde(default)]
    pub allowed: Vec<String>,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            bind_addr: util::get_default_bind_addr(),
            identity_mode: IdentityMode::default(),
            retention_cap: default_retention_cap(),
            offline_threshold_secs: default_offline_threshold(),
            cleanup_interval_hours: default_cleanup_interval_hours(),
            auth_token: None,
            debug: false,
            enable_cors: default_enable_cors(),
            allowed: vec![],
        }
    }
}

impl HubConfig {
    /// Override values with the ones present in the environment
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(addr) = util::get_hub_addr() {
            self.bind_addr = addr;
        }
        if let Some(token) = util::get_auth_token() {
            self.auth_token = Some(token);
        }
        if let Some(threshold) = util::get_offline_threshold() {
            self.offline_threshold_secs = threshold;
        }
        if let Some(hours) = util::get_cleanup_interval_hours() {
            self.cleanup_interval_hours = hours;
        }
        if let Some(debug) = util::get_debug() {
            self.debug = debug;
        }
        self
    }

    /// Interval of the cleanup pass, between one hour and one year
    pub fn cleanup_interval(&self) -> Duration {
        let hours = self
            .cleanup_interval_hours
            .clamp(1, MAX_CLEANUP_INTERVAL_HOURS);
        Duration::from_secs(hours.saturating_mul(3600))
    }

    /// The shared secret for the admin routes; the hub does not start without one
    pub fn require_auth_token(&self) -> anyhow::Result<String> {
        match self.auth_token.as_deref().map(str::trim) {
            Some(token) if !token.is_empty() => Ok(token.to_string()),
            _ => anyhow::bail!(
                "no auth token configured (set AUTH_TOKEN or \"auth_token\" in the config file)"
            ),
        }
    }
}

/// Upper bound for `cleanup_interval_hours` (one year)
pub const MAX_CLEANUP_INTERVAL_HOURS: u64 = 24 * 365;

fn default_retention_cap() -> usize {
    DEFAULT_RETENTION_CAP
}

fn default_offline_threshold() -> i64 {
    DEFAULT_OFFLINE_THRESHOLD_SECS
}

fn default_cleanup_interval_hours() -> u64 {
    1
}

fn default_enable_cors() -> bool {
    true
}

pub const DEFAULT_PUSH_INTERVAL_SECS: u64 = 10;

pub const DEFAULT_PUSH_TIMEOUT_SECS: u64 = 5;

/// Settings of a single agent's collector loop
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Identity declared in every pushed sample
    pub name: String,

    /// Base URL of the hub, e.g. `http://10.0.0.1:37322`
    pub hub_url: String,

    pub interval: Duration,

    /// Upper bound for a single push to the hub
    pub timeout: Duration,
}

impl AgentConfig {
    pub fn new(name: impl Into<String>, hub_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hub_url: hub_url.into(),
            interval: Duration::from_secs(DEFAULT_PUSH_INTERVAL_SECS),
            timeout: Duration::from_secs(DEFAULT_PUSH_TIMEOUT_SECS),
        }
    }
}

pub fn read_config_file(path: &str) -> anyhow::Result<HubConfig> {
    let file_content = std::fs::read_to_string(path)?;
    serde_json::from_str(&file_content)
        .map_err(|e| anyhow::anyhow!("Invalid configuration file provided: {e}"))
        .inspect(|_| trace!("loaded config from {path}"))
}
