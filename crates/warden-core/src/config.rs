use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::WardenError;

/// Top-level groupwarden configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub bridge: BridgeConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub files: FilesConfig,
    #[serde(default)]
    pub groups: GroupsConfig,
    #[serde(default)]
    pub phone: PhoneConfig,
    #[serde(default)]
    pub broadcast: BroadcastConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            bridge: BridgeConfig::default(),
            batch: BatchConfig::default(),
            files: FilesConfig::default(),
            groups: GroupsConfig::default(),
            phone: PhoneConfig::default(),
            broadcast: BroadcastConfig::default(),
        }
    }
}

/// Where the bridge lives and how long a single call may take.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds (default: 15).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl BridgeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Reject a bridge address or timeout no call could succeed with.
    pub fn validate(&self) -> Result<(), WardenError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(WardenError::Config(format!(
                "bridge base_url must start with http:// or https://, got {:?}",
                self.base_url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(WardenError::Config(
                "bridge timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Batch size and pacing for removals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    #[serde(default = "default_batch_size")]
    pub size: usize,
    /// Seconds to wait between two removals in the same batch (default: 2).
    #[serde(default = "default_delay_secs")]
    pub delay_secs: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            size: default_batch_size(),
            delay_secs: default_delay_secs(),
        }
    }
}

impl BatchConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }

    /// Reject settings the coordinator cannot work with.
    pub fn validate(&self) -> Result<(), WardenError> {
        if self.size == 0 {
            return Err(WardenError::Config(
                "batch size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Input and output file locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesConfig {
    #[serde(default = "default_contacts")]
    pub contacts: String,
    #[serde(default = "default_whitelist")]
    pub whitelist: String,
    #[serde(default = "default_results")]
    pub results: String,
    #[serde(default = "default_log_file")]
    pub log: String,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            contacts: default_contacts(),
            whitelist: default_whitelist(),
            results: default_results(),
            log: default_log_file(),
        }
    }
}

/// Target groups processed by `remove` when none are given on the command line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupsConfig {
    #[serde(default)]
    pub targets: Vec<String>,
}

/// Phone number normalization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhoneConfig {
    /// Country code prepended to local numbers written with a leading `0`.
    #[serde(default = "default_country_code")]
    pub default_country_code: String,
}

impl Default for PhoneConfig {
    fn default() -> Self {
        Self {
            default_country_code: default_country_code(),
        }
    }
}

/// Pacing of the `broadcast` command.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastConfig {
    /// Seconds between two messages (default: 30).
    #[serde(default = "default_broadcast_delay_secs")]
    pub delay_secs: u64,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            delay_secs: default_broadcast_delay_secs(),
        }
    }
}

// --- Default value functions ---

fn default_log_level() -> String {
    "info".to_string()
}
fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}
fn default_timeout_secs() -> u64 {
    15
}
fn default_batch_size() -> usize {
    10
}
fn default_delay_secs() -> u64 {
    2
}
fn default_contacts() -> String {
    "common_contacts_full.csv".to_string()
}
fn default_whitelist() -> String {
    "whitelist.txt".to_string()
}
fn default_results() -> String {
    "removal_results.csv".to_string()
}
fn default_log_file() -> String {
    "groupwarden.log".to_string()
}
fn default_broadcast_delay_secs() -> u64 {
    30
}
fn default_country_code() -> String {
    "972".to_string()
}

/// Load configuration from a TOML file.
///
/// Falls back to defaults if the file does not exist.
pub fn load(path: &str) -> Result<Config, WardenError> {
    let path = Path::new(path);
    if !path.exists() {
        tracing::info!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| WardenError::Config(format!("failed to read {}: {}", path.display(), e)))?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| WardenError::Config(format!("failed to parse config: {}", e)))?;

    Ok(config)
}
