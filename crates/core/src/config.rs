//! Configuration management
//!
//! This module handles loading and migrating the s3t configuration file.
//! The configuration file is stored in TOML format at ~/.config/s3t/config.toml,
//! or under `$S3T_CONFIG_DIR` when that is set.

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Current configuration schema version
///
/// Files written for an older version are upgraded by `ConfigManager::migrate`.
pub const SCHEMA_VERSION: u32 = 1;

/// Environment variable holding a custom store endpoint
pub const ENDPOINT_ENV: &str = "AWS_ENDPOINT";

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "S3T_CONFIG_DIR";

/// Default output format
const DEFAULT_OUTPUT: &str = "human";

/// Default color setting
const DEFAULT_COLOR: &str = "auto";

/// Default multipart part size: 64 MiB
const DEFAULT_PART_SIZE: u64 = 64 * 1024 * 1024;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Schema version for migration support
    pub schema_version: u32,

    /// Default settings
    #[serde(default)]
    pub defaults: Defaults,

    /// Object store connection settings
    #[serde(default)]
    pub store: StoreSettings,

    /// Transfer tuning
    #[serde(default)]
    pub transfer: TransferSettings,
}

/// Default settings for CLI behavior
#[derive(Debug, Clone, Deserialize)]
pub struct Defaults {
    /// Output format: "human" or "json"
    #[serde(default = "default_output")]
    pub output: String,

    /// Color mode: "auto", "always", or "never"
    #[serde(default = "default_color")]
    pub color: String,

    /// Show progress bars
    #[serde(default = "default_true")]
    pub progress: bool,
}

/// Where and how to reach the object store
///
/// Credentials are not stored here; they come from the standard AWS
/// credential chain.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreSettings {
    /// Custom endpoint URL; the provider default is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Region override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// Use path-style bucket addressing (implied by a custom endpoint)
    #[serde(default)]
    pub force_path_style: bool,
}

/// Transfer tuning
#[derive(Debug, Clone, Deserialize)]
pub struct TransferSettings {
    /// Part size for chunked uploads, also the size threshold for using them
    #[serde(default = "default_part_size")]
    pub part_size: u64,

    /// Parts of one object uploaded concurrently
    #[serde(default = "default_part_concurrency")]
    pub part_concurrency: usize,

    /// Discovered files buffered ahead of the upload loop
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Keep syncing after a failed transfer
    #[serde(default)]
    pub continue_on_error: bool,
}

fn default_output() -> String {
    DEFAULT_OUTPUT.to_string()
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

fn default_true() -> bool {
    true
}

fn default_part_size() -> u64 {
    DEFAULT_PART_SIZE
}

fn default_part_concurrency() -> usize {
    4
}

fn default_queue_capacity() -> usize {
    crate::walker::DEFAULT_QUEUE_CAPACITY
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            progress: true,
        }
    }
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            part_size: default_part_size(),
            part_concurrency: default_part_concurrency(),
            queue_capacity: default_queue_capacity(),
            continue_on_error: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            defaults: Defaults::default(),
            store: StoreSettings::default(),
            transfer: TransferSettings::default(),
        }
    }
}

impl StoreSettings {
    /// Apply an endpoint taken from the environment, if any
    ///
    /// An empty value is ignored. The resulting endpoint is validated as a URL.
    pub fn with_endpoint_override(mut self, endpoint: Option<String>) -> Result<Self> {
        if let Some(endpoint) = endpoint.filter(|e| !e.trim().is_empty()) {
            self.endpoint = Some(endpoint.trim().to_string());
        }
        if let Some(endpoint) = &self.endpoint {
            let url = url::Url::parse(endpoint)?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(Error::Config(format!(
                    "Endpoint must be an http or https URL: {endpoint}"
                )));
            }
        }
        Ok(self)
    }

    /// Apply `AWS_ENDPOINT` from the process environment
    pub fn from_env(self) -> Result<Self> {
        self.with_endpoint_override(std::env::var(ENDPOINT_ENV).ok())
    }

    /// Whether requests should use path-style addressing
    pub fn path_style(&self) -> bool {
        self.force_path_style || self.endpoint.is_some()
    }
}

/// Configuration manager handles loading and saving config
#[derive(Debug)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the default config path
    pub fn new() -> Result<Self> {
        let config_dir = match std::env::var_os(CONFIG_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::config_dir()
                .ok_or_else(|| Error::Config("Could not determine config directory".into()))?
                .join("s3t"),
        };
        Ok(Self {
            config_path: config_dir.join("config.toml"),
        })
    }

    /// Create a ConfigManager with a custom path (useful for testing)
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Load configuration from disk
    ///
    /// If the configuration file doesn't exist, returns a default configuration.
    /// If the schema version doesn't match, attempts migration.
    pub fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&self.config_path)
            .map_err(|e| Error::local_io(&self.config_path, e))?;
        let mut config: Config = toml::from_str(&content)?;

        if config.schema_version < SCHEMA_VERSION {
            config = self.migrate(config)?;
        } else if config.schema_version > SCHEMA_VERSION {
            return Err(Error::Config(format!(
                "Configuration file version {} is newer than supported version {}. Please upgrade s3t.",
                config.schema_version, SCHEMA_VERSION
            )));
        }

        if config.transfer.part_concurrency == 0 {
            return Err(Error::Config("transfer.part_concurrency must be at least 1".into()));
        }

        Ok(config)
    }

    /// Migrate configuration from older schema version
    fn migrate(&self, config: Config) -> Result<Config> {
        let mut config = config;
        tracing::debug!(
            from = config.schema_version,
            to = SCHEMA_VERSION,
            "migrating configuration"
        );
        config.schema_version = SCHEMA_VERSION;
        Ok(config)
    }
}
