//! Configuration management
//!
//! Two layers live here:
//! - [`Config`], the optional TOML file at `~/.config/skycp/config.toml`
//!   (or `$SKYCP_CONFIG_DIR/config.toml`) holding per-provider defaults.
//! - [`TransferConfig`], the explicit value built once per invocation from
//!   flags and file defaults, then passed into resolution and transfer.

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::path::Provider;

/// Current configuration schema version
pub const SCHEMA_VERSION: u32 = 1;

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "SKYCP_CONFIG_DIR";

const CONFIG_FILE: &str = "config.toml";

/// Default output format
const DEFAULT_OUTPUT: &str = "human";

/// Default color setting
const DEFAULT_COLOR: &str = "auto";

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Schema version for migration support
    pub schema_version: u32,

    /// Output settings
    #[serde(default)]
    pub defaults: Defaults,

    /// Defaults for `s3:` destinations
    #[serde(default)]
    pub s3: ProviderDefaults,

    /// Defaults for `gs://` destinations
    #[serde(default)]
    pub gcs: ProviderDefaults,
}

/// Default settings for CLI output
#[derive(Debug, Clone, Deserialize)]
pub struct Defaults {
    /// Output format: "human" or "json"
    #[serde(default = "default_output")]
    pub output: String,

    /// Color mode: "auto", "always", or "never"
    #[serde(default = "default_color")]
    pub color: String,
}

fn default_output() -> String {
    DEFAULT_OUTPUT.to_string()
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
        }
    }
}

/// Per-provider permission and storage-class defaults
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProviderDefaults {
    #[serde(default)]
    pub permission: Option<String>,

    #[serde(default)]
    pub storage_class: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            defaults: Defaults::default(),
            s3: ProviderDefaults::default(),
            gcs: ProviderDefaults::default(),
        }
    }
}

/// Locates and loads the configuration file
#[derive(Debug)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager honouring `SKYCP_CONFIG_DIR`, else the user config dir
    pub fn new() -> Result<Self> {
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
            return Ok(Self::with_path(PathBuf::from(dir).join(CONFIG_FILE)));
        }

        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("Could not determine config directory".into()))?;
        Ok(Self::with_path(config_dir.join("skycp").join(CONFIG_FILE)))
    }

    /// Create a ConfigManager with a custom path (useful for testing)
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Load configuration from disk
    ///
    /// If the configuration file doesn't exist, returns a default configuration.
    pub fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&self.config_path)?;
        let config: Config = toml::from_str(&content)?;

        if config.schema_version > SCHEMA_VERSION {
            return Err(Error::Config(format!(
                "Configuration file version {} is newer than supported version {SCHEMA_VERSION}. \
                 Please upgrade skycp.",
                config.schema_version
            )));
        }

        tracing::debug!(path = %self.config_path.display(), "Loaded configuration");
        Ok(config)
    }
}

/// Explicit settings for one copy invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferConfig {
    /// Force the provider's public-read permission
    pub public: bool,

    /// Requested permission name
    pub permission: Option<String>,

    /// Requested storage class
    pub storage_class: Option<String>,

    /// Config-file defaults for S3
    pub s3: ProviderDefaults,

    /// Config-file defaults for GCS
    pub gcs: ProviderDefaults,
}

impl TransferConfig {
    /// Attach the provider defaults from a loaded config file
    pub fn with_file_defaults(mut self, config: &Config) -> Self {
        self.s3 = config.s3.clone();
        self.gcs = config.gcs.clone();
        self
    }

    /// File defaults for one provider
    pub fn provider_defaults(&self, provider: Provider) -> &ProviderDefaults {
        match provider {
            Provider::S3 => &self.s3,
            Provider::Gcs => &self.gcs,
        }
    }
}
