//! Configuration management
//!
//! This module handles loading, saving, and editing the s3pick preference file.
//! The file is stored in TOML format at ~/.config/s3pick/config.toml, or in
//! `$S3PICK_CONFIG_DIR/config.toml` when that variable is set.
//!
//! Changes to schema_version require migration support.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Current configuration schema version
pub const SCHEMA_VERSION: u32 = 1;

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "S3PICK_CONFIG_DIR";

/// Application directory name under the platform config and cache dirs
const APP_DIR: &str = "s3pick";

/// Default number of content lines in a leaf preview
const DEFAULT_PREVIEW_LINES: usize = 10;

/// Preference keys accepted by [`Preferences::set`]
pub const PREFERENCE_KEYS: &[&str] = &[
    "ignore_case",
    "default_profile",
    "endpoint",
    "region",
    "cache_dir",
    "download_dir",
    "preview_lines",
];

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Schema version for migration support
    pub schema_version: u32,

    /// User preferences
    #[serde(default)]
    pub preferences: Preferences,
}

/// User preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    /// Filter candidates case-insensitively
    #[serde(default = "default_true")]
    pub ignore_case: bool,

    /// AWS shared-config profile used for credentials and region
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_profile: Option<String>,

    /// Custom S3 endpoint URL for S3-compatible services
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Region override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// Directory holding the tree cache (one file per bucket)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,

    /// Destination directory for downloads
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Number of content lines shown in a leaf preview
    #[serde(default = "default_preview_lines")]
    pub preview_lines: usize,
}

fn default_true() -> bool {
    true
}

fn default_download_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_preview_lines() -> usize {
    DEFAULT_PREVIEW_LINES
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            ignore_case: true,
            default_profile: None,
            endpoint: None,
            region: None,
            cache_dir: None,
            download_dir: default_download_dir(),
            preview_lines: DEFAULT_PREVIEW_LINES,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            preferences: Preferences::default(),
        }
    }
}

impl Preferences {
    /// Effective cache directory
    pub fn cache_dir(&self) -> Result<PathBuf> {
        match &self.cache_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::cache_dir()
                .map(|dir| dir.join(APP_DIR))
                .ok_or_else(|| Error::Config("Could not determine cache directory".into())),
        }
    }

    /// Update a single preference from its textual form
    ///
    /// `none` (or an empty value) clears an optional field.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "ignore_case" => self.ignore_case = parse_bool(value)?,
            "default_profile" => self.default_profile = optional(value),
            "endpoint" => {
                self.endpoint = match optional(value) {
                    Some(endpoint) => {
                        url::Url::parse(&endpoint)?;
                        Some(endpoint)
                    }
                    None => None,
                }
            }
            "region" => self.region = optional(value),
            "cache_dir" => self.cache_dir = optional(value).map(PathBuf::from),
            "download_dir" => {
                self.download_dir = optional(value)
                    .map(PathBuf::from)
                    .unwrap_or_else(default_download_dir)
            }
            "preview_lines" => {
                self.preview_lines = value.trim().parse().map_err(|_| {
                    Error::Config(format!("preview_lines must be a number, got '{value}'"))
                })?
            }
            _ => {
                return Err(Error::Config(format!(
                    "Unknown preference '{key}'. Known keys: {}",
                    PREFERENCE_KEYS.join(", ")
                )));
            }
        }
        Ok(())
    }

    /// Preferences as (key, value) pairs for display
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let unset = || "-".to_string();
        vec![
            ("ignore_case", self.ignore_case.to_string()),
            (
                "default_profile",
                self.default_profile.clone().unwrap_or_else(unset),
            ),
            ("endpoint", self.endpoint.clone().unwrap_or_else(unset)),
            ("region", self.region.clone().unwrap_or_else(unset)),
            (
                "cache_dir",
                self.cache_dir
                    .as_ref()
                    .map(|dir| dir.display().to_string())
                    .unwrap_or_else(unset),
            ),
            ("download_dir", self.download_dir.display().to_string()),
            ("preview_lines", self.preview_lines.to_string()),
        ]
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(Error::Config(format!("Expected a boolean, got '{value}'"))),
    }
}

fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("none") {
        None
    } else {
        Some(value.to_string())
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
        if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
            return Ok(Self::with_path(PathBuf::from(dir).join("config.toml")));
        }
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("Could not determine config directory".into()))?;
        let config_path = config_dir.join(APP_DIR).join("config.toml");
        Ok(Self { config_path })
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

        let content = std::fs::read_to_string(&self.config_path)?;
        let mut config: Config = toml::from_str(&content)?;

        if config.schema_version < SCHEMA_VERSION {
            config = self.migrate(config)?;
        } else if config.schema_version > SCHEMA_VERSION {
            return Err(Error::Config(format!(
                "Configuration file version {} is newer than supported version {}. Please upgrade s3pick.",
                config.schema_version, SCHEMA_VERSION
            )));
        }

        Ok(config)
    }

    /// Save configuration to disk
    ///
    /// Creates parent directories if they don't exist.
    /// Sets file permissions to 600 (owner read/write only).
    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(config)?;
        std::fs::write(&self.config_path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.config_path, permissions)?;
        }

        tracing::debug!(path = %self.config_path.display(), "saved configuration");
        Ok(())
    }

    /// Reset preferences to their defaults
    pub fn init(&self) -> Result<Config> {
        let config = Config::default();
        self.save(&config)?;
        Ok(config)
    }

    /// Edit one preference and rewrite the whole file
    pub fn set_preference(&self, key: &str, value: &str) -> Result<Config> {
        let mut config = self.load()?;
        config.preferences.set(key, value)?;
        self.save(&config)?;
        Ok(config)
    }

    /// Migrate configuration from older schema version
    fn migrate(&self, config: Config) -> Result<Config> {
        let mut config = config;
        config.schema_version = SCHEMA_VERSION;
        Ok(config)
    }
}
