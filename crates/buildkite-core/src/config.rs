//! Configuration management for buildkite-mcp-server.
//!
//! Handles loading and saving configuration from TOML files.
//! Config files are stored in platform-specific locations:
//!
//! - **macOS**: `~/Library/Application Support/buildkite-mcp-server/config.toml`
//! - **Linux**: `~/.config/buildkite-mcp-server/config.toml`
//! - **Windows**: `%APPDATA%\buildkite-mcp-server\config.toml`
//!
//! The API token is never stored here; it comes from `BUILDKITE_API_TOKEN`.
//!
//! # Example
//!
//! ```ignore
//! use buildkite_core::config::Config;
//!
//! let mut config = Config::load()?;
//! config.set("buildkite.headers.X-Team", "platform")?;
//! config.save()?;
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{Error, Result};

/// Config file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Config directory name.
const CONFIG_DIR_NAME: &str = "buildkite-mcp-server";

/// Default Buildkite API URL.
pub const DEFAULT_BASE_URL: &str = "https://api.buildkite.com";

// =============================================================================
// Configuration structures
// =============================================================================

/// Main configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Buildkite API settings
    #[serde(default)]
    pub buildkite: BuildkiteConfig,

    /// Logging settings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<LogConfig>,
}

/// Buildkite API settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildkiteConfig {
    /// API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Overrides the default `User-Agent` header
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,

    /// Extra headers sent with every API request
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

impl Default for BuildkiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: None,
            headers: BTreeMap::new(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default `tracing` filter directive, e.g. `info` or `buildkite_api=debug`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

// =============================================================================
// Config implementation
// =============================================================================

impl Config {
    /// Get the configuration directory path.
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join(CONFIG_DIR_NAME))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
    }

    /// Get the configuration file path.
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Load configuration from the default location.
    ///
    /// Returns a default config if the file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    ///
    /// Returns a default config if the file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = ?path, "Config file does not exist, using defaults");
            return Ok(Self::default());
        }

        debug!(path = ?path, "Loading config");

        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config file: {}", e)))?;

        info!(path = ?path, "Config loaded successfully");
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        self.save_to(&path)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create config directory: {}", e)))?;
        }

        debug!(path = ?path, "Saving config");

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, contents)
            .map_err(|e| Error::Config(format!("Failed to write config file: {}", e)))?;

        info!(path = ?path, "Config saved successfully");
        Ok(())
    }

    /// Configured log filter, if any.
    pub fn log_level(&self) -> Option<&str> {
        self.log.as_ref().and_then(|l| l.level.as_deref())
    }

    /// Set a configuration value by key path.
    ///
    /// Supported keys: `buildkite.base_url`, `buildkite.user_agent`,
    /// `buildkite.headers.<Name>` and `log.level`.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let (section, field, rest) = split_key(key)?;

        match (section, field, rest) {
            ("buildkite", "base_url" | "url", None) => {
                self.buildkite.base_url = value.trim_end_matches('/').to_string();
            }
            ("buildkite", "user_agent", None) => {
                self.buildkite.user_agent = Some(value.to_string());
            }
            ("buildkite", "headers", Some(name)) => {
                self.buildkite
                    .headers
                    .insert(name.to_string(), value.to_string());
            }
            ("log", "level", None) => {
                self.log.get_or_insert_with(LogConfig::default).level = Some(value.to_string());
            }
            ("buildkite" | "log", _, _) => {
                return Err(Error::Config(format!(
                    "Unknown {} config field: {}",
                    section, field
                )));
            }
            _ => {
                return Err(Error::Config(format!("Unknown config section: {}", section)));
            }
        }

        Ok(())
    }

    /// Get a configuration value by key path.
    ///
    /// Returns `Ok(None)` for known keys that are not set.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let (section, field, rest) = split_key(key)?;

        match (section, field, rest) {
            ("buildkite", "base_url" | "url", None) => Ok(Some(self.buildkite.base_url.clone())),
            ("buildkite", "user_agent", None) => Ok(self.buildkite.user_agent.clone()),
            ("buildkite", "headers", Some(name)) => Ok(self.buildkite.headers.get(name).cloned()),
            ("log", "level", None) => Ok(self.log_level().map(str::to_string)),
            ("buildkite" | "log", _, _) => Err(Error::Config(format!(
                "Unknown {} config field: {}",
                section, field
            ))),
            _ => Err(Error::Config(format!("Unknown config section: {}", section))),
        }
    }
}

/// Split `section.field[.name]`.
fn split_key(key: &str) -> Result<(&str, &str, Option<&str>)> {
    let mut parts = key.splitn(3, '.');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(section), Some(field), rest) if !section.is_empty() && !field.is_empty() => {
            if rest.is_some_and(str::is_empty) {
                return Err(invalid_key(key));
            }
            Ok((section, field, rest))
        }
        _ => Err(invalid_key(key)),
    }
}

fn invalid_key(key: &str) -> Error {
    Error::Config(format!(
        "Invalid config key '{}'. Expected format: section.field",
        key
    ))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.buildkite.base_url, DEFAULT_BASE_URL);
        assert!(config.buildkite.headers.is_empty());
        assert!(config.buildkite.user_agent.is_none());
        assert!(config.log_level().is_none());
    }

    #[test]
    fn test_set_and_get() {
        let mut config = Config::default();

        config
            .set("buildkite.base_url", "https://buildkite.example.com/")
            .unwrap();
        config.set("buildkite.headers.X-Team", "platform").unwrap();
        config.set("log.level", "debug").unwrap();

        assert_eq!(
            config.get("buildkite.base_url").unwrap(),
            Some("https://buildkite.example.com".to_string())
        );
        assert_eq!(
            config.get("buildkite.headers.X-Team").unwrap(),
            Some("platform".to_string())
        );
        assert_eq!(config.get("buildkite.headers.Missing").unwrap(), None);
        assert_eq!(config.get("log.level").unwrap(), Some("debug".to_string()));
        assert_eq!(config.get("buildkite.user_agent").unwrap(), None);
    }

    #[test]
    fn test_invalid_key() {
        let mut config = Config::default();

        assert!(config.set("invalid", "value").is_err());
        assert!(config.set("buildkite.", "value").is_err());
        assert!(config.set("buildkite.headers.", "value").is_err());
        assert!(config.set("unknown.field", "value").is_err());
        assert!(config.set("buildkite.token", "value").is_err());
        assert!(config.set("log.level.extra", "value").is_err());

        assert!(config.get("buildkite.headers").is_err());
        assert!(config.get("github.owner").is_err());
    }

    #[test]
    fn test_save_and_load() {
        let mut config = Config::default();
        config.set("buildkite.headers.X-Team", "platform").unwrap();
        config.set("buildkite.user_agent", "custom-agent/1.0").unwrap();

        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path().to_path_buf();

        config.save_to(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("[buildkite]"));
        assert!(contents.contains("user_agent = \"custom-agent/1.0\""));
        assert!(contents.contains("X-Team = \"platform\""));
        assert!(!contents.contains("[log]"));

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_nonexistent() {
        let path = PathBuf::from("/nonexistent/path/config.toml");
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_partial_file_fills_defaults() {
        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), "[log]\nlevel = \"warn\"\n").unwrap();

        let config = Config::load_from(temp_file.path()).unwrap();
        assert_eq!(config.buildkite.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.log_level(), Some("warn"));
    }

    #[test]
    fn test_load_invalid_toml() {
        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), "[buildkite\nbase_url = ").unwrap();

        let err = Config::load_from(temp_file.path()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
