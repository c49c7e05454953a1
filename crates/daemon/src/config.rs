//! Configuration management for the Direxplorer daemon.
//!
//! This module provides TOML-based configuration file loading and saving.
//! The default configuration path is `~/.config/direxplorer/config.toml`.
//!
//! The configured home directory is only the startup value. Changes made at
//! runtime through the API are never written back here.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::files::transfer::DEFAULT_MAX_UPLOAD_SIZE;
use crate::files::ContainmentPolicy;

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 5080;

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("port must be greater than 0")]
    InvalidPort,

    #[error("host must not be empty")]
    InvalidHost,

    #[error("home_directory must not be empty")]
    EmptyHomeDirectory,

    #[error("max_upload_size must be greater than 0, got {0}")]
    InvalidMaxUploadSize(u64),

    #[error("log_level must be one of: trace, debug, info, warn, error; got {0}")]
    InvalidLogLevel(String),
}

/// Valid log level values for tracing configuration.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Main configuration structure for the Direxplorer daemon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    /// HTTP listener configuration.
    pub server: ServerConfig,

    /// Exposed directory configuration.
    pub explorer: ExplorerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind.
    pub host: String,

    /// Port to bind.
    pub port: u16,

    /// Number of HTTP workers (0 = one per CPU core).
    pub workers: usize,
}

/// Exposed directory configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExplorerConfig {
    /// Initial home directory all relative paths resolve against.
    pub home_directory: PathBuf,

    /// Whether resolved paths may leave the home directory.
    pub containment: ContainmentPolicy,

    /// Maximum upload size in bytes (default: 100MB).
    pub max_upload_size: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Directory for a `direxplorer.log` file. Console only when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            workers: 0,
        }
    }
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            home_directory: default_home_directory(),
            containment: ContainmentPolicy::Unconfined,
            max_upload_size: DEFAULT_MAX_UPLOAD_SIZE,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: None,
        }
    }
}

/// Returns the default configuration file path.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("direxplorer")
        .join("config.toml")
}

/// Returns the default home directory (the user's home, else the cwd).
fn default_home_directory() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

const ENV_HOME: &str = "DIREXPLORER_HOME";
const ENV_HOST: &str = "DIREXPLORER_HOST";
const ENV_PORT: &str = "DIREXPLORER_PORT";
const ENV_LOG_LEVEL: &str = "DIREXPLORER_LOG_LEVEL";

/// An environment variable seen by [`Config::apply_env_overrides`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvOverride {
    /// The value replaced the configured one.
    Applied { var: &'static str, value: String },
    /// The value could not be parsed and was skipped.
    Ignored {
        var: &'static str,
        value: String,
        reason: String,
    },
}

impl EnvOverride {
    /// Log this override through the active subscriber.
    pub fn log(&self) {
        match self {
            EnvOverride::Applied { var, value } => {
                tracing::info!("Overriding config from environment: {}={}", var, value);
            }
            EnvOverride::Ignored { var, value, reason } => {
                tracing::warn!("Ignoring invalid {} {:?}: {}", var, value, reason);
            }
        }
    }
}

impl Config {
    /// Apply environment variable overrides to the configuration.
    ///
    /// Environment variables take precedence over config file values.
    /// Empty values are ignored. Supported variables:
    /// - DIREXPLORER_HOME: Override the initial home directory
    /// - DIREXPLORER_HOST: Override the bind address
    /// - DIREXPLORER_PORT: Override the bind port (ignored if not a number)
    /// - DIREXPLORER_LOG_LEVEL: Override log level (trace, debug, info, warn, error)
    ///
    /// Runs before logging is initialized, so nothing is logged here; the
    /// caller reports the returned overrides once a subscriber exists.
    pub fn apply_env_overrides(&mut self) -> Vec<EnvOverride> {
        let mut overrides = Vec::new();

        if let Some(home) = non_empty_env(ENV_HOME) {
            self.explorer.home_directory = PathBuf::from(&home);
            overrides.push(EnvOverride::Applied {
                var: ENV_HOME,
                value: home,
            });
        }

        if let Some(host) = non_empty_env(ENV_HOST) {
            self.server.host = host.clone();
            overrides.push(EnvOverride::Applied {
                var: ENV_HOST,
                value: host,
            });
        }

        if let Some(port) = non_empty_env(ENV_PORT) {
            match port.parse::<u16>() {
                Ok(parsed) => {
                    self.server.port = parsed;
                    overrides.push(EnvOverride::Applied {
                        var: ENV_PORT,
                        value: port,
                    });
                }
                Err(e) => overrides.push(EnvOverride::Ignored {
                    var: ENV_PORT,
                    value: port,
                    reason: e.to_string(),
                }),
            }
        }

        if let Some(level) = non_empty_env(ENV_LOG_LEVEL) {
            self.logging.log_level = level.clone();
            overrides.push(EnvOverride::Applied {
                var: ENV_LOG_LEVEL,
                value: level,
            });
        }

        overrides
    }

    /// Validate the configuration values.
    ///
    /// The home directory is not required to exist: the daemon starts anyway
    /// and operations fail until a valid home is set at runtime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidPort);
        }

        if self.server.host.trim().is_empty() {
            return Err(ConfigError::InvalidHost);
        }

        if self.explorer.home_directory.as_os_str().is_empty() {
            return Err(ConfigError::EmptyHomeDirectory);
        }

        if self.explorer.max_upload_size == 0 {
            return Err(ConfigError::InvalidMaxUploadSize(
                self.explorer.max_upload_size,
            ));
        }

        let level = self.logging.log_level.to_lowercase();
        if !VALID_LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(self.logging.log_level.clone()));
        }

        Ok(())
    }

    /// Load configuration from a file.
    ///
    /// If the file does not exist, returns the default configuration.
    /// If the file exists but is invalid TOML, returns an error with
    /// a helpful message.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load configuration from the default path.
    pub fn load_default() -> Result<Self> {
        Self::load(default_config_path())
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str)
            .map_err(|e| anyhow::anyhow!("Invalid TOML configuration: {}", format_toml_error(&e)))
    }

    /// Save configuration to a file.
    ///
    /// Creates parent directories if they don't exist.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = self.to_toml()?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::debug!("Configuration saved to {:?}", path);
        Ok(())
    }

    /// Serialize configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")
    }

    /// The `host:port` string to bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

/// Format a TOML deserialization error for user-friendly display.
fn format_toml_error(error: &toml::de::Error) -> String {
    let mut msg = error.message().to_string();

    if let Some(span) = error.span() {
        msg.push_str(&format!(" (at position {}..{})", span.start, span.end));
    }

    msg
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    const ENV_VARS: &[&str] = &[
        "DIREXPLORER_HOME",
        "DIREXPLORER_HOST",
        "DIREXPLORER_PORT",
        "DIREXPLORER_LOG_LEVEL",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(config.server.workers, 0);
        assert_eq!(config.explorer.containment, ContainmentPolicy::Unconfined);
        assert_eq!(config.explorer.max_upload_size, 100 * 1024 * 1024);
        assert!(!config.explorer.home_directory.as_os_str().is_empty());
        assert_eq!(config.logging.log_level, "info");
        assert!(config.logging.log_dir.is_none());
    }

    #[test]
    fn test_from_toml_empty() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_from_toml_partial() {
        let toml = r#"
[explorer]
home_directory = "/srv/share"
"#;
        let config = Config::from_toml(toml).unwrap();

        assert_eq!(config.explorer.home_directory, PathBuf::from("/srv/share"));
        // Other values should be defaults
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(config.logging.log_level, "info");
    }

    #[test]
    fn test_from_toml_full() {
        let toml = r#"
[server]
host = "0.0.0.0"
port = 8080
workers = 4

[explorer]
home_directory = "/data"
containment = "confined"
max_upload_size = 52428800

[logging]
log_level = "debug"
log_dir = "/var/log/direxplorer"
"#;
        let config = Config::from_toml(toml).unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.workers, 4);
        assert_eq!(config.explorer.home_directory, PathBuf::from("/data"));
        assert_eq!(config.explorer.containment, ContainmentPolicy::Confined);
        assert_eq!(config.explorer.max_upload_size, 52428800);
        assert_eq!(config.logging.log_level, "debug");
        assert_eq!(
            config.logging.log_dir,
            Some(PathBuf::from("/var/log/direxplorer"))
        );
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_from_toml_invalid_syntax() {
        let toml = r#"
[server
port = 1
"#;
        let result = Config::from_toml(toml);
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("Invalid TOML"));
    }

    #[test]
    fn test_from_toml_unknown_containment() {
        let toml = r#"
[explorer]
containment = "sometimes"
"#;
        assert!(Config::from_toml(toml).is_err());
    }

    #[test]
    fn test_from_toml_wrong_type() {
        let toml = r#"
[server]
port = "not a number"
"#;
        assert!(Config::from_toml(toml).is_err());
    }

    #[test]
    fn test_roundtrip_custom() {
        let mut original = Config::default();
        original.server.port = 9000;
        original.explorer.home_directory = PathBuf::from("/srv/files");
        original.explorer.containment = ContainmentPolicy::Confined;
        original.logging.log_dir = Some(PathBuf::from("/tmp/logs"));

        let loaded = Config::from_toml(&original.to_toml().unwrap()).unwrap();
        assert_eq!(original, loaded);
    }

    #[test]
    fn test_to_toml_sections() {
        let toml = Config::default().to_toml().unwrap();

        assert!(toml.contains("[server]"));
        assert!(toml.contains("[explorer]"));
        assert!(toml.contains("[logging]"));
        assert!(toml.contains(r#"containment = "unconfined""#));
    }

    #[test]
    fn test_load_missing_file() {
        let config = Config::load("/nonexistent/path/config.toml").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let mut original = Config::default();
        original.logging.log_level = "debug".to_string();
        original.explorer.max_upload_size = 1024;

        original.save(&config_path).unwrap();
        let loaded = Config::load(&config_path).unwrap();

        assert_eq!(original, loaded);
    }

    #[test]
    fn test_load_invalid_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "invalid [ toml").unwrap();

        let err = Config::load(&config_path).unwrap_err().to_string();
        assert!(err.contains("Failed to parse config file"));
    }

    #[test]
    fn test_default_config_path() {
        let path = default_config_path();
        assert!(path.to_string_lossy().contains("direxplorer"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    #[serial]
    fn test_env_override_home() {
        clear_env();
        std::env::set_var("DIREXPLORER_HOME", "/env/home");

        let mut config = Config::default();
        config.apply_env_overrides();

        assert_eq!(config.explorer.home_directory, PathBuf::from("/env/home"));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_env_override_host_and_port() {
        clear_env();
        std::env::set_var("DIREXPLORER_HOST", "0.0.0.0");
        std::env::set_var("DIREXPLORER_PORT", "9999");

        let mut config = Config::default();
        config.apply_env_overrides();

        assert_eq!(config.bind_address(), "0.0.0.0:9999");
        clear_env();
    }

    #[test]
    #[serial]
    fn test_env_overrides_are_reported_for_later_logging() {
        clear_env();
        std::env::set_var("DIREXPLORER_HOME", "/env/home");
        std::env::set_var("DIREXPLORER_LOG_LEVEL", "warn");

        let mut config = Config::default();
        let overrides = config.apply_env_overrides();

        assert_eq!(
            overrides,
            vec![
                EnvOverride::Applied {
                    var: "DIREXPLORER_HOME",
                    value: "/env/home".to_string(),
                },
                EnvOverride::Applied {
                    var: "DIREXPLORER_LOG_LEVEL",
                    value: "warn".to_string(),
                },
            ]
        );
        clear_env();
    }

    #[test]
    #[serial]
    fn test_env_override_invalid_port_ignored() {
        clear_env();
        std::env::set_var("DIREXPLORER_PORT", "eighty");

        let mut config = Config::default();
        let overrides = config.apply_env_overrides();

        assert_eq!(config.server.port, DEFAULT_PORT);
        assert!(matches!(
            overrides.as_slice(),
            [EnvOverride::Ignored { var: "DIREXPLORER_PORT", value, .. }] if value == "eighty"
        ));
        clear_env();
    }

    #[test]
    #[serial]
    fn test_env_override_log_level() {
        clear_env();
        std::env::set_var("DIREXPLORER_LOG_LEVEL", "debug");

        let mut config = Config::default();
        config.apply_env_overrides();

        assert_eq!(config.logging.log_level, "debug");
        clear_env();
    }

    #[test]
    #[serial]
    fn test_env_override_empty_does_not_override() {
        clear_env();
        std::env::set_var("DIREXPLORER_HOME", "");
        std::env::set_var("DIREXPLORER_LOG_LEVEL", "");

        let mut config = Config::default();
        let original = config.clone();
        let overrides = config.apply_env_overrides();

        assert_eq!(config, original);
        assert!(overrides.is_empty());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_env_override_unset_does_not_override() {
        clear_env();

        let mut config = Config::default();
        let original = config.clone();
        config.apply_env_overrides();

        assert_eq!(config, original);
    }

    #[test]
    fn test_validate_default_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_port_zero() {
        let mut config = Config::default();
        config.server.port = 0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidPort));
    }

    #[test]
    fn test_validate_blank_host() {
        let mut config = Config::default();
        config.server.host = "  ".to_string();
        assert_eq!(config.validate(), Err(ConfigError::InvalidHost));
    }

    #[test]
    fn test_validate_empty_home() {
        let mut config = Config::default();
        config.explorer.home_directory = PathBuf::new();
        assert_eq!(config.validate(), Err(ConfigError::EmptyHomeDirectory));
    }

    #[test]
    fn test_validate_missing_home_is_allowed() {
        let mut config = Config::default();
        config.explorer.home_directory = PathBuf::from("/definitely/not/here");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_max_upload_size_zero() {
        let mut config = Config::default();
        config.explorer.max_upload_size = 0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidMaxUploadSize(0))
        );
    }

    #[test]
    fn test_validate_log_level_case_insensitive() {
        let mut config = Config::default();
        config.logging.log_level = "WARN".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_log_level_invalid() {
        let mut config = Config::default();
        config.logging.log_level = "verbose".to_string();
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidLogLevel("verbose".to_string()))
        );
    }
}
