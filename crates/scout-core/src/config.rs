//! Configuration management for Scout.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration.
///
/// This is loaded from `~/.config/scout/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Browser automation settings
    pub browser: BrowserConfig,
    /// Scraping defaults and pacing
    pub scraping: ScrapingConfig,
    /// Diagnostic output settings
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from the default path, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, falling back to defaults if missing.
    pub fn load_from(config_path: &Path) -> ConfigResult<Self> {
        if config_path.exists() {
            tracing::debug!("Loading config from {}", config_path.display());
            let contents = fs::read_to_string(config_path)?;
            let config: Self = toml::from_str(&contents)?;
            config.validate()?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `SCOUT_HEADLESS`: Override browser headless mode (true/false)
    /// - `SCOUT_CHROME_PATH`: Override the Chrome/Chromium executable
    /// - `SCOUT_LOG`: Override the log filter directive
    /// - `SCOUT_THROTTLE`: Enable or disable request pacing (true/false)
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply `SCOUT_*` environment overrides on top of the current values.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("SCOUT_HEADLESS") {
            if let Ok(headless) = val.parse() {
                self.browser.headless = headless;
                tracing::debug!("Override browser.headless from env: {}", headless);
            }
        }

        if let Ok(val) = std::env::var("SCOUT_CHROME_PATH") {
            if !val.is_empty() {
                tracing::debug!("Override browser.chrome_executable from env: {}", val);
                self.browser.chrome_executable = Some(PathBuf::from(val));
            }
        }

        if let Ok(val) = std::env::var("SCOUT_LOG") {
            if !val.is_empty() {
                self.logging.filter = val;
            }
        }

        if let Ok(val) = std::env::var("SCOUT_THROTTLE") {
            if let Ok(throttle) = val.parse() {
                self.scraping.throttle = throttle;
                tracing::debug!("Override scraping.throttle from env: {}", throttle);
            }
        }
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.browser.viewport_width == 0 || self.browser.viewport_height == 0 {
            return Err(ConfigError::InvalidValue {
                field: "browser.viewport".to_string(),
                reason: format!(
                    "viewport must be non-zero, got {}x{}",
                    self.browser.viewport_width, self.browser.viewport_height
                ),
            });
        }

        if self.scraping.default_platform.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "scraping.default_platform".to_string(),
                reason: "cannot be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/scout/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs = ProjectDirs::from("com", "scout", "scout").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}

/// Browser automation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run browser in headless mode
    pub headless: bool,
    /// Explicit Chrome/Chromium binary; auto-detected when unset
    pub chrome_executable: Option<PathBuf>,
    /// Extra command-line arguments passed to the browser process
    pub extra_args: Vec<String>,
    /// Viewport width presented to sites
    pub viewport_width: u32,
    /// Viewport height presented to sites
    pub viewport_height: u32,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            chrome_executable: None,
            extra_args: vec![
                "--no-sandbox".to_string(),
                "--disable-dev-shm-usage".to_string(),
            ],
            viewport_width: 1920,
            viewport_height: 1080,
        }
    }
}

/// Scraping defaults used when the caller omits a value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapingConfig {
    /// Platform scraped when none is given
    pub default_platform: String,
    /// Free-text search query
    pub default_query: String,
    /// Location filter for location-aware platforms
    pub default_location: String,
    /// Profile cap per invocation
    pub default_max_profiles: usize,
    /// Directory of platform definition TOML files overriding the built-ins
    pub definitions_dir: Option<PathBuf>,
    /// Insert randomized delays between browser actions
    pub throttle: bool,
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            default_platform: "github".to_string(),
            default_query: "fullstack".to_string(),
            default_location: "India".to_string(),
            default_max_profiles: 10,
            definitions_dir: None,
            throttle: true,
        }
    }
}

/// Diagnostic output settings. Logs always go to stderr.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info,scout=debug`
    pub filter: String,
    /// Line format for log records
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info,scout=debug".to_string(),
            format: LogFormat::Compact,
        }
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable single-line records
    #[default]
    Compact,
    /// One JSON object per record
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert!(config.browser.headless);
        assert_eq!(config.browser.viewport_width, 1920);
        assert_eq!(config.browser.viewport_height, 1080);
        assert_eq!(config.scraping.default_platform, "github");
        assert_eq!(config.scraping.default_query, "fullstack");
        assert_eq!(config.scraping.default_location, "India");
        assert_eq!(config.scraping.default_max_profiles, 10);
        assert!(config.scraping.throttle);
        assert_eq!(config.logging.format, LogFormat::Compact);
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("[browser]"));
        assert!(toml_str.contains("[scraping]"));
        assert!(toml_str.contains("[logging]"));

        let parsed: AppConfig = toml::from_str(&toml_str).expect("parse serialized config");
        assert_eq!(
            parsed.scraping.default_platform,
            config.scraping.default_platform
        );
    }

    #[test]
    fn test_config_load_from_file() {
        let tmp = TempDir::new().expect("create temp dir");
        let config_path = tmp.path().join("config.toml");

        fs::write(
            &config_path,
            r#"
[browser]
headless = false

[scraping]
default_platform = "behance"
default_max_profiles = 3
"#,
        )
        .expect("write config file");

        let loaded = AppConfig::load_from(&config_path).expect("load config");
        assert!(!loaded.browser.headless);
        assert_eq!(loaded.scraping.default_platform, "behance");
        assert_eq!(loaded.scraping.default_max_profiles, 3);
        // Untouched keys keep their defaults
        assert_eq!(loaded.scraping.default_query, "fullstack");
        assert_eq!(loaded.browser.extra_args.len(), 2);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let tmp = TempDir::new().expect("create temp dir");
        let loaded =
            AppConfig::load_from(&tmp.path().join("absent.toml")).expect("defaults for missing");
        assert_eq!(loaded.scraping.default_platform, "github");
    }

    #[test]
    fn test_invalid_viewport_rejected() {
        let tmp = TempDir::new().expect("create temp dir");
        let config_path = tmp.path().join("config.toml");
        fs::write(&config_path, "[browser]\nviewport_width = 0\n").expect("write config file");

        let err = AppConfig::load_from(&config_path).expect_err("zero viewport must fail");
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_log_format_parsing() {
        let config: AppConfig =
            toml::from_str("[logging]\nformat = \"json\"\n").expect("parse logging section");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.filter, "info,scout=debug");
    }

    #[test]
    fn test_env_overrides() {
        std::env::set_var("SCOUT_HEADLESS", "false");
        std::env::set_var("SCOUT_THROTTLE", "false");
        std::env::set_var("SCOUT_CHROME_PATH", "/opt/chromium/chrome");

        let mut config = AppConfig::default();
        config.apply_env_overrides();
        assert!(!config.browser.headless);
        assert!(!config.scraping.throttle);
        assert_eq!(
            config.browser.chrome_executable,
            Some(PathBuf::from("/opt/chromium/chrome"))
        );

        std::env::remove_var("SCOUT_HEADLESS");
        std::env::remove_var("SCOUT_THROTTLE");
        std::env::remove_var("SCOUT_CHROME_PATH");
    }
}
