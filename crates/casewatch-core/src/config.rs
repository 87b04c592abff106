//! Configuration management for casewatch.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default bound on every page load and element wait.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Main application configuration.
///
/// This is loaded from `~/.config/casewatch/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Lookup pipeline settings
    pub fetch: FetchConfig,
    /// Browser automation settings
    pub browser: BrowserConfig,
}

impl AppConfig {
    /// Load configuration from the default location, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit file, which must exist.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.display().to_string(),
            });
        }

        tracing::debug!("Loading config from {}", path.display());
        let contents = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `CASEWATCH_MODE`: `live`, `synthetic` or `fallback`
    /// - `CASEWATCH_REQUEST_TIMEOUT_MS`: bound on every wait
    /// - `CASEWATCH_HEADLESS`: browser headless mode (true/false)
    /// - `CASEWATCH_SYNTHETIC_SEED`: seed for reproducible synthetic records
    /// - `CAPTCHA_SERVICE_KEY`: credential for the external CAPTCHA service
    pub fn load_with_env(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(path) => Self::load_from(path)?,
            None => Self::load()?,
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup.
    ///
    /// An unparseable mode, timeout or seed is an error; an unparseable
    /// headless flag is ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("CASEWATCH_MODE") {
            self.fetch.mode = val.parse()?;
            tracing::debug!("Override fetch.mode from env: {}", self.fetch.mode);
        }

        if let Some(val) = lookup("CASEWATCH_REQUEST_TIMEOUT_MS") {
            self.fetch.request_timeout_ms =
                val.parse().map_err(|_| ConfigError::InvalidValue {
                    field: "CASEWATCH_REQUEST_TIMEOUT_MS".to_string(),
                    reason: format!("not a number: '{val}'"),
                })?;
            tracing::debug!(
                "Override fetch.request_timeout_ms from env: {}",
                self.fetch.request_timeout_ms
            );
        }

        if let Some(val) = lookup("CASEWATCH_HEADLESS") {
            if let Ok(headless) = val.parse() {
                self.browser.headless = headless;
                tracing::debug!("Override browser.headless from env: {}", headless);
            }
        }

        if let Some(val) = lookup("CASEWATCH_SYNTHETIC_SEED") {
            let seed = val.parse().map_err(|_| ConfigError::InvalidValue {
                field: "CASEWATCH_SYNTHETIC_SEED".to_string(),
                reason: format!("not a number: '{val}'"),
            })?;
            self.fetch.synthetic_seed = Some(seed);
        }

        if let Some(val) = lookup("CAPTCHA_SERVICE_KEY") {
            if !val.trim().is_empty() {
                self.fetch.captcha_service_key = Some(val.trim().to_string());
                tracing::debug!("CAPTCHA service credential loaded from env");
            }
        }

        self.validate()
    }

    /// Check value ranges.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.fetch.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "fetch.request_timeout_ms".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.browser.window_width == 0 || self.browser.window_height == 0 {
            return Err(ConfigError::InvalidValue {
                field: "browser.window_width/window_height".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Save configuration to the default location.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> ConfigResult<()> {
        let config_path = Self::config_path()?;
        let config_dir = config_path
            .parent()
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "config_path".to_string(),
                reason: "no parent directory".to_string(),
            })?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", config_path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(config_path, contents)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/casewatch/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs =
            ProjectDirs::from("com", "casewatch", "casewatch").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }
}

/// How a lookup obtains its data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    /// Drive the court website; failures are returned as failures
    Live,
    /// Never touch the network; fabricate a plausible record
    #[default]
    Synthetic,
    /// Try live, and on failure return a synthetic record tagged as such
    Fallback,
}

impl fmt::Display for FetchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Live => f.write_str("live"),
            Self::Synthetic => f.write_str("synthetic"),
            Self::Fallback => f.write_str("fallback"),
        }
    }
}

impl FromStr for FetchMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "live" => Ok(Self::Live),
            "synthetic" | "demo" => Ok(Self::Synthetic),
            "fallback" => Ok(Self::Fallback),
            other => Err(ConfigError::InvalidValue {
                field: "fetch.mode".to_string(),
                reason: format!("expected live, synthetic or fallback, got '{other}'"),
            }),
        }
    }
}

/// Lookup pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Default mode for lookups
    pub mode: FetchMode,
    /// Bound on every page load, element wait and HTTP request, in milliseconds
    pub request_timeout_ms: u64,
    /// Seed making synthetic records reproducible per query
    pub synthetic_seed: Option<u64>,
    /// TOML file overriding the built-in court site definition
    pub site_definition: Option<PathBuf>,
    /// Base URL of the external CAPTCHA solving service
    pub captcha_service_url: String,
    /// Path to the `tesseract` executable (searched on `PATH` when unset)
    pub tesseract_path: Option<PathBuf>,
    /// External CAPTCHA service credential (from the environment, never written to disk)
    #[serde(skip)]
    pub captcha_service_key: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            mode: FetchMode::default(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            synthetic_seed: None,
            site_definition: None,
            captcha_service_url: "https://2captcha.com".to_string(),
            tesseract_path: None,
            captcha_service_key: None,
        }
    }
}

impl FetchConfig {
    /// The request timeout as a [`std::time::Duration`].
    #[must_use]
    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.request_timeout_ms)
    }
}

/// Browser automation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run browser in headless mode
    pub headless: bool,
    /// Browser window width
    pub window_width: u32,
    /// Browser window height
    pub window_height: u32,
    /// Chrome/Chromium executable (auto-detected when unset)
    pub chrome_executable: Option<PathBuf>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1920,
            window_height: 1080,
            chrome_executable: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.fetch.mode, FetchMode::Synthetic);
        assert_eq!(config.fetch.request_timeout_ms, 10_000);
        assert!(config.fetch.captcha_service_key.is_none());
        assert!(config.browser.headless);
    }

    #[test]
    fn test_config_serialization_skips_credential() {
        let mut config = AppConfig::default();
        config.fetch.captcha_service_key = Some("secret".to_string());

        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("[fetch]"));
        assert!(toml_str.contains("[browser]"));
        assert!(!toml_str.contains("secret"));

        let parsed: AppConfig = toml::from_str(&toml_str).expect("parse serialized config");
        assert_eq!(parsed.fetch.mode, config.fetch.mode);
        assert!(parsed.fetch.captcha_service_key.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let tmp = TempDir::new().expect("create temp dir");
        let config_path = tmp.path().join("config.toml");
        fs::write(
            &config_path,
            r#"
[fetch]
mode = "live"
request_timeout_ms = 2500
"#,
        )
        .expect("write config file");

        let loaded = AppConfig::load_from(&config_path).expect("load config");
        assert_eq!(loaded.fetch.mode, FetchMode::Live);
        assert_eq!(loaded.fetch.request_timeout_ms, 2500);
        // Defaults for everything else
        assert!(loaded.browser.headless);
        assert_eq!(loaded.fetch.captcha_service_url, "https://2captcha.com");
    }

    #[test]
    fn test_load_missing_file() {
        let tmp = TempDir::new().expect("create temp dir");
        let err = AppConfig::load_from(&tmp.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("CASEWATCH_MODE", "fallback"),
            ("CASEWATCH_REQUEST_TIMEOUT_MS", "5000"),
            ("CASEWATCH_HEADLESS", "false"),
            ("CASEWATCH_SYNTHETIC_SEED", "42"),
            ("CAPTCHA_SERVICE_KEY", " abc123 "),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config
            .apply_env_overrides(|k| vars.get(k).map(|v| (*v).to_string()))
            .expect("apply overrides");

        assert_eq!(config.fetch.mode, FetchMode::Fallback);
        assert_eq!(config.fetch.request_timeout_ms, 5000);
        assert!(!config.browser.headless);
        assert_eq!(config.fetch.synthetic_seed, Some(42));
        assert_eq!(config.fetch.captcha_service_key.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_bad_env_mode_rejected() {
        let mut config = AppConfig::default();
        let result = config.apply_env_overrides(|k| {
            (k == "CASEWATCH_MODE").then(|| "liev".to_string())
        });
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config: AppConfig = toml::from_str("[fetch]\nrequest_timeout_ms = 0\n").unwrap();
        assert!(config.validate().is_err());
    }
}
