//! Configuration management for Claix
//!
//! Provides TOML-based configuration with defaults and validation.
//! Location: ~/.claix/config.toml

use crate::errors::{ClaixError, Result};
use crate::generator::client::{ClientSettings, DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::session::DEFAULT_SESSION;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Complete configuration for Claix
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub openai: OpenAiConfig,
    pub session: SessionConfig,
    pub shell: ShellConfig,
    pub display: DisplayConfig,
}

/// Generation backend configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    pub base_url: String,
    pub model: String,
    pub extraction_model: String,
    pub poll_interval_ms: u64,
    pub run_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

/// Session cache configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub name: String,
    pub state_dir: String,
}

/// Shell configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Interpreter override (`sh` / `cmd` when unset)
    pub program: Option<String>,
}

/// Terminal display configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub color: bool,
    pub spinner: bool,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            extraction_model: DEFAULT_MODEL.to_string(),
            poll_interval_ms: 100,
            run_timeout_secs: 120,
            request_timeout_secs: 30,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_SESSION.to_string(),
            state_dir: "~/.claix".to_string(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            color: true,
            spinner: true,
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(config_path) => Self::load_from_file(config_path),
            None => Self::load_default(),
        }
    }

    /// Load configuration from specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ClaixError::ConfigError(format!("Failed to read config: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| ClaixError::ConfigError(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load default configuration from standard location or use built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Some(config_path) = Self::default_path() {
            if config_path.exists() {
                return Self::load_from_file(&config_path);
            }
        }

        Ok(Config::default())
    }

    /// ~/.claix/config.toml
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".claix").join("config.toml"))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.openai.base_url.trim().is_empty() {
            return Err(ClaixError::ConfigError("base_url must not be empty".to_string()));
        }

        if self.openai.model.trim().is_empty() || self.openai.extraction_model.trim().is_empty() {
            return Err(ClaixError::ConfigError("model names must not be empty".to_string()));
        }

        if self.openai.poll_interval_ms == 0
            || self.openai.run_timeout_secs == 0
            || self.openai.request_timeout_secs == 0
        {
            return Err(ClaixError::ConfigError(
                "intervals and timeouts must be greater than 0".to_string(),
            ));
        }

        if self.openai.poll_interval_ms >= self.openai.run_timeout_secs.saturating_mul(1000) {
            return Err(ClaixError::ConfigError(
                "poll_interval_ms must be less than run_timeout_secs".to_string(),
            ));
        }

        if self.session.name.trim().is_empty() {
            return Err(ClaixError::ConfigError("session name must not be empty".to_string()));
        }

        Ok(())
    }

    /// Expand tilde in paths
    pub fn expand_path(path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(path)
    }

    /// Get state directory path
    pub fn state_dir(&self) -> PathBuf {
        Self::expand_path(&self.session.state_dir)
    }

    /// Client settings for the given API key
    pub fn client_settings(&self, api_key: &str) -> ClientSettings {
        ClientSettings {
            base_url: self.openai.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: self.openai.model.clone(),
            extraction_model: self.openai.extraction_model.clone(),
            poll_interval: Duration::from_millis(self.openai.poll_interval_ms),
            run_timeout: Duration::from_secs(self.openai.run_timeout_secs),
            request_timeout: Duration::from_secs(self.openai.request_timeout_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.openai.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.session.name, "default");
        assert!(config.display.color);
        assert!(config.shell.program.is_none());
    }

    #[test]
    fn test_config_validation_success() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation_empty_url() {
        let mut config = Config::default();
        config.openai.base_url = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_empty_model() {
        let mut config = Config::default();
        config.openai.extraction_model = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_interval() {
        let mut config = Config::default();
        config.openai.poll_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_poll_exceeds_timeout() {
        let mut config = Config::default();
        config.openai.run_timeout_secs = 1;
        config.openai.poll_interval_ms = 1000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_huge_timeout() {
        let mut config = Config::default();
        config.openai.run_timeout_secs = u64::MAX / 10;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[openai]\nmodel = \"gpt-4o\"\n\n[display]\ncolor = false\n").unwrap();

        let config = Config::load(Some(path.as_path())).unwrap();
        assert_eq!(config.openai.model, "gpt-4o");
        assert_eq!(config.openai.poll_interval_ms, 100);
        assert!(!config.display.color);
        assert!(config.display.spinner);
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[openai\nmodel = ").unwrap();

        let err = Config::load_from_file(&path).unwrap_err();
        assert!(matches!(err, ClaixError::ConfigError(_)));
    }

    #[test]
    fn test_client_settings() {
        let mut config = Config::default();
        config.openai.base_url = "http://localhost:8080/v1/".to_string();
        config.openai.run_timeout_secs = 5;

        let settings = config.client_settings("sk-test");
        assert_eq!(settings.base_url, "http://localhost:8080/v1");
        assert_eq!(settings.api_key, "sk-test");
        assert_eq!(settings.run_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let expanded = Config::expand_path("~/.claix");
        assert!(!expanded.to_string_lossy().contains('~'));
    }

    #[test]
    fn test_expand_path_without_tilde() {
        let expanded = Config::expand_path("/absolute/path");
        assert_eq!(expanded.to_string_lossy(), "/absolute/path");
    }
}
