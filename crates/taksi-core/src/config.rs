//! Configuration management for the taksi client.
//!
//! Loads configuration from ${TAKSI_HOME}/config.toml with sensible defaults.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub mod paths {
    //! Path resolution for taksi configuration and data directories.
    //!
    //! TAKSI_HOME resolution order:
    //! 1. TAKSI_HOME environment variable (if set)
    //! 2. ~/.config/taksi (default)

    use std::path::PathBuf;

    /// Returns the taksi home directory.
    ///
    /// Checks TAKSI_HOME env var first, falls back to ~/.config/taksi
    pub fn taksi_home() -> PathBuf {
        if let Ok(home) = std::env::var("TAKSI_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir()
            .map(|h| h.join(".config").join("taksi"))
            .expect("Could not determine home directory")
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        taksi_home().join("config.toml")
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the backend API gateway.
    ///
    /// Overridable with the TAKSI_API_BASE_URL environment variable.
    pub api_base_url: Option<String>,

    /// Timeout for API requests in seconds (0 disables)
    pub request_timeout_secs: u32,
}

impl Config {
    /// Development gateway; the deployed apps ship their own config.toml.
    pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8765";
    const DEFAULT_REQUEST_TIMEOUT_SECS: u32 = 30;

    /// Loads configuration from the default config path.
    pub fn load() -> Result<Self> {
        Self::load_from(&paths::config_path())
    }

    /// Loads configuration from a specific path.
    /// Returns defaults if file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config from {}", path.display()))
        } else {
            Ok(Config::default())
        }
    }

    /// Resolves the API base URL with precedence: env > config > default.
    pub fn resolve_api_base_url(&self) -> Result<String> {
        if let Ok(env_url) = std::env::var("TAKSI_API_BASE_URL") {
            let trimmed = env_url.trim();
            if !trimmed.is_empty() {
                validate_url(trimmed)?;
                return Ok(trimmed.trim_end_matches('/').to_string());
            }
        }

        if let Some(config_url) = self.api_base_url.as_deref() {
            let trimmed = config_url.trim();
            if !trimmed.is_empty() {
                validate_url(trimmed)?;
                return Ok(trimmed.trim_end_matches('/').to_string());
            }
        }

        Ok(Self::DEFAULT_API_BASE_URL.to_string())
    }

    /// Returns the request timeout, if enabled.
    pub fn request_timeout(&self) -> Option<Duration> {
        if self.request_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(u64::from(self.request_timeout_secs)))
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: None,
            request_timeout_secs: Self::DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

/// Validates that a URL is well-formed.
fn validate_url(url: &str) -> Result<()> {
    url::Url::parse(url).with_context(|| format!("Invalid API base URL: {url}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_load_from_missing_file_returns_defaults() {
        let config = Config::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.api_base_url, None);
        assert_eq!(
            config.request_timeout_secs,
            Config::DEFAULT_REQUEST_TIMEOUT_SECS
        );
    }

    #[test]
    fn test_load_from_partial_file_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"api_base_url = "https://api.example.com""#).unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(
            config.api_base_url.as_deref(),
            Some("https://api.example.com")
        );
        assert_eq!(
            config.request_timeout_secs,
            Config::DEFAULT_REQUEST_TIMEOUT_SECS
        );
    }

    #[test]
    fn test_config_base_url_trims_trailing_slash() {
        let config = Config {
            api_base_url: Some("https://api.example.com/".to_string()),
            ..Config::default()
        };
        assert_eq!(
            config.resolve_api_base_url().unwrap(),
            "https://api.example.com"
        );
    }

    #[test]
    fn test_zero_timeout_disables() {
        let config = Config {
            request_timeout_secs: 0,
            ..Config::default()
        };
        assert!(config.request_timeout().is_none());
    }
}
