//! TOML-backed configuration.
//!
//! Stores the report server connection (host + API token) and UI
//! preferences under the user config directory. The file is created
//! with defaults on first save; a missing file is not an error.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the report server, e.g. `https://desk.example.com`.
    pub host: String,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_theme")]
    pub theme: String,
    /// Page key used as the first route segment.
    #[serde(default = "default_page")]
    pub default_page: String,
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_theme() -> String {
    "dark".to_string()
}

fn default_page() -> String {
    "report-view".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost:8000".to_string(),
            api_key: None,
            api_secret: None,
            request_timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            default_page: default_page(),
        }
    }
}

impl Config {
    /// Get the path to the config file.
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "linux") {
            dirs::config_dir()
                .context("Failed to get XDG config directory")?
                .join("reportview-cli")
        } else {
            dirs::home_dir()
                .context("Failed to get home directory")?
                .join(".reportview-cli")
        };

        if !config_dir.exists() {
            std::fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {:?}", config_dir))?;
            log::info!("Created config directory: {:?}", config_dir);
        }

        Ok(config_dir.join("config.toml"))
    }

    /// Load configuration, falling back to defaults when no file exists.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            log::debug!("No config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&raw).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        let raw = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&path, raw)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;
        log::info!("Saved config to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.host, "http://localhost:8000");
        assert_eq!(config.server.request_timeout_secs, 60);
        assert_eq!(config.ui.default_page, "report-view");
    }

    #[test]
    fn test_parse_minimal() {
        let config: Config = toml::from_str(
            r#"
            [server]
            host = "https://desk.example.com"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.host, "https://desk.example.com");
        assert!(config.server.api_key.is_none());
        assert_eq!(config.ui.theme, "dark");
    }

    #[test]
    fn test_parse_full() {
        let config: Config = toml::from_str(
            r#"
            [server]
            host = "https://desk.example.com"
            api_key = "key"
            api_secret = "secret"
            request_timeout_secs = 30

            [ui]
            theme = "light"
            default_page = "reports"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.api_key.as_deref(), Some("key"));
        assert_eq!(config.server.request_timeout_secs, 30);
        assert_eq!(config.ui.theme, "light");
        assert_eq!(config.ui.default_page, "reports");
    }
}
