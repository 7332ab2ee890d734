/// Application configuration management
/// Stores user preferences in <config dir>/pm1-monitor/config.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::poller::{PollSettings, MIN_INTERVAL};
use crate::utils::constants::{
    APP_NAME, CONFIG_FILE_NAME, DEFAULT_BASE_URL, DEFAULT_INTERVAL_MS, DEFAULT_LOG_DIR,
    DEFAULT_REQUEST_TIMEOUT_SECS,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Controller address, e.g. `http://192.168.4.1`
    pub base_url: String,
    pub interval_ms: u64,
    pub live_update: bool,
    pub request_timeout_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            interval_ms: DEFAULT_INTERVAL_MS,
            live_update: true,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            log_dir: None,
        }
    }
}

impl AppConfig {
    /// Get config file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine the user config directory")?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load configuration from file, defaults when the file does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(config)
    }

    /// Save configuration to file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;

        Ok(())
    }

    /// Write defaults to `path`. An existing file, valid or not, is only
    /// replaced with `force`.
    pub fn write_default(path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            anyhow::bail!("{} already exists (use --force to overwrite)", path.display());
        }
        Self::default().save_to(path)
    }

    /// Problems that would make the monitor unusable
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.base_url.trim().is_empty() {
            errors.push("base_url must not be empty".to_string());
        }
        if Duration::from_millis(self.interval_ms) < MIN_INTERVAL {
            errors.push(format!(
                "interval_ms must be at least {}",
                MIN_INTERVAL.as_millis()
            ));
        }
        if self.request_timeout_secs == 0 {
            errors.push("request_timeout_secs must be greater than 0".to_string());
        }

        errors
    }

    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            interval: Duration::from_millis(self.interval_ms).max(MIN_INTERVAL),
            live_update: self.live_update,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Configured log directory, else the platform data dir, else `./logs`
    pub fn log_dir(&self) -> PathBuf {
        self.log_dir
            .clone()
            .or_else(|| dirs::data_local_dir().map(|dir| dir.join(APP_NAME).join("logs")))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.poll_settings(), PollSettings::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = AppConfig {
            base_url: "http://pm1.local".to_string(),
            interval_ms: 5000,
            live_update: false,
            request_timeout_secs: 3,
            log_dir: Some(dir.path().join("logs")),
        };
        config.save_to(&path).unwrap();

        assert_eq!(AppConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "interval_ms = 1000\n").unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.interval_ms, 1000);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert!(config.live_update);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "interval_ms = \"fast\"\n").unwrap();

        assert!(AppConfig::load_from(&path).is_err());
    }

    #[test]
    fn test_write_default_replaces_broken_file_only_with_force() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "interval_ms = \"fast\"\n").unwrap();

        assert!(AppConfig::write_default(&path, false).is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "interval_ms = \"fast\"\n");

        AppConfig::write_default(&path, true).unwrap();
        assert_eq!(AppConfig::load_from(&path).unwrap(), AppConfig::default());
    }

    #[test]
    fn test_write_default_creates_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pm1-monitor").join("config.toml");

        AppConfig::write_default(&path, false).unwrap();
        assert!(path.exists());
        assert_eq!(AppConfig::load_from(&path).unwrap(), AppConfig::default());
    }

    #[test]
    fn test_validate() {
        assert!(AppConfig::default().validate().is_empty());

        let config = AppConfig {
            base_url: " ".to_string(),
            interval_ms: 50,
            request_timeout_secs: 0,
            ..AppConfig::default()
        };
        assert_eq!(config.validate().len(), 3);
        assert_eq!(config.poll_settings().interval, MIN_INTERVAL);
    }
}
