//! Application configuration.
//!
//! Values are layered: built-in defaults, then `~/.config/qvalve/config.json`,
//! then `QVALVE__*` environment variables (e.g. `QVALVE__BASE_URL`,
//! `QVALVE__FILTERS__MAX_PING`).

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::listing::ListingFilter;

/// Directory name under the platform config directory.
pub const CONFIG_DIR: &str = "qvalve";
/// File name of the configuration file.
pub const CONFIG_FILE: &str = "config.json";
/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "QVALVE";

/// Runtime settings for the front-end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL of the backend serving `/show-players` and `/connect`.
    pub base_url: String,
    /// JSON file holding the server listing.
    pub listing_path: PathBuf,
    /// Per-request timeout.
    pub request_timeout_secs: u64,
    /// Interval for refreshing expanded rows; `0` disables it.
    pub auto_refresh_secs: u64,
    /// Filters applied to the listing on load.
    pub filters: ListingFilter,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5000".to_string(),
            listing_path: config_root().join("servers.json"),
            request_timeout_secs: 10,
            auto_refresh_secs: 0,
            filters: ListingFilter::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default location plus the environment.
    pub fn load() -> Result<Self> {
        Self::load_from(config_path())
    }

    /// Load configuration from `path` (if present) plus the environment.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_layered(path.as_ref(), ENV_PREFIX)
    }

    fn load_layered(path: &Path, env_prefix: &str) -> Result<Self> {
        let defaults = Config::try_from(&AppConfig::default())
            .context("failed to serialize default configuration")?;
        let settings = Config::builder()
            .add_source(defaults)
            .add_source(File::from(path).format(FileFormat::Json).required(false))
            .add_source(Environment::with_prefix(env_prefix).separator("__"))
            .build()
            .with_context(|| format!("failed to read configuration {}", path.display()))?;
        settings
            .try_deserialize()
            .context("invalid configuration")
    }

    /// Request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Auto-refresh interval, if enabled.
    pub fn auto_refresh(&self) -> Option<Duration> {
        (self.auto_refresh_secs > 0).then(|| Duration::from_secs(self.auto_refresh_secs))
    }
}

/// Platform configuration directory for the application.
pub fn config_root() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
}

/// Path of the configuration file.
pub fn config_path() -> PathBuf {
    config_root().join(CONFIG_FILE)
}

/// Write the default configuration file if none exists yet.
pub fn ensure_default_config() -> Result<()> {
    write_default_config(config_path())
}

fn write_default_config(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    let serialized = serde_json::to_string_pretty(&AppConfig::default())
        .context("failed to serialize default configuration")?;
    fs::write(path, serialized)
        .with_context(|| format!("failed to write config {}", path.display()))?;
    info!(path = %path.display(), "wrote default configuration");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() -> Result<()> {
        let dir = tempdir()?;
        let config = AppConfig::load_from(dir.path().join("absent.json"))?;
        assert_eq!(config.request_timeout_secs, 10);
        assert_eq!(config.auto_refresh(), None);
        assert_eq!(config.filters, ListingFilter::default());
        Ok(())
    }

    #[test]
    fn file_overrides_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE);
        fs::write(
            &path,
            r#"{"base_url": "http://backend:8080", "auto_refresh_secs": 15,
                "filters": {"map_prefix": "pl_", "max_ping": 90}}"#,
        )?;
        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.base_url, "http://backend:8080");
        assert_eq!(config.auto_refresh(), Some(Duration::from_secs(15)));
        assert_eq!(config.filters.map_prefix.as_deref(), Some("pl_"));
        assert_eq!(config.filters.max_ping, Some(90));
        assert_eq!(config.request_timeout_secs, 10);
        Ok(())
    }

    #[test]
    fn default_file_round_trips() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join(CONFIG_FILE);
        write_default_config(&path)?;
        assert!(path.exists());
        assert_eq!(AppConfig::load_from(&path)?, AppConfig::default());
        Ok(())
    }

    #[test]
    fn environment_overrides_file() -> Result<()> {
        // Own prefix so parallel tests never see these variables.
        const PREFIX: &str = "QVALVE_LAYER_TEST";
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE);
        fs::write(
            &path,
            r#"{"base_url": "http://file:8080", "request_timeout_secs": 3,
                "filters": {"max_ping": 90}}"#,
        )?;
        std::env::set_var(format!("{PREFIX}__BASE_URL"), "http://env:1");
        std::env::set_var(format!("{PREFIX}__FILTERS__MAX_PING"), "70");
        let loaded = AppConfig::load_layered(&path, PREFIX);
        std::env::remove_var(format!("{PREFIX}__BASE_URL"));
        std::env::remove_var(format!("{PREFIX}__FILTERS__MAX_PING"));

        let config = loaded?;
        assert_eq!(config.base_url, "http://env:1");
        assert_eq!(config.filters.max_ping, Some(70));
        assert_eq!(config.request_timeout_secs, 3);
        assert_eq!(config.auto_refresh_secs, 0);
        Ok(())
    }
}
