// src/config/mod.rs
mod schema;

use std::path::{Path, PathBuf};
use std::time::Duration;
use config::{Config as ConfigLoader, FileFormat};
use tracing::{info, warn};

pub use schema::{
    Config, DispatchMode, FailurePolicy, HttpConfig,
    SmtpConfig, SmtpSecurity, WatchConfig
};

use crate::error::{PageWatchResult, PageWatchError};

/// Centralized configuration handling
impl Config {
    /// Load configuration from a file, layered over the built-in defaults and the environment
    pub fn load(config_path: Option<&Path>) -> PageWatchResult<Self> {
        info!("Loading configuration");

        let mut config_builder = ConfigLoader::builder();

        // Default configuration
        config_builder = config_builder.add_source(
            config::File::from_str(
                include_str!("../../config/default.toml"),
                FileFormat::Toml
            )
        );

        // User-provided configuration
        if let Some(path) = config_path {
            if !path.exists() {
                return Err(PageWatchError::File {
                    path: path.to_path_buf(),
                    message: "Configuration file not found".to_string(),
                });
            }
            config_builder = config_builder.add_source(config::File::from(path));
            info!("Loading user configuration from: {}", path.display());
        } else {
            let default_path = Self::default_path();
            if default_path.exists() {
                config_builder = config_builder.add_source(config::File::from(default_path.as_path()));
                info!("Loading default configuration from: {}", default_path.display());
            } else {
                warn!("No configuration found at {}, using built-in defaults", default_path.display());
            }
        }

        // Environment variables, e.g. PAGEWATCH_SMTP__PASS
        config_builder = config_builder.add_source(
            config::Environment::with_prefix("PAGEWATCH")
                .prefix_separator("_")
                .separator("__")
        );

        let config: Config = config_builder
            .build()
            .map_err(|e| PageWatchError::Config(format!("Failed to build configuration: {}", e)))?
            .try_deserialize()
            .map_err(|e| PageWatchError::Config(format!("Failed to parse configuration: {}", e)))?;

        info!("[config] OK");
        Ok(config)
    }

    /// Check the values the watch loop depends on.
    ///
    /// `require_smtp` is false for dry runs, where nothing is mailed.
    pub fn validate(&self, require_smtp: bool) -> PageWatchResult<()> {
        self.delay()?;

        if self.queue_capacity == 0 {
            return Err(PageWatchError::Config("queue_capacity must be at least 1".to_string()));
        }

        if self.watch.is_empty() {
            return Err(PageWatchError::Config("No pages to watch".to_string()));
        }

        if let Some(pos) = self.watch.iter().position(|w| w.address.trim().is_empty()) {
            return Err(PageWatchError::Config(format!("watch entry {} has no address", pos + 1)));
        }

        if require_smtp {
            let smtp = &self.smtp;
            if smtp.host.trim().is_empty() {
                return Err(PageWatchError::Config("smtp.host is not set".to_string()));
            }
            if smtp.from.trim().is_empty() {
                return Err(PageWatchError::Config("smtp.from is not set".to_string()));
            }
            if smtp.to.is_empty() {
                return Err(PageWatchError::Config("smtp.to has no recipients".to_string()));
            }
        }

        Ok(())
    }

    /// Pause between two polls of the same target
    pub fn delay(&self) -> PageWatchResult<Duration> {
        let invalid = || PageWatchError::Config(format!(
            "delay_minutes must be a positive number of minutes, got {}", self.delay_minutes
        ));

        let delay = Duration::try_from_secs_f64(self.delay_minutes * 60.0).map_err(|_| invalid())?;
        if delay.is_zero() {
            return Err(invalid());
        }
        Ok(delay)
    }

    /// Get the default configuration path
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".pagewatch/config.toml")
    }

    /// Write a sample configuration, refusing to overwrite unless forced
    pub fn init(path: Option<&Path>, force: bool) -> PageWatchResult<PathBuf> {
        let config_path = path.map(Path::to_path_buf).unwrap_or_else(Self::default_path);

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| PageWatchError::File {
                    path: parent.to_path_buf(),
                    message: format!("Failed to create directory: {}", e),
                })?;
        }

        if config_path.exists() && !force {
            return Err(PageWatchError::Config(
                format!("Configuration already exists at {}. Use --force to overwrite.", config_path.display())
            ));
        }

        Config::sample().save(&config_path)?;

        Ok(config_path)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> PageWatchResult<()> {
        let config_str = toml::to_string_pretty(self)
            .map_err(|e| PageWatchError::Serialization(format!("Failed to serialize configuration: {}", e)))?;

        std::fs::write(path, config_str)
            .map_err(|e| PageWatchError::File {
                path: path.to_path_buf(),
                message: format!("Failed to write configuration: {}", e),
            })?;

        info!("Configuration saved to {}", path.display());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &tempfile::TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_user_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, r##"
delay_minutes = 0.5
dispatch = "batched"

[smtp]
host = "smtp.example.com"
from = "watcher@example.com"
to = ["a@example.com", "b@example.com"]

[[watch]]
address = "https://example.com/shop"
selector = "#stock"

[[watch]]
address = "https://example.com/news"
"##);

        let config = Config::load(Some(&path)).unwrap();

        assert_eq!(config.delay().unwrap(), Duration::from_secs(30));
        assert_eq!(config.dispatch, DispatchMode::Batched);
        assert_eq!(config.on_failure, FailurePolicy::Exit);
        assert_eq!(config.smtp.port, 587);
        assert_eq!(config.smtp.to.len(), 2);
        assert_eq!(config.watch[0].selector.as_deref(), Some("#stock"));
        assert_eq!(config.watch[1].selector, None);
        assert!(config.validate(true).is_ok());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load(Some(&dir.path().join("nope.toml")));

        assert!(matches!(result, Err(PageWatchError::File { .. })));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::sample();
        assert!(config.validate(true).is_ok());

        config.delay_minutes = 0.0;
        assert!(config.validate(true).is_err());
        config.delay_minutes = f64::NAN;
        assert!(config.validate(true).is_err());
        config.delay_minutes = -2.0;
        assert!(config.validate(true).is_err());
        config.delay_minutes = 1e18;
        assert!(matches!(config.validate(true), Err(PageWatchError::Config(_))));
        assert!(config.delay().is_err());
        config.delay_minutes = 1.0;

        config.smtp.to.clear();
        assert!(config.validate(true).is_err());
        assert!(config.validate(false).is_ok());

        config.watch.push(WatchConfig { address: " ".to_string(), selector: None });
        assert!(config.validate(false).is_err());

        config.watch.clear();
        assert!(config.validate(false).is_err());
    }

    #[test]
    fn test_init_writes_loadable_sample() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");

        let written = Config::init(Some(&path), false).unwrap();
        assert_eq!(written, path);
        assert!(Config::init(Some(&path), false).is_err());
        assert!(Config::init(Some(&path), true).is_ok());

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.watch, Config::sample().watch);
        assert!(config.validate(true).is_ok());
    }
}
